use crate::config::unit::{is_source_unit_name, ConfigUnit, DEFAULT_UNIT_NAME};
use crate::core::orchestrator::DumpOrchestrator;
use crate::domain::model::DumpOutcome;
use crate::domain::ports::{Clock, DumpRunner};
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SourceReport {
    pub unit_path: PathBuf,
    pub result: Result<DumpOutcome>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.count(|r| matches!(r, Ok(DumpOutcome::Completed { .. })))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, Ok(DumpOutcome::Skipped { .. })))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| r.is_err())
    }

    fn count(&self, pred: impl Fn(&Result<DumpOutcome>) -> bool) -> usize {
        self.sources.iter().filter(|s| pred(&s.result)).count()
    }
}

/// Walks a configs directory and runs every source unit in it, one at a time.
pub struct RunLoop {
    configs_dir: PathBuf,
}

impl RunLoop {
    pub fn new(configs_dir: impl Into<PathBuf>) -> Self {
        Self {
            configs_dir: configs_dir.into(),
        }
    }

    /// Source units in file name order.
    pub fn discover_units(&self) -> Result<Vec<PathBuf>> {
        let mut units = Vec::new();

        for entry in fs::read_dir(&self.configs_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_unit = entry
                .file_name()
                .to_str()
                .map(is_source_unit_name)
                .unwrap_or(false);

            if is_unit && path.is_file() {
                units.push(path);
            }
        }

        units.sort();
        Ok(units)
    }

    /// A source failing never stops the loop; its error lands in the report.
    pub async fn run<R: DumpRunner, C: Clock>(
        &self,
        orchestrator: &DumpOrchestrator<R, C>,
    ) -> Result<RunReport> {
        let units = self.discover_units()?;
        if units.is_empty() {
            tracing::warn!("No *.conf.toml units found in {}", self.configs_dir.display());
        }

        let mut report = RunReport::default();
        for unit_path in units {
            tracing::info!("📋 processing {} ...", unit_path.display());

            let result = self.process_unit(orchestrator, &unit_path).await;
            if let Err(e) = &result {
                tracing::error!(
                    "❌ {} failed: {} (Category: {:?})",
                    unit_path.display(),
                    e,
                    e.category()
                );
                log_error_chain(e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            }

            report.sources.push(SourceReport { unit_path, result });
        }

        Ok(report)
    }

    async fn process_unit<R: DumpRunner, C: Clock>(
        &self,
        orchestrator: &DumpOrchestrator<R, C>,
        unit_path: &Path,
    ) -> Result<DumpOutcome> {
        let config = self
            .load_default_unit()?
            .merge(ConfigUnit::from_file(unit_path)?)
            .resolve()?;

        orchestrator.process(&config).await
    }

    fn load_default_unit(&self) -> Result<ConfigUnit> {
        let path = self.configs_dir.join(DEFAULT_UNIT_NAME);
        if !path.is_file() {
            tracing::warn!("⚠️ {} not found, using an empty default unit", path.display());
            return Ok(ConfigUnit::default());
        }
        ConfigUnit::from_file(path)
    }
}

fn log_error_chain(e: &(dyn std::error::Error + 'static)) {
    let mut source = e.source();
    while let Some(cause) = source {
        tracing::error!("   caused by: {}", cause);
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_units_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        for name in [
            "zeta.conf.toml",
            "alpha.conf.toml",
            DEFAULT_UNIT_NAME,
            "notes.txt",
            "beta.conf.toml.disabled",
        ] {
            fs::write(dir.join(name), "").unwrap();
        }
        fs::create_dir(dir.join("dir.conf.toml")).unwrap();

        let units = RunLoop::new(dir).discover_units().unwrap();
        let names: Vec<_> = units
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha.conf.toml", "zeta.conf.toml"]);
    }

    #[test]
    fn test_discover_units_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let run_loop = RunLoop::new(temp_dir.path().join("absent"));
        assert!(run_loop.discover_units().is_err());
    }

    #[test]
    fn test_report_counts() {
        let report = RunReport {
            sources: vec![
                SourceReport {
                    unit_path: PathBuf::from("a"),
                    result: Ok(DumpOutcome::Skipped {
                        newest_timestamp: 1,
                        next_due: 2,
                    }),
                },
                SourceReport {
                    unit_path: PathBuf::from("b"),
                    result: Err(crate::utils::error::DumpError::MissingConfigError {
                        field: "dumps_dir".to_string(),
                    }),
                },
            ],
        };
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.completed(), 0);
    }
}
