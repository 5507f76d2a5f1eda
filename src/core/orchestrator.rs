use crate::adapters::identity::lookup_user;
use crate::core::inventory::scan_artifacts;
use crate::core::naming::ArtifactName;
use crate::core::retention::RetentionPolicy;
use crate::domain::model::{DumpOutcome, DumpRequest, Identity, SourceConfig};
use crate::domain::ports::{Clock, DumpRunner};
use crate::utils::error::{DumpError, Result};
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// Where a dump is going, decided once the source turned out to be due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPlan {
    pub timestamp: i64,
    pub unfinished_path: PathBuf,
    pub finished_path: PathBuf,
}

/// Runs one source through check-due, dump, promote and retention.
pub struct DumpOrchestrator<R: DumpRunner, C: Clock> {
    runner: R,
    clock: C,
}

impl<R: DumpRunner, C: Clock> DumpOrchestrator<R, C> {
    pub fn new(runner: R, clock: C) -> Self {
        Self { runner, clock }
    }

    pub async fn process(&self, config: &SourceConfig) -> Result<DumpOutcome> {
        let identity = lookup_user(&config.run_as_identity)?;
        prepare_storage_dir(&config.storage_dir, &identity)?;

        // CHECK_DUE
        let now = self.clock.now();
        let plan = match check_due(config, now)? {
            Due::Skip(outcome) => {
                tracing::info!("⏭️ skipping {}: last dump is too recent", config.source_name);
                return Ok(outcome);
            }
            Due::Run(plan) => plan,
        };

        // RUNNING
        tracing::info!(
            "💾 Dumping {} as {} into {}",
            config.source_name,
            identity.name,
            plan.unfinished_path.display()
        );
        let request = DumpRequest {
            command: &config.dump_command,
            database_name: &config.source_name,
            output_path: &plan.unfinished_path,
            working_dir: &config.storage_dir,
            identity: &identity,
        };
        self.runner.run_dump(&request).await?;

        // PROMOTING
        fs::rename(&plan.unfinished_path, &plan.finished_path).map_err(|source| {
            DumpError::PromoteFailed {
                from: plan.unfinished_path.clone(),
                to: plan.finished_path.clone(),
                source,
            }
        })?;
        tracing::info!("✅ Finished {}", plan.finished_path.display());

        // RETAINING
        tracing::info!("🧹 cleaning {} ...", config.storage_dir.display());
        let records = scan_artifacts(&config.storage_dir)?;
        let report = RetentionPolicy::new(config.limits).enforce(records)?;

        Ok(DumpOutcome::Completed {
            artifact: plan.finished_path,
            removed: report.removed.into_iter().map(|r| r.path).collect(),
        })
    }
}

enum Due {
    Skip(DumpOutcome),
    Run(DumpPlan),
}

fn check_due(config: &SourceConfig, now: i64) -> Result<Due> {
    let records = scan_artifacts(&config.storage_dir)?;

    if let Some(newest) = records.last() {
        let period = i64::try_from(config.min_period_seconds).unwrap_or(i64::MAX);
        if now.saturating_sub(newest.source_timestamp) < period {
            return Ok(Due::Skip(DumpOutcome::Skipped {
                newest_timestamp: newest.source_timestamp,
                next_due: newest.source_timestamp.saturating_add(period),
            }));
        }
    }

    let name = ArtifactName::new(&config.name_prefix, &config.source_name, now);
    Ok(Due::Run(DumpPlan {
        timestamp: now,
        unfinished_path: config.storage_dir.join(name.unfinished_file_name()),
        finished_path: config.storage_dir.join(name.finished_file_name()),
    }))
}

/// 建立目錄 (0o777, 受 umask 影響) 並交給執行身分
fn prepare_storage_dir(dir: &Path, identity: &Identity) -> Result<()> {
    fs::DirBuilder::new().recursive(true).mode(0o777).create(dir)?;
    std::os::unix::fs::chown(dir, Some(identity.uid), Some(identity.gid))?;
    Ok(())
}
