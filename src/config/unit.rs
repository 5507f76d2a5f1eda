use crate::domain::model::{RetentionLimits, SourceConfig};
use crate::utils::error::{DumpError, Result};
use crate::utils::validation::{
    validate_name_component, validate_non_empty_string, validate_non_negative, validate_path,
    validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shared unit merged under every source unit.
pub const DEFAULT_UNIT_NAME: &str = "default.conf.toml";
pub const UNIT_SUFFIX: &str = ".conf.toml";
pub const DEFAULT_DUMP_PROGRAM: &str = "pg_dump";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One TOML config unit. Every key is optional here; required keys are
/// checked after merging with the default unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUnit {
    pub dumps_dir: Option<String>,
    pub database_name: Option<String>,
    pub run_as_user: Option<String>,
    pub file_name_prefix: Option<String>,
    pub dumping_period_seconds: Option<u64>,
    pub files_limiter: Option<usize>,
    pub size_limiter_gb: Option<f64>,
    /// argv prefix, the runner appends `-Fc --file=<path> <database>`
    pub dump_command: Option<Vec<String>>,
}

impl ConfigUnit {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, origin: &Path) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DumpError::ConfigParseError {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// 替換環境變數 (例如 ${PGHOST}), 未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DumpError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Field by field merge, values set in `overrides` win.
    pub fn merge(self, overrides: ConfigUnit) -> ConfigUnit {
        ConfigUnit {
            dumps_dir: overrides.dumps_dir.or(self.dumps_dir),
            database_name: overrides.database_name.or(self.database_name),
            run_as_user: overrides.run_as_user.or(self.run_as_user),
            file_name_prefix: overrides.file_name_prefix.or(self.file_name_prefix),
            dumping_period_seconds: overrides
                .dumping_period_seconds
                .or(self.dumping_period_seconds),
            files_limiter: overrides.files_limiter.or(self.files_limiter),
            size_limiter_gb: overrides.size_limiter_gb.or(self.size_limiter_gb),
            dump_command: overrides.dump_command.or(self.dump_command),
        }
    }

    /// Turns a merged unit into a validated source record.
    pub fn resolve(&self) -> Result<SourceConfig> {
        let dumps_dir = validate_required_field("dumps_dir", &self.dumps_dir)?;
        let database_name = validate_required_field("database_name", &self.database_name)?;
        let run_as_user = validate_required_field("run_as_user", &self.run_as_user)?;
        let period = validate_required_field("dumping_period_seconds", &self.dumping_period_seconds)?;
        let files_limiter = validate_required_field("files_limiter", &self.files_limiter)?;
        let size_limiter_gb = validate_required_field("size_limiter_gb", &self.size_limiter_gb)?;

        validate_path("dumps_dir", dumps_dir)?;
        validate_non_negative("size_limiter_gb", *size_limiter_gb)?;

        let config = SourceConfig {
            source_name: database_name.clone(),
            storage_dir: PathBuf::from(dumps_dir).join(database_name),
            name_prefix: self.file_name_prefix.clone().unwrap_or_default(),
            min_period_seconds: *period,
            limits: RetentionLimits {
                max_count: *files_limiter,
                max_total_bytes: (*size_limiter_gb * BYTES_PER_GB) as u64,
            },
            run_as_identity: run_as_user.clone(),
            dump_command: self
                .dump_command
                .clone()
                .unwrap_or_else(|| vec![DEFAULT_DUMP_PROGRAM.to_string()]),
        };

        config.validate()?;
        Ok(config)
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        validate_name_component("database_name", &self.source_name)?;
        validate_non_empty_string("run_as_user", &self.run_as_identity)?;

        if self.name_prefix.contains('/') {
            return Err(DumpError::InvalidConfigValueError {
                field: "file_name_prefix".to_string(),
                value: self.name_prefix.clone(),
                reason: "Prefix must not contain path separators".to_string(),
            });
        }

        match self.dump_command.first() {
            Some(program) => validate_non_empty_string("dump_command", program),
            None => Err(DumpError::InvalidConfigValueError {
                field: "dump_command".to_string(),
                value: "[]".to_string(),
                reason: "Dump command cannot be empty".to_string(),
            }),
        }
    }
}

/// Whether `file_name` is a per-source unit (the default unit is not).
pub fn is_source_unit_name(file_name: &str) -> bool {
    file_name != DEFAULT_UNIT_NAME
        && file_name.len() > UNIT_SUFFIX.len()
        && file_name.ends_with(UNIT_SUFFIX)
}
