use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse config unit {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    #[error("Lock file {path} is held by another instance")]
    LockHeld { path: PathBuf },

    #[error("Malformed dump file name '{file_name}': {reason}")]
    ArtifactFormat { file_name: String, reason: String },

    #[error("Cannot resolve run-as user '{user}': {reason}")]
    UnknownIdentity { user: String, reason: String },

    #[error("Dump command exited with {status}, partial output left at {partial}")]
    DumpFailed { status: String, partial: PathBuf },

    #[error("Dump subprocess could not switch to user '{user}'")]
    PrivilegeDrop { user: String },

    #[error("Failed to promote {from} to {to}: {source}")]
    PromoteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path} during retention: {source}")]
    RetentionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 啟動前即失敗 (CLI 參數、鎖)
    Startup,
    /// 設定檔內容錯誤
    Configuration,
    /// 單一來源處理過程中的錯誤
    Source,
}

impl DumpError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DumpError::ConfigError { .. } | DumpError::LockHeld { .. } => ErrorCategory::Startup,
            DumpError::MissingConfigError { .. }
            | DumpError::InvalidConfigValueError { .. }
            | DumpError::ConfigParseError { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Source,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DumpError::ConfigError { .. } => "Pass the configs directory with -c <DIR>",
            DumpError::LockHeld { .. } => {
                "Wait for the running instance to finish or check for a stuck process"
            }
            DumpError::MissingConfigError { .. } => {
                "Add the field to the source unit or to default.conf.toml"
            }
            DumpError::InvalidConfigValueError { .. } | DumpError::ConfigParseError { .. } => {
                "Fix the config unit and rerun"
            }
            DumpError::ArtifactFormat { .. } => {
                "Remove or rename foreign .dump files in the storage directory"
            }
            DumpError::UnknownIdentity { .. } => "Check run_as_user against /etc/passwd",
            DumpError::DumpFailed { .. } => {
                "Inspect the .unfinished file and the dump tool output, then remove it"
            }
            DumpError::PrivilegeDrop { .. } => {
                "Run dump-keeper as root or as the configured run_as_user"
            }
            DumpError::PromoteFailed { .. } => {
                "Check that nothing else touches the storage directory during a dump"
            }
            DumpError::RetentionFailed { .. } | DumpError::IoError(_) => {
                "Check permissions and free space of the storage directory"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DumpError>;
