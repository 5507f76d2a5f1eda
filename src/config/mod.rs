pub mod unit;

pub use unit::{ConfigUnit, DEFAULT_UNIT_NAME, UNIT_SUFFIX};

use crate::utils::error::{DumpError, Result};
use crate::utils::validation::Validate;
use std::path::PathBuf;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "dump-keeper", version))]
#[cfg_attr(
    feature = "cli",
    command(about = "Rotating database dumps, one config unit per database")
)]
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Directory with *.conf.toml units and default.conf.toml
    #[cfg_attr(feature = "cli", arg(short = 'c', long))]
    pub configs_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Only valid after `validate` succeeded.
    pub fn configs_dir(&self) -> Result<&PathBuf> {
        self.configs_dir
            .as_ref()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| DumpError::ConfigError {
                message: "use -c option".to_string(),
            })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.configs_dir().map(|_| ())
    }
}
