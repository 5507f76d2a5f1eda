pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{ProcessDumpRunner, SingletonGuard, SystemClock};
pub use config::{CliConfig, ConfigUnit};
pub use core::{orchestrator::DumpOrchestrator, run_loop::RunLoop};
pub use utils::error::{DumpError, Result};
