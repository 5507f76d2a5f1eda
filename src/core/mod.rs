pub mod inventory;
pub mod naming;
pub mod orchestrator;
pub mod retention;
pub mod run_loop;

pub use crate::domain::model::{ArtifactRecord, DumpOutcome, RetentionLimits, SourceConfig};
pub use crate::domain::ports::{Clock, DumpRunner};
pub use crate::utils::error::Result;
