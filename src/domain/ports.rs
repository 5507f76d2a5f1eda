use crate::domain::model::DumpRequest;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> i64;
}

#[async_trait]
pub trait DumpRunner: Send + Sync {
    /// Runs the dump to completion. Must not execute anything unless the
    /// switch to `request.identity` succeeded first.
    async fn run_dump(&self, request: &DumpRequest<'_>) -> Result<()>;
}
