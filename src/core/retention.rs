use crate::domain::model::{ArtifactRecord, RetentionLimits};
use crate::utils::error::{DumpError, Result};
use std::collections::VecDeque;
use std::fs;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub removed: Vec<ArtifactRecord>,
    pub retained: Vec<ArtifactRecord>,
}

pub struct RetentionPolicy {
    limits: RetentionLimits,
}

impl RetentionPolicy {
    pub fn new(limits: RetentionLimits) -> Self {
        Self { limits }
    }

    /// Number of records, from the front of an oldest-first list, that have
    /// to go so the rest fits both limits. Exactly at a limit is compliant.
    pub fn plan(&self, records: &[ArtifactRecord]) -> usize {
        let mut evict = records.len().saturating_sub(self.limits.max_count);

        let mut total: u64 = records[evict..].iter().map(|r| r.size_bytes).sum();
        while evict < records.len() && total > self.limits.max_total_bytes {
            total -= records[evict].size_bytes;
            evict += 1;
        }

        evict
    }

    /// Deletes the oldest records until both limits hold. Stops at the first
    /// file that cannot be removed.
    pub fn enforce(&self, records: Vec<ArtifactRecord>) -> Result<RetentionReport> {
        let evict = self.plan(&records);
        let mut remaining: VecDeque<ArtifactRecord> = records.into();
        let mut removed = Vec::with_capacity(evict);

        for _ in 0..evict {
            let Some(oldest) = remaining.pop_front() else {
                break;
            };
            fs::remove_file(&oldest.path).map_err(|source| DumpError::RetentionFailed {
                path: oldest.path.clone(),
                source,
            })?;
            tracing::info!(
                "🗑️ Removed {} ({} bytes, ts {})",
                oldest.path.display(),
                oldest.size_bytes,
                oldest.source_timestamp
            );
            removed.push(oldest);
        }

        Ok(RetentionReport {
            removed,
            retained: remaining.into(),
        })
    }
}
