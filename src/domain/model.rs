use std::path::{Path, PathBuf};

/// 掃描目錄得到的一個完成的 dump 檔
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub source_timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionLimits {
    pub max_count: usize,
    pub max_total_bytes: u64,
}

/// 合併並驗證後的單一來源設定
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub source_name: String,
    pub storage_dir: PathBuf,
    pub name_prefix: String,
    pub min_period_seconds: u64,
    pub limits: RetentionLimits,
    pub run_as_identity: String,
    pub dump_command: Vec<String>,
}

/// A resolved passwd entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home_dir: PathBuf,
}

/// Everything the dump runner needs for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct DumpRequest<'a> {
    pub command: &'a [String],
    pub database_name: &'a str,
    pub output_path: &'a Path,
    pub working_dir: &'a Path,
    pub identity: &'a Identity,
}

/// Terminal states of one source's run that are not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpOutcome {
    Skipped {
        newest_timestamp: i64,
        next_due: i64,
    },
    Completed {
        artifact: PathBuf,
        removed: Vec<PathBuf>,
    },
}
