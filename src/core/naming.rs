use crate::utils::error::{DumpError, Result};
use chrono::{DateTime, Local};

pub const DELIMITER: &str = "__";
pub const FINISHED_KIND: &str = "pg.dump";
pub const UNFINISHED_EXTENSION: &str = ".unfinished";
/// Inventory picks up every file with this ending.
pub const FINISHED_EXTENSION: &str = ".dump";

const HUMAN_DATE_FORMAT: &str = "%Y_%B_%d_%H:%M:%S";

/// `{stem}__{human_date}__{timestamp}__pg.dump[.unfinished]`
///
/// `stem` is the configured prefix followed by the source name. Only the
/// timestamp is read back by the rotation logic; the date is for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub stem: String,
    pub human_date: String,
    pub timestamp: i64,
}

impl ArtifactName {
    pub fn new(prefix: &str, source_name: &str, timestamp: i64) -> Self {
        Self {
            stem: format!("{}{}", prefix, source_name),
            human_date: human_date(timestamp),
            timestamp,
        }
    }

    pub fn finished_file_name(&self) -> String {
        [
            self.stem.as_str(),
            self.human_date.as_str(),
            &self.timestamp.to_string(),
            FINISHED_KIND,
        ]
        .join(DELIMITER)
    }

    pub fn unfinished_file_name(&self) -> String {
        format!("{}{}", self.finished_file_name(), UNFINISHED_EXTENSION)
    }

    /// 從檔名尾端往回解析: kind, timestamp, date, 其餘為 stem
    pub fn parse(file_name: &str) -> Result<Self> {
        let mut tokens = file_name.rsplit(DELIMITER);

        // rsplit always yields at least one token
        let _kind = tokens.next();
        let raw_timestamp = tokens.next().ok_or_else(|| DumpError::ArtifactFormat {
            file_name: file_name.to_string(),
            reason: format!("no '{}' delimited timestamp field", DELIMITER),
        })?;
        let timestamp = raw_timestamp
            .parse::<i64>()
            .map_err(|e| DumpError::ArtifactFormat {
                file_name: file_name.to_string(),
                reason: format!("timestamp field '{}' is not an integer: {}", raw_timestamp, e),
            })?;

        let human_date = tokens.next().unwrap_or_default().to_string();
        let mut stem_parts: Vec<&str> = tokens.collect();
        stem_parts.reverse();

        Ok(Self {
            stem: stem_parts.join(DELIMITER),
            human_date,
            timestamp,
        })
    }
}

pub fn is_finished_file_name(file_name: &str) -> bool {
    file_name.ends_with(FINISHED_EXTENSION)
}

fn human_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&Local).format(HUMAN_DATE_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
