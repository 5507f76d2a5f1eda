use crate::core::naming::{is_finished_file_name, ArtifactName};
use crate::domain::model::ArtifactRecord;
use crate::utils::error::Result;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Lists finished dumps in `dir`, oldest first.
///
/// One `.dump` file with an unparseable timestamp fails the whole scan.
pub fn scan_artifacts(dir: &Path) -> Result<Vec<ArtifactRecord>> {
    let mut records = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let raw_name = entry.file_name();
        // 非 UTF-8 檔名也要納入, 時間戳欄位本身是 ASCII
        let file_name = String::from_utf8_lossy(raw_name.as_bytes());

        if !is_finished_file_name(&file_name) {
            continue;
        }

        // 跟隨 symlink, 與 is_file 行為一致; 斷掉的連結不算候選
        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Ignoring dangling entry {}", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            continue;
        }

        let name = ArtifactName::parse(&file_name)?;
        records.push(ArtifactRecord {
            path,
            size_bytes: metadata.len(),
            source_timestamp: name.timestamp,
        });
    }

    records.sort_by_key(|record| record.source_timestamp);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::DumpError;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, size: usize) {
        fs::write(dir.join(name), vec![0u8; size]).unwrap();
    }

    #[test]
    fn test_scan_orders_by_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        touch(dir, "db__d__300__pg.dump", 3);
        touch(dir, "db__d__100__pg.dump", 1);
        touch(dir, "db__d__200__pg.dump", 2);

        let records = scan_artifacts(dir).unwrap();
        let timestamps: Vec<i64> = records.iter().map(|r| r.source_timestamp).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
        assert_eq!(records[0].size_bytes, 1);
        assert_eq!(records[2].size_bytes, 3);
    }

    #[test]
    fn test_scan_numeric_not_lexical_order() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        touch(dir, "db__d__90__pg.dump", 0);
        touch(dir, "db__d__1000__pg.dump", 0);

        let records = scan_artifacts(dir).unwrap();
        assert_eq!(records[0].source_timestamp, 90);
        assert_eq!(records[1].source_timestamp, 1000);
    }

    #[test]
    fn test_scan_skips_unfinished_and_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        touch(dir, "db__d__100__pg.dump", 1);
        touch(dir, "db__d__200__pg.dump.unfinished", 1);
        touch(dir, "notes.txt", 1);
        fs::create_dir(dir.join("nested__d__300__pg.dump")).unwrap();

        let records = scan_artifacts(dir).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_timestamp, 100);
    }

    #[test]
    fn test_scan_fails_on_malformed_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        touch(dir, "db__d__100__pg.dump", 1);
        touch(dir, "manual_copy.dump", 1);

        let err = scan_artifacts(dir).unwrap_err();
        assert!(matches!(err, DumpError::ArtifactFormat { .. }));
    }

    #[test]
    fn test_scan_ignores_dangling_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        touch(dir, "db__d__100__pg.dump", 1);
        std::os::unix::fs::symlink(dir.join("missing-target"), dir.join("link__d__5__pg.dump"))
            .unwrap();

        let records = scan_artifacts(dir).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_timestamp, 100);
    }

    #[test]
    fn test_scan_includes_non_utf8_names() {
        use std::ffi::OsStr;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        touch(dir, "db__d__200__pg.dump", 1);
        let raw = OsStr::from_bytes(b"caf\xe9__d__100__pg.dump");
        fs::write(dir.join(raw), vec![0u8; 4]).unwrap();

        let records = scan_artifacts(dir).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_timestamp, 100);
        assert_eq!(records[0].path, dir.join(raw));
        assert_eq!(records[0].size_bytes, 4);
    }

    #[test]
    fn test_scan_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(scan_artifacts(temp_dir.path()).unwrap().is_empty());
    }
}
