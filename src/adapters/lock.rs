use crate::utils::error::{DumpError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Fixed lock file name, resolved against the working directory.
pub const LOCK_FILE_NAME: &str = "dump_keeper.pid";

/// Process-wide single instance lock.
///
/// Holds an exclusive `flock` on the lock file until dropped, and records the
/// owner's pid in it. The file itself is never removed.
#[derive(Debug)]
pub struct SingletonGuard {
    file: File,
    path: PathBuf,
}

impl SingletonGuard {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if !try_flock_exclusive(&file)? {
            return Err(DumpError::LockHeld { path });
        }

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        tracing::debug!("Acquired run lock {}", path.display());

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingletonGuard {
    fn drop(&mut self) {
        // SAFETY: the descriptor belongs to `self.file`, which is still open.
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

/// Non-blocking exclusive flock. `Ok(false)` means another holder exists.
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    // SAFETY: flock on a descriptor owned by `file`.
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        return Ok(false);
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LOCK_FILE_NAME);

        let guard = SingletonGuard::acquire(&path).unwrap();
        let err = SingletonGuard::acquire(&path).unwrap_err();
        assert!(matches!(err, DumpError::LockHeld { .. }));

        drop(guard);
        assert!(SingletonGuard::acquire(&path).is_ok());
    }

    #[test]
    fn test_lock_file_records_pid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "stale contents from an older run\n").unwrap();

        let guard = SingletonGuard::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(guard.path()).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
    }
}
