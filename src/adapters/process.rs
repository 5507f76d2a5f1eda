use crate::domain::model::DumpRequest;
use crate::domain::ports::DumpRunner;
use crate::utils::error::{DumpError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use tokio::process::Command;

/// Exit status of a child that could not switch to the run-as identity.
///
/// The dump tool may exit with the same code on its own. A demoted child never
/// reaches exec, so the status only counts as a privilege drop failure when
/// the output file was not created.
pub const DEMOTION_FAILED_EXIT: i32 = 125;

const DEMOTION_FAILED_MESSAGE: &[u8] = b"dump-keeper: cannot switch to the run-as identity\n";

/// Runs `<command...> -Fc --file=<output> <database>` as the requested user.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessDumpRunner;

impl ProcessDumpRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(request: &DumpRequest<'_>) -> Result<Command> {
        let (program, base_args) =
            request
                .command
                .split_first()
                .ok_or_else(|| DumpError::InvalidConfigValueError {
                    field: "dump_command".to_string(),
                    value: "[]".to_string(),
                    reason: "Dump command cannot be empty".to_string(),
                })?;

        let mut file_arg = OsString::from("--file=");
        file_arg.push(request.output_path);

        let identity = request.identity;
        let mut command = Command::new(program);
        command
            .args(base_args)
            .arg("-Fc")
            .arg(file_arg)
            .arg(request.database_name)
            .current_dir(request.working_dir)
            .env("HOME", &identity.home_dir)
            .env("LOGNAME", &identity.name)
            .env("USER", &identity.name)
            .env("PWD", request.working_dir);

        let (uid, gid) = (identity.uid, identity.gid);
        // SAFETY: the hook runs between fork and exec and only makes
        // async-signal-safe libc calls.
        unsafe {
            command.pre_exec(move || {
                demote(uid, gid);
                Ok(())
            });
        }

        Ok(command)
    }
}

/// 先降 group 再降 user; 失敗時直接結束子程序, 絕不以原身分執行
unsafe fn demote(uid: libc::uid_t, gid: libc::gid_t) {
    let groups_cleared = libc::geteuid() != 0 || libc::setgroups(0, std::ptr::null()) == 0;

    if !groups_cleared || libc::setgid(gid) != 0 || libc::setuid(uid) != 0 {
        libc::write(
            libc::STDERR_FILENO,
            DEMOTION_FAILED_MESSAGE.as_ptr().cast(),
            DEMOTION_FAILED_MESSAGE.len(),
        );
        libc::_exit(DEMOTION_FAILED_EXIT);
    }
}

#[async_trait]
impl DumpRunner for ProcessDumpRunner {
    async fn run_dump(&self, request: &DumpRequest<'_>) -> Result<()> {
        let mut command = Self::build_command(request)?;

        tracing::debug!(
            "Spawning {:?} as {} in {}",
            request.command,
            request.identity.name,
            request.working_dir.display()
        );

        let status = command.status().await.map_err(|e| {
            DumpError::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to spawn {:?}: {}", request.command, e),
            ))
        })?;

        if status.success() {
            return Ok(());
        }

        let output_created = request.output_path.symlink_metadata().is_ok();
        if status.code() == Some(DEMOTION_FAILED_EXIT) && !output_created {
            return Err(DumpError::PrivilegeDrop {
                user: request.identity.name.clone(),
            });
        }

        Err(DumpError::DumpFailed {
            status: status.to_string(),
            partial: request.output_path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::current_user;
    use crate::domain::model::Identity;
    use std::fs;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "fake-dump".to_string(),
        ]
    }

    // $1 = -Fc, $2 = --file=<path>, $3 = database
    const WRITE_DUMP: &str = r#"out="${2#--file=}"; printf '%s:%s:%s' "$1" "$3" "$USER" > "$out""#;

    #[tokio::test]
    async fn test_runs_command_with_dump_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let identity = current_user().unwrap();
        let output = temp_dir.path().join("db.dump.unfinished");
        let command = sh(WRITE_DUMP);

        let request = DumpRequest {
            command: &command,
            database_name: "orders",
            output_path: &output,
            working_dir: temp_dir.path(),
            identity: &identity,
        };

        ProcessDumpRunner::new().run_dump(&request).await.unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, format!("-Fc:orders:{}", identity.name));
    }

    #[tokio::test]
    async fn test_tool_exiting_with_demotion_code_is_dump_failure() {
        let temp_dir = TempDir::new().unwrap();
        let identity = current_user().unwrap();
        let output = temp_dir.path().join("db.dump.unfinished");
        let command = sh(&format!(
            r#"out=$(echo "$2" | cut -d= -f2-); echo partial > "$out"; exit {}"#,
            DEMOTION_FAILED_EXIT
        ));

        let request = DumpRequest {
            command: &command,
            database_name: "orders",
            output_path: &output,
            working_dir: temp_dir.path(),
            identity: &identity,
        };

        let err = ProcessDumpRunner::new().run_dump(&request).await.unwrap_err();
        assert!(matches!(err, DumpError::DumpFailed { .. }));
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_dump_failure() {
        let temp_dir = TempDir::new().unwrap();
        let identity = current_user().unwrap();
        let output = temp_dir.path().join("db.dump.unfinished");
        let command = sh("exit 3");

        let request = DumpRequest {
            command: &command,
            database_name: "orders",
            output_path: &output,
            working_dir: temp_dir.path(),
            identity: &identity,
        };

        let err = ProcessDumpRunner::new().run_dump(&request).await.unwrap_err();
        match err {
            DumpError::DumpFailed { partial, .. } => assert_eq!(partial, output),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refuses_to_run_as_other_user_without_privileges() {
        let me = current_user().unwrap();
        if me.uid == 0 {
            // root can become anyone
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("ran");
        let other = Identity {
            name: "nobody".to_string(),
            uid: me.uid + 1,
            gid: me.gid + 1,
            home_dir: temp_dir.path().to_path_buf(),
        };
        let command = sh(&format!("touch {}", marker.display()));
        let output = temp_dir.path().join("db.dump.unfinished");

        let request = DumpRequest {
            command: &command,
            database_name: "orders",
            output_path: &output,
            working_dir: temp_dir.path(),
            identity: &other,
        };

        let err = ProcessDumpRunner::new().run_dump(&request).await.unwrap_err();
        assert!(matches!(err, DumpError::PrivilegeDrop { .. }));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let identity = current_user().unwrap();
        let output = temp_dir.path().join("x");
        let command: Vec<String> = vec![];

        let request = DumpRequest {
            command: &command,
            database_name: "orders",
            output_path: &output,
            working_dir: temp_dir.path(),
            identity: &identity,
        };

        assert!(ProcessDumpRunner::new().run_dump(&request).await.is_err());
    }
}
