use log::debug;
use std::ffi::OsString;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;

use crate::error::{BtrfsError, Result};

/// Exit code and captured output of a single finished child process.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turns a non-zero exit into `BtrfsError::Execution`, keeping both streams.
    pub fn into_result(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(BtrfsError::Execution {
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

/// Launches a program and waits for it, capturing both output streams.
///
/// A non-zero exit is reported through `CommandResult::exit_code`, never as an
/// `Err`; the error side is only for processes that could not run at all.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandResult>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DuctRunner;

impl CommandRunner for DuctRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandResult> {
        let output = duct::cmd(program, args)
            .unchecked()
            .stdout_capture()
            .stderr_capture()
            .run()?;
        Ok(CommandResult {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// Signal terminations report the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(c) => c,
        None => -status.signal().unwrap_or_default(),
    }
}

pub fn command_line(program: &Path, args: &[OsString]) -> String {
    std::iter::once(program.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn run_logged<R: CommandRunner + ?Sized>(
    runner: &R,
    program: &Path,
    args: &[OsString],
) -> Result<CommandResult> {
    let command = command_line(program, args);
    debug!("Executing: {}", command);
    let result = runner
        .run(program, args)
        .map_err(|source| BtrfsError::Launch { command, source })?;
    debug!("btrfs finished with exit code {}", result.exit_code);
    Ok(result)
}

#[cfg(test)]
pub mod fake {
    use std::fs::{self, File};
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Writes an executable shell script named `name` into `dir`.
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh").unwrap();
            file.write_all(body.as_bytes()).unwrap();
            file.sync_all().unwrap();
        }
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use serial_test::serial;

    #[test]
    #[serial(fakebtrfs)]
    fn duct_runner_returns_exit_code_and_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake::write_script(
            dir.path(),
            "btrfs",
            indoc!(
                r#"
                echo "out $1 $2"
                echo "err line" >&2
                exit 3
                "#
            ),
        );

        let result = DuctRunner
            .run(&script, &["subvolume".into(), "list".into()])
            .unwrap();

        assert_eq!(
            result,
            CommandResult {
                exit_code: 3,
                stdout: "out subvolume list\n".to_string(),
                stderr: "err line\n".to_string(),
            }
        );
    }

    #[test]
    #[serial(fakebtrfs)]
    fn signal_termination_is_negative() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake::write_script(dir.path(), "btrfs", "kill -9 $$\n");

        let result = DuctRunner.run(&script, &[]).unwrap();

        assert_eq!(result.exit_code, -9);
    }

    #[test]
    #[serial(fakebtrfs)]
    fn missing_program_is_launch_error() {
        let err = run_logged(&DuctRunner, Path::new("/nonexistent/btrfs"), &["version".into()]).unwrap_err();
        match err {
            BtrfsError::Launch { command, .. } => assert_eq!(command, "/nonexistent/btrfs version"),
            e => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn non_zero_exit_becomes_execution_error() {
        let result = CommandResult {
            exit_code: 1,
            stdout: "partial".to_string(),
            stderr: "ERROR: not a btrfs filesystem".to_string(),
        };
        match result.into_result().unwrap_err() {
            BtrfsError::Execution {
                exit_code,
                stdout,
                stderr,
            } => {
                assert_eq!(exit_code, 1);
                assert_eq!(stdout, "partial");
                assert_eq!(stderr, "ERROR: not a btrfs filesystem");
            }
            e => panic!("unexpected error: {}", e),
        }
    }
}
