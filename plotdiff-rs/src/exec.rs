use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus};

use log::info;

use crate::error::{Error, Result};

/// Captured output of a finished subprocess. Both streams are held fully
/// in memory; there is no streaming and no timeout.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Launch `program` with `args`, block until it exits and return both output
/// streams along with the exit status. Invalid UTF-8 in either stream is
/// replaced rather than rejected.
pub fn run_and_capture<I, S>(program: &str, args: I) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect();

    info!(
        "Executing command \"{} {}\"",
        program,
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(program)
        .args(&args)
        .output()
        .map_err(|err| Error::io(program, err))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let output = run_and_capture("sh", ["-c", "echo hello"]).unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "");
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stderr_and_exit_code() {
        let output = run_and_capture("sh", ["-c", "echo oops >&2; exit 3"]).unwrap();
        assert_eq!(output.stdout, "");
        assert_eq!(output.stderr, "oops\n");
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let result = run_and_capture("definitely-not-a-real-program-xyz", ["--version"]);
        assert!(result.is_err());
    }
}
