//! Running external tools.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::cloud::ScriptRunner;
use crate::error::{Error, Result};

/// Run `program` with `args` and return its stdout.
///
/// A non-zero exit becomes [`Error::Tool`] carrying the tool's stderr.
pub fn run_tool(program: &str, args: &[String]) -> Result<String> {
    debug!("Running {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return Err(Error::Tool {
            program: program.to_string(),
            status: output.status.to_string(),
            // bq reports some failures on stdout
            stderr: if stderr.is_empty() { stdout } else { stderr },
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs pipeline scripts with inherited stdout/stderr so their progress stays
/// visible.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ScriptRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        debug!("Launching {} {}", program, args.join(" "));
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Tool {
                program: program.to_string(),
                status: status.to_string(),
                stderr: String::new(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_tool_captures_stdout() {
        let out = run_tool("sh", &["-c".to_string(), "echo hello".to_string()]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_run_tool_reports_stderr() {
        let err = run_tool(
            "sh",
            &["-c".to_string(), "echo broken >&2; exit 3".to_string()],
        )
        .unwrap_err();
        match err {
            Error::Tool {
                program, stderr, ..
            } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_run_tool_missing_program() {
        let err = run_tool("definitely-not-a-real-tool-xyz", &[]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_process_runner_status() {
        let runner = ProcessRunner;
        assert!(runner.run("true", &[]).is_ok());
        assert!(runner.run("false", &[]).is_err());
    }
}
