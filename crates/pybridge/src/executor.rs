//! Interpreter process execution.
//!
//! One interpreter process per call, script passed inline, output captured so
//! failures can be inspected programmatically instead of only visually.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::error::{Error, Result};

/// Captured outcome of one interpreter run.
#[derive(Debug)]
pub struct RunOutput {
    /// Process exit status (always successful here; failures are errors).
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Run `python -c <script>` to completion with the install directory as the
/// working directory.
///
/// Blocks (asynchronously) until the process exits. A spawn failure and a
/// non-zero exit are distinct errors; the latter carries the captured stderr.
pub async fn run(python: &Path, workdir: &Path, script: &str) -> Result<RunOutput> {
    let output = Command::new(python)
        .arg("-c")
        .arg(script)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| Error::Spawn {
            path: python.to_path_buf(),
            message: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !stdout.is_empty() {
        tracing::debug!("interpreter stdout:\n{stdout}");
    }
    if !stderr.is_empty() {
        tracing::debug!("interpreter stderr:\n{stderr}");
    }

    if !output.status.success() {
        return Err(Error::Execution {
            status: output.status,
            stderr,
        });
    }

    Ok(RunOutput {
        status: output.status,
        stdout,
        stderr,
    })
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // /bin/sh also takes `-c <program>`, which makes these tests hermetic.

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let temp = TempDir::new().expect("temp dir");
        let output = run(Path::new("/bin/sh"), temp.path(), "exit 0")
            .await
            .expect("run failed");
        assert!(output.status.success());
    }

    #[tokio::test]
    async fn test_stdout_captured() {
        let temp = TempDir::new().expect("temp dir");
        let output = run(Path::new("/bin/sh"), temp.path(), "echo hello")
            .await
            .expect("run failed");
        assert_eq!(output.stdout, "hello\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_execution_error() {
        let temp = TempDir::new().expect("temp dir");
        let err = run(Path::new("/bin/sh"), temp.path(), "echo boom 1>&2; exit 7")
            .await
            .expect_err("expected error");
        match err {
            Error::Execution { status, stderr } => {
                assert_eq!(status.code(), Some(7));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error() {
        let temp = TempDir::new().expect("temp dir");
        let err = run(Path::new("/nonexistent/python3"), temp.path(), "exit 0")
            .await
            .expect_err("expected error");
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
