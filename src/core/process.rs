//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (the lottie converter)
//! with configurable timeouts to prevent hung processes from blocking a batch.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Errors from running an external process
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("process timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run an async Command with a timeout.
///
/// Returns the process Output on success, or a ProcessError on timeout/IO failure.
/// The child process is killed when the timeout fires.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ProcessError::Io(e)),
        Err(_) => Err(ProcessError::Timeout(timeout.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_with_timeout_returns_output() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");

        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_with_timeout_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");

        let err = run_with_timeout(&mut cmd, Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, ProcessError::Timeout(_)));
    }
}
