//! Command execution utilities for scheduler and payload invocations.

use std::process::ExitStatus;
use thiserror::Error;
use tokio::process::Command;

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Execute a command and return stdout as a string.
///
/// This is a convenience wrapper that handles common error cases
/// and UTF-8 conversion for scheduler command output.
pub async fn run_command(cmd: &mut Command, name: &str) -> Result<String, CommandError> {
    let output = cmd.output().await.map_err(|e| CommandError::Execution {
        command: name.to_string(),
        error: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::Failed {
            command: name.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a single shell line through `sh -c` with inherited stdio.
///
/// The exit status is returned as-is; callers decide whether a non-zero
/// status is fatal.
pub async fn run_shell(line: &str) -> Result<ExitStatus, CommandError> {
    Command::new("sh")
        .arg("-c")
        .arg(line)
        .status()
        .await
        .map_err(|e| CommandError::Execution {
            command: "sh".to_string(),
            error: e.to_string(),
        })
}
