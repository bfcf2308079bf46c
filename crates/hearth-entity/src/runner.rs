//! Seam to the external shell-command execution mechanism.

use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Errors raised when a command cannot be spawned at all.
///
/// A command that runs and exits non-zero is not an error; it is reported as
/// `Ok(false)` so callers can treat it as a failed-but-expected outcome.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Spawning the shell failed.
    #[error("failed to spawn command")]
    Spawn {
        /// Command line that could not be spawned.
        command: String,
        /// Source IO error.
        source: io::Error,
    },
}

/// Executes entity commands. The gateway only ever needs to know whether the
/// command exited successfully.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command, resolving to whether it exited with status zero.
    async fn run(&self, command: &str) -> Result<bool, CommandError>;
}

/// Production runner that hands the command line to `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str) -> Result<bool, CommandError> {
        info!(command = %command, "running command");
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn true_command_succeeds() {
        assert!(ShellCommandRunner.run("true").await.unwrap());
    }

    #[tokio::test]
    async fn false_command_reports_failure_without_error() {
        assert!(!ShellCommandRunner.run("false").await.unwrap());
    }
}
