//! The [`ProcessExecutor`] capability and its implementations.
//!
//! The scheduler never spawns processes itself; it hands each resolved
//! [`EncodeCommand`] to an injected executor. Tests substitute a recording
//! fake, and dry runs use [`DryRunExecutor`].

use std::time::Duration;

use async_trait::async_trait;
use lf_core::EncodeCommand;

use crate::command::ToolCommand;

/// Captured output of a successful process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a single fully-formed external command to completion.
///
/// Implementations must return `Ok` only for a zero exit status. Non-zero
/// exits, spawn failures, and timeouts are reported as
/// [`lf_core::Error::EncodeProcess`] carrying whatever stderr was captured.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn run(&self, command: &EncodeCommand) -> lf_core::Result<ProcessOutput>;
}

/// Spawns real processes through [`ToolCommand`].
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    timeout: Option<Duration>,
}

impl SystemExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: kill processes that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ProcessExecutor for SystemExecutor {
    async fn run(&self, command: &EncodeCommand) -> lf_core::Result<ProcessOutput> {
        tracing::debug!("Spawning: {}", command.to_shell_string());
        let output = ToolCommand::from_encode(command)
            .timeout(self.timeout)
            .execute()
            .await?;
        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Logs each command instead of running it and always reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl ProcessExecutor for DryRunExecutor {
    async fn run(&self, command: &EncodeCommand) -> lf_core::Result<ProcessOutput> {
        tracing::info!("[DRY RUN] Would execute: {}", command.to_shell_string());
        Ok(ProcessOutput::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn command(program: &str, args: &[&str]) -> EncodeCommand {
        let mut cmd = EncodeCommand::new(PathBuf::from(program));
        cmd.args = args.iter().map(|a| a.to_string()).collect();
        cmd
    }

    #[tokio::test]
    async fn dry_run_never_spawns() {
        let out = DryRunExecutor
            .run(&command("nonexistent_tool_xyz_12345", &["-y"]))
            .await
            .unwrap();
        assert_eq!(out, ProcessOutput::default());
    }

    #[tokio::test]
    async fn system_executor_reports_spawn_failure() {
        let err = SystemExecutor::new()
            .run(&command("nonexistent_tool_xyz_12345", &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encode_process");
    }

    #[tokio::test]
    async fn system_executor_captures_stdout() {
        if let Ok(out) = SystemExecutor::new()
            .run(&command("sh", &["-c", "echo segment written"]))
            .await
        {
            assert_eq!(out.stdout.trim(), "segment written");
        }
    }

    #[tokio::test]
    async fn system_executor_applies_timeout() {
        let err = SystemExecutor::new()
            .with_timeout(Some(Duration::from_millis(100)))
            .run(&command("sleep", &["10"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
