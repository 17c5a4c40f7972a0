//! Builder for executing external encoder commands with optional timeout.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use lf_core::EncodeCommand;
use tokio::process::Command;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// The child never gets interactive input: stdin is always `/dev/null`. On
/// unix it runs in its own process group, so a terminal Ctrl-C reaches only
/// ladderforge and running encodes are allowed to finish.
///
/// # Example
///
/// ```no_run
/// use lf_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> lf_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-hide_banner")
///     .arg("-version")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Create a command from a resolved [`EncodeCommand`].
    pub fn from_encode(command: &EncodeCommand) -> Self {
        Self {
            program: command.program.clone(),
            args: command.args.clone(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time. Without one, the process may run
    /// indefinitely.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`lf_core::Error::EncodeProcess`] if spawning fails, if the
    /// process exits with a non-zero status (stderr is preserved), or if the
    /// timeout expires.
    pub async fn execute(&self) -> lf_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| {
            lf_core::Error::encode_process(&program_name, format!("failed to spawn: {e}"), "")
        })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                // The future owning the child is dropped here, and
                // kill_on_drop terminates the process.
                Err(_elapsed) => {
                    return Err(lf_core::Error::encode_process(
                        program_name,
                        format!("timed out after {limit:?}"),
                        "",
                    ))
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| {
            lf_core::Error::encode_process(
                &program_name,
                format!("I/O error waiting for process: {e}"),
                "",
            )
        })?;

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(lf_core::Error::encode_process(
                program_name,
                format!("exited with status {}", output.status),
                tool_output.stderr,
            ));
        }

        Ok(tool_output)
    }
}
