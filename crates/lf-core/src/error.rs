//! Unified error type for the ladderforge workspace.
//!
//! Every library crate funnels its failures into [`Error`]. The variants follow
//! the blast radius of a failure: discovery errors cost a course, directory and
//! encode errors cost a single job, and batch errors summarise a window.

use std::fmt;
use std::path::{Path, PathBuf};

/// Unified error type covering all failure modes in ladderforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input root or a course directory could not be listed.
    #[error("Discovery error [{}]: {message}", .path.display())]
    Discovery {
        /// The directory that failed to list.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// A job's output directory could not be materialized.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The encoder exited non-zero, failed to spawn, or timed out.
    #[error("Encode process error [{tool}]: {message}")]
    EncodeProcess {
        /// Name of the program that was run.
        tool: String,
        /// Human-readable error description.
        message: String,
        /// Captured standard error, kept for diagnosis.
        stderr: String,
    },

    /// A batch window completed with one or more failed jobs.
    #[error("Batch {window} finished with {failed} of {total} jobs failed")]
    Batch {
        /// Zero-based window index.
        window: usize,
        /// Number of failed jobs in the window.
        failed: usize,
        /// Number of jobs in the window.
        total: usize,
    },

    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external tool could not be located.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable category, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Discovery { .. } => "discovery",
            Error::DirectoryCreation { .. } => "directory_creation",
            Error::EncodeProcess { .. } => "encode_process",
            Error::Batch { .. } => "batch",
            Error::Config(_) => "config",
            Error::Tool { .. } => "tool",
            Error::Io { .. } => "io",
            Error::Internal(_) => "internal",
        }
    }

    /// Captured stderr for encode failures.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::EncodeProcess { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Convenience constructor for [`Error::Discovery`].
    pub fn discovery(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Error::Discovery {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::DirectoryCreation`].
    pub fn directory_creation(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::DirectoryCreation {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for [`Error::EncodeProcess`].
    pub fn encode_process(
        tool: impl Into<String>,
        message: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Error::EncodeProcess {
            tool: tool.into(),
            message: message.into(),
            stderr: stderr.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_display() {
        let err = Error::discovery("/input/algebra", "permission denied");
        assert_eq!(
            err.to_string(),
            "Discovery error [/input/algebra]: permission denied"
        );
        assert_eq!(err.kind(), "discovery");
    }

    #[test]
    fn directory_creation_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::directory_creation("/output/algebra", io_err);
        assert!(err.to_string().contains("/output/algebra"));
        assert!(err.to_string().contains("denied"));
        assert_eq!(err.kind(), "directory_creation");
    }

    #[test]
    fn encode_process_keeps_stderr() {
        let err = Error::encode_process("ffmpeg", "exited with status 1", "Invalid data found");
        assert_eq!(
            err.to_string(),
            "Encode process error [ffmpeg]: exited with status 1"
        );
        assert_eq!(err.stderr(), Some("Invalid data found"));
    }

    #[test]
    fn batch_display() {
        let err = Error::Batch {
            window: 2,
            failed: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "Batch 2 finished with 1 of 3 jobs failed");
        assert!(err.stderr().is_none());
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn config_display() {
        let err = Error::config("batch.window_size must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: batch.window_size must be at least 1"
        );
    }
}
