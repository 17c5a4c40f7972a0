//! Transcode job descriptors and their results.
//!
//! A [`TranscodeJob`] is fully resolved before it reaches the scheduler: its
//! output paths, required directories, and encoder command line are all fixed
//! at planning time. A [`JobResult`] is produced exactly once per job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::Error;
use crate::media::{RenditionSpec, SourceVideo};

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Deterministic job identifier: `<course>/<stem>@<label>` for single-rung
/// jobs and `<course>/<stem>@ladder` for fan-out jobs.
///
/// Two jobs share an id exactly when they would write to the same outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn for_rendition(source: &SourceVideo, label: &str) -> Self {
        Self(format!("{}/{}@{}", source.course, source.stem, label))
    }

    pub fn for_fan_out(source: &SourceVideo) -> Self {
        Self(format!("{}/{}@ladder", source.course, source.stem))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// EncodeCommand
// ---------------------------------------------------------------------------

/// A fully resolved external command: program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EncodeCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Program file name, used as the tool name in errors and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Shell-style rendering for logs and `plan --commands`.
    ///
    /// Arguments containing whitespace or shell metacharacters are single-quoted.
    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .map(|a| shell_quote(&a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || "'\"\\$`;&|<>()[]*?!{}".contains(c));
    if needs_quotes {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

// ---------------------------------------------------------------------------
// TranscodeJob
// ---------------------------------------------------------------------------

/// What a job encodes: a single rung or the whole ladder in one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobTarget {
    Rendition { rung: RenditionSpec },
    FanOut { rungs: Vec<RenditionSpec> },
}

/// One unit of work handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub id: JobId,
    pub source: SourceVideo,
    pub target: JobTarget,
    /// Directory the job writes into.
    pub output_dir: PathBuf,
    /// Rendition playlists, in ladder order.
    pub playlists: Vec<PathBuf>,
    /// Master playlist for fan-out jobs.
    pub master_playlist: Option<PathBuf>,
    /// Directories that must exist before the encoder starts.
    pub required_dirs: Vec<PathBuf>,
    pub command: EncodeCommand,
}

impl TranscodeJob {
    /// Rung labels covered by this job.
    pub fn labels(&self) -> Vec<&str> {
        match &self.target {
            JobTarget::Rendition { rung } => vec![rung.label.as_str()],
            JobTarget::FanOut { rungs } => rungs.iter().map(|r| r.label.as_str()).collect(),
        }
    }

    /// Human-readable summary, e.g. `algebra/intro.mp4 [720p]`.
    pub fn describe(&self) -> String {
        format!("{} [{}]", self.source, self.labels().join(","))
    }
}

// ---------------------------------------------------------------------------
// JobResult
// ---------------------------------------------------------------------------

/// Outcome of a single job. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub description: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Error category (see [`Error::kind`]) for failed jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Error message for failed jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn succeeded(job: &TranscodeJob, stdout: String, stderr: String) -> Self {
        Self {
            job_id: job.id.clone(),
            description: job.describe(),
            success: true,
            stdout,
            stderr,
            error_kind: None,
            error: None,
        }
    }

    /// Record a failure, preserving any stderr the error carried.
    pub fn failed(job: &TranscodeJob, error: &Error) -> Self {
        Self {
            job_id: job.id.clone(),
            description: job.describe(),
            success: false,
            stdout: String::new(),
            stderr: error.stderr().unwrap_or_default().to_string(),
            error_kind: Some(error.kind().to_string()),
            error: Some(error.to_string()),
        }
    }

    /// Result for a job that was never dispatched because the run was cancelled.
    pub fn cancelled(job: &TranscodeJob) -> Self {
        Self {
            job_id: job.id.clone(),
            description: job.describe(),
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            error_kind: Some("cancelled".to_string()),
            error: Some("run cancelled before job was dispatched".to_string()),
        }
    }
}
