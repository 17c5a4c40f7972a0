//! Windowed batch scheduler.
//!
//! Jobs are split into consecutive windows of at most `window_size` jobs.
//! Each window is dispatched concurrently and joined in full before the next
//! one starts, so at most `window_size` encoder processes run at a time. A
//! failed job never cancels its siblings or later windows.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

use futures::future::join_all;
use lf_av::ProcessExecutor;
use lf_core::{Error, JobResult, Result, TranscodeJob};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::layout::OutputLayout;
use crate::progress::ProgressSender;

/// Aggregate record for a window that finished with at least one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Zero-based window index.
    pub window: usize,
    pub failed: usize,
    pub total: usize,
    pub message: String,
}

impl BatchFailure {
    fn from_error(error: &Error) -> Option<Self> {
        match error {
            Error::Batch {
                window,
                failed,
                total,
            } => Some(Self {
                window: *window,
                failed: *failed,
                total: *total,
                message: error.to_string(),
            }),
            _ => None,
        }
    }
}

/// Everything the scheduler produced for one run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One result per submitted job, in submission order.
    pub results: Vec<JobResult>,
    pub batch_failures: Vec<BatchFailure>,
    /// Set when the run was cancelled before every window started.
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Split `len` jobs into consecutive windows of at most `window` jobs.
///
/// Yields `ceil(len / window)` ranges; every range except possibly the last
/// has exactly `window` elements.
pub fn partition(len: usize, window: NonZeroUsize) -> Vec<Range<usize>> {
    let window = window.get();
    (0..len)
        .step_by(window)
        .map(|start| start..(start + window).min(len))
        .collect()
}

/// Runs transcode jobs through a [`ProcessExecutor`] in fixed-size windows.
pub struct BatchScheduler {
    window_size: NonZeroUsize,
    executor: Arc<dyn ProcessExecutor>,
    create_layout: bool,
    cancellation: CancellationToken,
    progress: Arc<ProgressSender>,
}

impl BatchScheduler {
    /// Create a scheduler with the given window size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `window_size` is zero.
    pub fn new(window_size: usize, executor: Arc<dyn ProcessExecutor>) -> Result<Self> {
        let window_size = NonZeroUsize::new(window_size)
            .ok_or_else(|| Error::config("batch window size must be at least 1"))?;
        Ok(Self {
            window_size,
            executor,
            create_layout: true,
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        })
    }

    /// Builder: skip output directory creation (dry runs).
    pub fn with_layout(mut self, create_layout: bool) -> Self {
        self.create_layout = create_layout;
        self
    }

    /// Builder: token checked before each window starts.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: callback invoked after each window.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size.get()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Run every job and return one result per job, in submission order.
    ///
    /// Cancellation is observed between windows only; in-flight encoder
    /// processes are always allowed to finish. Jobs in windows that never
    /// started get a cancelled result.
    pub async fn run(&self, jobs: &[TranscodeJob]) -> BatchOutcome {
        let total = jobs.len();
        let windows = partition(total, self.window_size);
        let mut outcome = BatchOutcome {
            results: Vec::with_capacity(total),
            ..Default::default()
        };

        tracing::info!(
            "Scheduling {total} job(s) in {} window(s) of up to {}",
            windows.len(),
            self.window_size
        );

        for (index, range) in windows.into_iter().enumerate() {
            let window = &jobs[range];

            if self.cancellation.is_cancelled() {
                if !outcome.cancelled {
                    tracing::warn!("Run cancelled; skipping remaining windows");
                }
                outcome.cancelled = true;
                outcome
                    .results
                    .extend(window.iter().map(JobResult::cancelled));
                continue;
            }

            tracing::info!("Window {}: dispatching {} job(s)", index + 1, window.len());
            let results = join_all(window.iter().map(|job| self.run_job(job))).await;

            let failed = results.iter().filter(|r| !r.success).count();
            if failed > 0 {
                let error = Error::Batch {
                    window: index,
                    failed,
                    total: window.len(),
                };
                tracing::warn!("{error}");
                outcome.batch_failures.extend(BatchFailure::from_error(&error));
            }

            outcome.results.extend(results);
            self.progress.send(outcome.results.len(), total);
        }

        outcome
    }

    async fn run_job(&self, job: &TranscodeJob) -> JobResult {
        if self.create_layout {
            if let Err(e) = OutputLayout::prepare(job).await {
                tracing::warn!("{}: {e}", job.id);
                return JobResult::failed(job, &e);
            }
        }

        tracing::debug!("{}: {}", job.id, job.command.to_shell_string());
        match self.executor.run(&job.command).await {
            Ok(output) => {
                tracing::info!("Finished {}", job.describe());
                JobResult::succeeded(job, output.stdout, output.stderr)
            }
            Err(e) => {
                tracing::warn!("Failed {}: {e}", job.describe());
                JobResult::failed(job, &e)
            }
        }
    }
}

impl std::fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("window_size", &self.window_size)
            .field("create_layout", &self.create_layout)
            .finish_non_exhaustive()
    }
}
