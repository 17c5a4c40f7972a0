//! Progress reporting from the scheduler to the caller.

/// Sender for reporting batch progress.
///
/// Wraps a callback that receives the number of jobs finished so far and the
/// total number of jobs in the run. The scheduler calls it once after every
/// window.
pub struct ProgressSender {
    callback: Box<dyn Fn(usize, usize) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_, _| {}),
        }
    }

    /// Report progress.
    pub fn send(&self, completed: usize, total: usize) {
        (self.callback)(completed, total);
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}
