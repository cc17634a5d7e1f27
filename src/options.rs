//! Configuration for a pipeline run.
//!
//! Everything is a plain value constructed once at startup and passed
//! explicitly to [`run`](crate::run) — there is no global option state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Options for a pipeline run.
///
/// # Example
///
/// ```
/// use crosscopy::PipelineOptions;
///
/// let options = PipelineOptions::default().with_workers(8);
/// assert_eq!(options.workers, 8);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Number of concurrent transfer workers (clamped to at least 1)
    pub workers: usize,

    /// Cooperative cancellation flag (optional)
    ///
    /// When set to `true`, workers stop pulling new items after finishing
    /// their current one and the run drains to a normal completion with
    /// partial counts.
    pub cancel_token: Option<Arc<AtomicBool>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            cancel_token: None,
        }
    }
}

impl PipelineOptions {
    /// Set the number of concurrent workers.
    ///
    /// Value is clamped to at least 1.
    #[must_use]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }

    /// Set a cancellation token for cooperative cancellation.
    #[must_use]
    pub fn cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }
}
