//! Step reporting for pipeline runs.
//!
//! [`ProgressCallback`] decouples the pipeline from any rendering
//! backend. The CLI drives an `indicatif` spinner through it; the server
//! and tests use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a pipeline run.
///
/// Implementations must be `Send + Sync` so a run can be shared across
/// tokio tasks.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of steps.
    fn set_total(&self, total: u64);

    /// Advance by `delta` steps.
    fn inc(&self, delta: u64);

    /// Describe the step in progress.
    fn set_message(&self, msg: String);

    /// Mark the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
