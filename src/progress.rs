//! Progress reporting for in-flight batches.

use tracing::{debug, info};

/// Observer for batch dispatch progress.
///
/// The dispatcher calls `begin` once before fanning out, `task_completed`
/// once per finished call, and `finish` once after all calls returned.
/// Completion notifications can arrive in arbitrary order relative to the
/// input batch; `completed` is a monotonic count, not an entry index.
/// Reporting is purely observational and never affects returned data.
pub trait ProgressReporter: Send + Sync {
    fn begin(&self, _total: usize) {}

    fn task_completed(&self, completed: usize, total: usize);

    fn finish(&self) {}
}

/// Reports batch progress through `tracing` events.
///
/// Rendering (progress bars, spinners) is left to the subscriber; this
/// crate only emits the counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn begin(&self, total: usize) {
        info!(total, "Dispatching completion batch");
    }

    fn task_completed(&self, completed: usize, total: usize) {
        info!(completed, total, "Completion call finished");
    }

    fn finish(&self) {
        debug!("Batch dispatch complete");
    }
}
