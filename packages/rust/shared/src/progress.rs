//! Progress callbacks shared by both pipelines.

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after an item (page or record) has been processed.
    fn item(&self, label: &str, current: usize, total: usize);
    /// Called when an item failed and was skipped.
    fn failed(&self, label: &str, error: &str);
    /// Called when the pipeline completes.
    fn finish(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _label: &str, _current: usize, _total: usize) {}
    fn failed(&self, _label: &str, _error: &str) {}
    fn finish(&self) {}
}
