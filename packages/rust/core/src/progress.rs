//! Progress reporting for the long-running loops.

/// Progress callback for the per-file loops of extract, render and upload.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each item of a loop with a known length.
    fn item(&self, name: &str, current: usize, total: usize);
    /// Called when the loop is done.
    fn finish(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _name: &str, _current: usize, _total: usize) {}
    fn finish(&self) {}
}
