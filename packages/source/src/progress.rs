//! Stage progress reporting for the report pipeline.
//!
//! The pipeline announces each stage it starts and finishes through
//! [`StageProgress`]; the CLI renders these with `indicatif`, tests and
//! library callers use [`NullProgress`].

/// Receives notifications as pipeline stages start and finish.
pub trait StageProgress: Send + Sync {
    /// Declares how many stages the run will go through.
    fn set_stages(&self, total: u64);

    /// A stage has started.
    fn begin(&self, stage: &str);

    /// The current stage has finished; `summary` is a one-line result.
    fn complete(&self, stage: &str, summary: &str);

    /// The whole run has finished.
    fn finish(&self);
}

/// A [`StageProgress`] that ignores every notification.
pub struct NullProgress;

impl StageProgress for NullProgress {
    fn set_stages(&self, _total: u64) {}
    fn begin(&self, _stage: &str) {}
    fn complete(&self, _stage: &str, _summary: &str) {}
    fn finish(&self) {}
}
