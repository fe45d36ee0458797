//! Progress-callback trait for per-job batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! events as the batch driver moves each document through its stages.
//!
//! Events arrive strictly in order (the batch is sequential), but the trait
//! is `Send + Sync` so an implementation can forward them to another task.
//!
//! # Example
//!
//! ```rust
//! use pdf_batch_translate::{BatchProgressCallback, BatchConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_job_complete(&self, index: usize, total: usize, filename: &str, _output: &std::path::Path) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} translated", index + 1, total, filename);
//!     }
//! }
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::job::JobStage;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each job.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 0-based; `total` is the number of
/// eligible jobs found in the input directory.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the input directory has been listed.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before the first stage of a job runs.
    fn on_job_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called on every stage transition of a job that is still running.
    fn on_stage(&self, index: usize, filename: &str, stage: JobStage) {
        let _ = (index, filename, stage);
    }

    /// Called when the translated PDF has been written.
    fn on_job_complete(&self, index: usize, total: usize, filename: &str, output: &Path) {
        let _ = (index, total, filename, output);
    }

    /// Called when a job is aborted at `stage`.
    fn on_job_error(&self, index: usize, total: usize, filename: &str, stage: JobStage, error: &str) {
        let _ = (index, total, filename, stage, error);
    }

    /// Called once after every job has been attempted.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        stages: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_job_start(&self, _index: usize, _total: usize, _filename: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage(&self, _index: usize, _filename: &str, _stage: JobStage) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_complete(&self, _index: usize, _total: usize, _filename: &str, _output: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_error(&self, _i: usize, _t: usize, _f: &str, _s: JobStage, _e: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_job_start(0, 2, "a.pdf");
        cb.on_stage(0, "a.pdf", JobStage::Normalizing);
        cb.on_job_complete(0, 2, "a.pdf", Path::new("out/a_de_a_es.pdf"));
        cb.on_job_error(1, 2, "b.pdf", JobStage::OcrProcessing, "boom");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_job_start(0, 2, "a.pdf");
        tracker.on_stage(0, "a.pdf", JobStage::Normalizing);
        tracker.on_stage(0, "a.pdf", JobStage::Translating);
        tracker.on_job_complete(0, 2, "a.pdf", Path::new("x.pdf"));
        tracker.on_job_start(1, 2, "b.pdf");
        tracker.on_job_error(1, 2, "b.pdf", JobStage::Normalizing, "exit 1");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.stages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
    }
}
