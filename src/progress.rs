//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through each input image.
//!
//! # Example
//!
//! ```rust
//! use jpeg2pdf::{ConversionConfig, ConversionProgressCallback, SelectionResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     kept: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, selection: &SelectionResult) {
//!         self.kept.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} → {}", index, total, selection.chosen_path.display());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { kept: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FileError;
use crate::output::SelectionResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Called by the pipeline as it processes each input file.
///
/// Files are processed strictly in order on the calling thread, so events
/// arrive in input order. All methods have default no-op implementations so
/// callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first input is opened.
    fn on_conversion_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before an input is opened.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the input list
    /// * `total`: number of inputs
    /// * `path`: the input path
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when an input has been recompressed and a file chosen for it.
    fn on_file_complete(&self, index: usize, total: usize, selection: &SelectionResult) {
        let _ = (index, total, selection);
    }

    /// Called when an input is excluded (missing or not an image).
    fn on_file_skipped(&self, index: usize, total: usize, error: &FileError) {
        let _ = (index, total, error);
    }

    /// Called once after every input has been attempted, with the files that
    /// will become pages, in page order. Not called when nothing is usable.
    fn on_selection_complete(&self, chosen: &[PathBuf]) {
        let _ = chosen;
    }

    /// Called once after every input has been attempted.
    ///
    /// # Arguments
    /// * `total_files`: number of inputs
    /// * `success_count`: inputs that produced a page
    fn on_conversion_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SelectionReason;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        selected: AtomicUsize,
        success_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_file_start(&self, _index: usize, _total: usize, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _selection: &SelectionResult) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, _index: usize, _total: usize, _error: &FileError) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_selection_complete(&self, chosen: &[PathBuf]) {
            self.selected.store(chosen.len(), Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total_files: usize, success_count: usize) {
            self.success_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_file_start(1, 2, Path::new("a.png"));
        cb.on_file_skipped(
            2,
            2,
            &FileError::NotFound {
                path: PathBuf::from("b.png"),
            },
        );
        cb.on_conversion_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let selection = SelectionResult {
            source: PathBuf::from("a.jpg"),
            chosen_path: PathBuf::from("a.jpg"),
            candidate_path: PathBuf::from("/tmp/s/page0001.jpg"),
            reason: SelectionReason::KeptOriginal,
            original_bytes: 10,
            candidate_bytes: 20,
        };

        tracker.on_file_start(1, 2, Path::new("a.jpg"));
        tracker.on_file_complete(1, 2, &selection);
        tracker.on_file_start(2, 2, Path::new("b.txt"));
        tracker.on_file_skipped(
            2,
            2,
            &FileError::Unreadable {
                path: PathBuf::from("b.txt"),
                detail: "not an image".into(),
            },
        );
        tracker.on_selection_complete(&[PathBuf::from("a.jpg")]);
        tracker.on_conversion_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.selected.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.success_total.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(3);
        cb.on_file_start(1, 3, Path::new("x.png"));
    }
}
