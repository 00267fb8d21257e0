//! Progress-callback trait for per-tile and per-page events.
//!
//! Inject an [`Arc<dyn ProgressReporter>`] via
//! [`crate::config::FetchConfigBuilder::progress_callback`] or
//! [`crate::config::CompileConfigBuilder::progress_callback`] to receive
//! events as the fetch loop and the compiler make progress.
//!
//! The trait is `Send + Sync` because compilation runs on a blocking worker
//! thread, not on the thread that configured it.
//!
//! # Example
//!
//! ```rust
//! use tile2pdf::{FetchConfig, FetchOutcome, ProgressReporter};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountSaved(AtomicUsize);
//!
//! impl ProgressReporter for CountSaved {
//!     fn on_tile_outcome(&self, _index: u64, outcome: &FetchOutcome, _misses: u32, _threshold: u32) {
//!         if outcome.is_saved() {
//!             self.0.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let config = FetchConfig::builder()
//!     .progress_callback(Arc::new(CountSaved(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageError;
use crate::output::PageStats;
use crate::pipeline::fetch::FetchOutcome;
use std::sync::Arc;

/// Called by the fetch loop and the compiler as they make progress.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first request.
    fn on_fetch_start(&self, start_index: u64, threshold: u32) {
        let _ = (start_index, threshold);
    }

    /// Called just before the request for `index` is sent.
    fn on_tile_start(&self, index: u64) {
        let _ = index;
    }

    /// Called once the request for `index` has been classified.
    ///
    /// # Arguments
    /// * `consecutive_not_found` — counter value *after* this outcome
    /// * `threshold`             — value at which the loop stops
    fn on_tile_outcome(
        &self,
        index: u64,
        outcome: &FetchOutcome,
        consecutive_not_found: u32,
        threshold: u32,
    ) {
        let _ = (index, outcome, consecutive_not_found, threshold);
    }

    /// Called once the stop rule has fired.
    fn on_fetch_complete(&self, saved: usize) {
        let _ = saved;
    }

    /// Called once before the first image is decoded.
    fn on_compile_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called when an image has been turned into a page buffer.
    ///
    /// `page_num` is the 1-indexed position in the input sequence.
    fn on_page_complete(&self, page_num: usize, total: usize, stats: &PageStats) {
        let _ = (page_num, total, stats);
    }

    /// Called when an image is skipped.
    fn on_page_error(&self, page_num: usize, total: usize, error: &PageError) {
        let _ = (page_num, total, error);
    }

    /// Called once every input has been attempted, before the PDF is written.
    fn on_compile_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {}

/// Convenience alias matching the type stored in the configs.
pub type ProgressCallback = Arc<dyn ProgressReporter>;
