//! Result types returned by the compiler.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Running byte totals across every page that made it into the PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionReport {
    /// Sum of the on-disk sizes of the source tiles.
    pub total_original_bytes: u64,
    /// Sum of the re-encoded JPEG page buffers.
    pub total_compressed_bytes: u64,
}

impl CompressionReport {
    /// Account for one page.
    pub fn add(&mut self, original_bytes: u64, compressed_bytes: u64) {
        self.total_original_bytes += original_bytes;
        self.total_compressed_bytes += compressed_bytes;
    }

    /// `(1 − compressed / original) × 100`, or `None` when nothing was counted.
    ///
    /// Negative when re-encoding grew the data (tiny or already-JPEG inputs).
    pub fn reduction_percent(&self) -> Option<f64> {
        if self.total_original_bytes == 0 {
            return None;
        }
        Some(
            (1.0 - self.total_compressed_bytes as f64 / self.total_original_bytes as f64) * 100.0,
        )
    }
}

/// Per-page processing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    /// Tile the page was built from.
    pub source: PathBuf,
    /// Decoded size before resizing, `(width, height)`.
    pub original_dimensions: (u32, u32),
    /// Size embedded in the PDF.
    pub resized_dimensions: (u32, u32),
    /// Size of the tile on disk.
    pub original_bytes: u64,
    /// Size of the JPEG page buffer.
    pub compressed_bytes: u64,
}

impl PageStats {
    /// True when the page was downscaled.
    pub fn was_resized(&self) -> bool {
        self.original_dimensions != self.resized_dimensions
    }
}

/// Everything the compiler knows after the PDF has been written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutput {
    /// Where the PDF landed.
    pub output_path: PathBuf,
    /// Pages in the PDF (inputs minus skipped).
    pub page_count: usize,
    /// Size of the written PDF file.
    pub pdf_bytes: u64,
    /// Aggregate byte totals.
    pub report: CompressionReport,
    /// One entry per page, in page order.
    pub pages: Vec<PageStats>,
    /// Inputs that were left out.
    pub skipped: Vec<PageError>,
}
