//! Error types for the tile2pdf library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`Tile2PdfError`] — **Fatal**: the run cannot proceed at all (output
//!   directory cannot be created, nothing to compile, PDF cannot be written).
//!   Returned as `Err(Tile2PdfError)` from [`crate::Fetcher::fetch`] and
//!   [`crate::compile`].
//!
//! * [`PageError`] — **Non-fatal**: a single tile could not be decoded or
//!   re-encoded. The image is left out of the PDF and the error is stored in
//!   [`crate::output::CompileOutput::skipped`].
//!
//! * [`TransportError`] — **Non-fatal**: a single request timed out or never
//!   got a response. Carried inside [`crate::FetchOutcome::TransportError`];
//!   the fetch loop logs it and moves on to the next index.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tile2pdf library.
#[derive(Debug, Error)]
pub enum Tile2PdfError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The HTTP client could not be constructed (bad user agent, TLS backend).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Could not create the directory tiles are downloaded into.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A downloaded tile body could not be written to disk.
    #[error("Failed to write tile {index} to '{path}': {source}")]
    TileWriteFailed {
        index: u64,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tile directory could not be listed.
    #[error("Failed to scan '{path}' for existing tiles: {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Compile errors ────────────────────────────────────────────────────
    /// No input paths were handed to the compiler.
    #[error("No images to compile into a PDF")]
    EmptyInput,

    /// Every input image failed to decode; the PDF would have no pages.
    #[error("All {total} images failed to process; no PDF written.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// lopdf could not serialise the assembled document.
    #[error("Failed to assemble PDF: {0}")]
    PdfAssembly(String),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// The compiler continues unless every image fails.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The tile could not be read from disk or decoded.
    #[error("{path:?}: decode failed: {detail}")]
    DecodeFailed { path: PathBuf, detail: String },

    /// The normalised image could not be re-encoded as JPEG.
    #[error("{path:?}: JPEG encode failed: {detail}")]
    EncodeFailed { path: PathBuf, detail: String },
}

impl PageError {
    /// Path of the tile that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            PageError::DecodeFailed { path, .. } | PageError::EncodeFailed { path, .. } => path,
        }
    }
}

/// A request that produced no HTTP status at all.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TransportError {
    /// No response within the per-request timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection refused, DNS failure, TLS error, truncated body, …
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_pages_failed_display() {
        let e = Tile2PdfError::AllPagesFailed {
            total: 3,
            first_error: "bad header".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 3 images"), "got: {msg}");
        assert!(msg.contains("bad header"));
    }

    #[test]
    fn tile_write_failed_display() {
        let e = Tile2PdfError::TileWriteFailed {
            index: 42,
            path: PathBuf::from("out/image_000042.jp2"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let msg = e.to_string();
        assert!(msg.contains("tile 42"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn page_error_exposes_path() {
        let e = PageError::DecodeFailed {
            path: PathBuf::from("a/image_000001.jp2"),
            detail: "unsupported format".into(),
        };
        assert_eq!(e.path(), std::path::Path::new("a/image_000001.jp2"));
        assert!(e.to_string().contains("unsupported format"));
    }

    #[test]
    fn transport_timeout_display() {
        let e = TransportError::Timeout { secs: 30 };
        assert_eq!(e.to_string(), "timed out after 30s");
    }
}
