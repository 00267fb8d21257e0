//! # tile2pdf
//!
//! Download a numbered series of tile images from a remote archive and
//! compile them into a single compressed PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! archive
//!  │
//!  ├─ 1. Fetch    GET base_url + pattern(i) for i = start, start+1, …
//!  │              until N consecutive 404s (or: scan an existing directory)
//!  ├─ 2. Decode   one tile at a time from disk
//!  ├─ 3. Resize   cap the longest edge, never upscale
//!  ├─ 4. Flatten  alpha onto white, 8-bit RGB
//!  ├─ 5. Encode   lossy JPEG page buffer
//!  └─ 6. Assemble one page per buffer, written atomically
//! ```
//!
//! Everything is sequential: one request in flight, one image decoded at a
//! time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tile2pdf::{compile, CompileConfig, FetchConfig, Fetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Fetcher::http(FetchConfig::default())?;
//!     let tiles = fetcher.fetch(1, 5).await?;
//!
//!     let out = compile(&tiles, "archive.pdf", &CompileConfig::default()).await?;
//!     if let Some(pct) = out.report.reduction_percent() {
//!         eprintln!("{} pages, {:.1}% smaller", out.page_count, pct);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tile2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `jpeg2000` | on   | Decodes JP2/J2K tiles through OpenJPEG (`jpeg2k`) |
//!
//! ## Stop rule
//!
//! Only HTTP 404 counts towards the stop condition, and only when the misses
//! are consecutive: any saved tile resets the counter. Other statuses and
//! timeouts are skipped without counting, so an archive that keeps
//! answering 500 is fetched forever.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compile;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compile::{compile, compile_blocking};
pub use config::{CompileConfig, CompileConfigBuilder, FetchConfig, FetchConfigBuilder, UrlPattern};
pub use error::{PageError, Tile2PdfError, TransportError};
pub use output::{CompileOutput, CompressionReport, PageStats};
pub use pipeline::fetch::{DownloadTarget, FetchOutcome, Fetcher, RunState};
pub use pipeline::scan::list_existing;
pub use pipeline::source::{HttpTileSource, TileResponse, TileSource};
pub use progress::{NoopProgress, ProgressCallback, ProgressReporter};
