//! Compile an ordered list of tiles into one compressed PDF.
//!
//! The async [`compile`] entry point runs the whole CPU-bound pass inside
//! `spawn_blocking`; [`compile_blocking`] is the same thing for callers that
//! are not on a Tokio runtime.
//!
//! Images are processed strictly one after another. Only one decoded image
//! is alive at a time; what accumulates is the list of JPEG page buffers,
//! which is handed to the assembler once every input has been attempted.

use crate::config::CompileConfig;
use crate::error::{PageError, Tile2PdfError};
use crate::output::{CompileOutput, CompressionReport, PageStats};
use crate::pipeline::assemble;
use crate::pipeline::decode::load_page;
use crate::pipeline::encode::{encode_page, PageBuffer};
use crate::pipeline::normalize::{downscale, flatten_onto_white};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Compile `paths` into a PDF at `output_path`.
///
/// Pages appear in the order of `paths`. Images that fail to decode are
/// skipped and reported in [`CompileOutput::skipped`].
///
/// # Errors
/// * [`Tile2PdfError::EmptyInput`] — `paths` is empty.
/// * [`Tile2PdfError::AllPagesFailed`] — nothing decoded; no file written.
/// * [`Tile2PdfError::OutputWriteFailed`] / [`Tile2PdfError::PdfAssembly`].
///
/// # Example
/// ```rust,no_run
/// use tile2pdf::{compile, CompileConfig};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tiles = vec![PathBuf::from("downloaded_images/image_000001.jp2")];
/// let out = compile(&tiles, "out.pdf", &CompileConfig::default()).await?;
/// println!("{} pages, {} bytes", out.page_count, out.pdf_bytes);
/// # Ok(())
/// # }
/// ```
pub async fn compile(
    paths: &[PathBuf],
    output_path: impl AsRef<Path>,
    config: &CompileConfig,
) -> Result<CompileOutput, Tile2PdfError> {
    let paths = paths.to_vec();
    let output_path = output_path.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || compile_blocking(&paths, &output_path, &config))
        .await
        .map_err(|e| Tile2PdfError::Internal(format!("Compile task panicked: {}", e)))?
}

/// Blocking implementation of [`compile`].
pub fn compile_blocking(
    paths: &[PathBuf],
    output_path: &Path,
    config: &CompileConfig,
) -> Result<CompileOutput, Tile2PdfError> {
    if paths.is_empty() {
        return Err(Tile2PdfError::EmptyInput);
    }

    let total = paths.len();
    info!(
        "Compiling {} images (max_dimension={}px, quality={})",
        total, config.max_dimension, config.quality
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_compile_start(total);
    }

    let mut buffers: Vec<PageBuffer> = Vec::with_capacity(total);
    let mut pages: Vec<PageStats> = Vec::with_capacity(total);
    let mut skipped: Vec<PageError> = Vec::new();
    let mut report = CompressionReport::default();

    for (i, path) in paths.iter().enumerate() {
        let page_num = i + 1;
        match process_image(path, config) {
            Ok((buffer, stats)) => {
                report.add(stats.original_bytes, stats.compressed_bytes);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total, &stats);
                }
                buffers.push(buffer);
                pages.push(stats);
            }
            Err(e) => {
                warn!("Skipping image {}/{}: {}", page_num, total, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, &e);
                }
                skipped.push(e);
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_compile_complete(total, buffers.len());
    }

    if buffers.is_empty() {
        return Err(Tile2PdfError::AllPagesFailed {
            total,
            first_error: skipped
                .first()
                .map(|e| e.to_string())
                .unwrap_or_default(),
        });
    }

    if let Some(pct) = report.reduction_percent() {
        info!(
            "Image compression: {:.1}% reduction ({} → {} bytes)",
            pct, report.total_original_bytes, report.total_compressed_bytes
        );
    }

    let page_count = buffers.len();
    let pdf_bytes = write_atomically(buffers, config.resolution, output_path)?;
    info!(
        "PDF written: {} ({} pages, {} bytes)",
        output_path.display(),
        page_count,
        pdf_bytes
    );

    Ok(CompileOutput {
        output_path: output_path.to_path_buf(),
        page_count,
        pdf_bytes,
        report,
        pages,
        skipped,
    })
}

/// Decode → downscale → flatten → JPEG for a single tile.
fn process_image(
    path: &Path,
    config: &CompileConfig,
) -> Result<(PageBuffer, PageStats), PageError> {
    let page = load_page(path).map_err(|detail| PageError::DecodeFailed {
        path: path.to_path_buf(),
        detail,
    })?;

    let resized = downscale(page.image, config.max_dimension);
    let resized_dimensions = (resized.width(), resized.height());
    let flat = flatten_onto_white(resized);

    let buffer = encode_page(&flat, config.quality).map_err(|e| PageError::EncodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!(
        "{}: {}x{} → {}x{}, {} → {} bytes",
        path.display(),
        page.original_dimensions.0,
        page.original_dimensions.1,
        resized_dimensions.0,
        resized_dimensions.1,
        page.original_bytes,
        buffer.len()
    );

    let stats = PageStats {
        source: page.source,
        original_dimensions: page.original_dimensions,
        resized_dimensions,
        original_bytes: page.original_bytes,
        compressed_bytes: buffer.len() as u64,
    };
    Ok((buffer, stats))
}

/// Serialise into a temp file next to `path`, then rename over it, so a
/// failed run never leaves a truncated PDF behind. Returns the file size.
fn write_atomically(
    buffers: Vec<PageBuffer>,
    resolution: f32,
    path: &Path,
) -> Result<u64, Tile2PdfError> {
    let write_err = |source: std::io::Error| Tile2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    assemble::write_pdf(buffers, resolution, tmp.as_file_mut())
        .map_err(|e| Tile2PdfError::PdfAssembly(e.to_string()))?;
    let file = tmp.persist(path).map_err(|e| write_err(e.error))?;

    let len = file.metadata().map_err(write_err)?.len();
    Ok(len)
}
