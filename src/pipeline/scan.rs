//! Reuse tiles already on disk instead of downloading them again.

use crate::error::Tile2PdfError;
use std::path::{Path, PathBuf};
use tracing::info;

/// List regular files in `dir` (non-recursive) whose extension is
/// `extension`, sorted lexicographically.
///
/// Tile names are zero-padded to a fixed width, so lexicographic order is
/// index order and the result matches what a download run would have
/// returned. The extension comparison is case-sensitive.
pub fn list_existing(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Tile2PdfError> {
    let scan_err = |e: std::io::Error| Tile2PdfError::ScanFailed {
        path: dir.to_path_buf(),
        source: e,
    };
    let extension = extension.trim_start_matches('.');

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        if !entry.file_type().map_err(scan_err)?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == extension) {
            paths.push(path);
        }
    }
    paths.sort();

    info!("Found {} existing tiles in {}", paths.len(), dir.display());
    Ok(paths)
}
