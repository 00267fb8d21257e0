//! Decode a tile from disk.
//!
//! The format is sniffed from the file contents, not the extension: tiles
//! keep the archive's extension locally even when the server hands out
//! something else. JPEG 2000 (JP2 container or raw J2K codestream) goes
//! through OpenJPEG via `jpeg2k` when the `jpeg2000` feature is on;
//! everything else goes to the `image` crate. Undecodable tiles fail here
//! and the page is skipped.

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};

/// `jP  ` signature box that opens every JP2 file.
const JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ', 0x0D, 0x0A, 0x87, 0x0A,
];

/// SOC followed by SIZ: a bare JPEG 2000 codestream.
const J2K_CODESTREAM: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

/// A decoded tile plus what it looked like before processing.
#[derive(Debug)]
pub struct PageImage {
    pub source: PathBuf,
    /// `(width, height)` as decoded.
    pub original_dimensions: (u32, u32),
    /// On-disk size of the tile.
    pub original_bytes: u64,
    pub image: DynamicImage,
}

/// Read and decode `path`. The error string is ready for a `PageError`.
pub fn load_page(path: &Path) -> Result<PageImage, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("read failed: {e}"))?;
    let image = decode_bytes(&bytes)?;

    Ok(PageImage {
        source: path.to_path_buf(),
        original_dimensions: (image.width(), image.height()),
        original_bytes: bytes.len() as u64,
        image,
    })
}

/// True for a JP2 file or a raw J2K codestream.
pub fn is_jpeg2000(bytes: &[u8]) -> bool {
    bytes.starts_with(&JP2_SIGNATURE) || bytes.starts_with(&J2K_CODESTREAM)
}

fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, String> {
    if is_jpeg2000(bytes) {
        return decode_jpeg2000(bytes);
    }
    image::load_from_memory(bytes).map_err(|e| e.to_string())
}

#[cfg(not(feature = "jpeg2000"))]
fn decode_jpeg2000(_bytes: &[u8]) -> Result<DynamicImage, String> {
    Err("JPEG 2000 tile, but tile2pdf was built without the `jpeg2000` feature".into())
}

#[cfg(feature = "jpeg2000")]
fn decode_jpeg2000(bytes: &[u8]) -> Result<DynamicImage, String> {
    let j2k = jpeg2k::Image::from_bytes(bytes).map_err(|e| format!("JPEG 2000: {e}"))?;
    let (width, height) = (j2k.width(), j2k.height());
    let len = width as usize * height as usize;

    // Gray, gray+alpha, RGB or RGBA; extra channels are dropped.
    let planes = j2k
        .components()
        .iter()
        .take(4)
        .map(|comp| {
            let data = comp.data();
            if data.len() != len {
                return Err(format!(
                    "JPEG 2000: subsampled component ({} samples for {}x{}) is not supported",
                    data.len(),
                    width,
                    height
                ));
            }
            let precision = comp.precision();
            Ok(data.iter().map(|&v| sample_to_u8(v, precision)).collect())
        })
        .collect::<Result<Vec<Vec<u8>>, String>>()?;

    planes_to_image(width, height, planes)
        .ok_or_else(|| "JPEG 2000: unsupported component layout".to_string())
}

/// Scale one `precision`-bit sample to 8 bits. Out-of-range values clamp.
#[cfg_attr(not(feature = "jpeg2000"), allow(dead_code))]
fn sample_to_u8(v: i32, precision: u32) -> u8 {
    let precision = precision.clamp(1, 31);
    let max = (1i64 << precision) - 1;
    let v = i64::from(v).clamp(0, max);
    ((v * 255 + max / 2) / max) as u8
}

/// Interleave separate channel planes into an 8-bit image.
#[cfg_attr(not(feature = "jpeg2000"), allow(dead_code))]
fn planes_to_image(width: u32, height: u32, planes: Vec<Vec<u8>>) -> Option<DynamicImage> {
    let interleaved = |planes: &[Vec<u8>]| -> Vec<u8> {
        let len = planes.first().map_or(0, Vec::len);
        (0..len)
            .flat_map(|i| planes.iter().map(move |p| p[i]))
            .collect()
    };

    match planes.len() {
        1 => {
            let gray = planes.into_iter().next()?;
            GrayImage::from_raw(width, height, gray).map(DynamicImage::ImageLuma8)
        }
        2 => GrayAlphaImage::from_raw(width, height, interleaved(&planes))
            .map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(width, height, interleaved(&planes)).map(DynamicImage::ImageRgb8),
        4 => {
            RgbaImage::from_raw(width, height, interleaved(&planes)).map(DynamicImage::ImageRgba8)
        }
        _ => None,
    }
}
