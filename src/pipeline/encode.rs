//! Page encoding: flattened `RgbImage` → in-memory JPEG page buffer.
//!
//! Source tiles are usually lossless or high-bitrate, so this lossy pass is
//! where most of the size reduction comes from. The resulting bytes are
//! embedded in the PDF verbatim (`DCTDecode`), which means the quality chosen
//! here is also the quality of the final document.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// One page, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBuffer {
    pub width: u32,
    pub height: u32,
    /// Baseline JPEG, 8-bit RGB.
    pub jpeg: Vec<u8>,
}

impl PageBuffer {
    /// Size of the encoded page in bytes.
    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}

/// Encode a flattened page as JPEG at `quality` (1–100).
pub fn encode_page(img: &RgbImage, quality: u8) -> Result<PageBuffer, image::ImageError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(img)?;

    debug!(
        "Encoded {}x{} page → {} bytes JPEG (q={})",
        img.width(),
        img.height(),
        jpeg.len(),
        quality
    );

    Ok(PageBuffer {
        width: img.width(),
        height: img.height(),
        jpeg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn encode_small_image() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let page = encode_page(&img, 85).expect("encode should succeed");
        assert_eq!((page.width, page.height), (10, 10));
        assert!(!page.is_empty());
        // JPEG SOI marker
        assert_eq!(&page.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn output_decodes_back_to_same_size() {
        let img = RgbImage::from_fn(64, 32, |x, y| Rgb([x as u8 * 4, y as u8 * 8, 128]));
        let page = encode_page(&img, 60).unwrap();
        let back = image::load_from_memory(&page.jpeg).expect("valid JPEG");
        assert_eq!((back.width(), back.height()), (64, 32));
    }

    #[test]
    fn lower_quality_is_smaller() {
        let img = RgbImage::from_fn(128, 128, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        });
        let high = encode_page(&img, 95).unwrap();
        let low = encode_page(&img, 20).unwrap();
        assert!(low.len() < high.len(), "{} vs {}", low.len(), high.len());
    }
}
