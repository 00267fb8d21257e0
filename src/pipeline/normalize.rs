//! Geometry and colour normalisation for a decoded tile.
//!
//! Two steps, always in this order:
//!
//! 1. [`downscale`] — shrink so neither edge exceeds `max_dimension`,
//!    keeping the aspect ratio. Never upscales.
//! 2. [`flatten_onto_white`] — composite any alpha onto an opaque white
//!    background and drop to 8-bit RGB, the only colour model the page
//!    encoder accepts.

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

/// Size `(width, height)` fits into after downscaling.
///
/// Identity when both edges are already ≤ `max_dimension`. Otherwise a single
/// factor `min(max/w, max/h)` is applied to both edges and rounded to the
/// nearest pixel, so the longer edge lands on `max_dimension` exactly.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let max = f64::from(max_dimension);
    let scale = f64::min(max / f64::from(width), max / f64::from(height));
    let fit = |edge: u32| ((f64::from(edge) * scale).round() as u32).clamp(1, max_dimension);

    (fit(width), fit(height))
}

/// Downscale `img` to [`target_dimensions`] with a Lanczos3 filter.
///
/// Returns the image untouched when it already fits.
pub fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let (tw, th) = target_dimensions(w, h, max_dimension);
    if (tw, th) == (w, h) {
        return img;
    }
    img.resize_exact(tw, th, FilterType::Lanczos3)
}

/// Convert to opaque 8-bit RGB.
///
/// Images with an alpha channel are blended onto white:
/// `out = c·a + 255·(1 − a)`. Everything else (grey, 16-bit, float) is
/// converted directly.
pub fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }

    let rgba = img.into_rgba8();
    let (w, h) = rgba.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, LumaA, Rgba, RgbaImage};

    #[test]
    fn within_bounds_is_identity() {
        assert_eq!(target_dimensions(800, 600, 2000), (800, 600));
        assert_eq!(target_dimensions(2000, 2000, 2000), (2000, 2000));
    }

    #[test]
    fn longer_edge_hits_the_limit() {
        assert_eq!(target_dimensions(4000, 3000, 2000), (2000, 1500));
        assert_eq!(target_dimensions(3000, 4000, 2000), (1500, 2000));
        assert_eq!(target_dimensions(2001, 10, 2000), (2000, 10));
    }

    #[test]
    fn aspect_ratio_within_one_pixel() {
        for &(w, h) in &[(5123, 3771), (2999, 2001), (10_000, 7), (2345, 6789)] {
            let (tw, th) = target_dimensions(w, h, 2000);
            assert_eq!(tw.max(th), 2000, "{w}x{h} → {tw}x{th}");
            let expected_th = f64::from(tw) * f64::from(h) / f64::from(w);
            assert!(
                (f64::from(th) - expected_th).abs() <= 1.0,
                "{w}x{h} → {tw}x{th}, expected height ≈ {expected_th}"
            );
        }
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        assert_eq!(target_dimensions(100_000, 1, 2000), (2000, 1));
    }

    #[test]
    fn downscale_resizes_and_skips() {
        let big = DynamicImage::ImageRgb8(RgbImage::new(300, 150));
        let small = downscale(big, 100);
        assert_eq!((small.width(), small.height()), (100, 50));

        let fits = DynamicImage::ImageRgb8(RgbImage::new(30, 15));
        let same = downscale(fits, 100);
        assert_eq!((same.width(), same.height()), (30, 15));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let flat = flatten_onto_white(DynamicImage::ImageRgba8(img));
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn opaque_pixels_keep_their_colour() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let flat = flatten_onto_white(DynamicImage::ImageRgba8(img));
        assert_eq!(flat.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn half_alpha_blends_halfway() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let [r, g, b] = flatten_onto_white(DynamicImage::ImageRgba8(img)).get_pixel(0, 0).0;
        assert_eq!((r, g, b), (127, 127, 127));
    }

    #[test]
    fn grey_with_alpha_is_flattened() {
        let img = image::ImageBuffer::from_pixel(1, 1, LumaA([0u8, 0]));
        let flat = flatten_onto_white(DynamicImage::ImageLumaA8(img));
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn grey_is_expanded_to_rgb() {
        let img = GrayImage::from_pixel(3, 1, Luma([42]));
        let flat = flatten_onto_white(DynamicImage::ImageLuma8(img));
        assert_eq!(flat.dimensions(), (3, 1));
        assert_eq!(flat.get_pixel(2, 0).0, [42, 42, 42]);
    }
}
