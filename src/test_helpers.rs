//! Shared test utilities for the listing-photos test suite.
//!
//! Synthetic photos are generated in memory with the `image` crate, so tests
//! need no fixture files and can pick any size or format.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = encode_synthetic(4000, 3000, ImageFormat::Png);
//! let raster = RustBackend::new().decode(&bytes).unwrap();
//! ```

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Synthetic images
// =========================================================================

/// RGBA gradient with a half-transparent right half.
pub fn synthetic_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let a = if x < width / 2 { 255 } else { 128 };
        Rgba([r, g, 128, a])
    })
}

/// Encode a synthetic gradient in `format`.
///
/// JPEG and BMP get an RGB8 copy, since their encoders reject RGBA input
/// (JPEG) or would keep alpha we don't want (BMP).
pub fn encode_synthetic(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let rgba = DynamicImage::ImageRgba8(synthetic_rgba(width, height));
    let img = match format {
        ImageFormat::Jpeg | ImageFormat::Bmp => DynamicImage::ImageRgb8(rgba.to_rgb8()),
        _ => rgba,
    };
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_png_decodes_to_requested_size() {
        let bytes = encode_synthetic(30, 20, ImageFormat::Png);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (30, 20));
        assert!(img.color().has_alpha());
    }

    #[test]
    fn synthetic_jpeg_is_rgb() {
        let bytes = encode_synthetic(16, 16, ImageFormat::Jpeg);
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
