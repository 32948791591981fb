//! Pure Rust raster backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP) | `image::ImageReader` with content sniffing |
//! | Resample | `DynamicImage::resize_exact` with `CatmullRom` (bicubic) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! JPEG has no alpha channel: transparent sources are flattened by dropping
//! alpha (transparent pixels keep whatever color they store, usually black).

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::params::Quality;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `ext` (without the dot, any case) is a decodable image extension.
pub fn is_supported_extension(ext: &str) -> bool {
    supported_input_extensions()
        .iter()
        .any(|e| e.eq_ignore_ascii_case(ext))
}

/// Resampling filter for downscales. Bicubic keeps edges crisp without
/// Lanczos ringing on architectural lines.
const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for RustBackend {
    type Raster = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(BackendError::Decode("unrecognized image format".into()));
        }
        reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn dimensions(&self, raster: &DynamicImage) -> Dimensions {
        Dimensions {
            width: raster.width(),
            height: raster.height(),
        }
    }

    fn resample(
        &self,
        raster: &DynamicImage,
        target: Dimensions,
    ) -> Result<DynamicImage, BackendError> {
        if target.is_empty() {
            return Err(BackendError::Encode(format!(
                "cannot resample to zero-area canvas {target}"
            )));
        }
        if self.dimensions(raster) == target {
            return Ok(raster.clone());
        }
        Ok(raster.resize_exact(target.width, target.height, RESAMPLE_FILTER))
    }

    fn encode_jpeg(&self, raster: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        if raster.width() == 0 || raster.height() == 0 {
            return Err(BackendError::Encode("zero-area raster".into()));
        }
        let rgb = raster.to_rgb8();
        let mut buf = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.jpeg_value());
        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }
}
