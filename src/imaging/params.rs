//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the target size) and the [`backend`](super::backend)
//! (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality as a fraction in `(0, 1]` (default 0.85). Clamped on construction.
//! - [`BoundingBox`]: The ceiling a normalized image must fit in (default 1920×1080).
//! - [`NormalizeParams`]: Bounding box + quality for a single normalization.

/// Lowest quality fraction accepted; anything at or below zero is raised to this.
const MIN_QUALITY: f32 = 0.01;
const DEFAULT_QUALITY: f32 = 0.85;

/// Quality setting for lossy JPEG encoding, as a fraction in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Clamp into `[0.01, 1.0]`. NaN falls back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(MIN_QUALITY, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// The same quality on the JPEG encoder's 1–100 scale.
    pub fn jpeg_value(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

/// Maximum width and height a normalized image may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl BoundingBox {
    /// Both sides are raised to at least one pixel.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
        }
    }
}

/// Parameters for a single normalization (resize + JPEG re-encode).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizeParams {
    pub bounds: BoundingBox,
    pub quality: Quality,
}

impl NormalizeParams {
    pub fn new(max_width: u32, max_height: u32, quality: f32) -> Self {
        Self {
            bounds: BoundingBox::new(max_width, max_height),
            quality: Quality::new(quality),
        }
    }
}
