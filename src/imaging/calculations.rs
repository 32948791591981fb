//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::BoundingBox;

/// Calculate the dimensions an image is resized to so it fits a bounding box.
///
/// Images already inside the box keep their size (never upscaled). Larger
/// images are scaled by `min(max_w / w, max_h / h)` so both constraints hold
/// at once and the aspect ratio is kept to within integer rounding.
///
/// # Arguments
/// * `source` - Decoded image dimensions
/// * `bounds` - Maximum width and height
///
/// # Returns
/// * Target dimensions, each side at least 1 and never above the box
///
/// # Examples
/// ```
/// # use listing_photos::imaging::{BoundingBox, Dimensions, calculate_fit_dimensions};
/// // 4000x3000 into 1920x1080 is height-limited: ratio 0.36 → 1440x1080
/// let fit = calculate_fit_dimensions(
///     Dimensions { width: 4000, height: 3000 },
///     BoundingBox::new(1920, 1080),
/// );
/// assert_eq!((fit.width, fit.height), (1440, 1080));
/// ```
pub fn calculate_fit_dimensions(source: Dimensions, bounds: BoundingBox) -> Dimensions {
    let Dimensions { width, height } = source;

    if width == 0 || height == 0 {
        return source;
    }
    if width <= bounds.max_width && height <= bounds.max_height {
        return source;
    }

    let ratio = f64::min(
        bounds.max_width as f64 / width as f64,
        bounds.max_height as f64 / height as f64,
    );

    Dimensions {
        width: scale_side(width, ratio, bounds.max_width),
        height: scale_side(height, ratio, bounds.max_height),
    }
}

/// Scale one side and keep it inside `1..=max`.
fn scale_side(side: u32, ratio: f64, max: u32) -> u32 {
    ((side as f64 * ratio).round() as u32).clamp(1, max)
}

/// Absolute difference between the aspect ratios of two sizes.
pub fn aspect_drift(a: Dimensions, b: Dimensions) -> f64 {
    let ra = a.width as f64 / a.height as f64;
    let rb = b.width as f64 / b.height as f64;
    (ra - rb).abs()
}
