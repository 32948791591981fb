//! Image normalization in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, GIF, WebP, BMP) |
//! | **Fit** | [`calculate_fit_dimensions`] (no upscaling) |
//! | **Resample** | `resize_exact` + CatmullRom |
//! | **Encode** | `JpegEncoder` at the requested quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality and bounding box
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Operations**: [`normalize`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, RasterBackend};
pub use calculations::{aspect_drift, calculate_fit_dimensions};
pub use operations::{NormalizeError, normalize, plan_normalize};
pub use params::{BoundingBox, NormalizeParams, Quality};
pub use rust_backend::{RustBackend, is_supported_extension, supported_input_extensions};
