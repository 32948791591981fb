//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take parameters, compute the target size, and call the backend.

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::NormalizeParams;
use crate::naming::normalized_file_name;
use crate::types::{NormalizedImage, SourceImage};
use thiserror::Error;
use tracing::debug;

/// Failure to normalize a single file. Always names the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{file_name}: not a decodable image ({reason})")]
    Decode { file_name: String, reason: String },
    #[error("{file_name}: re-encoding failed ({reason})")]
    Encode { file_name: String, reason: String },
}

impl NormalizeError {
    fn from_backend(file_name: &str, err: BackendError) -> Self {
        match err {
            BackendError::Decode(reason) => Self::Decode {
                file_name: file_name.to_string(),
                reason,
            },
            BackendError::Encode(reason) => Self::Encode {
                file_name: file_name.to_string(),
                reason,
            },
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Decode { file_name, .. } | Self::Encode { file_name, .. } => file_name,
        }
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Plan the output size of a normalization without touching pixels.
pub fn plan_normalize(source: Dimensions, params: &NormalizeParams) -> Dimensions {
    calculate_fit_dimensions(source, params.bounds)
}

/// Normalize one image: decode, fit into the bounding box, re-encode as JPEG.
///
/// The source is borrowed and never modified. Failures are returned as-is;
/// the original bytes are never substituted for a failed encode.
pub fn normalize<B: RasterBackend>(
    backend: &B,
    source: &SourceImage,
    params: &NormalizeParams,
) -> Result<NormalizedImage> {
    let name = source.file_name.as_str();
    let fail = |e: BackendError| NormalizeError::from_backend(name, e);

    let raster = backend.decode(&source.bytes).map_err(fail)?;
    let original = backend.dimensions(&raster);
    if original.is_empty() {
        return Err(fail(BackendError::Encode(format!(
            "decoded image has zero area ({original})"
        ))));
    }

    let target = plan_normalize(original, params);
    let resized = if target == original {
        raster
    } else {
        backend.resample(&raster, target).map_err(fail)?
    };
    let bytes = backend.encode_jpeg(&resized, params.quality).map_err(fail)?;

    debug!(
        file = name,
        from = %original,
        to = %target,
        original_bytes = source.bytes.len(),
        jpeg_bytes = bytes.len(),
        "normalized image"
    );

    Ok(NormalizedImage {
        file_name: normalized_file_name(name),
        bytes,
        width: target.width,
        height: target.height,
        original_size: source.declared_size,
    })
}
