//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait defines the three pixel operations the
//! normalizer needs: decode, resample and JPEG encode. Everything above it
//! (dimension planning, batching, admission) is backend-agnostic, so tests
//! swap in an in-memory fake instead of decoding real images.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Pixel extents of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for raster backends.
///
/// `Sync` because batches normalize files in parallel on the rayon pool.
pub trait RasterBackend: Sync {
    /// Decoded, in-memory image.
    type Raster;

    /// Decode encoded bytes (PNG, JPEG, GIF, WebP, BMP) into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Raster, BackendError>;

    /// Pixel dimensions of a decoded raster.
    fn dimensions(&self, raster: &Self::Raster) -> Dimensions;

    /// Single-pass resample to exactly `target`.
    fn resample(&self, raster: &Self::Raster, target: Dimensions)
    -> Result<Self::Raster, BackendError>;

    /// Encode as baseline JPEG. Alpha, if any, is discarded.
    fn encode_jpeg(&self, raster: &Self::Raster, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Magic prefix of a fake-encoded image: `FAKE` + u16 width + u16 height.
    pub const FAKE_MAGIC: &[u8; 4] = b"FAKE";

    /// Bytes the [`FakeBackend`] decodes as a `width`×`height` image.
    pub fn fake_image(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = FAKE_MAGIC.to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes
    }

    /// In-memory backend: rasters are just dimensions, encoded output is a
    /// fake header. Records every operation it is asked to perform.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct FakeBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, `encode_jpeg` fails for rasters of this width.
        pub fail_encode_width: Option<u32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode { len: usize },
        Resample { from: Dimensions, to: Dimensions },
        Encode { dims: Dimensions, quality: u8 },
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_encode_at_width(width: u32) -> Self {
            Self {
                fail_encode_width: Some(width),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn decode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Decode { .. }))
                .count()
        }
    }

    impl RasterBackend for FakeBackend {
        type Raster = Dimensions;

        fn decode(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode { len: bytes.len() });

            if bytes.len() < 8 || &bytes[..4] != FAKE_MAGIC {
                return Err(BackendError::Decode("unrecognized image format".into()));
            }
            let width = u16::from_le_bytes([bytes[4], bytes[5]]) as u32;
            let height = u16::from_le_bytes([bytes[6], bytes[7]]) as u32;
            Ok(Dimensions { width, height })
        }

        fn dimensions(&self, raster: &Dimensions) -> Dimensions {
            *raster
        }

        fn resample(&self, raster: &Dimensions, target: Dimensions) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resample {
                from: *raster,
                to: target,
            });
            Ok(target)
        }

        fn encode_jpeg(&self, raster: &Dimensions, quality: Quality) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                dims: *raster,
                quality: quality.jpeg_value(),
            });
            if raster.is_empty() {
                return Err(BackendError::Encode("zero-area raster".into()));
            }
            if self.fail_encode_width == Some(raster.width) {
                return Err(BackendError::Encode("encoder rejected parameters".into()));
            }
            Ok(fake_image(raster.width as u16, raster.height as u16))
        }
    }

    #[test]
    fn fake_decodes_header() {
        let backend = FakeBackend::new();
        let raster = backend.decode(&fake_image(800, 600)).unwrap();
        assert_eq!(raster, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode { len: 8 }]);
    }

    #[test]
    fn fake_rejects_garbage() {
        let backend = FakeBackend::new();
        let result = backend.decode(b"just some text, not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn fake_records_resample_and_encode() {
        let backend = FakeBackend::new();
        let raster = Dimensions::new(400, 300);
        let resized = backend.resample(&raster, Dimensions::new(200, 150)).unwrap();
        backend.encode_jpeg(&resized, Quality::new(0.7)).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::Encode {
                dims: Dimensions {
                    width: 200,
                    height: 150
                },
                quality: 70,
            }
        ));
    }

    #[test]
    fn fake_encode_rejects_zero_area() {
        let backend = FakeBackend::new();
        let result = backend.encode_jpeg(&Dimensions::new(0, 10), Quality::default());
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(1440, 1080).to_string(), "1440x1080");
    }
}
