//! Preview entries held by a batch until submission.

use crate::types::NormalizedImage;
use base64::{Engine, engine::general_purpose::STANDARD};

/// A normalized image paired with an inline preview and before/after sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub image: NormalizedImage,
    /// `data:image/jpeg;base64,...`, usable directly as an `<img src>`.
    pub preview: String,
    /// Declared size of the file as selected.
    pub original_size: u64,
    /// Size of the normalized JPEG.
    pub resized_size: u64,
}

impl PreviewEntry {
    pub fn new(image: NormalizedImage) -> Self {
        let preview = data_url(image.mime_type(), &image.bytes);
        Self {
            original_size: image.original_size,
            resized_size: image.byte_len(),
            preview,
            image,
        }
    }

    /// Bytes saved by normalization (zero if the JPEG came out larger).
    pub fn saved_bytes(&self) -> u64 {
        self.original_size.saturating_sub(self.resized_size)
    }
}

/// Encode bytes as a `data:` URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(bytes: &[u8], original_size: u64) -> NormalizedImage {
        NormalizedImage {
            file_name: "porch.jpg".into(),
            bytes: bytes.to_vec(),
            width: 4,
            height: 3,
            original_size,
        }
    }

    #[test]
    fn data_url_format() {
        assert_eq!(data_url("image/jpeg", b"hi"), "data:image/jpeg;base64,aGk=");
    }

    #[test]
    fn entry_records_sizes_and_preview() {
        let entry = PreviewEntry::new(image(&[0xFF, 0xD8, 0xFF], 5000));
        assert_eq!(entry.original_size, 5000);
        assert_eq!(entry.resized_size, 3);
        assert_eq!(entry.preview, "data:image/jpeg;base64,/9j/");
        assert_eq!(entry.saved_bytes(), 4997);
    }

    #[test]
    fn saved_bytes_never_negative() {
        let entry = PreviewEntry::new(image(&[1, 2, 3, 4], 2));
        assert_eq!(entry.saved_bytes(), 0);
    }
}
