//! Shared types passed between selection, normalization and upload.
//!
//! These are transient: they live for one selection or until the batch
//! holding them is submitted or cleared.

use crate::imaging::Dimensions;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// MIME type of every normalized image.
pub const JPEG_MIME: &str = "image/jpeg";

/// A user-selected file, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Name as selected (e.g. `001-living-room.png`), no directories.
    pub file_name: String,
    /// Raw, still-encoded bytes.
    pub bytes: Vec<u8>,
    /// Byte length reported by the selection, checked before any decoding.
    pub declared_size: u64,
    /// MIME type reported by the selection. Informational only; decoding
    /// sniffs the actual content.
    pub declared_mime: String,
}

impl SourceImage {
    /// Build a source whose declared size is the actual byte length.
    pub fn new(file_name: &str, bytes: Vec<u8>, declared_mime: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            declared_size: bytes.len() as u64,
            bytes,
            declared_mime: declared_mime.to_string(),
        }
    }

    /// Read a file from disk. See [`SelectedFile`] for the metadata-first path.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        SelectedFile::stat(path)?.read()
    }
}

/// A file picked from disk whose size is known but whose bytes are not read yet.
///
/// Admission runs on this, so files over the cap or the size limit are
/// never read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Length from filesystem metadata.
    pub declared_size: u64,
}

impl SelectedFile {
    pub fn stat(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file_name: display_name(path),
            declared_size: metadata.len(),
        })
    }

    /// Load the bytes. The declared size stays the one seen at selection.
    pub fn read(&self) -> std::io::Result<SourceImage> {
        let bytes = std::fs::read(&self.path)?;
        let mime = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(mime_for_extension)
            .unwrap_or("application/octet-stream");
        Ok(SourceImage {
            file_name: self.file_name.clone(),
            bytes,
            declared_size: self.declared_size,
            declared_mime: mime.to_string(),
        })
    }
}

/// File name used in warnings and output; the whole path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Best-effort MIME type for a file extension (case-insensitive).
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => JPEG_MIME,
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Output of a successful normalization: a JPEG that fits the bounding box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Original stem with a `.jpg` extension.
    pub file_name: String,
    /// Encoded JPEG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Declared size of the source file, for before/after reporting.
    pub original_size: u64,
}

impl NormalizedImage {
    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Public-facing address of a stored photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn new_declares_actual_length() {
        let src = SourceImage::new("a.png", vec![0; 42], "image/png");
        assert_eq!(src.declared_size, 42);
        assert_eq!(src.declared_mime, "image/png");
    }

    #[test]
    fn mime_for_known_extensions() {
        assert_eq!(mime_for_extension("JPG"), "image/jpeg");
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("WebP"), "image/webp");
        assert_eq!(mime_for_extension("txt"), "application/octet-stream");
    }

    #[test]
    fn from_path_reads_name_and_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("010-terrace.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let src = SourceImage::from_path(&path).unwrap();
        assert_eq!(src.file_name, "010-terrace.gif");
        assert_eq!(src.bytes, b"GIF89a");
        assert_eq!(src.declared_size, 6);
        assert_eq!(src.declared_mime, "image/gif");
    }

    #[test]
    fn selected_file_sizes_from_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("porch.png");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();

        let file = SelectedFile::stat(&path).unwrap();
        assert_eq!(file.file_name, "porch.png");
        assert_eq!(file.declared_size, 1234);

        let src = file.read().unwrap();
        assert_eq!(src.declared_size, 1234);
        assert_eq!(src.declared_mime, "image/png");
    }

    #[test]
    fn read_keeps_declared_size_from_selection() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hall.jpg");
        std::fs::write(&path, b"abc").unwrap();
        let file = SelectedFile::stat(&path).unwrap();

        std::fs::write(&path, b"abcdef").unwrap();
        assert_eq!(file.read().unwrap().declared_size, 3);
    }

    #[test]
    fn selected_file_deleted_before_read_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.jpg");
        std::fs::write(&path, b"x").unwrap();
        let file = SelectedFile::stat(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(file.read().is_err());
    }

    #[test]
    fn display_name_prefers_file_name() {
        assert_eq!(display_name(Path::new("/photos/a/kitchen.jpg")), "kitchen.jpg");
        assert_eq!(display_name(Path::new("/")), "/");
    }

    #[test]
    fn locator_serializes_as_string() {
        let json = serde_json::to_string(&Locator::new("https://x/y.jpg")).unwrap();
        assert_eq!(json, "\"https://x/y.jpg\"");
    }

    #[test]
    fn from_path_missing_file_errors() {
        assert!(SourceImage::from_path(Path::new("/nonexistent/photo.jpg")).is_err());
    }

    #[test]
    fn normalized_image_is_always_jpeg() {
        let img = NormalizedImage {
            file_name: "x.jpg".into(),
            bytes: vec![1, 2, 3],
            width: 10,
            height: 20,
            original_size: 99,
        };
        assert_eq!(img.mime_type(), "image/jpeg");
        assert_eq!(img.byte_len(), 3);
        assert_eq!(img.dimensions(), Dimensions::new(10, 20));
    }
}
