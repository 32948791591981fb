//! Hand-off of a finished batch to storage.
//!
//! Where photos end up is not this crate's business: an [`UploadSink`] takes
//! a key and a normalized image and answers with a public [`Locator`].
//! [`DirectorySink`] is the local implementation (a plain directory served
//! under some base URL), used by the CLI and for development without a
//! storage service.

use crate::batch::Batch;
use crate::naming::storage_key;
use crate::types::NormalizedImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use crate::types::Locator;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload of {key} rejected: {reason}")]
    Rejected { key: String, reason: String },
}

/// Destination for normalized photos.
pub trait UploadSink {
    fn store(&self, key: &str, image: &NormalizedImage) -> Result<Locator, UploadError>;
}

/// Stores photos as files in a directory; locators are `public_base/key`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
    public_base: String,
}

impl DirectorySink {
    pub fn new(root: &Path, public_base: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }
}

impl UploadSink for DirectorySink {
    fn store(&self, key: &str, image: &NormalizedImage) -> Result<Locator, UploadError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(UploadError::Rejected {
                key: key.to_string(),
                reason: "key must be a plain file name".into(),
            });
        }
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(key);
        std::fs::write(&path, &image.bytes)?;
        debug!(path = %path.display(), bytes = image.bytes.len(), "stored photo");
        Ok(Locator::new(format!("{}/{}", self.public_base, key)))
    }
}

/// Store every new photo in the batch, in order, and return the listing's
/// full photo list: kept existing locators first, then the new ones.
///
/// Stops at the first failure; photos stored before it stay stored.
pub fn upload_batch(sink: &impl UploadSink, batch: &Batch) -> Result<Vec<Locator>, UploadError> {
    let mut locators = batch.existing().to_vec();
    locators.reserve(batch.len());
    for entry in batch.entries() {
        locators.push(sink.store(&storage_key(&entry.image), &entry.image)?);
    }
    Ok(locators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::PreviewEntry;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn image(name: &str, bytes: &[u8]) -> NormalizedImage {
        NormalizedImage {
            file_name: name.to_string(),
            bytes: bytes.to_vec(),
            width: 2,
            height: 2,
            original_size: 100,
        }
    }

    /// Sink that records keys and fails once `fail_after` uploads succeeded.
    struct RecordingSink {
        keys: Mutex<Vec<String>>,
        fail_after: usize,
    }

    impl UploadSink for RecordingSink {
        fn store(&self, key: &str, _image: &NormalizedImage) -> Result<Locator, UploadError> {
            let mut keys = self.keys.lock().unwrap();
            if keys.len() == self.fail_after {
                return Err(UploadError::Rejected {
                    key: key.to_string(),
                    reason: "quota exceeded".into(),
                });
            }
            keys.push(key.to_string());
            Ok(Locator::new(format!("mem://{key}")))
        }
    }

    #[test]
    fn directory_sink_writes_file_and_returns_url() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectorySink::new(tmp.path(), "https://cdn.example/listings/");

        let locator = sink.store("abc_porch.jpg", &image("porch.jpg", b"jpeg")).unwrap();

        assert_eq!(locator.as_str(), "https://cdn.example/listings/abc_porch.jpg");
        assert_eq!(std::fs::read(tmp.path().join("abc_porch.jpg")).unwrap(), b"jpeg");
    }

    #[test]
    fn directory_sink_creates_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("nested/uploads");
        let sink = DirectorySink::new(&root, "file://uploads");

        sink.store("k.jpg", &image("k.jpg", b"x")).unwrap();
        assert!(root.join("k.jpg").exists());
    }

    #[test]
    fn directory_sink_rejects_path_keys() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectorySink::new(tmp.path(), "file://uploads");

        for key in ["../escape.jpg", "a/b.jpg", ".hidden", ""] {
            let result = sink.store(key, &image("x.jpg", b"x"));
            assert!(matches!(result, Err(UploadError::Rejected { .. })), "{key}");
        }
    }

    #[test]
    fn upload_batch_preserves_order() {
        let sink = RecordingSink {
            keys: Mutex::new(Vec::new()),
            fail_after: usize::MAX,
        };
        let mut batch = Batch::default();
        batch.add(PreviewEntry::new(image("front.jpg", b"1"))).unwrap();
        batch.add(PreviewEntry::new(image("back.jpg", b"2"))).unwrap();

        let locators = upload_batch(&sink, &batch).unwrap();

        assert_eq!(locators.len(), 2);
        assert!(locators[0].as_str().ends_with("_front.jpg"));
        assert!(locators[1].as_str().ends_with("_back.jpg"));
    }

    #[test]
    fn upload_batch_stops_at_first_failure() {
        let sink = RecordingSink {
            keys: Mutex::new(Vec::new()),
            fail_after: 1,
        };
        let mut batch = Batch::default();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            batch.add(PreviewEntry::new(image(name, name.as_bytes()))).unwrap();
        }

        let result = upload_batch(&sink, &batch);

        assert!(matches!(result, Err(UploadError::Rejected { .. })));
        assert_eq!(sink.keys.lock().unwrap().len(), 1);
    }

    #[test]
    fn empty_batch_uploads_nothing() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectorySink::new(tmp.path(), "file://uploads");
        assert!(upload_batch(&sink, &Batch::default()).unwrap().is_empty());
    }

    #[test]
    fn existing_locators_come_first() {
        let sink = RecordingSink {
            keys: Mutex::new(Vec::new()),
            fail_after: usize::MAX,
        };
        let mut batch = Batch::with_existing(
            Default::default(),
            vec![
                Locator::new("https://cdn.example/old-1.jpg"),
                Locator::new("https://cdn.example/old-2.jpg"),
                Locator::new("https://cdn.example/old-3.jpg"),
            ],
        );
        batch.remove_existing(1);
        batch.add(PreviewEntry::new(image("new.jpg", b"n"))).unwrap();

        let locators = upload_batch(&sink, &batch).unwrap();

        let urls: Vec<_> = locators.iter().map(Locator::as_str).collect();
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0], "https://cdn.example/old-1.jpg");
        assert_eq!(urls[1], "https://cdn.example/old-3.jpg");
        assert!(urls[2].starts_with("mem://") && urls[2].ends_with("_new.jpg"));
        assert_eq!(sink.keys.lock().unwrap().len(), 1);
    }

    #[test]
    fn existing_only_batch_stores_nothing() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectorySink::new(tmp.path(), "file://uploads");
        let batch = Batch::with_existing(Default::default(), vec![Locator::new("https://x/a.jpg")]);

        let locators = upload_batch(&sink, &batch).unwrap();

        assert_eq!(locators, vec![Locator::new("https://x/a.jpg")]);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
