//! File naming for normalized images and upload keys.
//!
//! Normalized output is always JPEG, so the original stem is kept and the
//! extension becomes `.jpg`:
//! - `living-room.png` → `living-room.jpg`
//! - `IMG_0042.HEIC.jpeg` → `IMG_0042.HEIC.jpg`
//! - `.jpg` / empty → `image.jpg`
//!
//! Upload keys are content-addressed: the first 16 hex digits of the JPEG's
//! SHA-256, then a URL-safe version of the stem. Re-uploading the same photo
//! yields the same key.

use crate::types::NormalizedImage;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Stem used when a file name has none.
const FALLBACK_STEM: &str = "image";

/// Number of hex digits of the content hash kept in a storage key.
const KEY_HASH_LEN: usize = 16;

fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .unwrap_or(FALLBACK_STEM)
}

/// Name of the normalized file: original stem + `.jpg`.
pub fn normalized_file_name(original: &str) -> String {
    format!("{}.jpg", stem_of(original))
}

/// Reduce a stem to `[a-z0-9_-]`, collapsing everything else to single dashes.
fn slugify(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        slug.to_string()
    }
}

/// Destination key for the upload sink.
pub fn storage_key(image: &NormalizedImage) -> String {
    let digest = format!("{:x}", Sha256::digest(&image.bytes));
    format!(
        "{}_{}.jpg",
        &digest[..KEY_HASH_LEN],
        slugify(stem_of(&image.file_name))
    )
}
