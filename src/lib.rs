//! # Listing Photos
//!
//! Photo intake for property listings. Operators pick photos straight off a
//! phone or camera; this crate turns them into uniformly sized, reasonably
//! small JPEGs with inline previews, and hands the finished batch to storage.
//!
//! # Architecture: Three Steps Per Selection
//!
//! Every file-selection event goes through the same steps, each with its own
//! failure scope:
//!
//! ```text
//! 1. Admit      selection  →  accepted files     (count cap, size cap)
//! 2. Normalize  accepted   →  previews           (decode → fit → JPEG, in parallel)
//! 3. Commit     previews   →  batch              (selection order, generation checked)
//! ```
//!
//! Once the operator submits, [`upload::upload_batch`] stores each photo
//! through an [`upload::UploadSink`] and returns public locators in batch
//! order.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Fit-box math, the raster backend seam, and the single-image normalizer |
//! | [`batch`] | Admission limits, parallel normalization, preview list, generation tickets |
//! | [`preview`] | Preview entries: data URL plus before/after sizes |
//! | [`upload`] | Storage boundary: `UploadSink`, `DirectorySink`, locators |
//! | [`types`] | `SourceImage` and `NormalizedImage` |
//! | [`naming`] | Output file names and content-addressed storage keys |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting for progress, batches, and uploads |
//!
//! # Design Decisions
//!
//! ## JPEG Out, Whatever Comes In
//!
//! Every accepted photo comes out as a baseline JPEG, whatever it was
//! selected as. Listing photos are opaque by nature, so alpha is discarded
//! rather than composited.
//!
//! ## Fit, Never Upscale
//!
//! Photos are scaled down to fit a bounding box (1920x1080 by default) with
//! their aspect ratio kept. A photo already inside the box keeps its pixel
//! dimensions and is only re-encoded.
//!
//! ## Per-File Failures
//!
//! A selection is never rejected as a whole. Oversized, corrupt, or
//! over-the-cap files each produce a warning and the rest carry on.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, and encoding use the `image` crate behind the
//! [`imaging::RasterBackend`] trait. Tests swap in a recording fake so the
//! pipeline logic is checked without encoding real pixels.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod preview;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
