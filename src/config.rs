//! Intake configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! max_width = 1920          # Bounding box width (px)
//! max_height = 1080         # Bounding box height (px)
//! quality = 0.85            # JPEG quality, fraction in (0, 1]
//!
//! [batch]
//! max_files = 10            # Photos per listing
//! max_file_bytes = 5242880  # Per-file limit before normalization (5 MiB)
//!
//! [upload]
//! public_base = "file://uploads"  # Prefix of returned locators
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::batch::{AdmissionLimits, DEFAULT_MAX_FILE_BYTES, DEFAULT_MAX_FILES};
use crate::imaging::{BoundingBox, NormalizeParams, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Intake configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeConfig {
    /// Bounding box and JPEG quality.
    pub images: ImagesConfig,
    /// Admission limits for a listing's photo batch.
    pub batch: BatchConfig,
    /// Where uploaded photos are said to live.
    pub upload: UploadConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl IntakeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.max_width == 0 || self.images.max_height == 0 {
            return Err(ConfigError::Validation(
                "images.max_width and images.max_height must be non-zero".into(),
            ));
        }
        if !(self.images.quality > 0.0 && self.images.quality <= 1.0) {
            return Err(ConfigError::Validation(
                "images.quality must be in (0, 1]".into(),
            ));
        }
        if self.batch.max_files == 0 {
            return Err(ConfigError::Validation(
                "batch.max_files must be non-zero".into(),
            ));
        }
        if self.batch.max_file_bytes == 0 {
            return Err(ConfigError::Validation(
                "batch.max_file_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn normalize_params(&self) -> NormalizeParams {
        NormalizeParams {
            bounds: BoundingBox::new(self.images.max_width, self.images.max_height),
            quality: Quality::new(self.images.quality),
        }
    }

    pub fn admission_limits(&self) -> AdmissionLimits {
        AdmissionLimits {
            max_files: self.batch.max_files,
            max_file_bytes: self.batch.max_file_bytes,
        }
    }
}

/// Normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// JPEG quality as a fraction (0 exclusive, 1 = best).
    pub quality: f32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 0.85,
        }
    }
}

/// Admission limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Prefix joined with the storage key to form a photo's locator.
    pub public_base: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            public_base: "file://uploads".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel normalization workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// The built-in defaults as a TOML tree, the base every user file lands on.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(IntakeConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Lay a sparse user config over the defaults.
///
/// Sections are combined key by key, so `[images] quality = 0.7` keeps the
/// default `max_width`. Any other value from the user replaces the default
/// outright.
pub fn merge_toml(defaults: toml::Value, user: toml::Value) -> toml::Value {
    let user_section = match user {
        toml::Value::Table(table) => table,
        other => return other,
    };
    let mut section = match defaults {
        toml::Value::Table(table) => table,
        _ => return toml::Value::Table(user_section),
    };
    for (key, value) in user_section {
        let combined = match section.remove(&key) {
            Some(default) => merge_toml(default, value),
            None => value,
        };
        section.insert(key, combined);
    }
    toml::Value::Table(section)
}

/// Parse the user's `config.toml` in `dir`, if there is one.
///
/// A missing file is not an error: the CLI runs on defaults.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Turn defaults plus an optional user file into a checked [`IntakeConfig`].
///
/// Unknown keys surface here as [`ConfigError::Toml`], bad values as
/// [`ConfigError::Validation`].
pub fn resolve_config(
    defaults: toml::Value,
    user: Option<toml::Value>,
) -> Result<IntakeConfig, ConfigError> {
    let merged = user.into_iter().fold(defaults, merge_toml);
    let config: IntakeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<IntakeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Listing Photos Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Normalization
# ---------------------------------------------------------------------------
[images]
# Photos larger than this box are scaled down (aspect ratio kept).
# Smaller photos keep their size; nothing is ever upscaled.
max_width = 1920
max_height = 1080

# JPEG quality as a fraction: 0 exclusive, 1 = best.
quality = 0.85

# ---------------------------------------------------------------------------
# Batch admission
# ---------------------------------------------------------------------------
[batch]
# Maximum photos per listing. Extra files in a selection are skipped.
max_files = 10

# Files larger than this (in bytes, before normalization) are skipped.
max_file_bytes = 5242880

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# Prefix of the locator returned for each stored photo.
public_base = "file://uploads"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel normalization workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
