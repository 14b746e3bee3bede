//! Dropzone configuration.
//!
//! Field names follow the option names used by browser hosts (`maxSize`,
//! `enableCrop`, ...) so a plain JS object deserializes directly into
//! [`DropzoneConfig`]. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::{parse_accept, ValidationRules};

/// Default upload size limit (5 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

/// Default number of files a dropzone may hold.
pub const DEFAULT_MAX_FILES: usize = 5;

/// Errors raised by an invalid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid accept pattern: {0:?}")]
    InvalidAcceptPattern(String),

    #[error("maxFiles must be at least 1")]
    ZeroMaxFiles,

    #[error("maxSize must be greater than zero")]
    ZeroMaxSize,

    #[error("aspectRatio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f64),
}

/// Which accepted images of a drop are routed through the crop editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CropScope {
    /// Only the first accepted image of each drop is cropped.
    #[default]
    FirstImage,
    /// Every accepted image is cropped, one session at a time.
    EveryImage,
}

/// Options recognized by the dropzone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropzoneConfig {
    /// Comma-separated MIME types, `type/*` wildcards and `.ext` patterns.
    /// An empty string accepts everything.
    pub accept: String,
    /// Maximum size of a single file in bytes.
    pub max_size: u64,
    /// Maximum number of files held at once.
    pub max_files: usize,
    /// Whether one drop may add more than one file.
    pub multiple: bool,
    /// Route accepted images through the crop editor before upload.
    pub enable_crop: bool,
    /// Output aspect ratio (width / height) of the crop editor.
    pub aspect_ratio: f64,
    /// Ignore drops entirely.
    pub disabled: bool,
    pub crop_scope: CropScope,
}

impl Default for DropzoneConfig {
    fn default() -> Self {
        Self {
            accept: "image/*".to_string(),
            max_size: DEFAULT_MAX_SIZE,
            max_files: DEFAULT_MAX_FILES,
            multiple: true,
            enable_crop: false,
            aspect_ratio: 1.0,
            disabled: false,
            crop_scope: CropScope::FirstImage,
        }
    }
}

impl DropzoneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every option is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules().map(|_| ())
    }

    /// Build the validation rule set, checking the configuration on the way.
    pub fn rules(&self) -> Result<ValidationRules, ConfigError> {
        if self.max_files == 0 {
            return Err(ConfigError::ZeroMaxFiles);
        }
        if self.max_size == 0 {
            return Err(ConfigError::ZeroMaxSize);
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidAspectRatio(self.aspect_ratio));
        }

        Ok(ValidationRules {
            max_size_bytes: self.max_size,
            max_files: self.max_files,
            accepted: parse_accept(&self.accept)?,
            allow_multiple: self.multiple,
        })
    }
}
