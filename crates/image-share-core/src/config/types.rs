//! Sub-configuration structs with defaults matching the deployed service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the three pipeline directories live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Common root for the pipeline directories
    pub root: PathBuf,

    /// Uploads land here (relative paths are joined to `root`)
    pub raw_dir: PathBuf,

    /// Finalized images served to the carousel
    pub display_dir: PathBuf,

    /// Originals that failed processing, kept for inspection
    pub failed_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/image-share-data"),
            raw_dir: PathBuf::from("raw_images"),
            display_dir: PathBuf::from("display_images"),
            failed_dir: PathBuf::from("failed_images"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum images admitted (and processed concurrently) per poll cycle
    pub max_concurrent: usize,

    /// Seconds between directory polls
    pub poll_interval_secs: u64,

    /// Recognized input extensions, matched case-insensitively
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            poll_interval_secs: 10,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "heic".to_string(),
            ],
        }
    }
}

impl ProcessingConfig {
    /// Check if a file extension (without the dot) is recognized.
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_formats
            .iter()
            .any(|fmt| fmt.to_lowercase() == ext_lower)
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 25,
            max_image_dimension: 20000,
            decode_timeout_ms: 30000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
