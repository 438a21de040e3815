//! Error types for the Image Share processing pipeline.
//!
//! Errors are split by scope: configuration, directory discovery, and the
//! per-item taxonomy that decides where a file ends up.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Image Share operations.
#[derive(Error, Debug)]
pub enum ImageShareError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by the pipeline machinery around individual items.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input directory could not be listed
    #[error("Discovery failed for {path}: {message}")]
    Discovery { path: PathBuf, message: String },
}

/// Why a single item failed to process.
///
/// Every variant up to and including `Persist` routes the original file to
/// the failed directory. The remaining variants are logged and never change
/// the outcome of an item.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The file could not be decoded as an image
    #[error("Corrupted image {path}: {message}")]
    CorruptImage { path: PathBuf, message: String },

    /// File size or pixel dimensions exceed the configured limits
    #[error("Image too large: {path} ({detail})")]
    TooLarge { path: PathBuf, detail: String },

    /// Decoding did not finish in time
    #[error("Timeout decoding {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// Unexpected I/O failure while reading the original
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The normalized artifact could not be encoded or written
    #[error("Failed to persist {path}: {message}")]
    Persist { path: PathBuf, message: String },

    /// Orientation metadata was present but unreadable
    #[error("Failed to read EXIF data: {0}")]
    MetadataParse(String),

    /// The original could not be removed after a successful write
    #[error("Failed to delete original {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The original could not be relocated to the failed directory
    #[error("Failed to move {path} to failed directory: {source}")]
    MoveToFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CorruptImage { .. } => "corrupt_image",
            Self::TooLarge { .. } => "too_large",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io",
            Self::Persist { .. } => "persist",
            Self::MetadataParse(_) => "metadata_parse",
            Self::Delete { .. } => "delete",
            Self::MoveToFailed { .. } => "move_to_failed",
        }
    }
}

/// Convenience type alias for Image Share results.
pub type Result<T> = std::result::Result<T, ImageShareError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
