//! Image Share Core - the background photo processing pipeline.
//!
//! Guests upload photos into a raw directory. This crate watches that
//! directory, bakes EXIF orientation into each image, renames it to a random
//! identifier and moves it to the display directory the carousel reads from.
//! Anything that cannot be processed is moved, untouched, to a failed
//! directory for inspection.
//!
//! # Architecture
//!
//! ```text
//! Poller → Discovery → BatchScheduler → PhotoProcessor → Decode → Normalize
//!                                                      ↘ display/ | failed/
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use image_share_core::{Config, ImageShare};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> image_share_core::Result<()> {
//!     let share = ImageShare::new(Config::load()?);
//!     share.ensure_storage()?;
//!     share.run(CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ImageShareError, PipelineError, PipelineResult, ProcessError, Result};
pub use pipeline::{BatchScheduler, DirectoryPoller, InFlightSet, PhotoProcessor};
pub use storage::{list_display_images, StorageLayout};
pub use types::{CycleReport, DisplayImage, ItemOutcome};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The assembled pipeline: one in-flight set shared by the poller and the
/// processor, wired to the configured directories.
pub struct ImageShare {
    config: Config,
    layout: StorageLayout,
    poller: DirectoryPoller,
}

impl ImageShare {
    /// Wire the pipeline from configuration. Touches no files.
    pub fn new(config: Config) -> Self {
        let layout = StorageLayout::from_config(&config);
        let processor = PhotoProcessor::new(&config, layout.clone(), InFlightSet::new());
        let scheduler = BatchScheduler::new(Arc::new(processor), config.processing.max_concurrent);
        let poller = DirectoryPoller::new(&config, scheduler);
        tracing::debug!("Initialized Image Share v{}", VERSION);
        Self {
            config,
            layout,
            poller,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Create the raw, display and failed directories.
    pub fn ensure_storage(&self) -> Result<()> {
        self.layout.ensure()?;
        Ok(())
    }

    /// Run the monitoring loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        self.poller.run(cancel).await
    }

    /// Run a single poll cycle.
    pub async fn poll_once(&self) -> Result<CycleReport> {
        Ok(self.poller.poll_once().await?)
    }

    /// Everything currently in the display directory, oldest first.
    pub fn list_photos(&self) -> Vec<DisplayImage> {
        list_display_images(&self.layout.display_dir, &self.config.processing)
    }
}
