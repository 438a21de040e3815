//! Pipeline directory layout and the display listing.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::config::{Config, ProcessingConfig};
use crate::types::DisplayImage;

/// The three directories the pipeline moves files between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    /// Uploads waiting to be processed
    pub raw_dir: PathBuf,
    /// Finalized images, named by generated identifier
    pub display_dir: PathBuf,
    /// Originals that failed, under their upload names
    pub failed_dir: PathBuf,
}

impl StorageLayout {
    /// Resolve the layout from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            raw_dir: config.resolve_dir(&config.storage.raw_dir),
            display_dir: config.resolve_dir(&config.storage.display_dir),
            failed_dir: config.resolve_dir(&config.storage.failed_dir),
        }
    }

    /// Default directory names under an arbitrary root.
    pub fn under(root: &Path) -> Self {
        Self {
            raw_dir: root.join("raw_images"),
            display_dir: root.join("display_images"),
            failed_dir: root.join("failed_images"),
        }
    }

    /// Create all three directories. Safe to call repeatedly.
    ///
    /// Must run before the poller's first cycle.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.raw_dir, &self.display_dir, &self.failed_dir] {
            std::fs::create_dir_all(dir)?;
            tracing::info!("Ensured directory exists: {}", dir.display());
        }
        Ok(())
    }
}

/// List display images, oldest first.
///
/// A missing directory is reported as a warning and yields an empty list;
/// unreadable entries are skipped.
pub fn list_display_images(display_dir: &Path, processing: &ProcessingConfig) -> Vec<DisplayImage> {
    let mut files: Vec<(SystemTime, String)> = Vec::new();

    for entry in WalkDir::new(display_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                tracing::warn!(
                    "Display images directory unavailable: {} ({e})",
                    display_dir.display()
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let supported = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| processing.is_supported_extension(ext))
            .unwrap_or(false);
        if !supported {
            continue;
        }
        if let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) {
            files.push((modified, name));
        }
    }

    files.sort();

    let photos: Vec<DisplayImage> = files
        .into_iter()
        .map(|(modified, name)| {
            let id = Path::new(&name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&name)
                .to_string();
            DisplayImage {
                id,
                url: format!("/images/{name}"),
                created_at: DateTime::<Utc>::from(modified).to_rfc3339(),
            }
        })
        .collect();

    tracing::info!("Fetched {} photos from display directory", photos.len());
    photos
}
