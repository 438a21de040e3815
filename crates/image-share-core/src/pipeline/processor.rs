//! Single-item processing: claim, decode, normalize, persist, finalize.
//!
//! Every uploaded file ends in exactly one place: its normalized copy in the
//! display directory (original deleted), or the untouched original in the
//! failed directory. No error escapes [`PhotoProcessor::process_item`].

use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Config;
use crate::error::ProcessError;
use crate::storage::StorageLayout;
use crate::types::ItemOutcome;

use super::decode::{format_to_string, output_format, ImageDecoder};
use super::in_flight::InFlightSet;
use super::naming::new_filename;
use super::orientation::OrientationNormalizer;

/// Stages an item passes through on its way to a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Claimed,
    Decoding,
    Normalizing,
    Persisting,
    Finalizing,
}

/// Processes one uploaded image at a time; share it behind an `Arc`.
pub struct PhotoProcessor {
    decoder: ImageDecoder,
    layout: StorageLayout,
    in_flight: InFlightSet,
}

impl PhotoProcessor {
    /// Create a processor writing into `layout` and claiming names in `in_flight`.
    pub fn new(config: &Config, layout: StorageLayout, in_flight: InFlightSet) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            layout,
            in_flight,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    /// Process a single image and report whether it reached the display directory.
    pub async fn process(&self, path: &Path) -> bool {
        self.process_item(path).await.is_success()
    }

    /// Process a single image through the full pipeline.
    pub async fn process_item(&self, path: &Path) -> ItemOutcome {
        let start = Instant::now();
        let Some(original) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            let reason = ProcessError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
            };
            tracing::error!(kind = reason.kind(), "{reason}");
            return ItemOutcome::Failed { reason };
        };

        // Held until this function returns or its future is dropped.
        let Some(_claim) = self.in_flight.claim(&original) else {
            tracing::debug!("Skipping {original}: already being processed");
            return ItemOutcome::AlreadyInFlight;
        };
        trace_stage(&original, ProcessingStage::Claimed);
        tracing::info!("Processing: {original}");

        match self.convert(path, &original).await {
            Ok((output, corrected)) => {
                trace_stage(&original, ProcessingStage::Finalizing);
                if let Err(e) = tokio::fs::remove_file(path).await {
                    let e = ProcessError::Delete {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    tracing::error!(kind = e.kind(), "{e}");
                }

                let duration = start.elapsed();
                tracing::info!(
                    "Successfully processed {original} in {}ms",
                    duration.as_millis()
                );
                ItemOutcome::Succeeded {
                    output,
                    corrected,
                    duration,
                }
            }
            Err(reason) => {
                match &reason {
                    ProcessError::CorruptImage { message, .. } => {
                        tracing::error!(kind = reason.kind(), "Corrupted image: {original} - {message}");
                    }
                    other => {
                        tracing::error!(
                            kind = other.kind(),
                            "Unexpected error processing {original}: {other}"
                        );
                    }
                }
                self.move_to_failed(path, &original).await;
                ItemOutcome::Failed { reason }
            }
        }
    }

    /// Decode, normalize and persist. Returns the artifact path and whether
    /// an orientation correction was applied.
    async fn convert(&self, path: &Path, original: &str) -> Result<(PathBuf, bool), ProcessError> {
        trace_stage(original, ProcessingStage::Decoding);
        let decoded = self.decoder.decode(path).await?;
        tracing::debug!(
            "Decoded {original}: {}x{} {}",
            decoded.width,
            decoded.height,
            decoded
                .format
                .map(format_to_string)
                .unwrap_or_else(|| "unknown".to_string())
        );

        let persist_err = |message: String| ProcessError::Persist {
            path: path.to_path_buf(),
            message,
        };

        let format = output_format(decoded.format, path)
            .ok_or_else(|| persist_err("No encoder for this format".to_string()))?;
        let filename = new_filename(original);
        let output = self.layout.display_dir.join(&filename);

        trace_stage(original, ProcessingStage::Normalizing);
        let (encoded, corrected) = tokio::task::spawn_blocking(move || {
            let normalized = OrientationNormalizer::normalize(decoded.image, &decoded.bytes);
            encode(&normalized.image, format).map(|bytes| (bytes, normalized.corrected))
        })
        .await
        .map_err(|e| persist_err(format!("Task join error: {e}")))?
        .map_err(|e| persist_err(e.to_string()))?;

        if corrected {
            tracing::info!("Applied EXIF orientation correction to {filename}");
        }

        trace_stage(original, ProcessingStage::Persisting);
        if let Err(e) = tokio::fs::write(&output, &encoded).await {
            // No truncated artifact may remain in the display directory.
            match tokio::fs::remove_file(&output).await {
                Ok(()) => {}
                Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
                Err(cleanup) => tracing::warn!(
                    "Could not remove partial artifact {}: {cleanup}",
                    output.display()
                ),
            }
            return Err(persist_err(format!("{}: {e}", output.display())));
        }

        Ok((output, corrected))
    }

    /// Relocate an untouched original to the failed directory, if it still exists.
    async fn move_to_failed(&self, path: &Path, original: &str) {
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::error!("Cannot check {} before moving: {e}", path.display());
                return;
            }
        }

        let failed_path = self.layout.failed_dir.join(original);
        match tokio::fs::rename(path, &failed_path).await {
            Ok(()) => tracing::info!("Moved failed image {original} to failed directory"),
            Err(source) => {
                let e = ProcessError::MoveToFailed {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::error!(kind = e.kind(), "{e}");
            }
        }
    }
}

fn trace_stage(original: &str, stage: ProcessingStage) {
    tracing::trace!(file = original, ?stage, "stage transition");
}

fn encode(image: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures;
    use crate::pipeline::orientation::read_orientation;
    use image::GenericImageView;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn setup() -> (TempDir, PhotoProcessor) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::under(dir.path());
        layout.ensure().unwrap();
        let processor = PhotoProcessor::new(&Config::default(), layout, InFlightSet::new());
        (dir, processor)
    }

    fn list(dir: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        entries.sort();
        entries
    }

    fn assert_generated_name(path: &Path, ext: &str) {
        let name = path.file_name().unwrap().to_str().unwrap();
        let stem = name.strip_suffix(ext).expect("extension preserved");
        assert_eq!(Uuid::parse_str(stem).unwrap().get_version_num(), 4);
    }

    #[tokio::test]
    async fn test_process_jpeg_moves_to_display() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("test_photo.jpg");
        std::fs::write(
            &input,
            fixtures::encode(&fixtures::gradient(20, 10), ImageFormat::Jpeg),
        )
        .unwrap();

        assert!(processor.process(&input).await);
        assert!(!input.exists());
        assert!(list(&layout.raw_dir).is_empty());
        assert!(list(&layout.failed_dir).is_empty());

        let display = list(&layout.display_dir);
        assert_eq!(display.len(), 1);
        assert_generated_name(&display[0], ".jpg");
        let bytes = std::fs::read(&display[0]).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_process_preserves_png_format() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("Screenshot.PNG");
        let rgba = DynamicImage::new_rgba8(16, 16);
        std::fs::write(&input, fixtures::encode(&rgba, ImageFormat::Png)).unwrap();

        assert!(processor.process(&input).await);
        let display = list(&layout.display_dir);
        assert_eq!(display.len(), 1);
        assert_generated_name(&display[0], ".png");
        let bytes = std::fs::read(&display[0]).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_corrupted_file_moves_to_failed_unchanged() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("corrupted.jpg");
        std::fs::write(&input, b"This is not an image").unwrap();

        let outcome = processor.process_item(&input).await;
        assert!(matches!(
            outcome,
            ItemOutcome::Failed {
                reason: ProcessError::CorruptImage { .. }
            }
        ));
        assert!(list(&layout.raw_dir).is_empty());
        assert!(list(&layout.display_dir).is_empty());
        assert_eq!(
            list(&layout.failed_dir),
            vec![layout.failed_dir.join("corrupted.jpg")]
        );
        assert_eq!(
            std::fs::read(layout.failed_dir.join("corrupted.jpg")).unwrap(),
            b"This is not an image"
        );
    }

    #[tokio::test]
    async fn test_orientation_is_baked_in() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("portrait.jpg");
        std::fs::write(&input, fixtures::jpeg_with_orientation(8, 4, 6)).unwrap();

        let (output, corrected) = match processor.process_item(&input).await {
            ItemOutcome::Succeeded {
                output, corrected, ..
            } => (output, corrected),
            other => panic!("expected success, got {other:?}"),
        };
        assert!(corrected);

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(read_orientation(&bytes).unwrap(), None);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 8));
    }

    #[tokio::test]
    async fn test_claimed_name_is_not_processed_twice() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("busy.jpg");
        std::fs::write(
            &input,
            fixtures::encode(&fixtures::gradient(4, 4), ImageFormat::Jpeg),
        )
        .unwrap();

        let guard = processor.in_flight().claim("busy.jpg").unwrap();
        let outcome = processor.process_item(&input).await;
        assert!(matches!(outcome, ItemOutcome::AlreadyInFlight));
        assert!(input.exists());
        assert!(list(&layout.display_dir).is_empty());

        drop(guard);
        assert!(processor.process(&input).await);
    }

    #[tokio::test]
    async fn test_claim_released_on_every_path() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let good = layout.raw_dir.join("good.jpg");
        let bad = layout.raw_dir.join("bad.jpg");
        std::fs::write(
            &good,
            fixtures::encode(&fixtures::gradient(4, 4), ImageFormat::Jpeg),
        )
        .unwrap();
        std::fs::write(&bad, b"Not an image").unwrap();

        assert!(processor.process(&good).await);
        assert!(!processor.process(&bad).await);
        assert!(processor.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_routes_to_failed() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("nowhere.jpg");
        let original = fixtures::encode(&fixtures::gradient(4, 4), ImageFormat::Jpeg);
        std::fs::write(&input, &original).unwrap();
        std::fs::remove_dir(&layout.display_dir).unwrap();

        let outcome = processor.process_item(&input).await;
        assert!(matches!(
            outcome,
            ItemOutcome::Failed {
                reason: ProcessError::Persist { .. }
            }
        ));
        assert!(!input.exists());
        assert_eq!(
            std::fs::read(layout.failed_dir.join("nowhere.jpg")).unwrap(),
            original
        );
    }

    #[tokio::test]
    async fn test_vanished_file_fails_without_move() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("ghost.jpg");

        let outcome = processor.process_item(&input).await;
        assert!(matches!(
            outcome,
            ItemOutcome::Failed {
                reason: ProcessError::Io { .. }
            }
        ));
        assert!(list(&layout.failed_dir).is_empty());
    }

    #[tokio::test]
    async fn test_same_upload_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let shared = StorageLayout::under(dir.path());
        shared.ensure().unwrap();

        let mut processors = Vec::new();
        for guest in ["guest_a", "guest_b"] {
            let raw_dir = dir.path().join(guest);
            std::fs::create_dir(&raw_dir).unwrap();
            std::fs::write(
                raw_dir.join("IMG_0001.jpg"),
                fixtures::encode(&fixtures::gradient(6, 6), ImageFormat::Jpeg),
            )
            .unwrap();
            let layout = StorageLayout {
                raw_dir,
                ..shared.clone()
            };
            processors.push(Arc::new(PhotoProcessor::new(
                &Config::default(),
                layout,
                InFlightSet::new(),
            )));
        }

        let handles: Vec<_> = processors
            .iter()
            .map(|p| {
                let p = Arc::clone(p);
                tokio::spawn(async move {
                    let input = p.layout().raw_dir.join("IMG_0001.jpg");
                    p.process(&input).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(list(&shared.display_dir).len(), 2);
    }

    #[tokio::test]
    async fn test_path_without_file_name_is_not_claimed() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();

        let outcome = processor.process_item(&layout.raw_dir.join("..")).await;
        assert!(matches!(
            outcome,
            ItemOutcome::Failed {
                reason: ProcessError::Io { .. }
            }
        ));
        assert!(processor.in_flight().is_empty());
        assert!(list(&layout.failed_dir).is_empty());
    }

    #[tokio::test]
    async fn test_move_to_failed_error_leaves_original_in_place() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("bad.jpg");
        std::fs::write(&input, b"Not an image").unwrap();
        std::fs::remove_dir(&layout.failed_dir).unwrap();

        assert!(!processor.process(&input).await);
        assert_eq!(std::fs::read(&input).unwrap(), b"Not an image");
        assert!(list(&layout.display_dir).is_empty());
        assert!(processor.in_flight().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_failure_keeps_success() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("stuck.jpg");
        std::fs::write(
            &input,
            fixtures::encode(&fixtures::gradient(4, 4), ImageFormat::Jpeg),
        )
        .unwrap();

        let set_mode = |mode| {
            std::fs::set_permissions(&layout.raw_dir, std::fs::Permissions::from_mode(mode))
                .unwrap()
        };
        set_mode(0o555);
        // Permission bits do not bind root.
        if std::fs::write(layout.raw_dir.join(".write_check"), b"").is_ok() {
            set_mode(0o755);
            return;
        }

        let outcome = processor.process_item(&input).await;
        set_mode(0o755);

        let output = match outcome {
            ItemOutcome::Succeeded { output, .. } => output,
            other => panic!("expected success, got {other:?}"),
        };
        assert!(output.exists());
        assert!(input.exists());
        assert_eq!(list(&layout.display_dir), vec![output]);
        assert!(list(&layout.failed_dir).is_empty());
        assert!(processor.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_success_logs_start_rename_and_duration() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("party.jpg");
        std::fs::write(&input, fixtures::jpeg_with_orientation(8, 4, 6)).unwrap();

        let logs = fixtures::CapturedLogs::default();
        let _guard = logs.install();
        let output = match processor.process_item(&input).await {
            ItemOutcome::Succeeded { output, .. } => output,
            other => panic!("expected success, got {other:?}"),
        };
        let generated = output.file_name().unwrap().to_str().unwrap().to_string();

        let text = logs.contents();
        assert!(text.contains("Processing: party.jpg"));
        assert!(text.contains(&format!("Renamed party.jpg → {generated}")));
        assert!(text.contains(&format!("Applied EXIF orientation correction to {generated}")));
        assert!(text.contains("Successfully processed party.jpg in "));
    }

    #[tokio::test]
    async fn test_corrupt_image_is_logged() {
        let (_dir, processor) = setup();
        let layout = processor.layout().clone();
        let input = layout.raw_dir.join("corrupted.jpg");
        std::fs::write(&input, b"This is not an image").unwrap();

        let logs = fixtures::CapturedLogs::default();
        let _guard = logs.install();
        assert!(!processor.process(&input).await);

        let text = logs.contents();
        assert!(text.contains("Corrupted image: corrupted.jpg - "));
        assert!(text.contains("Moved failed image corrupted.jpg to failed directory"));
    }
}
