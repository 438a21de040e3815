//! Image decoding with format detection, limits, and timeout support.

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::ProcessError;

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Format sniffed from the content, if any
    pub format: Option<ImageFormat>,
    /// Original file contents (kept for metadata parsing)
    pub bytes: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode an image file.
    ///
    /// The decode itself runs on the blocking pool so that slow images never
    /// stall the runtime driving the poll timer.
    pub async fn decode(&self, path: &Path) -> Result<DecodedImage, ProcessError> {
        let io_err = |source: std::io::Error| ProcessError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(ProcessError::TooLarge {
                path: path.to_path_buf(),
                detail: format!(
                    "{}MB > {}MB",
                    metadata.len() / (1024 * 1024),
                    self.limits.max_file_size_mb
                ),
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(io_err)?;
        self.decode_from_bytes(bytes, path).await
    }

    /// Decode an image from an in-memory byte buffer with limits and timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<DecodedImage, ProcessError> {
        let path_owned = path.to_path_buf();
        let max_dim = self.limits.max_image_dimension;
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_bytes_sync(bytes, &path_owned, max_dim))
                .await
        })
        .await;

        match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ProcessError::CorruptImage {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(ProcessError::Timeout {
                path: path.to_path_buf(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    fn decode_bytes_sync(
        bytes: Vec<u8>,
        path: &Path,
        max_dim: u32,
    ) -> Result<DecodedImage, ProcessError> {
        let corrupt = |message: String| ProcessError::CorruptImage {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = image::ImageReader::new(std::io::Cursor::new(&bytes[..]))
            .with_guessed_format()
            .map_err(|e| corrupt(format!("Cannot detect image format: {}", e)))?;

        // Content sniffing failed: trust the extension so the decoder reports
        // a real parse error instead of a generic "unsupported".
        let format = reader.format();
        if format.is_none() {
            let fallback = format_from_extension(path)
                .ok_or_else(|| corrupt("Unrecognized image format".to_string()))?;
            reader.set_format(fallback);
        }

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(max_dim);
        limits.max_image_height = Some(max_dim);
        reader.limits(limits);

        let image = reader.decode().map_err(|e| match e {
            ImageError::Limits(limit) => ProcessError::TooLarge {
                path: path.to_path_buf(),
                detail: limit.to_string(),
            },
            other => corrupt(other.to_string()),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            bytes,
            width,
            height,
        })
    }
}

/// Encoding implied by a file's extension.
///
/// `jpg` is normalized to the `jpeg` encoding; display serving relies on it.
pub fn format_from_extension(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let ext = if ext == "jpg" { "jpeg" } else { ext.as_str() };
    ImageFormat::from_extension(ext)
}

/// Pick the encoding for a display artifact: the detected format first, the
/// original extension second.
pub fn output_format(detected: Option<ImageFormat>, original: &Path) -> Option<ImageFormat> {
    detected.or_else(|| format_from_extension(original))
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
