//! Content-neutral display filenames.
//!
//! Uploaded names can carry personal details ("IMG_alice_birthday.jpg") and
//! collide across guests, so every display artifact gets a random v4 UUID.

use std::path::Path;
use uuid::Uuid;

/// Lower-cased extension of `original_filename`, including the leading dot.
///
/// Returns an empty string when there is no extension.
pub fn normalized_extension(original_filename: &str) -> String {
    Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Generate a display filename for an upload: `<uuid-v4><.ext>`.
pub fn new_filename(original_filename: &str) -> String {
    let filename = format!("{}{}", Uuid::new_v4(), normalized_extension(original_filename));
    tracing::info!("Renamed {} → {}", original_filename, filename);
    filename
}
