//! Core data types produced by the Image Share pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ProcessError;

/// Terminal result of one processing attempt.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The normalized image was written to the display directory.
    Succeeded {
        /// Path of the new display artifact
        output: PathBuf,
        /// Whether an EXIF orientation correction was applied
        corrected: bool,
        /// Wall time from claim to finalize
        duration: Duration,
    },

    /// The original was routed to the failed directory (if it still existed).
    Failed { reason: ProcessError },

    /// Another attempt already owns this filename; nothing was touched.
    AlreadyInFlight,
}

impl ItemOutcome {
    /// Collapse the outcome to the boolean reported by batches.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// An image available in the display directory.
///
/// Mirrors the record the carousel API serves for each photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayImage {
    /// Opaque identifier (the generated filename stem)
    pub id: String,

    /// URL path the file server exposes the image under
    pub url: String,

    /// File modification time, RFC 3339 in UTC
    pub created_at: String,
}

/// Summary of a single poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Recognized images present in the input directory
    pub discovered: usize,
    /// Images handed to the batch scheduler
    pub submitted: usize,
    /// Images that reached the display directory
    pub succeeded: usize,
    /// Images that were admitted but did not succeed
    pub failed: usize,
}
