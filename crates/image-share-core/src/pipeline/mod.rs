//! Photo processing pipeline components.
//!
//! Stages, leaf to root:
//! - **orientation**: bake EXIF rotation into pixel data
//! - **naming**: generate content-neutral display filenames
//! - **decode**: load and decode uploads on the blocking pool
//! - **in_flight**: claims that keep two attempts off the same file
//! - **processor**: one file from upload to display (or failed) directory
//! - **batch**: bounded concurrent fan-out of a poll cycle
//! - **discovery**: find uploads in the input directory
//! - **poller**: the long-running monitoring loop

pub mod batch;
pub mod decode;
pub mod discovery;
pub mod in_flight;
pub mod naming;
pub mod orientation;
pub mod poller;
pub mod processor;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-exports for convenient access
pub use batch::BatchScheduler;
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use in_flight::{InFlightGuard, InFlightSet};
pub use naming::new_filename;
pub use orientation::{Normalized, Orientation, OrientationNormalizer};
pub use poller::DirectoryPoller;
pub use processor::{PhotoProcessor, ProcessingStage};
