//! In-memory image fixtures shared by the pipeline unit tests.

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// An RGB gradient so that transforms are observable.
pub(crate) fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 40) as u8, (y * 40) as u8, 128])
    }))
}

pub(crate) fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// Big-endian TIFF block with a single Orientation (0x0112) SHORT entry.
fn exif_segment(orientation: u16) -> Vec<u8> {
    let mut segment = vec![0xFF, 0xE1, 0x00, 0x22];
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(b"MM\0\x2a\0\0\0\x08");
    segment.extend_from_slice(&[0x00, 0x01]);
    segment.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    segment.extend_from_slice(&orientation.to_be_bytes());
    segment.extend_from_slice(&[0x00, 0x00]);
    segment.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    segment
}

/// Insert an APP1 segment directly after the JPEG SOI marker.
fn splice_after_soi(jpeg: Vec<u8>, segment: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let mut out = Vec::with_capacity(jpeg.len() + segment.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A JPEG carrying the given EXIF orientation value.
pub(crate) fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = encode(&gradient(width, height), ImageFormat::Jpeg);
    splice_after_soi(jpeg, &exif_segment(orientation))
}

/// A decodable JPEG whose EXIF block has an invalid TIFF header.
pub(crate) fn jpeg_with_broken_exif(width: u32, height: u32) -> Vec<u8> {
    let mut segment = vec![0xFF, 0xE1, 0x00, 0x10];
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(b"XXXXXXXX");
    let jpeg = encode(&gradient(width, height), ImageFormat::Jpeg);
    splice_after_soi(jpeg, &segment)
}

/// Collects formatted log output for assertions.
///
/// Install with [`CapturedLogs::install`] on a current-thread runtime; lines
/// emitted from the blocking pool are not captured.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        let buffer = self.0.lock().unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
