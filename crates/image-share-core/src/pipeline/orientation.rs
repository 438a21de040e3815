//! EXIF orientation normalization.
//!
//! Phones usually store pixels in sensor order and record how they should be
//! displayed in EXIF tag 274. The carousel renders pixels as-is, so the
//! rotation is baked into the pixel data here. Encoders in the `image` crate
//! write pixel data only, which drops the tag from the persisted artifact.

use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

use crate::error::ProcessError;

/// EXIF orientation values (tag 274).
///
/// Variant names describe the correction applied, not the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 1: already upright
    Normal,
    /// 2: mirror left to right
    FlipHorizontal,
    /// 3: upside down
    Rotate180,
    /// 4: mirror top to bottom
    FlipVertical,
    /// 5: mirror across the main diagonal
    Transpose,
    /// 6: rotate 90° clockwise
    Rotate90,
    /// 7: mirror across the anti-diagonal
    Transverse,
    /// 8: rotate 90° counter-clockwise
    Rotate270,
}

impl Orientation {
    /// Map a raw tag value. Values outside 1..=8 are not orientations.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// The raw tag value for this orientation.
    pub fn to_exif(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    pub fn is_identity(self) -> bool {
        self == Self::Normal
    }

    /// Apply the correction to an image.
    ///
    /// `image`'s `rotate90` turns clockwise, so 6 maps to `rotate90` and 8 to
    /// `rotate270`. Quarter turns swap width and height.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => image,
            Self::FlipHorizontal => image.fliph(),
            Self::Rotate180 => image.rotate180(),
            Self::FlipVertical => image.flipv(),
            Self::Transpose => image.rotate90().fliph(),
            Self::Rotate90 => image.rotate90(),
            Self::Transverse => image.rotate270().fliph(),
            Self::Rotate270 => image.rotate270(),
        }
    }
}

/// Read the orientation tag from raw image bytes.
///
/// Returns `Ok(None)` when the container has no EXIF block or the block has
/// no usable orientation field. A present but unreadable block is an error.
pub fn read_orientation(bytes: &[u8]) -> Result<Option<Orientation>, ProcessError> {
    let mut cursor = Cursor::new(bytes);
    let exif = match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => return Err(ProcessError::MetadataParse(e.to_string())),
    };

    let value = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0));
    Ok(value.and_then(Orientation::from_exif))
}

/// An image with its orientation baked in.
pub struct Normalized {
    /// Upright pixel data
    pub image: DynamicImage,
    /// True when a non-identity transform was applied
    pub corrected: bool,
}

/// Applies EXIF orientation to decoded images.
pub struct OrientationNormalizer;

impl OrientationNormalizer {
    /// Normalize `image` using the orientation recorded in `raw`.
    ///
    /// Never fails: unreadable metadata is logged and the image is returned
    /// unchanged.
    pub fn normalize(image: DynamicImage, raw: &[u8]) -> Normalized {
        let orientation = match read_orientation(raw) {
            Ok(orientation) => orientation,
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        };

        match orientation {
            Some(o) if !o.is_identity() => {
                tracing::debug!("Applying EXIF orientation {}", o.to_exif());
                Normalized {
                    image: o.apply(image),
                    corrected: true,
                }
            }
            _ => Normalized {
                image,
                corrected: false,
            },
        }
    }
}
