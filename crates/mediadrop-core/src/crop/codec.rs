//! Decoding crop sources and encoding crop output.
//!
//! Sources are decoded with the `image` crate (format guessed from content)
//! and have their EXIF orientation applied, matching what a browser shows
//! the user in the crop editor. Output is always JPEG.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use thiserror::Error;

use super::raster::Raster;

/// JPEG quality of cropped output (0.95 on a 0–1 scale).
pub const OUTPUT_QUALITY: u8 = 95;

/// Errors from decoding a crop source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bytes are not in a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image is corrupted or truncated.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

/// EXIF orientation values (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90CW,
    Transverse,
    Rotate270CW,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Decode image bytes into an upright RGB raster.
pub fn decode_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let upright = apply_orientation(img, read_orientation(bytes));
    Ok(Raster::from_rgb_image(upright.into_rgb8()))
}

/// Pixel dimensions from the image header, without decoding pixel data.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    reader
        .into_dimensions()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// EXIF orientation of `bytes`, `Normal` when absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

/// Errors from encoding crop output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),

    #[error("JPEG encoder produced no data")]
    Empty,
}

/// Encode a raster as JPEG at `quality` (clamped to 1-100).
pub fn encode_jpeg(raster: &Raster, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if raster.is_empty() {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    let bytes = buffer.into_inner();
    if bytes.is_empty() {
        return Err(EncodeError::Empty);
    }
    Ok(bytes)
}
