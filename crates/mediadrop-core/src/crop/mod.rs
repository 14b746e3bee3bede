//! Crop, zoom and rotate an image before upload.
//!
//! A [`CropSession`] holds the decoded source plus the user's crop
//! rectangle, zoom and rotation. Committing runs a rotation-safe two-pass
//! raster pipeline (see [`raster`]) and encodes the result as a new JPEG
//! payload; dropping the session cancels it without touching anything else.
//!
//! # Coordinate System
//!
//! - Crop rectangles are in source pixels, origin at the unrotated source's
//!   top-left corner; they may extend into the safe area around the source
//! - Rotation angles are in degrees, positive = clockwise on screen

mod codec;
mod geometry;
pub mod raster;
mod session;

use thiserror::Error;

pub use codec::{
    decode_image, encode_jpeg, read_dimensions, DecodeError, EncodeError, Orientation,
    OUTPUT_QUALITY,
};
pub use geometry::{
    clamp_zoom, fit_aspect, fits_canvas_budget, normalize_rotation, safe_area, CropRect,
    SafeBounds, MAX_CANVAS_PIXELS, MAX_ZOOM, MIN_ZOOM,
};
pub use raster::Raster;
pub use session::{cropped_file_name, CropSession, CropSnapshot};

/// Errors that abort a crop session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropError {
    #[error("{0} is not an image")]
    NotAnImage(String),

    #[error("{width}x{height} image is too large to crop")]
    TooLarge { width: u32, height: u32 },

    #[error("Could not decode image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Crop failed: {0}")]
    CropFailed(#[from] EncodeError),
}
