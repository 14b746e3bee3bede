//! Interactive crop sessions.

use serde::Serialize;
use tracing::debug;

use super::codec::{decode_image, encode_jpeg, read_dimensions, DecodeError, OUTPUT_QUALITY};
use super::geometry::{
    clamp_zoom, fit_aspect, fits_canvas_budget, normalize_rotation, CropRect, SafeBounds,
    MIN_ZOOM,
};
use super::raster::{extract_crop, render_rotated, Raster};
use super::CropError;
use crate::file::FilePayload;

/// Name given to cropped output, e.g. `cropped-1700000000000.jpg`.
pub fn cropped_file_name(timestamp_ms: u64) -> String {
    format!("cropped-{}.jpg", timestamp_ms)
}

/// Serializable view of a session's state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSnapshot {
    pub source_width: u32,
    pub source_height: u32,
    pub rect: CropRect,
    pub zoom: f64,
    pub rotation: f64,
    pub aspect_ratio: f64,
}

/// Crop state bound to one decoded source image.
///
/// The crop rectangle always lies within the source's rotation-safe bounds,
/// zoom within `[1, 3]` and rotation within `[0, 360)`. Cancelling a session
/// is simply dropping it.
#[derive(Debug, Clone)]
pub struct CropSession {
    source: Raster,
    bounds: SafeBounds,
    rect: CropRect,
    zoom: f64,
    rotation: f64,
    aspect_ratio: f64,
}

impl CropSession {
    /// Decode `file` and start a session at zoom 1, no rotation, with the
    /// largest centered rectangle of the given aspect ratio.
    pub fn open(file: &FilePayload, aspect_ratio: f64) -> Result<Self, CropError> {
        if !file.is_image() {
            return Err(CropError::NotAnImage(file.name.clone()));
        }
        let (width, height) = read_dimensions(&file.bytes)?;
        if !fits_canvas_budget(width, height) {
            return Err(CropError::TooLarge { width, height });
        }
        let source = decode_image(&file.bytes)?;
        debug!(
            name = %file.name,
            width = source.width,
            height = source.height,
            "opened crop session"
        );
        Self::from_raster(source, aspect_ratio)
    }

    /// Start a session on an already decoded raster.
    pub fn from_raster(source: Raster, aspect_ratio: f64) -> Result<Self, CropError> {
        if source.is_empty() {
            return Err(CropError::Decode(DecodeError::InvalidFormat));
        }
        if !fits_canvas_budget(source.width, source.height) {
            return Err(CropError::TooLarge {
                width: source.width,
                height: source.height,
            });
        }
        let aspect_ratio = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };

        let bounds = SafeBounds::for_source(source.width, source.height);
        let center = (source.width as f64 / 2.0, source.height as f64 / 2.0);
        let mut session = Self {
            source,
            bounds,
            rect: CropRect::full(1, 1),
            zoom: MIN_ZOOM,
            rotation: 0.0,
            aspect_ratio,
        };
        session.rect = session.zoomed_rect(center);
        Ok(session)
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source.width, self.source.height)
    }

    pub fn rect(&self) -> CropRect {
        self.rect
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn bounds(&self) -> SafeBounds {
        self.bounds
    }

    pub fn snapshot(&self) -> CropSnapshot {
        CropSnapshot {
            source_width: self.source.width,
            source_height: self.source.height,
            rect: self.rect,
            zoom: self.zoom,
            rotation: self.rotation,
            aspect_ratio: self.aspect_ratio,
        }
    }

    /// Set zoom (clamped to `[1, 3]`). The crop rectangle is resized to the
    /// zoom-1 rectangle divided by `zoom`, keeping its center where possible.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
        self.rect = self.zoomed_rect(self.rect.center());
    }

    /// Set rotation in degrees; any value is normalized into `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = normalize_rotation(degrees);
        self.rect = self.bounds.clamp(self.rect);
    }

    pub fn rotate_by(&mut self, delta_degrees: f64) {
        self.set_rotation(self.rotation + delta_degrees);
    }

    /// Set the crop rectangle directly. The result is the largest rectangle
    /// of the session's aspect ratio inside `rect`, centered on it and
    /// clamped into the safe bounds.
    pub fn set_crop_rect(&mut self, rect: CropRect) {
        let (width, height) = fit_aspect(
            rect.width.min(self.bounds.width()),
            rect.height.min(self.bounds.height()),
            self.aspect_ratio,
        );
        let (cx, cy) = rect.center();
        let x = (cx - width as f64 / 2.0).round() as i64;
        let y = (cy - height as f64 / 2.0).round() as i64;
        self.rect = self.bounds.clamp(CropRect::new(x, y, width, height));
    }

    /// Run the rotate-then-crop pipeline and return the raw output raster.
    pub fn render(&self) -> Raster {
        let rotated = render_rotated(&self.source, self.rotation);
        extract_crop(&rotated, self.source.width, self.source.height, &self.rect)
    }

    /// Render and encode the crop as a JPEG payload named
    /// `cropped-<timestamp_ms>.jpg`.
    pub fn commit(&self, timestamp_ms: u64) -> Result<FilePayload, CropError> {
        let output = self.render();
        let bytes = encode_jpeg(&output, OUTPUT_QUALITY)?;
        debug!(
            width = output.width,
            height = output.height,
            rotation = self.rotation,
            bytes = bytes.len(),
            "committed crop"
        );
        Ok(FilePayload::new(
            cropped_file_name(timestamp_ms),
            "image/jpeg",
            bytes,
        ))
    }

    fn zoomed_rect(&self, center: (f64, f64)) -> CropRect {
        let (fit_w, fit_h) = fit_aspect(self.source.width, self.source.height, self.aspect_ratio);
        let width = ((fit_w as f64 / self.zoom).round() as u32).max(1);
        let height = ((fit_h as f64 / self.zoom).round() as u32).max(1);
        let x = (center.0 - width as f64 / 2.0).round() as i64;
        let y = (center.1 - height as f64 / 2.0).round() as i64;
        self.bounds.clamp(CropRect::new(x, y, width, height))
    }
}
