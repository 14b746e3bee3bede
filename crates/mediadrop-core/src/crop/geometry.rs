//! Geometry of the rotation-safe canvas.
//!
//! The source image is drawn centered on a square "safe area" canvas large
//! enough to hold it at any rotation. Crop rectangles are expressed in the
//! source's unrotated pixel frame (origin at the source's top-left corner),
//! so they may extend past the source into the safe area; they never extend
//! past the safe area itself.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

/// Normalize an angle in degrees into `[0, 360)`. Non-finite input maps to 0.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Clamp a zoom factor into `[MIN_ZOOM, MAX_ZOOM]`. NaN maps to `MIN_ZOOM`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        MIN_ZOOM
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

/// Side of the square canvas that contains a `width × height` image at any
/// rotation: `2 * ceil((max(width, height) / 2) * sqrt(2))`.
pub fn safe_area(width: u32, height: u32) -> u32 {
    let max_side = width.max(height) as f64;
    (2.0 * ((max_side / 2.0) * SQRT_2).ceil()) as u32
}

/// Largest safe canvas (in pixels) a crop may allocate: 100 MP, 300 MB of RGB.
pub const MAX_CANVAS_PIXELS: u64 = 100_000_000;

/// Whether the safe canvas of a `width × height` source stays within
/// [`MAX_CANVAS_PIXELS`].
pub fn fits_canvas_budget(width: u32, height: u32) -> bool {
    let safe = safe_area(width, height) as u64;
    safe * safe <= MAX_CANVAS_PIXELS
}

/// Integer offset of the source's top-left corner on the safe canvas.
pub fn source_offset(width: u32, height: u32) -> (u32, u32) {
    let safe = safe_area(width, height);
    ((safe - width) / 2, (safe - height) / 2)
}

/// Pixel-space crop rectangle in the source's unrotated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width × height` source.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Region of the source frame covered by the safe canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeBounds {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl SafeBounds {
    pub fn for_source(width: u32, height: u32) -> Self {
        let safe = safe_area(width, height) as i64;
        let (ox, oy) = source_offset(width, height);
        Self {
            min_x: -(ox as i64),
            min_y: -(oy as i64),
            max_x: safe - ox as i64,
            max_y: safe - oy as i64,
        }
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y) as u32
    }

    pub fn contains(&self, rect: &CropRect) -> bool {
        rect.x >= self.min_x
            && rect.y >= self.min_y
            && rect.right() <= self.max_x
            && rect.bottom() <= self.max_y
    }

    /// Shrink and shift `rect` until it lies inside the bounds. Width and
    /// height are kept at least 1.
    pub fn clamp(&self, rect: CropRect) -> CropRect {
        let width = rect.width.min(self.width()).max(1);
        let height = rect.height.min(self.height()).max(1);
        let x = rect.x.min(self.max_x - width as i64).max(self.min_x);
        let y = rect.y.min(self.max_y - height as i64).max(self.min_y);
        CropRect::new(x, y, width, height)
    }
}

/// Largest `aspect`-shaped rectangle (width / height) fitting in
/// `width × height`.
pub fn fit_aspect(width: u32, height: u32, aspect: f64) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    if w / h > aspect {
        (((h * aspect).round() as u32).min(width).max(1), height.max(1))
    } else {
        (width.max(1), ((w / aspect).round() as u32).min(height).max(1))
    }
}
