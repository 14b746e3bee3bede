//! RGB rasters and the two-pass rotate-then-crop pipeline.
//!
//! # Algorithm
//!
//! 1. The source is drawn centered on a `safe × safe` canvas rotated about
//!    its center (translate → rotate → translate back → draw). This
//!    uses inverse mapping: for each canvas pixel we find the source point
//!    that lands on it.
//! 2. The rotated canvas is blitted into an output the size of the crop
//!    rectangle, offset by `safe/2 − source_center − crop_origin` so the
//!    requested rectangle (in the unrotated source frame) fills the output.
//!
//! The source is placed at an integer offset so unrotated output is an exact
//! copy; when `safe - width` is odd that puts the source center half a pixel
//! off the canvas center, so the rotation pivots on the placed source center
//! `(cx, cy)` instead. For rotation θ (clockwise on screen, y axis pointing
//! down) the inverse transform is:
//! ```text
//! src_x =  (dst_x - cx) * cos(θ) + (dst_y - cy) * sin(θ) + width / 2
//! src_y = -(dst_x - cx) * sin(θ) + (dst_y - cy) * cos(θ) + height / 2
//! ```
//! Canvas pixels with no source behind them stay black, which is what a
//! transparent canvas flattens to in JPEG output.

use super::geometry::{normalize_rotation, safe_area, source_offset, CropRect};

/// Sub-pixel distance under which a sample is treated as an exact pixel hit.
const SNAP_EPSILON: f64 = 1e-6;

/// An RGB image, 3 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// All-black raster.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0u8; width as usize * height as usize * 3])
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Pixel at integer coordinates, `None` outside the raster.
    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]])
    }

    fn put(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Copy the rectangle of `src` starting at (`src_x`, `src_y`) into this
    /// raster at (`dst_x`, `dst_y`), clipping against both rasters.
    fn blit(&mut self, src: &Raster, src_x: i64, src_y: i64, dst_x: i64, dst_y: i64, w: i64, h: i64) {
        // clip against the source
        let (mut sx, mut sy, mut dx, mut dy, mut w, mut h) = (src_x, src_y, dst_x, dst_y, w, h);
        for (s, d, len, limit) in [
            (&mut sx, &mut dx, &mut w, src.width as i64),
            (&mut sy, &mut dy, &mut h, src.height as i64),
        ] {
            if *s < 0 {
                *d -= *s;
                *len += *s;
                *s = 0;
            }
            *len = (*len).min(limit - *s);
        }
        // clip against the destination
        for (s, d, len, limit) in [
            (&mut sx, &mut dx, &mut w, self.width as i64),
            (&mut sy, &mut dy, &mut h, self.height as i64),
        ] {
            if *d < 0 {
                *s -= *d;
                *len += *d;
                *d = 0;
            }
            *len = (*len).min(limit - *d);
        }
        if w <= 0 || h <= 0 {
            return;
        }

        let row_bytes = w as usize * 3;
        for row in 0..h as usize {
            let src_idx = ((sy as usize + row) * src.width as usize + sx as usize) * 3;
            let dst_idx = ((dy as usize + row) * self.width as usize + dx as usize) * 3;
            self.pixels[dst_idx..dst_idx + row_bytes]
                .copy_from_slice(&src.pixels[src_idx..src_idx + row_bytes]);
        }
    }
}

/// Draw `source` centered on its safe-area canvas, rotated clockwise by
/// `rotation_degrees` about the canvas center.
pub fn render_rotated(source: &Raster, rotation_degrees: f64) -> Raster {
    let safe = safe_area(source.width, source.height);
    let (ox, oy) = source_offset(source.width, source.height);
    let mut canvas = Raster::blank(safe, safe);

    let angle = normalize_rotation(rotation_degrees);
    if angle.abs() < 0.001 {
        canvas.blit(
            source,
            0,
            0,
            ox as i64,
            oy as i64,
            source.width as i64,
            source.height as i64,
        );
        return canvas;
    }

    let (sin, cos) = angle.to_radians().sin_cos();
    let half_w = source.width as f64 / 2.0;
    let half_h = source.height as f64 / 2.0;
    // rotation center: the source center as placed on the canvas
    let cx = ox as f64 + half_w;
    let cy = oy as f64 + half_h;

    for y in 0..safe {
        for x in 0..safe {
            // pixel centers, relative to the rotation center
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;

            let src_x = dx * cos + dy * sin + half_w - 0.5;
            let src_y = -dx * sin + dy * cos + half_h - 0.5;

            if let Some(rgb) = sample(source, src_x, src_y) {
                canvas.put(x, y, rgb);
            }
        }
    }

    canvas
}

/// Cut `rect` (in the unrotated source frame) out of a canvas produced by
/// [`render_rotated`] for a `source_width × source_height` source.
pub fn extract_crop(rotated: &Raster, source_width: u32, source_height: u32, rect: &CropRect) -> Raster {
    let (ox, oy) = source_offset(source_width, source_height);
    let mut output = Raster::blank(rect.width, rect.height);

    // The output's origin sits at (ox + rect.x, oy + rect.y) on the canvas,
    // i.e. the canvas is drawn at safe/2 - source_center - crop_origin.
    output.blit(
        rotated,
        ox as i64 + rect.x,
        oy as i64 + rect.y,
        0,
        0,
        rect.width as i64,
        rect.height as i64,
    );
    output
}

/// Sample `image` at continuous pixel-index coordinates.
///
/// Coordinates that land on a pixel center are copied exactly (so right-angle
/// rotations are lossless); anything else is bilinearly interpolated with
/// edges clamped. Returns `None` outside the image footprint.
fn sample(image: &Raster, x: f64, y: f64) -> Option<[u8; 3]> {
    let rx = x.round();
    let ry = y.round();
    if (x - rx).abs() < SNAP_EPSILON && (y - ry).abs() < SNAP_EPSILON {
        return image.pixel(rx as i64, ry as i64);
    }

    let (w, h) = (image.width as f64, image.height as f64);
    if x < -0.5 || y < -0.5 || x >= w - 0.5 || y >= h - 0.5 {
        return None;
    }

    let max_x = image.width as i64 - 1;
    let max_y = image.height as i64 - 1;
    let x0 = (x.floor() as i64).clamp(0, max_x);
    let y0 = (y.floor() as i64).clamp(0, max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);

    let fx = (x - x0 as f64).clamp(0.0, 1.0);
    let fy = (y - y0 as f64).clamp(0.0, 1.0);

    let p00 = image.pixel(x0, y0)?;
    let p10 = image.pixel(x1, y0)?;
    let p01 = image.pixel(x0, y1)?;
    let p11 = image.pixel(x1, y1)?;

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[i] as f64 * fx * (1.0 - fy)
            + p01[i] as f64 * (1.0 - fx) * fy
            + p11[i] as f64 * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    Some(result)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn raster(width: u32, height: u32) -> Raster {
        let pixels = (0..width * height * 3).map(|i| (i % 251) as u8).collect();
        Raster::new(width, height, pixels)
    }

    proptest! {
        /// Property: output dimensions always equal the crop rectangle.
        #[test]
        fn prop_output_matches_rect(
            (w, h) in (1u32..=24, 1u32..=24),
            angle in 0.0f64..360.0,
            (x, y) in (-10i64..=30, -10i64..=30),
            (cw, ch) in (1u32..=30, 1u32..=30),
        ) {
            let src = raster(w, h);
            let rect = CropRect::new(x, y, cw, ch);
            let out = extract_crop(&render_rotated(&src, angle), w, h, &rect);

            prop_assert_eq!(out.width, cw);
            prop_assert_eq!(out.height, ch);
            prop_assert_eq!(out.pixels.len(), (cw * ch * 3) as usize);
        }

        /// Property: unrotated full-frame crop reproduces the source exactly.
        #[test]
        fn prop_identity_round_trip((w, h) in (1u32..=40, 1u32..=40)) {
            let src = raster(w, h);
            let out = extract_crop(&render_rotated(&src, 0.0), w, h, &CropRect::full(w, h));
            prop_assert_eq!(out, src);
        }

        /// Property: four quarter turns of a square are lossless.
        #[test]
        fn prop_right_angles_preserve_pixels(side in 1u32..=16) {
            let src = raster(side, side);
            let mut sorted_src = src.pixels.chunks(3).map(|p| p.to_vec()).collect::<Vec<_>>();
            sorted_src.sort();

            for angle in [90.0, 180.0, 270.0] {
                let out = extract_crop(&render_rotated(&src, angle), side, side, &CropRect::full(side, side));
                let mut sorted_out = out.pixels.chunks(3).map(|p| p.to_vec()).collect::<Vec<_>>();
                sorted_out.sort();
                prop_assert_eq!(&sorted_out, &sorted_src);
            }
        }
    }
}
