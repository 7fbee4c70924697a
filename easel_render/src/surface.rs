// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene and hit surfaces.
//!
//! Every layer owns two parallel canvases of the same device size. The
//! [`SceneSurface`] holds the visible output. The [`HitSurface`] holds flat
//! color keys, one per shape, and is only ever read back one pixel at a time
//! through [`HitSurface::sample`].

use tracing::warn;

use crate::canvas::Canvas;
use crate::color::rgb_to_hex;

/// The visible raster of a layer.
#[derive(Debug)]
pub struct SceneSurface {
    canvas: Canvas,
}

/// The identity raster of a layer.
#[derive(Debug)]
pub struct HitSurface {
    canvas: Canvas,
}

/// Result of reading one hit-surface pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HitSample {
    /// Alpha 0: nothing was drawn here.
    Miss,
    /// Alpha strictly between 0 and 255: an antialiased edge.
    Antialiased,
    /// Alpha 255: the pixel color decoded as a `#rrggbb` key.
    Solid(String),
}

fn allocate(kind: &str, width: f64, height: f64, pixel_ratio: f64) -> Option<Canvas> {
    match Canvas::new(width, height, pixel_ratio) {
        Ok(canvas) => Some(canvas),
        Err(err) => {
            warn!(kind, width, height, pixel_ratio, %err, "skipping surface allocation");
            None
        }
    }
}

impl SceneSurface {
    /// Allocates a scene surface, or logs and returns `None` for a degenerate size.
    #[must_use]
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Option<Self> {
        allocate("scene", width, height, pixel_ratio).map(|canvas| Self { canvas })
    }

    /// Returns the drawing context.
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Returns the drawing context mutably.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }
}

impl HitSurface {
    /// Allocates a hit surface, or logs and returns `None` for a degenerate size.
    #[must_use]
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Option<Self> {
        allocate("hit", width, height, pixel_ratio).map(|canvas| Self { canvas })
    }

    /// Returns the drawing context.
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Returns the drawing context mutably.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Reads the pixel under logical point `(x, y)`.
    ///
    /// The point is scaled by the pixel ratio and rounded to the nearest
    /// device pixel.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> HitSample {
        let ratio = self.canvas.pixel_ratio();
        let px = round_to_i64(x * ratio);
        let py = round_to_i64(y * ratio);
        let c = self.canvas.pixel(px, py);
        match c.a {
            255 => HitSample::Solid(rgb_to_hex(c.r, c.g, c.b)),
            0 => HitSample::Miss,
            _ => HitSample::Antialiased,
        }
    }
}

fn round_to_i64(v: f64) -> i64 {
    if !v.is_finite() {
        return i64::MIN;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "saturating float-to-int cast; far out-of-range points read as misses"
    )]
    let v = v.round() as i64;
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Brush;
    use crate::color::Rgba;

    #[test]
    fn degenerate_size_yields_none() {
        assert!(SceneSurface::new(0.0, 10.0, 1.0).is_none());
        assert!(HitSurface::new(10.0, -1.0, 1.0).is_none());
    }

    #[test]
    fn sample_classifies_pixels() {
        let mut hit = HitSurface::new(10.0, 10.0, 1.0).unwrap();
        let c = hit.canvas_mut();
        c.set_fill(Brush::Solid(Rgba::opaque(0x12, 0x34, 0x56)));
        c.rect(0.0, 0.0, 5.0, 10.0);
        c.fill();
        c.set_fill(Brush::Solid(Rgba::new(0, 0, 0, 100)));
        c.begin_path();
        c.rect(8.0, 0.0, 2.0, 10.0);
        c.fill();

        assert_eq!(hit.sample(2.0, 2.0), HitSample::Solid("#123456".into()));
        assert_eq!(hit.sample(6.0, 2.0), HitSample::Miss);
        assert_eq!(hit.sample(8.6, 2.0), HitSample::Antialiased);
        assert_eq!(hit.sample(-50.0, 2.0), HitSample::Miss);
        assert_eq!(hit.sample(f64::NAN, 2.0), HitSample::Miss);
    }

    #[test]
    fn sample_scales_by_pixel_ratio() {
        let mut hit = HitSurface::new(10.0, 10.0, 2.0).unwrap();
        let c = hit.canvas_mut();
        c.rect(5.0, 5.0, 1.0, 1.0);
        c.fill();
        // Logical (5.4, 5.4) lands on device pixel (11, 11).
        assert_eq!(hit.sample(5.4, 5.4), HitSample::Solid("#000000".into()));
        assert_eq!(hit.sample(2.0, 2.0), HitSample::Miss);
    }
}
