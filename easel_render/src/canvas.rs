// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immediate-mode 2D drawing context over a `tiny_skia` pixmap.
//!
//! [`Canvas`] follows the familiar canvas model: a current path built with
//! `move_to`/`line_to`/`arc`/…, a save/restore stack of drawing state
//! (transform, global alpha, fill and stroke brushes, line style, shadow,
//! clip), and `fill`/`stroke`/`clip` operations that consume the current
//! path.
//!
//! Path coordinates are user-space coordinates. They are mapped through the
//! transform that is current when `fill`, `stroke`, or `clip` runs, then
//! through the device pixel ratio.

use std::f64::consts::TAU;
use std::rc::Rc;

use kurbo::{Affine, Arc, BezPath, PathEl, Point, Vec2};
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LinearGradient, Mask, Paint, Path, PathBuilder, Pattern,
    Pixmap, PixmapPaint, RadialGradient, Shader, SpreadMode, Stroke, StrokeDash, Transform,
};

pub use tiny_skia::{LineCap, LineJoin};

use crate::color::Rgba;
use crate::error::DrawError;

/// Arc flattening tolerance in user units.
const ARC_TOLERANCE: f64 = 0.1;

/// How a path is painted.
#[derive(Clone, Debug)]
pub enum Brush {
    /// A flat color.
    Solid(Rgba),
    /// A linear gradient between two user-space points.
    LinearGradient {
        /// Gradient start point.
        start: Point,
        /// Gradient end point.
        end: Point,
        /// `(offset, color)` stops with offsets in `0..=1`.
        stops: Vec<(f32, Rgba)>,
    },
    /// A radial gradient from `start` out to a circle of `radius` around `end`.
    RadialGradient {
        /// Focal point.
        start: Point,
        /// Center of the outer circle.
        end: Point,
        /// Radius of the outer circle.
        radius: f64,
        /// `(offset, color)` stops with offsets in `0..=1`.
        stops: Vec<(f32, Rgba)>,
    },
    /// A repeating image.
    Pattern(Rc<Pixmap>),
}

impl Default for Brush {
    fn default() -> Self {
        Self::Solid(Rgba::BLACK)
    }
}

/// A hard drop shadow drawn under fills and strokes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    /// Shadow color; its alpha is further scaled by global alpha.
    pub color: Rgba,
    /// Offset in logical (pre-transform) pixels.
    pub offset: Vec2,
}

#[derive(Clone)]
struct DrawState {
    transform: Affine,
    global_alpha: f64,
    fill: Brush,
    stroke: Brush,
    line_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
    dash: Vec<f64>,
    shadow: Option<Shadow>,
    clip: Option<Mask>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            global_alpha: 1.0,
            fill: Brush::default(),
            stroke: Brush::default(),
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            dash: Vec::new(),
            shadow: None,
            clip: None,
        }
    }
}

/// A rectangular block of straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl ImageData {
    /// Returns the pixel at `(x, y)` within this block.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some(Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }
}

/// A drawing context backed by an owned pixmap.
pub struct Canvas {
    pixmap: Pixmap,
    pixel_ratio: f64,
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezPath,
}

impl core::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("pixel_ratio", &self.pixel_ratio)
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// Creates a canvas for a logical `width × height` area at the given
    /// device pixel ratio.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::Surface`] if the device size is zero or too large.
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Result<Self, DrawError> {
        let (w, h) = device_size(width, height, pixel_ratio);
        let pixmap = Pixmap::new(w, h).ok_or(DrawError::Surface {
            width: w,
            height: h,
        })?;
        Ok(Self {
            pixmap,
            pixel_ratio,
            state: DrawState::default(),
            stack: Vec::new(),
            path: BezPath::new(),
        })
    }

    /// Device width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Device height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Device pixels per logical pixel.
    #[must_use]
    pub const fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Returns the backing pixmap.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Clears every pixel to transparent, ignoring transform and clip.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    // -- State stack --

    /// Pushes a copy of the current drawing state.
    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// Pops the most recently saved drawing state. Unbalanced calls are ignored.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Multiplies the current transform by `m` (`m` applies first).
    pub fn transform(&mut self, m: Affine) {
        self.state.transform *= m;
    }

    /// Replaces the current transform.
    pub fn set_transform(&mut self, m: Affine) {
        self.state.transform = m;
    }

    /// Resets the current transform to identity.
    pub fn reset_transform(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    /// Returns the current user transform (without the pixel ratio).
    #[must_use]
    pub fn current_transform(&self) -> Affine {
        self.state.transform
    }

    /// Sets the alpha multiplied into everything drawn.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    /// Returns the current global alpha.
    #[must_use]
    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// Sets the brush used by [`fill`](Self::fill).
    pub fn set_fill(&mut self, brush: Brush) {
        self.state.fill = brush;
    }

    /// Sets the brush used by [`stroke`](Self::stroke).
    pub fn set_stroke(&mut self, brush: Brush) {
        self.state.stroke = brush;
    }

    /// Sets the stroke width in user units.
    pub fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    /// Sets the stroke cap.
    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    /// Sets the stroke join.
    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    /// Sets the dash pattern. An empty slice draws solid lines.
    pub fn set_line_dash(&mut self, dash: &[f64]) {
        self.state.dash = dash.to_vec();
    }

    /// Sets or clears the drop shadow.
    pub fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    // -- Path construction --

    /// Discards the current path.
    pub fn begin_path(&mut self) {
        self.path = BezPath::new();
    }

    /// Starts a new subpath.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to((x, y));
    }

    /// Adds a straight segment, starting a subpath if there is none.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.path.elements().is_empty() {
            self.path.move_to((x, y));
        } else {
            self.path.line_to((x, y));
        }
    }

    /// Adds a quadratic Bézier segment.
    pub fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_subpath(cx, cy);
        self.path.quad_to((cx, cy), (x, y));
    }

    /// Adds a cubic Bézier segment.
    pub fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_subpath(c1x, c1y);
        self.path.curve_to((c1x, c1y), (c2x, c2y), (x, y));
    }

    /// Adds a circular arc around `(x, y)`.
    ///
    /// A straight segment connects the current point to the arc start. Sweeps
    /// of a full turn or more draw a complete circle.
    pub fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        let radius = radius.max(0.0);
        let sweep = if anticlockwise {
            let span = start_angle - end_angle;
            if span >= TAU { -TAU } else { -span.rem_euclid(TAU) }
        } else {
            let span = end_angle - start_angle;
            if span >= TAU { TAU } else { span.rem_euclid(TAU) }
        };
        let center = Point::new(x, y);
        let start = center + Vec2::from_angle(start_angle) * radius;
        self.line_to(start.x, start.y);
        if sweep == 0.0 || radius == 0.0 {
            return;
        }
        let arc = Arc::new(center, (radius, radius), start_angle, sweep, 0.0);
        for el in arc.append_iter(ARC_TOLERANCE) {
            self.path.push(el);
        }
    }

    /// Adds a closed rectangle subpath.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.path.move_to((x, y));
        self.path.line_to((x + width, y));
        self.path.line_to((x + width, y + height));
        self.path.line_to((x, y + height));
        self.path.close_path();
    }

    /// Closes the current subpath.
    pub fn close_path(&mut self) {
        if !self.path.elements().is_empty() {
            self.path.close_path();
        }
    }

    /// Returns the current path in user coordinates.
    #[must_use]
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    // -- Painting --

    /// Fills the current path with the fill brush (nonzero winding).
    pub fn fill(&mut self) {
        let Some(path) = to_skia_path(&self.path) else {
            return;
        };
        let ts = self.device_transform();
        let ratio = self.pixel_ratio;
        let Self { pixmap, state, .. } = self;
        let clip = state.clip.as_ref();
        if let Some(paint) = shadow_paint(state) {
            let shadow_ts = shadow_transform(state, ts, ratio);
            pixmap.fill_path(&path, &paint, FillRule::Winding, shadow_ts, clip);
        }
        if let Some(paint) = brush_paint(&state.fill, state.global_alpha) {
            pixmap.fill_path(&path, &paint, FillRule::Winding, to_skia_transform(ts), clip);
        }
    }

    /// Strokes the current path with the stroke brush and line style.
    pub fn stroke(&mut self) {
        if self.state.line_width <= 0.0 {
            return;
        }
        let Some(path) = to_skia_path(&self.path) else {
            return;
        };
        let ts = self.device_transform();
        let ratio = self.pixel_ratio;
        let Self { pixmap, state, .. } = self;
        let stroke = skia_stroke(state);
        let clip = state.clip.as_ref();
        if let Some(paint) = shadow_paint(state) {
            let shadow_ts = shadow_transform(state, ts, ratio);
            pixmap.stroke_path(&path, &paint, &stroke, shadow_ts, clip);
        }
        if let Some(paint) = brush_paint(&state.stroke, state.global_alpha) {
            pixmap.stroke_path(&path, &paint, &stroke, to_skia_transform(ts), clip);
        }
    }

    /// Intersects the clip region with the current path.
    pub fn clip(&mut self) {
        let ts = self.device_transform();
        let Some(mut next) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        // An empty path clips everything away.
        if let Some(path) = to_skia_path(&self.path) {
            next.fill_path(&path, FillRule::Winding, true, to_skia_transform(ts));
        }
        if let Some(prev) = &self.state.clip {
            for (d, s) in next.data_mut().iter_mut().zip(prev.data()) {
                let v = u16::from(*d) * u16::from(*s) / 255;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "product of two bytes divided by 255 fits in a byte"
                )]
                let v = v as u8;
                *d = v;
            }
        }
        self.state.clip = Some(next);
    }

    /// Draws `image` with its top-left corner at user-space `(x, y)`.
    pub fn draw_image(&mut self, image: &Pixmap, x: f64, y: f64) {
        let ts = to_skia_transform(self.device_transform() * Affine::translate((x, y)));
        let paint = PixmapPaint {
            opacity: to_f32(self.state.global_alpha),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, ts, self.state.clip.as_ref());
    }

    // -- Read-back --

    /// Reads back one device pixel. Out-of-bounds reads are transparent.
    #[must_use]
    pub fn pixel(&self, x: i64, y: i64) -> Rgba {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return Rgba::TRANSPARENT;
        };
        self.pixmap.pixel(x, y).map_or(Rgba::TRANSPARENT, |p| {
            let c = p.demultiply();
            Rgba::new(c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Copies a block of device pixels. Out-of-bounds pixels are transparent.
    #[must_use]
    pub fn get_image_data(&self, x: i64, y: i64, width: u32, height: u32) -> ImageData {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..i64::from(height) {
            for col in 0..i64::from(width) {
                let c = self.pixel(x + col, y + row);
                data.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        ImageData {
            width,
            height,
            data,
        }
    }

    // -- Internal helpers --

    fn device_transform(&self) -> Affine {
        Affine::scale(self.pixel_ratio) * self.state.transform
    }

    fn ensure_subpath(&mut self, x: f64, y: f64) {
        if self.path.elements().is_empty() {
            self.path.move_to((x, y));
        }
    }
}

/// Device size for a logical size, rounded up.
#[must_use]
pub fn device_size(width: f64, height: f64, pixel_ratio: f64) -> (u32, u32) {
    let scale = |v: f64| -> u32 {
        let v = (v * pixel_ratio).ceil();
        if !v.is_finite() || v <= 0.0 {
            return 0;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "clamped to the u32 range before the cast"
        )]
        let v = v.min(f64::from(u32::MAX)) as u32;
        v
    };
    (scale(width), scale(height))
}

fn to_f32(v: f64) -> f32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "tiny-skia works in f32; precision loss is acceptable for rendering"
    )]
    let v = v as f32;
    v
}

fn to_skia_transform(m: Affine) -> Transform {
    let [a, b, c, d, e, f] = m.as_coeffs();
    Transform::from_row(to_f32(a), to_f32(b), to_f32(c), to_f32(d), to_f32(e), to_f32(f))
}

fn to_skia_path(path: &BezPath) -> Option<Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(to_f32(p.x), to_f32(p.y)),
            PathEl::LineTo(p) => builder.line_to(to_f32(p.x), to_f32(p.y)),
            PathEl::QuadTo(c, p) => {
                builder.quad_to(to_f32(c.x), to_f32(c.y), to_f32(p.x), to_f32(p.y));
            }
            PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                to_f32(c1.x),
                to_f32(c1.y),
                to_f32(c2.x),
                to_f32(c2.y),
                to_f32(p.x),
                to_f32(p.y),
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn gradient_stops(stops: &[(f32, Rgba)]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|(pos, color)| GradientStop::new(*pos, color.to_skia()))
        .collect()
}

fn skia_point(p: Point) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(to_f32(p.x), to_f32(p.y))
}

fn brush_paint(brush: &Brush, alpha: f64) -> Option<Paint<'_>> {
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    let shader = match brush {
        Brush::Solid(color) => {
            let color = color.scale_alpha(alpha);
            if color.a == 0 {
                return None;
            }
            Shader::SolidColor(color.to_skia())
        }
        Brush::LinearGradient { start, end, stops } => LinearGradient::new(
            skia_point(*start),
            skia_point(*end),
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        )?,
        Brush::RadialGradient {
            start,
            end,
            radius,
            stops,
        } => RadialGradient::new(
            skia_point(*start),
            skia_point(*end),
            to_f32(*radius),
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        )?,
        Brush::Pattern(image) => Pattern::new(
            (**image).as_ref(),
            SpreadMode::Repeat,
            FilterQuality::Bilinear,
            1.0,
            Transform::identity(),
        ),
    };
    paint.shader = shader;
    if alpha < 1.0 && !matches!(brush, Brush::Solid(_)) {
        paint.shader.apply_opacity(to_f32(alpha));
    }
    Some(paint)
}

fn shadow_paint(state: &DrawState) -> Option<Paint<'static>> {
    let shadow = state.shadow?;
    let color = shadow.color.scale_alpha(state.global_alpha);
    if color.a == 0 {
        return None;
    }
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color(color.to_skia());
    Some(paint)
}

fn shadow_transform(state: &DrawState, ts: Affine, ratio: f64) -> Transform {
    let offset = state.shadow.map(|s| s.offset).unwrap_or_default();
    to_skia_transform(Affine::translate(offset * ratio) * ts)
}

fn skia_stroke(state: &DrawState) -> Stroke {
    let mut dash: Vec<f32> = state.dash.iter().copied().map(to_f32).collect();
    if dash.len() % 2 == 1 {
        dash.extend_from_within(..);
    }
    Stroke {
        width: to_f32(state.line_width),
        line_cap: state.line_cap,
        line_join: state.line_join,
        dash: if dash.is_empty() {
            None
        } else {
            StrokeDash::new(dash, 0.0)
        },
        ..Stroke::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(20.0, 20.0, 1.0).unwrap()
    }

    #[test]
    fn zero_size_is_an_error() {
        assert_eq!(
            Canvas::new(0.0, 10.0, 1.0).unwrap_err(),
            DrawError::Surface {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn pixel_ratio_scales_device_size() {
        let c = Canvas::new(10.0, 5.0, 2.0).unwrap();
        assert_eq!((c.width(), c.height()), (20, 10));
    }

    #[test]
    fn fill_rect_writes_opaque_pixels() {
        let mut c = canvas();
        c.set_fill(Brush::Solid(Rgba::opaque(10, 20, 30)));
        c.begin_path();
        c.rect(2.0, 2.0, 10.0, 10.0);
        c.fill();
        assert_eq!(c.pixel(5, 5), Rgba::opaque(10, 20, 30));
        assert_eq!(c.pixel(15, 15), Rgba::TRANSPARENT);
        assert_eq!(c.pixel(-1, 5), Rgba::TRANSPARENT);
    }

    #[test]
    fn transform_applies_at_fill_time() {
        let mut c = canvas();
        c.set_fill(Brush::Solid(Rgba::opaque(255, 0, 0)));
        c.begin_path();
        c.rect(0.0, 0.0, 4.0, 4.0);
        c.set_transform(Affine::translate((10.0, 10.0)));
        c.fill();
        assert_eq!(c.pixel(1, 1).a, 0);
        assert_eq!(c.pixel(11, 11), Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut c = canvas();
        c.set_global_alpha(0.5);
        c.save();
        c.set_global_alpha(0.25);
        c.transform(Affine::scale(2.0));
        c.restore();
        assert_eq!(c.global_alpha(), 0.5);
        assert_eq!(c.current_transform(), Affine::IDENTITY);
        // Extra restores are ignored.
        c.restore();
        assert_eq!(c.global_alpha(), 0.5);
    }

    #[test]
    fn global_alpha_produces_translucent_pixels() {
        let mut c = canvas();
        c.set_global_alpha(0.5);
        c.rect(0.0, 0.0, 20.0, 20.0);
        c.fill();
        let a = c.pixel(10, 10).a;
        assert!((127..=128).contains(&a), "alpha was {a}");
    }

    #[test]
    fn full_circle_arc_fills_center() {
        let mut c = canvas();
        c.set_fill(Brush::Solid(Rgba::opaque(0, 0, 255)));
        c.begin_path();
        c.arc(10.0, 10.0, 5.0, 0.0, TAU, false);
        c.close_path();
        c.fill();
        assert_eq!(c.pixel(10, 10), Rgba::opaque(0, 0, 255));
        assert_eq!(c.pixel(1, 1).a, 0);
    }

    #[test]
    fn clip_restricts_fill() {
        let mut c = canvas();
        c.save();
        c.rect(0.0, 0.0, 5.0, 20.0);
        c.clip();
        c.begin_path();
        c.rect(0.0, 0.0, 20.0, 20.0);
        c.fill();
        c.restore();
        assert_eq!(c.pixel(2, 10).a, 255);
        assert_eq!(c.pixel(10, 10).a, 0);
    }

    #[test]
    fn stroke_paints_outline_only() {
        let mut c = canvas();
        c.set_stroke(Brush::Solid(Rgba::opaque(0, 255, 0)));
        c.set_line_width(2.0);
        c.rect(4.0, 4.0, 12.0, 12.0);
        c.stroke();
        assert_eq!(c.pixel(10, 10).a, 0);
        assert_eq!(c.pixel(4, 10).g, 255);
    }

    #[test]
    fn shadow_is_offset_copy() {
        let mut c = canvas();
        c.set_shadow(Some(Shadow {
            color: Rgba::opaque(1, 1, 1),
            offset: Vec2::new(5.0, 5.0),
        }));
        c.set_fill(Brush::Solid(Rgba::opaque(200, 0, 0)));
        c.rect(0.0, 0.0, 5.0, 5.0);
        c.fill();
        assert_eq!(c.pixel(2, 2), Rgba::opaque(200, 0, 0));
        assert_eq!(c.pixel(7, 7), Rgba::opaque(1, 1, 1));
    }

    #[test]
    fn image_data_is_row_major_rgba() {
        let mut c = canvas();
        c.set_fill(Brush::Solid(Rgba::opaque(9, 8, 7)));
        c.rect(1.0, 0.0, 1.0, 1.0);
        c.fill();
        let data = c.get_image_data(0, 0, 2, 1);
        assert_eq!(data.data.len(), 8);
        assert_eq!(data.pixel(0, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(data.pixel(1, 0), Some(Rgba::opaque(9, 8, 7)));
        assert_eq!(data.pixel(2, 0), None);
    }

    #[test]
    fn draw_image_blits_at_offset() {
        let mut src = Canvas::new(2.0, 2.0, 1.0).unwrap();
        src.set_fill(Brush::Solid(Rgba::opaque(50, 60, 70)));
        src.rect(0.0, 0.0, 2.0, 2.0);
        src.fill();
        let mut dst = canvas();
        dst.draw_image(src.pixmap(), 10.0, 10.0);
        assert_eq!(dst.pixel(11, 11), Rgba::opaque(50, 60, 70));
        assert_eq!(dst.pixel(9, 9).a, 0);
    }
}
