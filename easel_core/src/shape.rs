// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape drawing: the context handed to scene functions, style resolution,
//! and the built-in `Rect` and `Circle` geometry.
//!
//! A scene function only builds a path and calls
//! [`fill_stroke_shape`](ShapeContext::fill_stroke_shape). The same function
//! runs twice per draw: once on the scene surface with the shape's real
//! style, once on the hit surface where every fill and stroke is the shape's
//! flat color key.

use core::f64::consts::{FRAC_PI_2, PI, TAU};
use core::fmt;
use std::rc::Rc;

use easel_render::{Brush, Canvas, DrawError, LineCap, LineJoin, Pixmap, Rgba, Shadow};
use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use serde_json::Value;
use tracing::debug;

use crate::attrs::{self, Attrs};
use crate::class::ClassSpec;
use crate::node::{Handle, NodeId, NodeKind};

/// Geometry callback for a shape.
pub type SceneFunc = Rc<dyn Fn(&mut ShapeContext<'_>) -> Result<(), DrawError>>;

/// Read access to a node's attributes with declared defaults applied.
#[derive(Clone, Copy)]
pub struct AttrView<'a> {
    attrs: &'a Attrs,
    spec: Option<&'a ClassSpec>,
    kind: NodeKind,
}

impl fmt::Debug for AttrView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrView")
            .field("attrs", self.attrs)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<'a> AttrView<'a> {
    pub(crate) fn new(attrs: &'a Attrs, spec: Option<&'a ClassSpec>, kind: NodeKind) -> Self {
        Self { attrs, spec, kind }
    }

    /// The explicit value of `key`, else its declared default.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.attrs
            .get(key)
            .cloned()
            .or_else(|| self.spec.and_then(|s| s.defaults.get(key).cloned()))
            .or_else(|| attrs::kind_default(self.kind, key))
    }

    /// `key` as a number, `0` when unset or not numeric.
    #[must_use]
    pub fn f64(&self, key: &str) -> f64 {
        self.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
    }

    /// `key` as a boolean, `false` when unset or not boolean.
    #[must_use]
    pub fn bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// `key` as a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether `key` is explicitly set to something other than `null`.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.attrs.get(key).is_some_and(|v| !v.is_null())
    }
}

// -- Style --

/// Paint settings resolved from a shape's attributes for one draw.
#[derive(Clone, Debug)]
pub(crate) struct ShapeStyle {
    fill: Option<Brush>,
    fill_enabled: bool,
    fill_after_stroke: bool,
    stroke: Option<Rgba>,
    stroke_width: f64,
    stroke_enabled: bool,
    hit_stroke_width: Option<f64>,
    line_cap: Option<LineCap>,
    line_join: Option<LineJoin>,
    dash: Vec<f64>,
    shadow: Option<Shadow>,
}

fn color(view: &AttrView<'_>, key: &str) -> Option<Rgba> {
    let raw = view.str(key)?;
    let parsed = Rgba::parse(&raw);
    if parsed.is_none() {
        debug!(attr = key, value = %raw, "unparseable color; not painting");
    }
    parsed
}

fn color_stops(view: &AttrView<'_>, key: &str) -> Option<Vec<(f32, Rgba)>> {
    let Some(Value::Array(raw)) = view.get(key) else {
        return None;
    };
    let stops: Vec<(f32, Rgba)> = raw
        .chunks_exact(2)
        .filter_map(|pair| {
            let offset = pair[0].as_f64()?;
            let color = Rgba::parse(pair[1].as_str()?)?;
            #[expect(
                clippy::cast_possible_truncation,
                reason = "gradient offsets live in 0..=1"
            )]
            let offset = offset.clamp(0.0, 1.0) as f32;
            Some((offset, color))
        })
        .collect();
    (!stops.is_empty()).then_some(stops)
}

fn point(view: &AttrView<'_>, prefix: &str) -> Point {
    Point::new(view.f64(&format!("{prefix}X")), view.f64(&format!("{prefix}Y")))
}

fn line_cap(name: &str) -> Option<LineCap> {
    match name {
        "butt" => Some(LineCap::Butt),
        "round" => Some(LineCap::Round),
        "square" => Some(LineCap::Square),
        _ => None,
    }
}

fn line_join(name: &str) -> Option<LineJoin> {
    match name {
        "miter" => Some(LineJoin::Miter),
        "round" => Some(LineJoin::Round),
        "bevel" => Some(LineJoin::Bevel),
        _ => None,
    }
}

impl ShapeStyle {
    /// Resolves the style of a shape. `abs_scale` scales the shadow offset,
    /// which is not subject to the drawing transform.
    pub(crate) fn resolve(
        view: &AttrView<'_>,
        handles: &HashMap<String, Handle>,
        abs_scale: Vec2,
    ) -> Self {
        let pattern = handles
            .get("fillPatternImage")
            .and_then(|h| Rc::clone(h).downcast::<Pixmap>().ok());
        let fill = color(view, "fill")
            .map(Brush::Solid)
            .or_else(|| pattern.map(Brush::Pattern))
            .or_else(|| {
                color_stops(view, "fillLinearGradientColorStops").map(|stops| {
                    Brush::LinearGradient {
                        start: point(view, "fillLinearGradientStartPoint"),
                        end: point(view, "fillLinearGradientEndPoint"),
                        stops,
                    }
                })
            })
            .or_else(|| {
                color_stops(view, "fillRadialGradientColorStops").map(|stops| {
                    Brush::RadialGradient {
                        start: point(view, "fillRadialGradientStartPoint"),
                        end: point(view, "fillRadialGradientEndPoint"),
                        radius: view.f64("fillRadialGradientEndRadius"),
                        stops,
                    }
                })
            });

        let stroke = color(view, "stroke");
        let stroke_width = view.f64("strokeWidth");
        let stroke_enabled = view.bool("strokeEnabled");
        let has_stroke = stroke_enabled && stroke_width != 0.0 && stroke.is_some();
        let hit_stroke_width = match view.get("hitStrokeWidth") {
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|w| stroke_enabled && *w != 0.0),
            _ => has_stroke.then_some(stroke_width),
        };

        let shadow_opacity = view.f64("shadowOpacity");
        let offset = Vec2::new(view.f64("shadowOffsetX"), view.f64("shadowOffsetY"));
        let has_shadow = view.bool("shadowEnabled")
            && shadow_opacity != 0.0
            && (view.is_set("shadowColor")
                || view.f64("shadowBlur") != 0.0
                || offset != Vec2::ZERO);
        let shadow = has_shadow.then(|| Shadow {
            color: color(view, "shadowColor")
                .unwrap_or(Rgba::BLACK)
                .scale_alpha(shadow_opacity),
            offset: Vec2::new(offset.x * abs_scale.x, offset.y * abs_scale.y),
        });

        let dash = match view.get("dash") {
            Some(Value::Array(d)) => d.iter().filter_map(Value::as_f64).collect(),
            _ => Vec::new(),
        };

        Self {
            fill,
            fill_enabled: view.bool("fillEnabled"),
            fill_after_stroke: view.bool("fillAfterStrokeEnabled"),
            stroke,
            stroke_width,
            stroke_enabled,
            hit_stroke_width,
            line_cap: view.str("lineCap").as_deref().and_then(line_cap),
            line_join: view.str("lineJoin").as_deref().and_then(line_join),
            dash,
            shadow,
        }
    }

    fn has_stroke(&self) -> bool {
        self.stroke_enabled && self.stroke_width != 0.0 && self.stroke.is_some()
    }
}

// -- Context --

/// Which surface a scene function is drawing into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DrawMode {
    Scene,
    Hit(Rgba),
}

/// The drawing context passed to scene and hit functions.
pub struct ShapeContext<'a> {
    canvas: &'a mut Canvas,
    mode: DrawMode,
    style: &'a ShapeStyle,
    view: AttrView<'a>,
    node: NodeId,
}

impl fmt::Debug for ShapeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeContext")
            .field("node", &self.node)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<'a> ShapeContext<'a> {
    pub(crate) fn new(
        canvas: &'a mut Canvas,
        mode: DrawMode,
        style: &'a ShapeStyle,
        view: AttrView<'a>,
        node: NodeId,
    ) -> Self {
        if let Some(join) = style.line_join {
            canvas.set_line_join(join);
        }
        Self {
            canvas,
            mode,
            style,
            view,
            node,
        }
    }

    /// The shape being drawn.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Whether this pass draws the hit surface.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self.mode, DrawMode::Hit(_))
    }

    /// The shape's attributes with defaults applied.
    #[must_use]
    pub fn attrs(&self) -> AttrView<'a> {
        self.view
    }

    /// Shorthand for `attrs().f64(key)`.
    #[must_use]
    pub fn attr_f64(&self, key: &str) -> f64 {
        self.view.f64(key)
    }

    /// The underlying canvas, for drawing beyond paths.
    pub fn canvas(&mut self) -> &mut Canvas {
        self.canvas
    }

    // -- Path construction --

    /// Discards the current path.
    pub fn begin_path(&mut self) {
        self.canvas.begin_path();
    }

    /// Starts a new subpath.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.canvas.move_to(x, y);
    }

    /// Adds a straight segment.
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.canvas.line_to(x, y);
    }

    /// Adds a quadratic Bézier segment.
    pub fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.canvas.quadratic_curve_to(cx, cy, x, y);
    }

    /// Adds a cubic Bézier segment.
    pub fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.canvas.bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
    }

    /// Adds a circular arc.
    pub fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.canvas.arc(x, y, radius, start, end, anticlockwise);
    }

    /// Adds a closed rectangle.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.canvas.rect(x, y, width, height);
    }

    /// Closes the current subpath.
    pub fn close_path(&mut self) {
        self.canvas.close_path();
    }

    // -- Painting --

    /// Fills then strokes the current path, or strokes first when
    /// `fillAfterStrokeEnabled` is set.
    pub fn fill_stroke_shape(&mut self) {
        if self.style.fill_after_stroke {
            self.stroke_shape();
            self.fill_shape();
        } else {
            self.fill_shape();
            self.stroke_shape();
        }
    }

    /// Fills the current path if `fillEnabled`. The hit pass fills with the
    /// color key even when the shape has no visible fill.
    pub fn fill_shape(&mut self) {
        if !self.style.fill_enabled {
            return;
        }
        match self.mode {
            DrawMode::Hit(key) => {
                self.canvas.save();
                self.canvas.set_fill(Brush::Solid(key));
                self.canvas.fill();
                self.canvas.restore();
            }
            DrawMode::Scene => {
                let Some(fill) = &self.style.fill else {
                    return;
                };
                self.canvas.save();
                self.canvas.set_shadow(self.style.shadow);
                self.canvas.set_fill(fill.clone());
                self.canvas.fill();
                self.canvas.restore();
            }
        }
    }

    /// Strokes the current path if the shape has a stroke (scene pass) or a
    /// hit stroke (hit pass).
    pub fn stroke_shape(&mut self) {
        let (brush, width) = match self.mode {
            DrawMode::Hit(key) => match self.style.hit_stroke_width {
                Some(width) => (key, width),
                None => return,
            },
            DrawMode::Scene => match self.style.stroke {
                Some(color) if self.style.has_stroke() => (color, self.style.stroke_width),
                _ => return,
            },
        };
        self.canvas.save();
        if let Some(cap) = self.style.line_cap {
            self.canvas.set_line_cap(cap);
        }
        if self.mode == DrawMode::Scene {
            self.canvas.set_line_dash(&self.style.dash);
            // A filled shape already cast its shadow.
            let fills = self.style.fill_enabled && self.style.fill.is_some();
            self.canvas
                .set_shadow(if fills { None } else { self.style.shadow });
        }
        self.canvas.set_line_width(width);
        self.canvas.set_stroke(Brush::Solid(brush));
        self.canvas.stroke();
        self.canvas.restore();
    }
}

// -- Built-in geometry --

/// Traces a rectangle with per-corner radii `[top-left, top-right,
/// bottom-right, bottom-left]`, each clamped to half the shorter side.
fn rounded_rect(ctx: &mut ShapeContext<'_>, width: f64, height: f64, radii: [f64; 4]) {
    let limit = (width / 2.0).min(height / 2.0).max(0.0);
    let [tl, tr, br, bl] = radii.map(|r| r.max(0.0).min(limit));
    ctx.move_to(tl, 0.0);
    ctx.line_to(width - tr, 0.0);
    ctx.arc(width - tr, tr, tr, 3.0 * FRAC_PI_2, TAU, false);
    ctx.line_to(width, height - br);
    ctx.arc(width - br, height - br, br, 0.0, FRAC_PI_2, false);
    ctx.line_to(bl, height);
    ctx.arc(bl, height - bl, bl, FRAC_PI_2, PI, false);
    ctx.line_to(0.0, tl);
    ctx.arc(tl, tl, tl, PI, 3.0 * FRAC_PI_2, false);
}

/// Geometry of the built-in `Rect` class: `width`, `height`, and
/// `cornerRadius` (a number or four numbers).
///
/// # Errors
///
/// Never fails.
pub fn rect_scene_func(ctx: &mut ShapeContext<'_>) -> Result<(), DrawError> {
    let width = ctx.attr_f64("width");
    let height = ctx.attr_f64("height");
    let radii = match ctx.attrs().get("cornerRadius") {
        Some(Value::Array(r)) => {
            let r: Vec<f64> = r.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect();
            let at = |i: usize| r.get(i).copied().unwrap_or(0.0);
            [at(0), at(1), at(2), at(3)]
        }
        Some(v) => [v.as_f64().unwrap_or(0.0); 4],
        None => [0.0; 4],
    };
    ctx.begin_path();
    if radii.iter().all(|r| *r == 0.0) {
        ctx.rect(0.0, 0.0, width, height);
    } else {
        rounded_rect(ctx, width, height, radii);
    }
    ctx.close_path();
    ctx.fill_stroke_shape();
    Ok(())
}

/// Geometry of the built-in `Circle` class: `radius` around the origin.
///
/// # Errors
///
/// Never fails.
pub fn circle_scene_func(ctx: &mut ShapeContext<'_>) -> Result<(), DrawError> {
    let radius = ctx.attr_f64("radius");
    ctx.begin_path();
    ctx.arc(0.0, 0.0, radius, 0.0, TAU, false);
    ctx.close_path();
    ctx.fill_stroke_shape();
    Ok(())
}
