// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer surfaces, drawing, and render-based hit testing.

use easel_render::{Canvas, HitSample, HitSurface, Pixmap, Rgba, SceneSurface};
use kurbo::{Affine, Point, Vec2};
use tracing::{error, warn};

use crate::event::Event;
use crate::node::{NodeId, NodeKind};
use crate::scene::Scene;
use crate::shape::{DrawMode, ShapeContext, ShapeStyle};
use crate::trace::{DrawEvent, DrawPass, PickEvent};

/// Sample offsets of the spiral search, scaled by the search distance.
const INTERSECTION_OFFSETS: [(f64, f64); 5] = [(0.0, 0.0), (-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// The two rasters of a layer attached to a stage.
#[derive(Debug)]
pub(crate) struct LayerSurfaces {
    scene: Option<SceneSurface>,
    hit: Option<HitSurface>,
}

impl LayerSurfaces {
    fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            scene: SceneSurface::new(width, height, pixel_ratio),
            hit: HitSurface::new(width, height, pixel_ratio),
        }
    }
}

impl Scene {
    // -- Surfaces --

    /// Allocates surfaces for `layer` at the size of `stage`.
    pub(crate) fn allocate_layer_surfaces(&mut self, layer: u32, stage: u32) {
        let width = self.nodes.num(stage, "width", 0.0);
        let height = self.nodes.num(stage, "height", 0.0);
        self.surfaces.insert(
            layer,
            LayerSurfaces::new(width, height, self.config.pixel_ratio),
        );
    }

    /// Reallocates and redraws every layer of a resized stage.
    pub(crate) fn resize_layer_surfaces(&mut self, stage: u32) {
        for layer in self.nodes.children[stage as usize].clone() {
            self.allocate_layer_surfaces(layer, stage);
            self.draw(self.nodes.id_at(layer));
        }
    }

    /// The scene surface of a layer attached to a stage.
    #[must_use]
    pub fn scene_surface(&self, layer: NodeId) -> Option<&SceneSurface> {
        self.nodes.validate(layer);
        self.surfaces.get(&layer.idx)?.scene.as_ref()
    }

    /// The hit surface of a layer attached to a stage.
    #[must_use]
    pub fn hit_surface(&self, layer: NodeId) -> Option<&HitSurface> {
        self.nodes.validate(layer);
        self.surfaces.get(&layer.idx)?.hit.as_ref()
    }

    /// Composites the scene surfaces of a stage's visible layers, bottom to
    /// top, into one device-resolution pixmap.
    pub fn to_pixmap(&mut self, stage: NodeId) -> Option<Pixmap> {
        self.nodes.validate(stage);
        let size = self.stage_size(stage);
        let ratio = self.config.pixel_ratio;
        let mut out = match Canvas::new(size.width, size.height, ratio) {
            Ok(canvas) => canvas,
            Err(err) => {
                warn!(stage = ?stage, %err, "cannot composite stage");
                return None;
            }
        };
        out.set_transform(Affine::scale(1.0 / ratio));
        for layer in self.nodes.children[stage.idx as usize].clone() {
            if !self.nodes.visible_at(layer) {
                continue;
            }
            if let Some(scene) = self.surfaces.get(&layer).and_then(|s| s.scene.as_ref()) {
                out.draw_image(scene.canvas().pixmap(), 0.0, 0.0);
            }
        }
        Some(out.pixmap().clone())
    }

    // -- Drawing --

    /// Redraws immediately: every layer of a stage, or the layer owning any
    /// other node. Both the scene and the hit surface are drawn.
    pub fn draw(&mut self, id: NodeId) {
        for layer in self.draw_targets(id) {
            self.draw_layer_scene(layer);
            self.draw_layer_hit(layer);
        }
    }

    /// Redraws only the scene surface of the affected layers.
    pub fn draw_scene(&mut self, id: NodeId) {
        for layer in self.draw_targets(id) {
            self.draw_layer_scene(layer);
        }
    }

    /// Redraws only the hit surface of the affected layers.
    pub fn draw_hit(&mut self, id: NodeId) {
        for layer in self.draw_targets(id) {
            self.draw_layer_hit(layer);
        }
    }

    /// Layer slots a draw of `id` covers.
    pub(crate) fn draw_targets(&self, id: NodeId) -> Vec<u32> {
        if !self.nodes.is_alive(id) {
            return Vec::new();
        }
        match self.nodes.kind[id.idx as usize] {
            NodeKind::Stage => self.nodes.children[id.idx as usize].clone(),
            _ => self.nodes.layer_at(id.idx).into_iter().collect(),
        }
    }

    fn draw_layer_scene(&mut self, layer: u32) {
        if !self.surfaces.contains_key(&layer) {
            return;
        }
        let id = self.nodes.id_at(layer);
        self.fire(id, &mut Event::new("beforeDraw").with_target(id));
        if !self.nodes.is_alive(id) {
            return;
        }
        let Some(mut surfaces) = self.surfaces.remove(&layer) else {
            return;
        };
        let mut shapes = 0;
        if let Some(scene) = surfaces.scene.as_mut() {
            let canvas = scene.canvas_mut();
            if self.nodes.flag(layer, "clearBeforeDraw", true) {
                canvas.clear();
            }
            self.draw_container(layer, canvas, DrawPass::Scene, &mut shapes);
        }
        self.surfaces.insert(layer, surfaces);
        let frame_index = self.frames.frame_index();
        self.emit(|sink| {
            sink.on_draw(&DrawEvent {
                layer: id,
                pass: DrawPass::Scene,
                shapes,
                frame_index,
            });
        });
        self.fire(id, &mut Event::new("draw").with_target(id));
    }

    fn draw_layer_hit(&mut self, layer: u32) {
        let Some(mut surfaces) = self.surfaces.remove(&layer) else {
            return;
        };
        let mut shapes = 0;
        if let Some(hit) = surfaces.hit.as_mut() {
            let canvas = hit.canvas_mut();
            if self.nodes.flag(layer, "clearBeforeDraw", true) {
                canvas.clear();
            }
            self.draw_container(layer, canvas, DrawPass::Hit, &mut shapes);
        }
        self.surfaces.insert(layer, surfaces);
        let id = self.nodes.id_at(layer);
        let frame_index = self.frames.frame_index();
        self.emit(|sink| {
            sink.on_draw(&DrawEvent {
                layer: id,
                pass: DrawPass::Hit,
                shapes,
                frame_index,
            });
        });
    }

    fn draw_container(&mut self, idx: u32, canvas: &mut Canvas, pass: DrawPass, shapes: &mut usize) {
        let enabled = match pass {
            DrawPass::Scene => self.nodes.visible_at(idx),
            DrawPass::Hit => self.should_draw_hit_at(idx, false),
        };
        if !enabled {
            return;
        }

        let clip = match (
            self.nodes.attr(idx, "clipWidth").and_then(|v| v.as_f64()),
            self.nodes.attr(idx, "clipHeight").and_then(|v| v.as_f64()),
        ) {
            (Some(w), Some(h)) => Some((
                self.nodes.num(idx, "clipX", 0.0),
                self.nodes.num(idx, "clipY", 0.0),
                w,
                h,
            )),
            _ => None,
        };
        if let Some((x, y, w, h)) = clip {
            let abs = self.nodes.absolute_transform_at(idx);
            canvas.save();
            canvas.transform(abs.to_affine());
            canvas.begin_path();
            canvas.rect(x, y, w, h);
            canvas.clip();
            canvas.begin_path();
            match abs.invert() {
                Some(inv) => canvas.transform(inv.to_affine()),
                None => canvas.reset_transform(),
            }
        }

        for child in self.nodes.children[idx as usize].clone() {
            if self.nodes.kind[child as usize] == NodeKind::Shape {
                if self.draw_shape(child, canvas, pass) {
                    *shapes += 1;
                }
            } else {
                self.draw_container(child, canvas, pass, shapes);
            }
        }

        if clip.is_some() {
            canvas.restore();
        }
    }

    fn draw_shape(&mut self, idx: u32, canvas: &mut Canvas, pass: DrawPass) -> bool {
        let mode = match pass {
            DrawPass::Scene => {
                if !self.nodes.visible_at(idx) {
                    return false;
                }
                DrawMode::Scene
            }
            DrawPass::Hit => {
                if !self.should_draw_hit_at(idx, false) {
                    return false;
                }
                let Some(key) = self.nodes.color_key[idx as usize]
                    .as_deref()
                    .and_then(Rgba::parse)
                else {
                    return false;
                };
                DrawMode::Hit(key)
            }
        };

        let class = self.nodes.class[idx as usize].clone();
        let hooks = &self.nodes.hooks[idx as usize];
        let spec = self.classes.spec(&class);
        let scene_func = hooks
            .scene_func
            .clone()
            .or_else(|| spec.and_then(|s| s.scene_func.clone()));
        let func = match pass {
            DrawPass::Scene => scene_func,
            DrawPass::Hit => hooks
                .hit_func
                .clone()
                .or_else(|| spec.and_then(|s| s.hit_func.clone()))
                .or(scene_func),
        };
        let Some(func) = func else {
            return false;
        };

        let abs = self.nodes.absolute_transform_at(idx);
        let opacity = self.nodes.absolute_opacity_at(idx);
        let decomposed = abs.decompose(self.config.angle_mode);
        let abs_scale = Vec2::new(decomposed.scale_x, decomposed.scale_y);
        let id = self.nodes.id_at(idx);

        let view = self.view(idx);
        let style = ShapeStyle::resolve(&view, &self.nodes.handles[idx as usize], abs_scale);
        canvas.save();
        canvas.transform(abs.to_affine());
        if matches!(mode, DrawMode::Scene) {
            canvas.set_global_alpha(opacity);
        }
        let result = {
            let mut ctx = ShapeContext::new(canvas, mode, &style, view, id);
            func(&mut ctx)
        };
        canvas.restore();
        if let Err(err) = result {
            error!(node = ?id, class = %class, %err, "scene function failed; shape skipped");
        }
        true
    }

    /// Whether a node is drawn into its layer's hit surface: visible,
    /// listening, and not on a layer with an active drag (unless
    /// `hit_on_drag_enabled`, or `skip_drag_check`).
    pub fn should_draw_hit(&mut self, id: NodeId, skip_drag_check: bool) -> bool {
        self.nodes.validate(id);
        self.should_draw_hit_at(id.idx, skip_drag_check)
    }

    pub(crate) fn should_draw_hit_at(&mut self, idx: u32, skip_drag_check: bool) -> bool {
        let layer = self.nodes.layer_at(idx);
        let layer_under_drag = self.drag.sessions().iter().any(|s| {
            s.status == crate::drag::DragStatus::Dragging
                && self.nodes.is_alive(s.node)
                && (self.nodes.kind[s.node.idx as usize] == NodeKind::Stage
                    || self.nodes.layer_at(s.node.idx) == layer)
        });
        let drag_skip = !skip_drag_check && !self.config.hit_on_drag_enabled && layer_under_drag;
        self.nodes.listening_at(idx) && self.nodes.visible_at(idx) && !drag_skip
    }

    // -- Hit testing --

    /// The shape under `p` (stage coordinates) on one layer.
    ///
    /// Reads the hit surface at `p`, then at the four diagonal neighbours,
    /// widening the ring while only antialiased or unknown pixels are found.
    #[must_use = "hit testing has no side effects besides tracing"]
    pub fn layer_intersection(&mut self, layer: NodeId, p: Point) -> Option<NodeId> {
        self.nodes.validate(layer);
        let idx = layer.idx;
        if !self.nodes.listening_at(idx) || !self.nodes.visible_at(idx) {
            return None;
        }
        let hit = self.surfaces.get(&idx)?.hit.as_ref()?;
        let canvas = hit.canvas();
        let ratio = canvas.pixel_ratio();
        let diagonal = f64::from(canvas.width()).hypot(f64::from(canvas.height())) / ratio;

        let mut distance = 1_u32;
        let mut result = None;
        'search: loop {
            let d = f64::from(distance);
            let mut antialiased = false;
            for (dx, dy) in INTERSECTION_OFFSETS {
                match hit.sample(p.x + dx * d, p.y + dy * d) {
                    HitSample::Solid(key) => match self.keys.lookup(&key) {
                        Some(shape) => {
                            result = Some(shape);
                            break 'search;
                        }
                        None => antialiased = true,
                    },
                    HitSample::Antialiased => antialiased = true,
                    HitSample::Miss => {}
                }
            }
            if !antialiased || d >= diagonal {
                break;
            }
            distance += 1;
        }

        self.emit(|sink| {
            sink.on_pick(&PickEvent {
                layer,
                point: p,
                distance,
                result,
            });
        });
        result
    }

    /// The shape under `p` on a stage, querying layers top-most first.
    #[must_use = "hit testing has no side effects besides tracing"]
    pub fn stage_intersection(&mut self, stage: NodeId, p: Point) -> Option<NodeId> {
        self.nodes.validate(stage);
        for layer in self.nodes.children[stage.idx as usize].clone().into_iter().rev() {
            let layer = self.nodes.id_at(layer);
            if let Some(shape) = self.layer_intersection(layer, p) {
                return Some(shape);
            }
        }
        None
    }

    /// Hit test scoped to a node: the whole stage for a stage, one layer for
    /// a layer, and otherwise the node's layer restricted to the node's
    /// subtree.
    pub fn pick(&mut self, id: NodeId, p: Point) -> Option<NodeId> {
        self.nodes.validate(id);
        match self.nodes.kind[id.idx as usize] {
            NodeKind::Stage => self.stage_intersection(id, p),
            NodeKind::Layer => self.layer_intersection(id, p),
            NodeKind::Group | NodeKind::Shape => {
                let layer = self.nodes.id_at(self.nodes.layer_at(id.idx)?);
                self.layer_intersection(layer, p)
                    .filter(|&hit| hit == id || self.nodes.is_ancestor_at(id.idx, hit.idx))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::config::SceneConfig;
    use crate::stage::HostContainer;

    fn stage_with_layer(ratio: f64) -> (Scene, NodeId, NodeId) {
        let config = SceneConfig {
            pixel_ratio: ratio,
            ..SceneConfig::seeded(21)
        };
        let mut scene = Scene::with_config(config);
        let stage = scene
            .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
            .unwrap();
        let layer = scene.create_layer(json!({}));
        scene.add(stage, layer).unwrap();
        (scene, stage, layer)
    }

    #[test]
    fn later_siblings_win_the_hit() {
        let (mut scene, stage, layer) = stage_with_layer(1.0);
        let below = scene.create_rect(json!({ "x": 10, "y": 10, "width": 50, "height": 50, "fill": "red" }));
        let above = scene.create_rect(json!({ "x": 30, "y": 30, "width": 50, "height": 50, "fill": "blue" }));
        scene.add(layer, below).unwrap();
        scene.add(layer, above).unwrap();
        scene.draw(layer);
        assert_eq!(scene.stage_intersection(stage, Point::new(40.0, 40.0)), Some(above));
        assert_eq!(scene.stage_intersection(stage, Point::new(15.0, 15.0)), Some(below));
        assert_eq!(scene.stage_intersection(stage, Point::new(95.0, 5.0)), None);
    }

    #[test]
    fn hit_respects_pixel_ratio() {
        let (mut scene, stage, layer) = stage_with_layer(2.0);
        let rect = scene.create_rect(json!({ "x": 20, "y": 20, "width": 10, "height": 10, "fill": "red" }));
        scene.add(layer, rect).unwrap();
        scene.draw(layer);
        assert_eq!(scene.hit_surface(layer).map(|h| h.canvas().width()), Some(200));
        assert_eq!(scene.stage_intersection(stage, Point::new(25.0, 25.0)), Some(rect));
        assert_eq!(scene.stage_intersection(stage, Point::new(40.0, 40.0)), None);
    }

    #[test]
    fn hidden_or_deaf_layers_are_skipped() {
        let (mut scene, stage, layer) = stage_with_layer(1.0);
        let rect = scene.create_rect(json!({ "width": 50, "height": 50, "fill": "red" }));
        scene.add(layer, rect).unwrap();
        scene.draw(layer);
        scene.set_attr(layer, "listening", false);
        assert_eq!(scene.stage_intersection(stage, Point::new(10.0, 10.0)), None);
        scene.set_attr(layer, "listening", true);
        scene.set_attr(layer, "visible", false);
        assert_eq!(scene.stage_intersection(stage, Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn clip_limits_drawing() {
        let (mut scene, stage, layer) = stage_with_layer(1.0);
        let group = scene.create_group(json!({ "clipX": 0, "clipY": 0, "clipWidth": 20, "clipHeight": 20 }));
        let rect = scene.create_rect(json!({ "width": 80, "height": 80, "fill": "red" }));
        scene.add(layer, group).unwrap();
        scene.add(group, rect).unwrap();
        scene.draw(layer);
        assert_eq!(scene.stage_intersection(stage, Point::new(10.0, 10.0)), Some(rect));
        assert_eq!(scene.stage_intersection(stage, Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn failing_scene_function_does_not_stop_siblings() {
        let (mut scene, stage, layer) = stage_with_layer(1.0);
        let broken = scene.create_shape(json!({}), |_| Err(easel_render::DrawError::callback("boom")));
        let rect = scene.create_rect(json!({ "width": 30, "height": 30, "fill": "red" }));
        scene.add(layer, broken).unwrap();
        scene.add(layer, rect).unwrap();
        scene.draw(layer);
        assert_eq!(scene.stage_intersection(stage, Point::new(10.0, 10.0)), Some(rect));
    }

    #[test]
    fn draw_events_bracket_the_layer_draw() {
        let (mut scene, _, layer) = stage_with_layer(1.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        scene.on(layer, "beforeDraw draw", move |_, e| sink.borrow_mut().push(e.kind.clone()));
        scene.draw(layer);
        assert_eq!(*log.borrow(), ["beforeDraw", "draw"]);
    }

    #[test]
    fn composite_contains_layer_pixels() {
        let (mut scene, stage, layer) = stage_with_layer(1.0);
        let rect = scene.create_rect(json!({ "width": 10, "height": 10, "fill": "#00ff00" }));
        scene.add(layer, rect).unwrap();
        scene.draw(layer);
        let pixmap = scene.to_pixmap(stage).unwrap();
        let px = pixmap.pixel(5, 5).unwrap().demultiply();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0, 255, 0, 255));
        assert_eq!(pixmap.pixel(50, 50).unwrap().alpha(), 0);
    }

    #[test]
    fn pick_on_a_group_is_scoped() {
        let (mut scene, _, layer) = stage_with_layer(1.0);
        let group = scene.create_group(json!({}));
        let inside = scene.create_rect(json!({ "width": 20, "height": 20, "fill": "red" }));
        let outside = scene.create_rect(json!({ "x": 50, "width": 20, "height": 20, "fill": "red" }));
        scene.add(layer, group).unwrap();
        scene.add(group, inside).unwrap();
        scene.add(layer, outside).unwrap();
        scene.draw(layer);
        assert_eq!(scene.pick(group, Point::new(10.0, 10.0)), Some(inside));
        assert_eq!(scene.pick(group, Point::new(60.0, 10.0)), None);
        assert_eq!(scene.pick(layer, Point::new(60.0, 10.0)), Some(outside));
    }
}
