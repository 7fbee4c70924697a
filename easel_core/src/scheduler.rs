// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame scheduling: animations and coalesced layer redraws.
//!
//! Nothing here owns a clock. The host calls [`Scene::tick`] once per display
//! frame with its own [`HostTime`]; every draw requested since the previous
//! tick (by [`Scene::batch_draw`], by attribute writes while auto-draw is
//! enabled, or by an animation callback returning `true`) is performed once.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::trace;

use crate::node::NodeId;
use crate::scene::Scene;
use crate::time::HostTime;

/// Per-frame callback of an animation. Returning `false` skips the redraw of
/// the animation's layers for this frame.
pub type AnimationFunc = Rc<dyn Fn(&mut Scene, &FrameInfo) -> bool>;

/// Handle of a running animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnimationId(u64);

/// Timing passed to an animation callback. Times are in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FrameInfo {
    /// Milliseconds accumulated since the animation started.
    pub time: f64,
    /// Milliseconds since the previous frame of this animation.
    pub time_diff: f64,
    /// Host time of the previous frame.
    pub last_time: HostTime,
    /// Instantaneous frames per second; 0 when no time elapsed.
    pub frame_rate: f64,
}

/// What one [`Scene::tick`] did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TickSummary {
    /// Sequence number of the tick, starting at 0.
    pub frame_index: u64,
    /// Host time passed to the tick.
    pub now: HostTime,
    /// Animation callbacks invoked.
    pub animations: usize,
    /// Layers drawn, each at most once.
    pub layers_drawn: usize,
}

struct Animation {
    id: AnimationId,
    func: AnimationFunc,
    layers: Vec<NodeId>,
    frame: FrameInfo,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("id", &self.id)
            .field("layers", &self.layers)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

/// Running animations and the layers waiting for the next frame.
#[derive(Debug, Default)]
pub(crate) struct FrameScheduler {
    animations: Vec<Animation>,
    pending: Vec<NodeId>,
    next_id: u64,
    frame_index: u64,
}

impl FrameScheduler {
    /// Index of the next tick.
    pub(crate) fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn schedule(&mut self, layer: NodeId) {
        if !self.pending.contains(&layer) {
            self.pending.push(layer);
        }
    }

    /// Drops every reference to a freed layer slot.
    pub(crate) fn forget_layer(&mut self, idx: u32) {
        self.pending.retain(|l| l.idx != idx);
        for anim in &mut self.animations {
            anim.layers.retain(|l| l.idx != idx);
        }
    }
}

impl Scene {
    // -- Animations --

    /// Starts an animation that redraws `layers` whenever `func` returns
    /// `true`. `now` seeds the first frame's `time_diff`.
    pub fn start_animation(
        &mut self,
        func: impl Fn(&mut Self, &FrameInfo) -> bool + 'static,
        layers: &[NodeId],
        now: HostTime,
    ) -> AnimationId {
        let id = AnimationId(self.frames.next_id);
        self.frames.next_id += 1;
        self.frames.animations.push(Animation {
            id,
            func: Rc::new(func),
            layers: layers.to_vec(),
            frame: FrameInfo {
                last_time: now,
                ..FrameInfo::default()
            },
        });
        id
    }

    /// Stops an animation. Returns whether it was running.
    pub fn stop_animation(&mut self, id: AnimationId) -> bool {
        let before = self.frames.animations.len();
        self.frames.animations.retain(|a| a.id != id);
        before != self.frames.animations.len()
    }

    /// Whether an animation is still registered.
    #[must_use]
    pub fn is_animation_running(&self, id: AnimationId) -> bool {
        self.frames.animations.iter().any(|a| a.id == id)
    }

    /// Replaces the layers an animation redraws.
    pub fn set_animation_layers(&mut self, id: AnimationId, layers: &[NodeId]) {
        if let Some(anim) = self.frames.animations.iter_mut().find(|a| a.id == id) {
            anim.layers = layers.to_vec();
        }
    }

    /// Timing of an animation's most recent frame.
    #[must_use]
    pub fn animation_frame(&self, id: AnimationId) -> Option<FrameInfo> {
        self.frames
            .animations
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.frame)
    }

    // -- Frames --

    /// Schedules a redraw for the next [`tick`](Self::tick): a stage schedules
    /// all of its layers, any other node its own layer. Repeated requests
    /// within one frame draw once.
    pub fn batch_draw(&mut self, id: NodeId) {
        for layer in self.draw_targets(id) {
            let layer = self.nodes.id_at(layer);
            self.frames.schedule(layer);
        }
    }

    /// Whether a layer is waiting for the next tick.
    #[must_use]
    pub fn is_draw_scheduled(&self, layer: NodeId) -> bool {
        self.frames.pending.contains(&layer)
    }

    /// Whether the host should keep delivering ticks.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        !self.frames.animations.is_empty() || !self.frames.pending.is_empty()
    }

    /// Runs one display frame: advances every animation, then draws every
    /// scheduled layer once.
    pub fn tick(&mut self, now: HostTime) -> TickSummary {
        let ids: Vec<AnimationId> = self.frames.animations.iter().map(|a| a.id).collect();
        let mut animations = 0;
        for id in ids {
            let Some(anim) = self.frames.animations.iter_mut().find(|a| a.id == id) else {
                continue;
            };
            let diff = now.saturating_duration_since(anim.frame.last_time).as_millis_f64();
            anim.frame.time_diff = diff;
            anim.frame.last_time = now;
            anim.frame.time += diff;
            anim.frame.frame_rate = if diff > 0.0 { 1000.0 / diff } else { 0.0 };
            let func = Rc::clone(&anim.func);
            let frame = anim.frame;

            animations += 1;
            if func(self, &frame) {
                let layers = self
                    .frames
                    .animations
                    .iter()
                    .find(|a| a.id == id)
                    .map(|a| a.layers.clone())
                    .unwrap_or_default();
                for layer in layers {
                    if self.nodes.is_alive(layer) {
                        self.frames.schedule(layer);
                    }
                }
            }
        }

        let pending = std::mem::take(&mut self.frames.pending);
        let mut layers_drawn = 0;
        for layer in pending {
            if self.nodes.is_alive(layer) {
                self.draw(layer);
                layers_drawn += 1;
            }
        }

        let summary = TickSummary {
            frame_index: self.frames.frame_index,
            now,
            animations,
            layers_drawn,
        };
        trace!(
            frame = summary.frame_index,
            animations,
            layers_drawn,
            "frame"
        );
        self.emit(|sink| sink.on_frame(&summary));
        self.frames.frame_index += 1;
        summary
    }

    /// Schedules the layer of a changed node when auto-draw is enabled.
    pub(crate) fn request_draw(&mut self, id: NodeId) {
        if self.config.auto_draw_enabled && self.nodes.is_alive(id) {
            self.batch_draw(id);
        }
    }

    pub(crate) fn request_draw_at(&mut self, idx: u32) {
        let id = self.nodes.id_at(idx);
        self.request_draw(id);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::config::SceneConfig;
    use crate::stage::HostContainer;

    fn staged(config: SceneConfig) -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::with_config(config);
        let stage = scene
            .create_stage(Some(HostContainer::sized(40.0, 40.0)), json!({}))
            .unwrap();
        let layer = scene.create_layer(json!({}));
        scene.add(stage, layer).unwrap();
        (scene, stage, layer)
    }

    fn count_draws(scene: &mut Scene, layer: NodeId) -> Rc<Cell<u32>> {
        let draws = Rc::new(Cell::new(0));
        let d = draws.clone();
        scene.on(layer, "draw", move |_, _| d.set(d.get() + 1));
        draws
    }

    #[test]
    fn batch_requests_coalesce() {
        let (mut scene, stage, layer) = staged(SceneConfig::default());
        scene.tick(HostTime(0));
        let draws = count_draws(&mut scene, layer);
        let rect = scene.create_rect(json!({}));
        scene.add(layer, rect).unwrap();
        scene.batch_draw(layer);
        scene.batch_draw(rect);
        scene.batch_draw(stage);
        assert!(scene.is_draw_scheduled(layer));
        assert!(scene.needs_frame());
        let summary = scene.tick(HostTime(16_000));
        assert_eq!(summary.layers_drawn, 1);
        assert_eq!(draws.get(), 1);
        assert!(!scene.is_draw_scheduled(layer));
        assert!(!scene.needs_frame());
    }

    #[test]
    fn attribute_writes_schedule_only_with_auto_draw() {
        let (mut scene, _, layer) = staged(SceneConfig {
            auto_draw_enabled: false,
            ..SceneConfig::default()
        });
        let rect = scene.create_rect(json!({}));
        scene.add(layer, rect).unwrap();
        scene.set_attr(rect, "x", 5);
        assert!(!scene.is_draw_scheduled(layer));

        let (mut scene, _, layer) = staged(SceneConfig::default());
        let rect = scene.create_rect(json!({}));
        scene.add(layer, rect).unwrap();
        scene.tick(HostTime(0));
        scene.set_attr(rect, "x", 5);
        assert!(scene.is_draw_scheduled(layer));
    }

    #[test]
    fn animation_return_value_controls_redraw() {
        let (mut scene, _, layer) = staged(SceneConfig::default());
        scene.tick(HostTime(0));
        let draws = count_draws(&mut scene, layer);
        let redraw = Rc::new(Cell::new(false));
        let r = redraw.clone();
        let anim = scene.start_animation(move |_, _| r.get(), &[layer], HostTime(0));

        scene.tick(HostTime(16_000));
        assert_eq!(draws.get(), 0);
        redraw.set(true);
        scene.tick(HostTime(32_000));
        assert_eq!(draws.get(), 1);

        let frame = scene.animation_frame(anim).unwrap();
        assert_eq!(frame.time, 32.0);
        assert_eq!(frame.time_diff, 16.0);
        assert_eq!(frame.frame_rate, 62.5);

        assert!(scene.stop_animation(anim));
        assert!(!scene.is_animation_running(anim));
        assert!(!scene.needs_frame());
    }

    #[test]
    fn animation_may_stop_itself() {
        let (mut scene, _, layer) = staged(SceneConfig::default());
        let slot: Rc<Cell<Option<AnimationId>>> = Rc::new(Cell::new(None));
        let s = slot.clone();
        let anim = scene.start_animation(
            move |scene, _| {
                if let Some(id) = s.get() {
                    scene.stop_animation(id);
                }
                true
            },
            &[layer],
            HostTime(0),
        );
        slot.set(Some(anim));
        let summary = scene.tick(HostTime(10_000));
        assert_eq!(summary.animations, 1);
        assert!(!scene.is_animation_running(anim));
    }

    #[test]
    fn destroyed_layers_are_dropped_from_the_queue() {
        let (mut scene, _, layer) = staged(SceneConfig::default());
        scene.batch_draw(layer);
        scene.destroy(layer).unwrap();
        assert_eq!(scene.tick(HostTime(0)).layers_drawn, 0);
    }
}
