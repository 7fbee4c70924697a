// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: host container geometry, pointer tracking, and translation of
//! host input into semantic node events.
//!
//! Each pointer family keeps its own hover target, click candidate, and
//! double-click window, so mouse, touch, and pointer input interleave
//! without disturbing each other.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::attrs;
use crate::error::{Result, SceneError};
use crate::event::{Event, InputEvent, InputPhase, PointerFamily};
use crate::node::{NodeId, NodeKind};
use crate::scene::Scene;
use crate::time::HostTime;

/// Placement of the stage's host element, in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostContainer {
    /// Left edge of the content box.
    pub left: f64,
    /// Top edge of the content box.
    pub top: f64,
    /// Displayed width. Differs from the stage width when the host scales
    /// the content.
    pub css_width: f64,
    /// Displayed height.
    pub css_height: f64,
}

impl HostContainer {
    /// A container at `(left, top)` displayed at `css_width × css_height`.
    #[must_use]
    pub const fn new(left: f64, top: f64, css_width: f64, css_height: f64) -> Self {
        Self {
            left,
            top,
            css_width,
            css_height,
        }
    }

    /// An unscaled container at the client origin.
    #[must_use]
    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Hover and click bookkeeping of one pointer family.
#[derive(Clone, Debug, Default)]
pub(crate) struct FamilyState {
    pub(crate) target_shape: Option<NodeId>,
    pub(crate) click_start: Option<NodeId>,
    pub(crate) click_end: Option<NodeId>,
    pub(crate) listen_click: bool,
    pub(crate) in_dbl_window: bool,
    pub(crate) dbl_deadline: HostTime,
}

/// Per-stage input state.
#[derive(Clone, Debug)]
pub(crate) struct StageState {
    pub(crate) container: HostContainer,
    pub(crate) pointer_positions: Vec<(u32, Point)>,
    pub(crate) changed_pointer_positions: Vec<(u32, Point)>,
    pub(crate) families: [FamilyState; 3],
}

impl StageState {
    fn new(container: HostContainer) -> Self {
        Self {
            container,
            pointer_positions: Vec::new(),
            changed_pointer_positions: Vec::new(),
            families: Default::default(),
        }
    }

    fn family(&mut self, family: PointerFamily) -> &mut FamilyState {
        &mut self.families[family.slot()]
    }
}

impl Scene {
    // -- Construction and geometry --

    /// Creates a stage bound to a host container. Unset `width`/`height`
    /// attributes default to the container's displayed size.
    ///
    /// # Errors
    ///
    /// [`SceneError::MissingContainer`] when `container` is `None`.
    pub fn create_stage(&mut self, container: Option<HostContainer>, attrs: Value) -> Result<NodeId> {
        let container = container.ok_or(SceneError::MissingContainer)?;
        let mut attrs = attrs::from_value(attrs);
        attrs
            .entry("width")
            .or_insert_with(|| json!(container.css_width));
        attrs
            .entry("height")
            .or_insert_with(|| json!(container.css_height));
        let spec = self
            .classes
            .get("Stage")
            .ok_or_else(|| SceneError::UnknownClass("Stage".to_owned()))?;
        let id = self.nodes.create(NodeKind::Stage, &spec.name);
        self.stages.insert(id.idx, StageState::new(container));
        for (key, value) in attrs {
            self.set_attr(id, &key, value);
        }
        Ok(id)
    }

    pub(crate) fn check_stage(&self, stage: NodeId) -> Result<()> {
        if !self.nodes.is_alive(stage) {
            return Err(SceneError::StaleNode(stage));
        }
        if self.stages.contains_key(&stage.idx) {
            Ok(())
        } else {
            Err(SceneError::MissingAncestor {
                node: stage,
                ancestor: "Stage",
            })
        }
    }

    /// Moves or rescales the host container.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] or [`SceneError::MissingAncestor`] when
    /// `stage` is not a live stage.
    pub fn set_container(&mut self, stage: NodeId, container: HostContainer) -> Result<()> {
        self.check_stage(stage)?;
        if let Some(state) = self.stages.get_mut(&stage.idx) {
            state.container = container;
        }
        Ok(())
    }

    /// The host container of a stage.
    #[must_use]
    pub fn container(&self, stage: NodeId) -> Option<HostContainer> {
        self.stages.get(&stage.idx).map(|s| s.container)
    }

    /// Resizes a stage. Every layer surface is reallocated and redrawn.
    ///
    /// # Errors
    ///
    /// As for [`set_container`](Self::set_container).
    pub fn set_stage_size(&mut self, stage: NodeId, size: Size) -> Result<()> {
        self.check_stage(stage)?;
        self.set_attr(stage, "width", size.width);
        self.set_attr(stage, "height", size.height);
        Ok(())
    }

    /// Logical size of a stage.
    #[must_use]
    pub fn stage_size(&self, stage: NodeId) -> Size {
        Size::new(self.attr_f64(stage, "width"), self.attr_f64(stage, "height"))
    }

    // -- Pointer positions --

    fn set_pointers_positions(&mut self, stage: NodeId, input: &InputEvent) {
        let size = self.stage_size(stage);
        let Some(state) = self.stages.get_mut(&stage.idx) else {
            return;
        };
        let c = state.container;
        let ratio = |css: f64, logical: f64| {
            let r = css / logical;
            if r.is_finite() && r != 0.0 { r } else { 1.0 }
        };
        let (sx, sy) = (ratio(c.css_width, size.width), ratio(c.css_height, size.height));
        let map = |(id, client): (u32, Point)| {
            (id, Point::new((client.x - c.left) / sx, (client.y - c.top) / sy))
        };
        state.pointer_positions = input.all_pointers().into_iter().map(map).collect();
        state.changed_pointer_positions = input.changed_pointers().into_iter().map(map).collect();
    }

    /// The first tracked pointer position of a stage.
    #[must_use]
    pub fn pointer_position(&self, stage: NodeId) -> Option<Point> {
        let state = self.stages.get(&stage.idx)?;
        let found = state
            .pointer_positions
            .first()
            .or_else(|| state.changed_pointer_positions.first())
            .map(|&(_, p)| p);
        if found.is_none() {
            warn!(stage = ?stage, "no pointer position recorded yet");
        }
        found
    }

    /// Every tracked pointer as `(id, position)`.
    #[must_use]
    pub fn pointers_positions(&self, stage: NodeId) -> Vec<(u32, Point)> {
        self.stages
            .get(&stage.idx)
            .map(|s| s.pointer_positions.clone())
            .unwrap_or_default()
    }

    /// The tracked position of one pointer.
    #[must_use]
    pub fn pointer_by_id(&self, stage: NodeId, pointer_id: u32) -> Option<Point> {
        self.stages.get(&stage.idx).and_then(|s| {
            s.pointer_positions
                .iter()
                .find(|(id, _)| *id == pointer_id)
                .map(|&(_, p)| p)
        })
    }

    pub(crate) fn changed_pointers(&self, stage: u32) -> Vec<(u32, Point)> {
        self.stages
            .get(&stage)
            .map(|s| s.changed_pointer_positions.clone())
            .unwrap_or_default()
    }

    /// The stage pointer position in the node's local coordinates.
    pub fn relative_pointer_position(&mut self, id: NodeId) -> Option<Point> {
        let stage = self.stage_of(id)?;
        let pos = self.pointer_position(stage)?;
        let inv = self.absolute_transform(id).invert()?;
        Some(inv.point(pos))
    }

    // -- Input dispatch --

    /// Feeds one host input event through the stage.
    ///
    /// Runs the whole cascade synchronously: pointer bookkeeping, hit
    /// testing, semantic events on shapes (bubbling) or on the stage, and
    /// drag-session updates. Redraws requested by handlers wait for the next
    /// [`tick`](Self::tick).
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] or [`SceneError::MissingAncestor`] when
    /// `stage` is not a live stage.
    pub fn dispatch_input(&mut self, stage: NodeId, input: InputEvent) -> Result<()> {
        self.check_stage(stage)?;
        if input.family == PointerFamily::Pointer && !self.config.pointer_events_enabled {
            return Ok(());
        }
        trace!(stage = ?stage, family = ?input.family, phase = ?input.phase, "input");
        self.set_pointers_positions(stage, &input);
        match input.phase {
            InputPhase::Enter => {
                let kind = input.family.names().enter;
                self.fire_on_stage(stage, kind, &input, None);
            }
            InputPhase::Down => self.stage_down(stage, &input),
            InputPhase::Move => {
                self.stage_move(stage, &input);
                self.drag_step(&input);
            }
            InputPhase::Up => {
                self.end_drag_before();
                self.stage_up(stage, &input);
                self.end_drag_after(&input);
            }
            InputPhase::Cancel => self.stage_cancel(stage, &input),
            InputPhase::Leave => self.stage_leave(stage, &input),
            InputPhase::Wheel => self.stage_simple(stage, &input, "wheel"),
            InputPhase::ContextMenu => self.stage_simple(stage, &input, "contextmenu"),
            InputPhase::LostCapture => {
                for (id, _) in input.changed_pointers() {
                    self.release_capture(id);
                }
            }
        }
        Ok(())
    }

    fn fire_on_stage(&mut self, stage: NodeId, kind: &str, input: &InputEvent, pointer_id: Option<u32>) {
        let mut event = Event::from_input(kind, input, pointer_id).with_target(stage);
        self.fire(stage, &mut event);
    }

    fn fire_on_shape(&mut self, shape: NodeId, kind: &str, input: &InputEvent, pointer_id: u32, compare: Option<NodeId>) {
        let mut event = Event::from_input(kind, input, Some(pointer_id));
        self.fire_and_bubble(shape, &mut event, compare);
    }

    fn family_state(&mut self, stage: NodeId, family: PointerFamily) -> Option<&mut FamilyState> {
        self.stages.get_mut(&stage.idx).map(|s| s.family(family))
    }

    /// Whether enter/leave/move processing runs while drags are active.
    fn hover_enabled(&self) -> bool {
        !self.drag.is_dragging_any() || self.config.hit_on_drag_enabled
    }

    fn is_listening_shape(&mut self, shape: Option<NodeId>) -> Option<NodeId> {
        shape.filter(|&s| self.nodes.is_alive(s) && self.nodes.listening_at(s.idx))
    }

    fn stage_down(&mut self, stage: NodeId, input: &InputEvent) {
        let family = input.family;
        let names = family.names();
        let mut triggered = false;
        for (pointer_id, pos) in self.changed_pointers(stage.idx) {
            let hit = self.stage_intersection(stage, pos);
            self.drag.just_dragged = false;
            let shape = self.is_listening_shape(hit);
            if let Some(state) = self.family_state(stage, family) {
                state.listen_click = true;
                state.click_start = shape;
            }
            let Some(shape) = shape else {
                continue;
            };
            if self.config.capture_pointer_events_enabled {
                self.set_pointer_capture(pointer_id, shape);
            }
            self.fire_on_shape(shape, names.down, input, pointer_id, None);
            triggered = true;
        }
        if !triggered {
            let first = self.pointers_positions(stage).first().map(|&(id, _)| id);
            self.fire_on_stage(stage, names.down, input, first);
        }
    }

    fn current_target(&mut self, stage: NodeId, family: PointerFamily) -> Option<NodeId> {
        let target = self.family_state(stage, family)?.target_shape?;
        if self.nodes.is_alive(target) && self.nodes.stage_at(target.idx).is_some() {
            Some(target)
        } else {
            None
        }
    }

    fn set_current_target(&mut self, stage: NodeId, family: PointerFamily, target: Option<NodeId>) {
        if let Some(state) = self.family_state(stage, family) {
            state.target_shape = target;
        }
    }

    fn stage_move(&mut self, stage: NodeId, input: &InputEvent) {
        if !self.hover_enabled() {
            return;
        }
        let family = input.family;
        let names = family.names();
        let target = self.current_target(stage, family);
        let mut processed: Vec<NodeId> = Vec::new();
        let mut triggered = false;
        let changed = self.changed_pointers(stage.idx);
        for &(pointer_id, pos) in &changed {
            let shape = match self.captured_node(pointer_id) {
                Some(captured) => Some(captured),
                None => self.stage_intersection(stage, pos),
            };
            let different = target != shape;
            if different && let Some(old) = target {
                self.fire_on_shape(old, names.out, input, pointer_id, shape);
                self.fire_on_shape(old, names.leave, input, pointer_id, shape);
            }
            if let Some(s) = shape {
                if processed.contains(&s) {
                    continue;
                }
                processed.push(s);
            }
            if let Some(shape) = self.is_listening_shape(shape) {
                triggered = true;
                if different {
                    self.fire_on_shape(shape, names.over, input, pointer_id, target);
                    self.fire_on_shape(shape, names.enter, input, pointer_id, target);
                    self.set_current_target(stage, family, Some(shape));
                }
                self.fire_on_shape(shape, names.moved, input, pointer_id, None);
            } else if target.is_some() {
                self.fire_on_stage(stage, names.over, input, Some(pointer_id));
                self.set_current_target(stage, family, None);
            }
        }
        if !triggered {
            let first = changed.first().map(|&(id, _)| id);
            self.fire_on_stage(stage, names.moved, input, first);
        }
    }

    fn stage_up(&mut self, stage: NodeId, input: &InputEvent) {
        let family = input.family;
        let names = family.names();
        let window = self.config.dbl_click_window;
        let now = input.time;
        let (click_start, click_end) = self
            .family_state(stage, family)
            .map_or((None, None), |s| (s.click_start, s.click_end));
        let mut processed: Vec<NodeId> = Vec::new();
        let mut triggered = false;
        let changed = self.changed_pointers(stage.idx);
        for &(pointer_id, pos) in &changed {
            let shape = match self.captured_node(pointer_id) {
                Some(captured) => Some(captured),
                None => self.stage_intersection(stage, pos),
            };
            if let Some(s) = shape {
                self.release_capture(pointer_id);
                if processed.contains(&s) {
                    continue;
                }
                processed.push(s);
            }

            let just_dragged = self.drag.just_dragged;
            let mut fire_dbl = false;
            if let Some(state) = self.family_state(stage, family) {
                if state.in_dbl_window && now >= state.dbl_deadline {
                    state.in_dbl_window = false;
                }
                if state.in_dbl_window {
                    fire_dbl = true;
                } else if !just_dragged {
                    state.in_dbl_window = true;
                }
                state.dbl_deadline = now + window;
            }
            let listen_click = self
                .family_state(stage, family)
                .is_some_and(|s| s.listen_click);

            if let Some(shape) = self.is_listening_shape(shape) {
                triggered = true;
                if let Some(state) = self.family_state(stage, family) {
                    state.click_end = Some(shape);
                }
                self.fire_on_shape(shape, names.up, input, pointer_id, None);
                if listen_click && click_start == Some(shape) {
                    self.fire_on_shape(shape, names.click, input, pointer_id, None);
                    if fire_dbl && click_end == Some(shape) {
                        self.fire_on_shape(shape, names.dblclick, input, pointer_id, None);
                    }
                }
            } else {
                if let Some(state) = self.family_state(stage, family) {
                    state.click_end = None;
                }
                if listen_click {
                    self.fire_on_stage(stage, names.click, input, Some(pointer_id));
                }
                if fire_dbl {
                    self.fire_on_stage(stage, names.dblclick, input, Some(pointer_id));
                }
            }
        }
        if !triggered {
            let first = changed.first().map(|&(id, _)| id);
            self.fire_on_stage(stage, names.up, input, first);
        }
        if let Some(state) = self.family_state(stage, family) {
            state.listen_click = false;
        }
    }

    fn stage_cancel(&mut self, stage: NodeId, input: &InputEvent) {
        let kind = input.family.names().cancel;
        for (pointer_id, pos) in self.changed_pointers(stage.idx) {
            let shape = match self.captured_node(pointer_id) {
                Some(captured) => Some(captured),
                None => self.stage_intersection(stage, pos),
            };
            if let Some(shape) = shape {
                self.fire_on_shape(shape, kind, input, pointer_id, None);
            }
            self.release_capture(pointer_id);
        }
    }

    fn stage_leave(&mut self, stage: NodeId, input: &InputEvent) {
        let family = input.family;
        let names = family.names();
        let enabled = self.hover_enabled();
        let target = self.current_target(stage, family);
        let pointer_id = input.primary_pointer_id();
        match target {
            Some(target) if enabled => {
                self.fire_on_shape(target, names.out, input, pointer_id, None);
                self.fire_on_shape(target, names.leave, input, pointer_id, None);
                self.fire_on_stage(stage, names.leave, input, None);
                self.set_current_target(stage, family, None);
            }
            _ if enabled => {
                self.fire_on_stage(stage, names.leave, input, None);
                self.fire_on_stage(stage, names.out, input, None);
            }
            _ => {}
        }
        if let Some(state) = self.stages.get_mut(&stage.idx) {
            state.pointer_positions.clear();
            state.changed_pointer_positions.clear();
        }
    }

    fn stage_simple(&mut self, stage: NodeId, input: &InputEvent, kind: &str) {
        let pointer_id = input.primary_pointer_id();
        let hit = self
            .pointer_position(stage)
            .and_then(|pos| self.stage_intersection(stage, pos));
        match self.is_listening_shape(hit) {
            Some(shape) => self.fire_on_shape(shape, kind, input, pointer_id, None),
            None => self.fire_on_stage(stage, kind, input, Some(pointer_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::SceneConfig;
    use crate::event::Touch;

    fn at(ms: u64) -> HostTime {
        HostTime::from_millis(ms)
    }

    #[test]
    fn stage_requires_a_container() {
        let mut scene = Scene::new();
        assert!(matches!(
            scene.create_stage(None, json!({})),
            Err(SceneError::MissingContainer)
        ));
        assert!(matches!(
            scene.create("Stage", json!({})),
            Err(SceneError::MissingContainer)
        ));
    }

    #[test]
    fn size_defaults_to_the_container() {
        let mut scene = Scene::new();
        let stage = scene
            .create_stage(Some(HostContainer::sized(120.0, 80.0)), json!({}))
            .unwrap();
        assert_eq!(scene.stage_size(stage), Size::new(120.0, 80.0));
    }

    #[test]
    fn positions_account_for_offset_and_css_scale() {
        let mut scene = Scene::new();
        let stage = scene
            .create_stage(
                Some(HostContainer::new(10.0, 20.0, 200.0, 100.0)),
                json!({ "width": 100, "height": 50 }),
            )
            .unwrap();
        scene
            .dispatch_input(stage, InputEvent::mouse(InputPhase::Move, 30.0, 40.0, at(0)))
            .unwrap();
        assert_eq!(scene.pointer_position(stage), Some(Point::new(10.0, 10.0)));
        assert_eq!(
            scene.pointers_positions(stage),
            vec![(crate::event::DEFAULT_POINTER_ID, Point::new(10.0, 10.0))]
        );
    }

    #[test]
    fn touches_track_all_and_changed() {
        let mut scene = Scene::new();
        let stage = scene
            .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
            .unwrap();
        let a = Touch::new(1, 5.0, 5.0);
        let b = Touch::new(2, 50.0, 50.0);
        scene
            .dispatch_input(stage, InputEvent::touch(InputPhase::Down, vec![a, b], vec![b], at(0)))
            .unwrap();
        assert_eq!(scene.pointers_positions(stage).len(), 2);
        assert_eq!(scene.changed_pointers(stage.idx), vec![(2, Point::new(50.0, 50.0))]);
        assert_eq!(scene.pointer_by_id(stage, 1), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn empty_space_events_land_on_the_stage() {
        let mut scene = Scene::with_config(SceneConfig::seeded(5));
        let stage = scene
            .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
            .unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        scene.on(stage, "mousedown mouseup click dblclick", move |_, e| {
            sink.borrow_mut().push(e.kind.clone());
        });
        for (phase, ms) in [
            (InputPhase::Down, 0),
            (InputPhase::Up, 10),
            (InputPhase::Down, 20),
            (InputPhase::Up, 30),
        ] {
            scene
                .dispatch_input(stage, InputEvent::mouse(phase, 5.0, 5.0, at(ms)))
                .unwrap();
        }
        assert_eq!(
            *log.borrow(),
            ["mousedown", "click", "mouseup", "mousedown", "click", "dblclick", "mouseup"]
        );
    }

    #[test]
    fn leave_clears_positions() {
        let mut scene = Scene::new();
        let stage = scene
            .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
            .unwrap();
        scene
            .dispatch_input(stage, InputEvent::mouse(InputPhase::Move, 5.0, 5.0, at(0)))
            .unwrap();
        scene
            .dispatch_input(stage, InputEvent::mouse(InputPhase::Leave, 500.0, 5.0, at(1)))
            .unwrap();
        assert!(scene.pointers_positions(stage).is_empty());
    }

    #[test]
    fn disabled_pointer_family_is_ignored() {
        let config = SceneConfig {
            pointer_events_enabled: false,
            ..SceneConfig::default()
        };
        let mut scene = Scene::with_config(config);
        let stage = scene
            .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
            .unwrap();
        let hits = Rc::new(RefCell::new(0));
        let sink = hits.clone();
        scene.on(stage, "pointerdown", move |_, _| *sink.borrow_mut() += 1);
        scene
            .dispatch_input(stage, InputEvent::pointer(InputPhase::Down, 1, 5.0, 5.0, at(0)))
            .unwrap();
        assert_eq!(*hits.borrow(), 0);
    }
}
