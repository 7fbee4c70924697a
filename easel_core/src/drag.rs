// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag sessions.
//!
//! A session moves `Ready → Dragging → Stopped` and is then removed. A
//! draggable node arms a `Ready` session when a down event passes through
//! it; the first move of that pointer beyond the drag distance starts the
//! drag. Sessions are independent, so several nodes can follow several
//! pointers at once.

use std::rc::Rc;

use kurbo::{Point, Vec2};
use tracing::{debug, warn};

use crate::event::{Event, InputEvent};
use crate::node::{NodeId, NodeKind};
use crate::scene::Scene;

/// Maps a proposed absolute drag position to the one applied. Returning
/// `None` keeps the proposal.
pub type DragBoundFunc = Rc<dyn Fn(&mut Scene, NodeId, Point) -> Option<Point>>;

/// Lifecycle state of a drag session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragStatus {
    /// Armed by a down event; waiting for the pointer to travel far enough.
    Ready,
    /// Following the pointer.
    Dragging,
    /// Released; `dragend` fires before the session is removed.
    Stopped,
}

/// One node following one pointer.
#[derive(Clone, Debug)]
pub struct DragSession {
    /// The dragged node.
    pub node: NodeId,
    /// Pointer position when the session was armed.
    pub start_pointer_pos: Point,
    /// Pointer position minus the node's absolute position at arming time.
    pub offset: Vec2,
    /// Current state.
    pub status: DragStatus,
    /// The pointer the session follows.
    pub pointer_id: u32,
    /// The last absolute position applied.
    pub last_pos: Option<Point>,
}

/// Every live drag session of a scene, in arming order.
#[derive(Debug, Default)]
pub(crate) struct DragController {
    sessions: Vec<DragSession>,
    pub(crate) just_dragged: bool,
}

impl DragController {
    fn get(&self, node: NodeId) -> Option<&DragSession> {
        self.sessions.iter().find(|s| s.node == node)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut DragSession> {
        self.sessions.iter_mut().find(|s| s.node == node)
    }

    pub(crate) fn remove(&mut self, idx: u32) {
        self.sessions.retain(|s| s.node.idx != idx);
    }

    pub(crate) fn is_dragging_any(&self) -> bool {
        self.sessions
            .iter()
            .any(|s| s.status == DragStatus::Dragging)
    }

    pub(crate) fn sessions(&self) -> &[DragSession] {
        &self.sessions
    }
}

impl Scene {
    // -- Queries --

    /// Whether the node is being dragged.
    #[must_use]
    pub fn is_dragging(&self, node: NodeId) -> bool {
        self.drag
            .get(node)
            .is_some_and(|s| s.status == DragStatus::Dragging)
    }

    /// Whether any node is being dragged.
    #[must_use]
    pub fn is_dragging_any(&self) -> bool {
        self.drag.is_dragging_any()
    }

    /// Whether the last pointer release ended a drag. Cleared by the next
    /// down event.
    #[must_use]
    pub fn just_dragged(&self) -> bool {
        self.drag.just_dragged
    }

    /// The session of a node, if one is armed or running.
    #[must_use]
    pub fn drag_session(&self, node: NodeId) -> Option<&DragSession> {
        self.drag.get(node)
    }

    /// Effective drag distance: the node's `dragDistance`, else the nearest
    /// ancestor's, else the configured default.
    #[must_use]
    pub fn drag_distance(&self, node: NodeId) -> f64 {
        self.nodes.validate(node);
        let mut cur = Some(node.idx);
        while let Some(idx) = cur {
            if let Some(d) = self.nodes.attr(idx, "dragDistance").and_then(|v| v.as_f64()) {
                return d;
            }
            cur = self.nodes.parent_at(idx);
        }
        self.config.drag_distance
    }

    // -- Control --

    /// Starts dragging a node right away, arming a session first if needed.
    /// Fires `dragstart` (bubbling).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn start_drag(&mut self, node: NodeId) {
        self.nodes.validate(node);
        if self.drag.get(node).is_none() {
            self.create_drag_session(node, None);
        }
        let Some(session) = self.drag.get_mut(node) else {
            return;
        };
        session.status = DragStatus::Dragging;
        debug!(node = ?node, pointer = session.pointer_id, "drag started");
        let mut event = Event::new("dragstart").with_target(node);
        event.pointer_id = Some(session.pointer_id);
        self.fire_bubble(node, &mut event);
    }

    /// Stops a node's drag: it is drawn, `dragend` fires if it was moving,
    /// and the session is removed.
    pub fn stop_drag(&mut self, node: NodeId) {
        if let Some(session) = self.drag.get_mut(node) {
            session.status = DragStatus::Stopped;
        }
        self.end_drag_before();
        self.end_drag_after_with(None);
    }

    // -- Session lifecycle --

    /// Arms a session when a down event passes through a draggable node.
    pub(crate) fn arm_drag(&mut self, node: NodeId, event: &Event) {
        let button = event.evt.as_ref().and_then(|e| e.button);
        if let Some(button) = button
            && !self.config.drag_buttons.contains(&button)
        {
            return;
        }
        if self.is_dragging(node) {
            return;
        }
        let dragging_descendant = self
            .drag
            .sessions()
            .iter()
            .any(|s| self.nodes.is_ancestor_at(node.idx, s.node.idx));
        if dragging_descendant {
            return;
        }
        self.create_drag_session(node, event.pointer_id);
    }

    fn create_drag_session(&mut self, node: NodeId, pointer_id: Option<u32>) {
        let Some(stage) = self.nodes.stage_at(node.idx) else {
            return;
        };
        let stage_id = self.nodes.id_at(stage);
        let abs = self.absolute_position(node);
        let first_changed = self.changed_pointers(stage).first().copied();
        let by_id = pointer_id.and_then(|id| self.pointer_by_id(stage_id, id));
        let pos = by_id
            .or_else(|| first_changed.map(|(_, p)| p))
            .unwrap_or(abs);
        let pointer_id = pointer_id
            .or_else(|| first_changed.map(|(id, _)| id))
            .unwrap_or(crate::event::DEFAULT_POINTER_ID);
        self.drag.remove(node.idx);
        self.drag.sessions.push(DragSession {
            node,
            start_pointer_pos: pos,
            offset: pos - abs,
            status: DragStatus::Ready,
            pointer_id,
            last_pos: None,
        });
    }

    /// Advances every session whose pointer moved.
    pub(crate) fn drag_step(&mut self, input: &InputEvent) {
        let mut moved: Vec<NodeId> = Vec::new();
        let nodes: Vec<NodeId> = self.drag.sessions.iter().map(|s| s.node).collect();
        for node in nodes {
            if !self.nodes.is_alive(node) {
                self.drag.remove(node.idx);
                continue;
            }
            let Some(session) = self.drag.get(node).cloned() else {
                continue;
            };
            let Some(stage) = self.nodes.stage_at(node.idx) else {
                continue;
            };
            let Some(pos) = self
                .changed_pointers(stage)
                .into_iter()
                .find(|(id, _)| *id == session.pointer_id)
                .map(|(_, p)| p)
            else {
                continue;
            };
            if session.status != DragStatus::Dragging {
                let travelled = (pos.x - session.start_pointer_pos.x)
                    .abs()
                    .max((pos.y - session.start_pointer_pos.y).abs());
                if travelled < self.drag_distance(node) {
                    continue;
                }
                self.start_drag(node);
                if !self.is_dragging(node) {
                    continue;
                }
            }
            self.set_drag_position(node, pos);
            moved.push(node);
        }
        for node in moved {
            let mut event = Event::from_input("dragmove", input, None).with_target(node);
            event.pointer_id = self.drag.get(node).map(|s| s.pointer_id);
            self.fire_bubble(node, &mut event);
        }
    }

    fn set_drag_position(&mut self, node: NodeId, pointer: Point) {
        let Some(session) = self.drag.get(node) else {
            return;
        };
        let proposed = pointer - session.offset;
        let last = session.last_pos;
        let mut next = proposed;
        if let Some(bound) = self.nodes.hooks[node.idx as usize].drag_bound.clone() {
            match bound(self, node, proposed) {
                Some(bounded) => next = bounded,
                None => warn!(node = ?node, "drag bound function returned nothing; using the unbounded position"),
            }
        }
        if !self.nodes.is_alive(node) {
            return;
        }
        if last != Some(next) {
            self.set_absolute_position(node, next);
            self.request_draw(node);
        }
        if let Some(session) = self.drag.get_mut(node) {
            session.last_pos = Some(next);
        }
    }

    /// Release, first half: runs before the stage sees the up event.
    pub(crate) fn end_drag_before(&mut self) {
        let mut draw: Vec<NodeId> = Vec::new();
        let nodes: Vec<NodeId> = self.drag.sessions.iter().map(|s| s.node).collect();
        for node in nodes {
            if !self.nodes.is_alive(node) {
                self.drag.remove(node.idx);
                continue;
            }
            let Some(stage) = self.nodes.stage_at(node.idx) else {
                continue;
            };
            let changed = self.changed_pointers(stage);
            let Some(session) = self.drag.get_mut(node) else {
                continue;
            };
            if !changed.iter().any(|(id, _)| *id == session.pointer_id) {
                continue;
            }
            if matches!(session.status, DragStatus::Dragging | DragStatus::Stopped) {
                session.status = DragStatus::Stopped;
                self.drag.just_dragged = true;
                for state in self.stages.values_mut() {
                    for family in &mut state.families {
                        family.listen_click = false;
                    }
                }
            }
            let target = match self.nodes.layer_at(node.idx) {
                Some(layer) => Some(self.nodes.id_at(layer)),
                None => (self.nodes.kind[node.idx as usize] == NodeKind::Stage).then_some(node),
            };
            if let Some(target) = target
                && !draw.contains(&target)
            {
                draw.push(target);
            }
        }
        for target in draw {
            self.draw(target);
        }
    }

    /// Release, second half: runs after the stage handled the up event.
    pub(crate) fn end_drag_after(&mut self, input: &InputEvent) {
        self.end_drag_after_with(Some(input));
    }

    fn end_drag_after_with(&mut self, input: Option<&InputEvent>) {
        let stopped: Vec<(NodeId, u32)> = self
            .drag
            .sessions
            .iter()
            .filter(|s| s.status == DragStatus::Stopped)
            .map(|s| (s.node, s.pointer_id))
            .collect();
        for (node, pointer_id) in stopped {
            debug!(node = ?node, "drag ended");
            let mut event = match input {
                Some(input) => Event::from_input("dragend", input, Some(pointer_id)),
                None => Event::new("dragend"),
            }
            .with_target(node);
            event.pointer_id = Some(pointer_id);
            self.fire_bubble(node, &mut event);
        }
        self.drag
            .sessions
            .retain(|s| s.status == DragStatus::Dragging);
    }
}
