// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer capture: routing a pointer's events to one node regardless of
//! what lies under it.

use crate::event::Event;
use crate::node::NodeId;
use crate::scene::Scene;

/// Pointer id → capturing node, in capture order.
#[derive(Clone, Debug, Default)]
pub(crate) struct PointerCaptures {
    entries: Vec<(u32, NodeId)>,
}

impl PointerCaptures {
    pub(crate) fn get(&self, pointer_id: u32) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(p, _)| *p == pointer_id)
            .map(|&(_, node)| node)
    }

    fn set(&mut self, pointer_id: u32, node: NodeId) {
        self.entries.push((pointer_id, node));
    }

    fn take(&mut self, pointer_id: u32) -> Option<NodeId> {
        let at = self.entries.iter().position(|(p, _)| *p == pointer_id)?;
        Some(self.entries.remove(at).1)
    }

    /// Drops every capture held by `node`, silently.
    pub(crate) fn forget(&mut self, node: NodeId) {
        self.entries.retain(|&(_, n)| n != node);
    }
}

impl Scene {
    /// Routes every event of `pointer_id` to `node` until released. Any
    /// previous capture of the pointer is released first. Fires
    /// `gotpointercapture` on the node. Nodes without a stage cannot capture.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_pointer_capture(&mut self, pointer_id: u32, node: NodeId) {
        self.nodes.validate(node);
        self.release_capture(pointer_id);
        if self.nodes.stage_at(node.idx).is_none() {
            return;
        }
        self.captures.set(pointer_id, node);
        let mut event = Event::new("gotpointercapture").with_target(node);
        event.pointer_id = Some(pointer_id);
        self.fire_local(node, &mut event);
    }

    /// Ends the capture of `pointer_id`, firing `lostpointercapture` on the
    /// node that held it.
    pub fn release_capture(&mut self, pointer_id: u32) {
        let Some(node) = self.captures.take(pointer_id) else {
            return;
        };
        if self.nodes.is_alive(node) {
            let mut event = Event::new("lostpointercapture").with_target(node);
            event.pointer_id = Some(pointer_id);
            self.fire_local(node, &mut event);
        }
    }

    /// Whether `node` holds the capture of `pointer_id`.
    #[must_use]
    pub fn has_pointer_capture(&self, pointer_id: u32, node: NodeId) -> bool {
        self.captured_node(pointer_id) == Some(node)
    }

    /// The live node capturing `pointer_id`.
    #[must_use]
    pub fn captured_node(&self, pointer_id: u32) -> Option<NodeId> {
        self.captures
            .get(pointer_id)
            .filter(|&node| self.nodes.is_alive(node))
    }
}
