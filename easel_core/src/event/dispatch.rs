// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registration and event delivery.

use std::rc::Rc;

use crate::event::{Event, Handler, Listeners, is_down, is_enter_or_leave};
use crate::node::{NodeId, NodeKind};
use crate::scene::Scene;
use crate::trace::DispatchEvent;

impl Scene {
    // -- Registration --

    /// Registers `handler` on a node under every space-separated
    /// `type.namespace` name in `names`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn on(
        &mut self,
        id: NodeId,
        names: &str,
        handler: impl Fn(&mut Self, &mut Event) + 'static,
    ) {
        self.nodes.validate(id);
        let handler: Handler = Rc::new(handler);
        self.nodes.listeners[id.idx as usize].add(names, &handler);
    }

    /// Removes a node's listeners matching `type`, `.namespace`, or
    /// `type.namespace`. Returns how many were removed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn off(&mut self, id: NodeId, names: &str) -> usize {
        self.nodes.validate(id);
        self.nodes.listeners[id.idx as usize].remove(names)
    }

    /// Removes every listener of a node.
    pub fn off_all(&mut self, id: NodeId) {
        self.nodes.validate(id);
        self.nodes.listeners[id.idx as usize].clear();
    }

    /// Number of a node's own listeners for an event type.
    #[must_use]
    pub fn listener_count(&self, id: NodeId, kind: &str) -> usize {
        self.nodes.validate(id);
        self.nodes.listeners[id.idx as usize].count(kind)
    }

    /// Registers a listener shared by every node of `class`. Listeners on a
    /// base class (`Shape`, `Group`, `Layer`, `Stage`) apply to every class of
    /// that kind.
    pub fn on_class(
        &mut self,
        class: &str,
        names: &str,
        handler: impl Fn(&mut Self, &mut Event) + 'static,
    ) {
        let handler: Handler = Rc::new(handler);
        self.class_listeners
            .entry(class.to_owned())
            .or_default()
            .add(names, &handler);
    }

    /// Removes class listeners. Returns how many were removed.
    pub fn off_class(&mut self, class: &str, names: &str) -> usize {
        self.class_listeners
            .get_mut(class)
            .map_or(0, |listeners| listeners.remove(names))
    }

    // -- Delivery --

    /// Fires an event on one node without bubbling. The target defaults to
    /// the node.
    pub fn fire(&mut self, id: NodeId, event: &mut Event) {
        if !self.nodes.is_alive(id) {
            return;
        }
        event.target.get_or_insert(id);
        self.fire_local(id, event);
    }

    /// Fires an event on a node and bubbles it towards the root.
    pub fn fire_bubble(&mut self, id: NodeId, event: &mut Event) {
        if !self.nodes.is_alive(id) {
            return;
        }
        event.target.get_or_insert(id);
        self.fire_and_bubble(id, event, None);
    }

    /// Fires a bare event by type name and returns it after delivery.
    pub fn fire_event(&mut self, id: NodeId, kind: &str, bubble: bool) -> Event {
        let mut event = Event::new(kind);
        if bubble {
            self.fire_bubble(id, &mut event);
        } else {
            self.fire(id, &mut event);
        }
        event
    }

    /// Runs the class listeners and then the node's own listeners.
    ///
    /// Handlers are snapshotted before the first runs, so listeners added
    /// during delivery wait for the next event. Delivery stops if a handler
    /// destroys the node.
    pub(crate) fn fire_local(&mut self, id: NodeId, event: &mut Event) {
        let idx = id.idx as usize;
        event.current_target = Some(id);

        let class = self.nodes.class[idx].clone();
        let kind = self.nodes.kind[idx];
        let base = kind.base_class();
        let mut handlers: Vec<Handler> = Vec::new();
        if let Some(listeners) = self.class_listeners.get(base) {
            handlers.extend(listeners.handlers(&event.kind));
        }
        if &*class != base
            && let Some(listeners) = self.class_listeners.get(&*class)
        {
            handlers.extend(listeners.handlers(&event.kind));
        }
        handlers.extend(self.nodes.listeners[idx].handlers(&event.kind));

        let count = handlers.len();
        let target = event.target;
        self.emit(|sink| {
            sink.on_dispatch(&DispatchEvent {
                kind: &event.kind,
                target,
                current_target: id,
                listeners: count,
            });
        });

        for handler in handlers {
            if !self.nodes.is_alive(id) {
                return;
            }
            handler(self, event);
        }

        if self.nodes.is_alive(id)
            && is_down(&event.kind)
            && self.nodes.flag(id.idx, "draggable", false)
        {
            self.arm_drag(id, event);
        }
    }

    /// Fires on `id` and walks up the parent chain.
    ///
    /// For enter/leave events `compare` is the node the pointer came from (or
    /// is going to): the event neither fires on it nor on its ancestors, and
    /// bubbling stops below the nearest common ancestor.
    pub(crate) fn fire_and_bubble(
        &mut self,
        id: NodeId,
        event: &mut Event,
        compare: Option<NodeId>,
    ) {
        let enter_leave = is_enter_or_leave(&event.kind);
        let mut cur = id;
        let mut compare = compare;
        loop {
            if !self.nodes.is_alive(cur) {
                return;
            }
            compare = compare.filter(|c| self.nodes.is_alive(*c));
            if self.nodes.kind[cur.idx as usize] == NodeKind::Shape {
                event.target = Some(cur);
            }

            let should_stop = enter_leave
                && match compare {
                    Some(c) => c == cur || self.nodes.is_ancestor_at(cur.idx, c.idx),
                    None => self.nodes.kind[cur.idx as usize] == NodeKind::Stage,
                };
            if should_stop {
                return;
            }

            self.fire_local(cur, event);
            if !self.nodes.is_alive(cur) || event.cancel_bubble {
                return;
            }
            let Some(parent) = self.nodes.parent_at(cur.idx) else {
                return;
            };
            let stop_bubble = enter_leave
                && compare.is_some_and(|c| {
                    self.nodes.is_ancestor_at(c.idx, cur.idx)
                        && !self.nodes.is_ancestor_at(c.idx, parent)
                });
            if stop_bubble || !self.nodes.listening_at(parent) {
                return;
            }
            compare = compare.filter(|c| self.nodes.parent_at(c.idx).is_some());
            cur = self.nodes.id_at(parent);
        }
    }

    /// Class listeners for `class`, if any were registered.
    #[must_use]
    pub fn class_listeners(&self, class: &str) -> Option<&Listeners> {
        self.class_listeners.get(class)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::config::SceneConfig;

    type Log = Rc<RefCell<Vec<String>>>;

    fn record(scene: &mut Scene, id: NodeId, kind: &str, tag: &str, log: &Log) {
        let log = log.clone();
        let tag = tag.to_owned();
        scene.on(id, kind, move |_, _| log.borrow_mut().push(tag.clone()));
    }

    fn tree() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::with_config(SceneConfig::seeded(3));
        let layer = scene.create_layer(json!({}));
        let group = scene.create_group(json!({}));
        let rect = scene.create_rect(json!({}));
        scene.add(layer, group).unwrap();
        scene.add(group, rect).unwrap();
        (scene, layer, group, rect)
    }

    #[test]
    fn bubbles_from_shape_to_layer() {
        let (mut scene, layer, group, rect) = tree();
        let log = Log::default();
        record(&mut scene, rect, "click", "rect", &log);
        record(&mut scene, group, "click", "group", &log);
        record(&mut scene, layer, "click", "layer", &log);
        let target = Rc::new(RefCell::new(Vec::new()));
        let t = target.clone();
        scene.on(layer, "click", move |_, e| {
            t.borrow_mut().push((e.target, e.current_target));
        });

        scene.fire_bubble(rect, &mut Event::new("click"));
        assert_eq!(*log.borrow(), ["rect", "group", "layer"]);
        assert_eq!(*target.borrow(), [(Some(rect), Some(layer))]);
    }

    #[test]
    fn cancel_bubble_stops_at_the_handler() {
        let (mut scene, layer, group, rect) = tree();
        let log = Log::default();
        record(&mut scene, rect, "click", "rect", &log);
        scene.on(group, "click", |_, e| e.stop_propagation());
        record(&mut scene, group, "click", "group", &log);
        record(&mut scene, layer, "click", "layer", &log);
        scene.fire_bubble(rect, &mut Event::new("click"));
        assert_eq!(*log.borrow(), ["rect", "group"]);
    }

    #[test]
    fn non_listening_parent_stops_bubbling() {
        let (mut scene, layer, group, rect) = tree();
        let log = Log::default();
        record(&mut scene, rect, "click", "rect", &log);
        record(&mut scene, layer, "click", "layer", &log);
        scene.set_attr(group, "listening", false);
        scene.fire_bubble(rect, &mut Event::new("click"));
        assert_eq!(*log.borrow(), ["rect"]);
    }

    #[test]
    fn class_listeners_run_before_instance_listeners() {
        let (mut scene, _, _, rect) = tree();
        let log = Log::default();
        record(&mut scene, rect, "tap", "own", &log);
        let l = log.clone();
        scene.on_class("Rect", "tap", move |_, _| l.borrow_mut().push("Rect".into()));
        let l = log.clone();
        scene.on_class("Shape", "tap", move |_, _| l.borrow_mut().push("Shape".into()));
        scene.fire(rect, &mut Event::new("tap"));
        assert_eq!(*log.borrow(), ["Shape", "Rect", "own"]);
        assert_eq!(scene.off_class("Rect", "tap"), 1);
    }

    #[test]
    fn destroying_the_node_stops_delivery() {
        let (mut scene, layer, group, rect) = tree();
        let log = Log::default();
        scene.on(rect, "click", move |scene, _| scene.destroy(rect).unwrap());
        record(&mut scene, rect, "click", "second", &log);
        record(&mut scene, group, "click", "group", &log);
        record(&mut scene, layer, "click", "layer", &log);
        scene.fire_bubble(rect, &mut Event::new("click"));
        assert!(log.borrow().is_empty());
        assert!(!scene.is_alive(rect));
    }

    #[test]
    fn enter_stops_at_the_shared_ancestor() {
        let (mut scene, layer, group, rect) = tree();
        let sibling = scene.create_circle(json!({}));
        scene.add(group, sibling).unwrap();
        let log = Log::default();
        record(&mut scene, rect, "mouseenter", "rect", &log);
        record(&mut scene, group, "mouseenter", "group", &log);
        record(&mut scene, layer, "mouseenter", "layer", &log);
        // Coming from a sibling: the shared group and above stay quiet.
        scene.fire_and_bubble(rect, &mut Event::new("mouseenter"), Some(sibling));
        assert_eq!(*log.borrow(), ["rect"]);
        log.borrow_mut().clear();
        // Coming from nowhere: everything up to the root fires.
        scene.fire_and_bubble(rect, &mut Event::new("mouseenter"), None);
        assert_eq!(*log.borrow(), ["rect", "group", "layer"]);
    }

    #[test]
    fn namespaced_removal() {
        let (mut scene, _, _, rect) = tree();
        let log = Log::default();
        record(&mut scene, rect, "click.a tap.a", "a", &log);
        record(&mut scene, rect, "click.b", "b", &log);
        assert_eq!(scene.off(rect, ".a"), 2);
        scene.fire(rect, &mut Event::new("click"));
        assert_eq!(*log.borrow(), ["b"]);
        assert_eq!(scene.listener_count(rect, "click"), 1);
    }
}
