// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine instance: node store plus every registry that used to be global.

use core::fmt;
use std::rc::Rc;

use easel_render::DrawError;
use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use serde_json::Value;
use tracing::{debug, warn};

use crate::attrs::{self, Attrs};
use crate::capture::PointerCaptures;
use crate::class::{ClassRegistry, ClassSpec};
use crate::config::SceneConfig;
use crate::dirty::CacheField;
use crate::drag::{DragBoundFunc, DragController};
use crate::error::{Result, SceneError};
use crate::event::{AttrChange, Event, Listeners};
use crate::layer::LayerSurfaces;
use crate::node::{Handle, NodeId, NodeKind, NodeStore};
use crate::registry::ColorKeyRegistry;
use crate::scheduler::FrameScheduler;
use crate::shape::{AttrView, ShapeContext};
use crate::stage::StageState;
use crate::trace::TraceSink;
use crate::transform::Transform;

/// A retained-mode scene: every node, surface, listener, drag session, and
/// animation of one engine.
///
/// All operations are synchronous and single-threaded. Event handlers receive
/// `&mut Scene` and may mutate or destroy nodes while an event is in flight.
pub struct Scene {
    pub(crate) nodes: NodeStore,
    pub(crate) classes: ClassRegistry,
    pub(crate) keys: ColorKeyRegistry,
    pub(crate) class_listeners: HashMap<String, Listeners>,
    pub(crate) stages: HashMap<u32, StageState>,
    pub(crate) surfaces: HashMap<u32, LayerSurfaces>,
    pub(crate) drag: DragController,
    pub(crate) captures: PointerCaptures,
    pub(crate) frames: FrameScheduler,
    pub(crate) config: SceneConfig,
    pub(crate) tracer: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes)
            .field("color_keys", &self.keys.len())
            .field("stages", &self.stages.len())
            .field("surfaces", &self.surfaces.len())
            .field("drag", &self.drag)
            .field("frames", &self.frames)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Creates an empty scene.
    #[must_use]
    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            nodes: NodeStore::new(config.angle_mode),
            classes: ClassRegistry::with_builtins(),
            keys: ColorKeyRegistry::new(config.color_key_seed),
            class_listeners: HashMap::new(),
            stages: HashMap::new(),
            surfaces: HashMap::new(),
            drag: DragController::default(),
            captures: PointerCaptures::default(),
            frames: FrameScheduler::default(),
            config,
            tracer: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Replaces the configuration. Existing surfaces keep their pixel ratio
    /// until their stage is resized; color keys keep their generator.
    pub fn set_config(&mut self, config: SceneConfig) {
        if config.angle_mode != self.nodes.angle_mode {
            self.nodes.angle_mode = config.angle_mode;
            for idx in 0..self.nodes.len {
                if self.nodes.alive[idx as usize] {
                    self.nodes.mark(idx, CacheField::Transform);
                    self.nodes.mark(idx, CacheField::AbsoluteTransform);
                }
            }
        }
        self.config = config;
    }

    /// Read access to the node store.
    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.is_alive(id)
    }

    /// Number of live shapes holding a color key.
    #[must_use]
    pub fn color_key_count(&self) -> usize {
        self.keys.len()
    }

    /// Installs a trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.tracer.replace(sink)
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.tracer.take()
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if self.nodes.is_alive(id) {
            Ok(())
        } else {
            Err(SceneError::StaleNode(id))
        }
    }

    // -- Classes and construction --

    /// Registers (or replaces) a node class. Returns `true` if a class of the
    /// same name was replaced.
    pub fn register_class(&mut self, spec: ClassSpec) -> bool {
        debug!(class = %spec.name, kind = ?spec.kind, "registering node class");
        self.classes.register(spec).is_some()
    }

    /// Registers a shape class drawn by `scene_func`.
    pub fn register_shape_class(
        &mut self,
        name: &str,
        scene_func: impl Fn(&mut ShapeContext<'_>) -> core::result::Result<(), DrawError> + 'static,
    ) -> bool {
        self.register_class(ClassSpec::shape(name, scene_func))
    }

    /// Creates a detached node of a registered class.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownClass`] if `class` is not registered, and
    /// [`SceneError::MissingContainer`] for `Stage` classes (use
    /// [`create_stage`](Self::create_stage)).
    pub fn create(&mut self, class: &str, attrs: Value) -> Result<NodeId> {
        let spec = self
            .classes
            .get(class)
            .ok_or_else(|| SceneError::UnknownClass(class.to_owned()))?;
        if spec.kind == NodeKind::Stage {
            return Err(SceneError::MissingContainer);
        }
        Ok(self.instantiate(&spec, attrs::from_value(attrs)))
    }

    fn builtin(&mut self, class: &str, attrs: Value) -> NodeId {
        let spec = self
            .classes
            .get(class)
            .unwrap_or_else(|| Rc::new(ClassSpec::new(class, NodeKind::Group)));
        self.instantiate(&spec, attrs::from_value(attrs))
    }

    /// Creates a detached layer.
    pub fn create_layer(&mut self, attrs: Value) -> NodeId {
        self.builtin("Layer", attrs)
    }

    /// Creates a detached group.
    pub fn create_group(&mut self, attrs: Value) -> NodeId {
        self.builtin("Group", attrs)
    }

    /// Creates a detached rectangle.
    pub fn create_rect(&mut self, attrs: Value) -> NodeId {
        self.builtin("Rect", attrs)
    }

    /// Creates a detached circle.
    pub fn create_circle(&mut self, attrs: Value) -> NodeId {
        self.builtin("Circle", attrs)
    }

    /// Creates a detached custom shape drawn by `scene_func`.
    pub fn create_shape(
        &mut self,
        attrs: Value,
        scene_func: impl Fn(&mut ShapeContext<'_>) -> core::result::Result<(), DrawError> + 'static,
    ) -> NodeId {
        let id = self.builtin("Shape", attrs);
        self.nodes.hooks[id.idx as usize].scene_func = Some(Rc::new(scene_func));
        id
    }

    pub(crate) fn instantiate(&mut self, spec: &ClassSpec, attrs: Attrs) -> NodeId {
        let id = self.nodes.create(spec.kind, &spec.name);
        if spec.kind == NodeKind::Shape {
            let key = self.keys.allocate(id);
            self.nodes.color_key[id.idx as usize] = Some(key);
        }
        for (key, value) in attrs {
            self.set_attr(id, &key, value);
        }
        id
    }

    // -- Tree structure --

    /// Appends `child` to `parent`, detaching it from any previous parent.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] for a destroyed handle,
    /// [`SceneError::NotAContainer`] when `parent` is a shape, and
    /// [`SceneError::InvalidChild`] when the class pair is not allowed or the
    /// move would create a cycle.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_at(parent, child, None)
    }

    /// Inserts `child` into `parent` at `index` (clamped to the child count).
    ///
    /// # Errors
    ///
    /// As for [`add`](Self::add).
    pub fn insert(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        self.insert_at(parent, child, Some(index))
    }

    /// Moves `child` under `new_parent`.
    ///
    /// # Errors
    ///
    /// As for [`add`](Self::add).
    pub fn move_to(&mut self, child: NodeId, new_parent: NodeId) -> Result<()> {
        self.add(new_parent, child)
    }

    fn insert_at(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        let (p, c) = (parent.idx, child.idx);
        let parent_kind = self.nodes.kind[p as usize];
        let child_kind = self.nodes.kind[c as usize];
        let parent_class = self.nodes.class[p as usize].clone();
        let child_class = self.nodes.class[c as usize].clone();
        if !parent_kind.is_container() {
            return Err(SceneError::NotAContainer(parent_class.to_string()));
        }
        if !parent_kind.accepts(child_kind) || p == c || self.nodes.is_ancestor_at(c, p) {
            return Err(SceneError::invalid_child(&parent_class, &child_class));
        }

        self.detach_slot(c);
        self.nodes.attach(p, c, at);
        if parent_kind == NodeKind::Stage {
            self.allocate_layer_surfaces(c, p);
            self.draw(child);
        }
        self.request_draw(child);
        Ok(())
    }

    /// Detaches slot `c`, releasing whatever only made sense under the old parent.
    fn detach_slot(&mut self, c: u32) {
        let Some(old) = self.nodes.parent_at(c) else {
            return;
        };
        self.request_draw_at(c);
        let _ = self.nodes.detach(c);
        if self.nodes.kind[old as usize] == NodeKind::Stage {
            self.surfaces.remove(&c);
        }
    }

    /// Detaches a node from its parent, keeping it (and its subtree) alive.
    /// Any drag session on the node is stopped.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] for a destroyed handle.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        if self.is_dragging(id) {
            self.stop_drag(id);
        }
        self.drag.remove(id.idx);
        self.detach_slot(id.idx);
        Ok(())
    }

    /// Destroys a node and its whole subtree. Color keys, drag sessions,
    /// pointer captures, and layer surfaces held by the subtree are released.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] for a destroyed handle.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        self.remove(id)?;
        let mut doomed = self.nodes.descendants_at(id.idx);
        doomed.push(id.idx);
        for idx in doomed {
            self.drag.remove(idx);
            self.captures.forget(self.nodes.id_at(idx));
            self.surfaces.remove(&idx);
            self.stages.remove(&idx);
            self.frames.forget_layer(idx);
            if let Some(key) = self.nodes.free(idx) {
                let _ = self.keys.release(&key);
            }
        }
        debug!(node = ?id, live = self.nodes.live_count(), "destroyed subtree");
        Ok(())
    }

    /// Destroys every child of a node.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] for a destroyed handle.
    pub fn destroy_children(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        for child in self.children(id) {
            self.destroy(child)?;
        }
        Ok(())
    }

    /// The parent of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.validate(id);
        self.nodes.parent_at(id.idx).map(|p| self.nodes.id_at(p))
    }

    /// The children of a node, in paint order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes.validate(id);
        self.nodes.children[id.idx as usize]
            .iter()
            .map(|&c| self.nodes.id_at(c))
            .collect()
    }

    /// The node's position among its siblings (its z-index).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn z_index(&self, id: NodeId) -> usize {
        self.nodes.validate(id);
        self.nodes.index[id.idx as usize] as usize
    }

    /// The node's kind.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes.validate(id);
        self.nodes.kind[id.idx as usize]
    }

    /// The node's class name.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn class_name(&self, id: NodeId) -> &str {
        self.nodes.validate(id);
        &self.nodes.class[id.idx as usize]
    }

    /// The shape's hit color key.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn color_key(&self, id: NodeId) -> Option<&str> {
        self.nodes.validate(id);
        self.nodes.color_key[id.idx as usize].as_deref()
    }

    /// The shape bound to a color key.
    #[must_use]
    pub fn shape_by_color_key(&self, key: &str) -> Option<NodeId> {
        self.keys.lookup(key)
    }

    /// Ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes.ancestors(id).collect()
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.nodes.validate(ancestor);
        self.nodes.validate(id);
        self.nodes.is_ancestor_at(ancestor.idx, id.idx)
    }

    /// Number of ancestors.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.nodes.validate(id);
        self.nodes.depth_at(id.idx)
    }

    /// The nearest layer at or above a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn layer_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.validate(id);
        self.nodes.layer_at(id.idx).map(|l| self.nodes.id_at(l))
    }

    /// The stage at the root of the node's tree.
    pub fn stage_of(&mut self, id: NodeId) -> Option<NodeId> {
        self.nodes.stage_of(id)
    }

    /// Descendants matching a selector (`#id`, `.name`, `ClassName`, or a
    /// comma-separated list of those), in tree order.
    #[must_use]
    pub fn find(&self, id: NodeId, selector: &str) -> Vec<NodeId> {
        self.nodes.find(id, selector)
    }

    /// The first descendant matching a selector.
    #[must_use]
    pub fn find_one(&self, id: NodeId, selector: &str) -> Option<NodeId> {
        self.nodes.find(id, selector).into_iter().next()
    }

    /// Whether the node itself matches a selector.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn matches(&self, id: NodeId, selector: &str) -> bool {
        self.nodes.validate(id);
        self.nodes.matches_selector(id.idx, selector)
    }

    // -- Z-order --

    fn reorder(&mut self, id: NodeId, to: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        self.nodes.validate(id);
        let Some(p) = self.nodes.parent_at(id.idx) else {
            warn!(node = ?id, "node has no parent; z-order change ignored");
            return false;
        };
        let len = self.nodes.children[p as usize].len();
        let from = self.nodes.index[id.idx as usize] as usize;
        let Some(to) = to(from, len) else {
            return false;
        };
        let moved = self.nodes.reorder(id.idx, to);
        if moved {
            self.request_draw(id);
        }
        moved
    }

    /// Moves the node one step up in paint order.
    pub fn move_up(&mut self, id: NodeId) -> bool {
        self.reorder(id, |from, len| (from + 1 < len).then_some(from + 1))
    }

    /// Moves the node one step down in paint order.
    pub fn move_down(&mut self, id: NodeId) -> bool {
        self.reorder(id, |from, _| from.checked_sub(1))
    }

    /// Moves the node above all of its siblings.
    pub fn move_to_top(&mut self, id: NodeId) -> bool {
        self.reorder(id, |from, len| (from + 1 < len).then_some(len - 1))
    }

    /// Moves the node below all of its siblings.
    pub fn move_to_bottom(&mut self, id: NodeId) -> bool {
        self.reorder(id, |from, _| (from > 0).then_some(0))
    }

    /// Moves the node to position `z` among its siblings. Out-of-range values
    /// log a warning and clamp.
    pub fn set_z_index(&mut self, id: NodeId, z: usize) -> bool {
        self.reorder(id, |_, len| {
            if z >= len {
                warn!(z, max = len.saturating_sub(1), "z-index out of range; clamping");
            }
            Some(z.min(len.saturating_sub(1)))
        })
    }

    // -- Attributes --

    /// Sets an attribute.
    ///
    /// Compound keys (`position`, `scale`, `skew`, `offset`, `size`, and the
    /// gradient/shadow point keys) take an object and write each component.
    /// A write equal to the current scalar value does nothing. Otherwise the
    /// value is validated (a mismatch is logged, the value kept), stored,
    /// `<key>Change` fires on the node, and a redraw is scheduled.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<Value>) {
        self.nodes.validate(id);
        let value = value.into();
        if let Some(parts) = attrs::compound(key) {
            match value {
                Value::Object(map) => {
                    for (component, attr) in parts {
                        if let Some(v) = map.get(component) {
                            self.set_attr(id, attr, v.clone());
                        }
                    }
                }
                Value::Null => {
                    for (_, attr) in parts {
                        self.set_attr(id, attr, Value::Null);
                    }
                }
                other => {
                    warn!(attr = key, value = %other, "compound attribute needs an object; ignoring");
                }
            }
            return;
        }

        let _ = attrs::validate(key, &value);
        if attrs::is_noop_write(self.nodes.attr(id.idx, key), &value) {
            return;
        }
        let old = self
            .nodes
            .put(id.idx, key, value.clone())
            .unwrap_or(Value::Null);
        self.after_attr_write(id.idx, key);

        let mut event = Event::new(format!("{key}Change")).with_target(id);
        event.change = Some(AttrChange {
            key: key.to_owned(),
            old,
            new: value,
        });
        self.fire(id, &mut event);
        if self.nodes.is_alive(id) {
            self.request_draw(id);
        }
    }

    /// Sets every attribute of a JSON object.
    pub fn set_attrs(&mut self, id: NodeId, attrs: Value) {
        for (key, value) in attrs::from_value(attrs) {
            self.set_attr(id, &key, value);
        }
    }

    /// Side effects of particular attributes.
    fn after_attr_write(&mut self, idx: u32, key: &str) {
        match (self.nodes.kind[idx as usize], key) {
            (NodeKind::Stage, "width" | "height") => self.resize_layer_surfaces(idx),
            (_, "draggable") if !self.nodes.flag(idx, "draggable", false) => {
                let id = self.nodes.id_at(idx);
                if self.is_dragging(id) {
                    self.stop_drag(id);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn view(&self, idx: u32) -> AttrView<'_> {
        AttrView::new(
            &self.nodes.attrs[idx as usize],
            self.classes.spec(&self.nodes.class[idx as usize]),
            self.nodes.kind[idx as usize],
        )
    }

    /// The explicit value of an attribute, else its declared default.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn attr(&self, id: NodeId, key: &str) -> Option<Value> {
        self.nodes.validate(id);
        self.view(id.idx).get(key)
    }

    /// An attribute as a number (`0` when unset without a default).
    #[must_use]
    pub fn attr_f64(&self, id: NodeId, key: &str) -> f64 {
        self.nodes.validate(id);
        self.view(id.idx).f64(key)
    }

    /// An attribute as a boolean (`false` when unset without a default).
    #[must_use]
    pub fn attr_bool(&self, id: NodeId, key: &str) -> bool {
        self.nodes.validate(id);
        self.view(id.idx).bool(key)
    }

    /// An attribute as a string.
    #[must_use]
    pub fn attr_str(&self, id: NodeId, key: &str) -> Option<String> {
        self.nodes.validate(id);
        self.view(id.idx).str(key)
    }

    /// The explicitly set attributes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &Attrs {
        self.nodes.validate(id);
        &self.nodes.attrs[id.idx as usize]
    }

    /// `(x, y)`.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Point {
        Point::new(self.attr_f64(id, "x"), self.attr_f64(id, "y"))
    }

    /// Sets `x` and `y`.
    pub fn set_position(&mut self, id: NodeId, pos: Point) {
        self.set_attr(id, "x", pos.x);
        self.set_attr(id, "y", pos.y);
    }

    // -- Handles and hooks --

    /// Attaches a non-serializable value (such as a `fillPatternImage`
    /// pixmap) under `key`, and schedules a redraw.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_handle(&mut self, id: NodeId, key: &str, handle: Handle) {
        self.nodes.validate(id);
        self.nodes.handles[id.idx as usize].insert(key.to_owned(), handle);
        self.request_draw(id);
    }

    /// Removes a handle, returning it.
    pub fn remove_handle(&mut self, id: NodeId, key: &str) -> Option<Handle> {
        self.nodes.validate(id);
        let removed = self.nodes.handles[id.idx as usize].remove(key);
        if removed.is_some() {
            self.request_draw(id);
        }
        removed
    }

    /// The handle under `key`.
    #[must_use]
    pub fn handle(&self, id: NodeId, key: &str) -> Option<Handle> {
        self.nodes.validate(id);
        self.nodes.handles[id.idx as usize].get(key).cloned()
    }

    /// Overrides the class geometry of a shape.
    pub fn set_scene_func(
        &mut self,
        id: NodeId,
        scene_func: impl Fn(&mut ShapeContext<'_>) -> core::result::Result<(), DrawError> + 'static,
    ) {
        self.nodes.validate(id);
        self.nodes.hooks[id.idx as usize].scene_func = Some(Rc::new(scene_func));
        self.request_draw(id);
    }

    /// Sets a hit-only geometry for a shape.
    pub fn set_hit_func(
        &mut self,
        id: NodeId,
        hit_func: impl Fn(&mut ShapeContext<'_>) -> core::result::Result<(), DrawError> + 'static,
    ) {
        self.nodes.validate(id);
        self.nodes.hooks[id.idx as usize].hit_func = Some(Rc::new(hit_func));
        self.request_draw(id);
    }

    /// Constrains drag positions. The function maps a proposed absolute
    /// position to the applied one; `None` keeps the proposal (and warns).
    pub fn set_drag_bound_func(
        &mut self,
        id: NodeId,
        bound: impl Fn(&mut Scene, NodeId, Point) -> Option<Point> + 'static,
    ) {
        self.nodes.validate(id);
        let bound: DragBoundFunc = Rc::new(bound);
        self.nodes.hooks[id.idx as usize].drag_bound = Some(bound);
    }

    // -- Derived values --

    /// Whether the node and all of its ancestors are visible.
    pub fn is_visible(&mut self, id: NodeId) -> bool {
        self.nodes.is_visible(id)
    }

    /// Whether the node and all of its ancestors are listening.
    pub fn is_listening(&mut self, id: NodeId) -> bool {
        self.nodes.is_listening(id)
    }

    /// Visibility of the node and its ancestors strictly below `top`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn is_visible_relative_to(&self, id: NodeId, top: NodeId) -> bool {
        self.flag_relative_to(id, top, "visible")
    }

    /// Listening state of the node and its ancestors strictly below `top`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn is_listening_relative_to(&self, id: NodeId, top: NodeId) -> bool {
        self.flag_relative_to(id, top, "listening")
    }

    fn flag_relative_to(&self, id: NodeId, top: NodeId, key: &str) -> bool {
        self.nodes.validate(id);
        self.nodes.validate(top);
        let mut cur = Some(id.idx);
        while let Some(idx) = cur {
            if idx == top.idx {
                return true;
            }
            if !self.nodes.flag(idx, key, true) {
                return false;
            }
            cur = self.nodes.parent_at(idx);
        }
        true
    }

    /// The node's own transform.
    pub fn transform(&mut self, id: NodeId) -> Transform {
        self.nodes.transform(id)
    }

    /// The transform from node space to stage space.
    pub fn absolute_transform(&mut self, id: NodeId) -> Transform {
        self.nodes.absolute_transform(id)
    }

    /// The transform from node space to the space of ancestor `top`
    /// (exclusive). Computed fresh on every call.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn absolute_transform_relative_to(&mut self, id: NodeId, top: NodeId) -> Transform {
        self.nodes.validate(id);
        self.nodes.validate(top);
        self.nodes.absolute_transform_relative_at(id.idx, top.idx)
    }

    /// Opacity after multiplying in every ancestor's.
    pub fn absolute_opacity(&mut self, id: NodeId) -> f64 {
        self.nodes.absolute_opacity(id)
    }

    /// Scale of the absolute transform.
    pub fn absolute_scale(&mut self, id: NodeId) -> Vec2 {
        let d = self.absolute_transform(id).decompose(self.config.angle_mode);
        Vec2::new(d.scale_x, d.scale_y)
    }

    /// The node's origin (ignoring `offset`) in stage coordinates.
    pub fn absolute_position(&mut self, id: NodeId) -> Point {
        let offset = Vec2::new(self.attr_f64(id, "offsetX"), self.attr_f64(id, "offsetY"));
        let t = self
            .absolute_transform(id)
            .translate(offset.x, offset.y)
            .translation();
        t.to_point()
    }

    /// Moves the node so its [`absolute_position`](Self::absolute_position)
    /// becomes `pos`.
    pub fn set_absolute_position(&mut self, id: NodeId, pos: Point) {
        self.nodes.validate(id);
        let parent_abs = match self.nodes.parent_at(id.idx) {
            Some(p) => self.nodes.absolute_transform_at(p),
            None => Transform::IDENTITY,
        };
        let local = match parent_abs.invert() {
            Some(inv) => inv.point(pos),
            None => {
                warn!(node = ?id, "ancestor transform is singular; using the absolute position as-is");
                pos
            }
        };
        self.set_position(id, local);
    }

    /// Whether a derived field currently holds a memoized value.
    pub fn is_cached(&mut self, id: NodeId, field: CacheField) -> bool {
        self.nodes.is_cached(id, field)
    }

    /// Drops a derived field (and, for inherited fields, the descendants')
    /// so it is recomputed on next read.
    pub fn invalidate(&mut self, id: NodeId, field: CacheField) {
        self.nodes.invalidate(id, field);
    }

    // -- Cloning --

    /// Deep-copies a node and its subtree with fresh handles and color keys,
    /// then applies `overrides` to the copy. The copy is detached.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] for a destroyed handle and
    /// [`SceneError::MissingContainer`] for stages.
    pub fn clone_node(&mut self, id: NodeId, overrides: Value) -> Result<NodeId> {
        self.check(id)?;
        if self.nodes.kind[id.idx as usize] == NodeKind::Stage {
            return Err(SceneError::MissingContainer);
        }
        let copy = self.clone_slot(id.idx);
        self.set_attrs(copy, overrides);
        Ok(copy)
    }

    fn clone_slot(&mut self, idx: u32) -> NodeId {
        let i = idx as usize;
        let class = self.nodes.class[i].clone();
        let kind = self.nodes.kind[i];
        let spec = self
            .classes
            .get(&class)
            .unwrap_or_else(|| Rc::new(ClassSpec::new(&*class, kind)));
        let copy = self.instantiate(&spec, self.nodes.attrs[i].clone());
        let c = copy.idx as usize;
        self.nodes.handles[c] = self.nodes.handles[i].clone();
        self.nodes.hooks[c] = self.nodes.hooks[i].clone();
        self.nodes.listeners[c] = self.nodes.listeners[i].clone();
        for child in self.nodes.children[i].clone() {
            let child_copy = self.clone_slot(child);
            self.nodes.attach(copy.idx, child_copy.idx, None);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    fn scene() -> Scene {
        Scene::with_config(SceneConfig::seeded(1))
    }

    #[test]
    fn containment_is_enforced() {
        let mut s = scene();
        let layer = s.create_layer(json!({}));
        let group = s.create_group(json!({}));
        let rect = s.create_rect(json!({}));
        let other_layer = s.create_layer(json!({}));
        assert!(s.add(layer, group).is_ok());
        assert!(s.add(group, rect).is_ok());
        assert!(matches!(
            s.add(group, other_layer),
            Err(SceneError::InvalidChild { .. })
        ));
        assert!(matches!(s.add(rect, group), Err(SceneError::NotAContainer(_))));
        // A group cannot be moved into its own descendant.
        let inner = s.create_group(json!({}));
        s.add(group, inner).unwrap();
        assert!(matches!(
            s.add(inner, group),
            Err(SceneError::InvalidChild { .. })
        ));
    }

    #[test]
    fn add_moves_between_parents() {
        let mut s = scene();
        let a = s.create_group(json!({}));
        let b = s.create_group(json!({}));
        let x = s.create_rect(json!({}));
        let y = s.create_rect(json!({}));
        s.add(a, x).unwrap();
        s.add(a, y).unwrap();
        s.add(b, x).unwrap();
        assert_eq!(s.children(a), vec![y]);
        assert_eq!(s.z_index(y), 0);
        assert_eq!(s.parent(x), Some(b));
    }

    #[test]
    fn z_order_operations_keep_index_in_step() {
        let mut s = scene();
        let layer = s.create_layer(json!({}));
        let shapes: Vec<_> = (0..4).map(|_| s.create_rect(json!({}))).collect();
        for &r in &shapes {
            s.add(layer, r).unwrap();
        }
        assert!(s.move_to_top(shapes[0]));
        assert_eq!(s.children(layer), vec![shapes[1], shapes[2], shapes[3], shapes[0]]);
        assert!(!s.move_up(shapes[0]));
        assert!(s.move_down(shapes[0]));
        assert!(s.move_to_bottom(shapes[3]));
        assert_eq!(s.children(layer), vec![shapes[3], shapes[1], shapes[0], shapes[2]]);
        assert!(s.set_z_index(shapes[2], 0));
        for (i, c) in s.children(layer).into_iter().enumerate() {
            assert_eq!(s.z_index(c), i);
        }
    }

    #[test]
    fn change_events_carry_old_and_new() {
        let mut s = scene();
        let rect = s.create_rect(json!({ "x": 1 }));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        s.on(rect, "xChange", move |_, e| {
            let change = e.change.clone().unwrap();
            sink.borrow_mut().push((change.old, change.new));
        });
        s.set_attr(rect, "x", 5);
        s.set_attr(rect, "x", 5);
        s.set_attr(rect, "x", 5.0);
        s.set_attr(rect, "position", json!({ "x": 7, "y": 2 }));
        assert_eq!(
            *seen.borrow(),
            vec![(json!(1), json!(5)), (json!(5), json!(7))]
        );
        assert_eq!(s.position(rect), Point::new(7.0, 2.0));
    }

    #[test]
    fn invalid_values_are_stored() {
        let mut s = scene();
        let rect = s.create_rect(json!({}));
        s.set_attr(rect, "width", "wide");
        assert_eq!(s.attr(rect, "width"), Some(json!("wide")));
        assert_eq!(s.attr_f64(rect, "width"), 0.0);
    }

    #[test]
    fn defaults_come_from_class_then_kind() {
        let mut s = scene();
        let circle = s.create_circle(json!({}));
        assert_eq!(s.attr(circle, "radius"), Some(json!(0)));
        assert_eq!(s.attr(circle, "strokeWidth"), Some(json!(2)));
        assert_eq!(s.attr(circle, "scaleX"), Some(json!(1)));
        assert!(s.attrs(circle).is_empty());
    }

    #[test]
    fn destroy_releases_keys_for_the_whole_subtree() {
        let mut s = scene();
        let layer = s.create_layer(json!({}));
        let group = s.create_group(json!({}));
        let a = s.create_rect(json!({}));
        let b = s.create_circle(json!({}));
        s.add(layer, group).unwrap();
        s.add(group, a).unwrap();
        s.add(group, b).unwrap();
        let key = s.color_key(a).unwrap().to_owned();
        assert_eq!(s.color_key_count(), 2);
        s.destroy(group).unwrap();
        assert_eq!(s.color_key_count(), 0);
        assert_eq!(s.shape_by_color_key(&key), None);
        assert!(!s.is_alive(a));
        assert!(s.children(layer).is_empty());
        assert!(matches!(s.destroy(group), Err(SceneError::StaleNode(_))));
    }

    #[test]
    fn absolute_position_round_trips_through_transformed_parents() {
        let mut s = scene();
        let layer = s.create_layer(json!({ "x": 10, "y": 20 }));
        let group = s.create_group(json!({ "scaleX": 2, "scaleY": 2, "rotation": 30 }));
        let rect = s.create_rect(json!({ "offsetX": 5 }));
        s.add(layer, group).unwrap();
        s.add(group, rect).unwrap();
        s.set_absolute_position(rect, Point::new(100.0, 50.0));
        let p = s.absolute_position(rect);
        assert!((p - Point::new(100.0, 50.0)).hypot() < 1e-9, "{p:?}");
    }

    #[test]
    fn relative_flags_stop_at_top() {
        let mut s = scene();
        let layer = s.create_layer(json!({ "visible": false }));
        let group = s.create_group(json!({}));
        let rect = s.create_rect(json!({}));
        s.add(layer, group).unwrap();
        s.add(group, rect).unwrap();
        assert!(!s.is_visible(rect));
        assert!(s.is_visible_relative_to(rect, layer));
        s.set_attr(group, "listening", false);
        assert!(!s.is_listening_relative_to(rect, layer));
        assert!(s.is_listening_relative_to(rect, group));
    }

    #[test]
    fn clone_copies_subtree_with_fresh_keys() {
        let mut s = scene();
        let group = s.create_group(json!({ "name": "g" }));
        let rect = s.create_rect(json!({ "width": 4 }));
        s.add(group, rect).unwrap();
        let copy = s.clone_node(group, json!({ "x": 9 })).unwrap();
        assert_ne!(copy, group);
        assert_eq!(s.attr_f64(copy, "x"), 9.0);
        assert_eq!(s.attr_str(copy, "name").as_deref(), Some("g"));
        let rect_copy = s.children(copy)[0];
        assert_eq!(s.attr_f64(rect_copy, "width"), 4.0);
        assert_ne!(s.color_key(rect_copy), s.color_key(rect));
        assert_eq!(s.color_key_count(), 2);
    }

    #[test]
    fn find_by_selector() {
        let mut s = scene();
        let layer = s.create_layer(json!({}));
        let a = s.create_rect(json!({ "id": "a", "name": "btn" }));
        let b = s.create_circle(json!({ "name": "btn round" }));
        s.add(layer, a).unwrap();
        s.add(layer, b).unwrap();
        assert_eq!(s.find(layer, ".btn"), vec![a, b]);
        assert_eq!(s.find_one(layer, "Circle"), Some(b));
        assert!(s.matches(a, "#a"));
    }
}
