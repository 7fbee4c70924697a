// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and attribute management.

use core::fmt;
use std::any::Any;
use std::rc::Rc;

use hashbrown::HashMap;
use serde_json::Value;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::attrs::Attrs;
use crate::dirty::{self, CacheField};
use crate::drag::DragBoundFunc;
use crate::event::Listeners;
use crate::shape::SceneFunc;
use crate::transform::{AngleMode, Transform};

use super::id::{INVALID, NodeId};
use super::kind::NodeKind;

/// Opaque host object attached to a node under a key (pattern images and
/// similar non-serializable values).
pub type Handle = Rc<dyn Any>;

/// Per-node callbacks that override class behavior.
#[derive(Clone, Default)]
pub(crate) struct NodeHooks {
    pub(crate) scene_func: Option<SceneFunc>,
    pub(crate) hit_func: Option<SceneFunc>,
    pub(crate) drag_bound: Option<DragBoundFunc>,
}

/// Memoized derived values. `None` means "not computed since last invalidation".
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NodeCache {
    pub(crate) transform: Option<Transform>,
    pub(crate) absolute_transform: Option<Transform>,
    pub(crate) absolute_opacity: Option<f64>,
    pub(crate) visible: Option<bool>,
    pub(crate) listening: Option<bool>,
    pub(crate) stage: Option<u32>,
}

impl NodeCache {
    pub(crate) fn clear(&mut self, field: CacheField) {
        match field {
            CacheField::Transform => self.transform = None,
            CacheField::AbsoluteTransform => self.absolute_transform = None,
            CacheField::AbsoluteOpacity => self.absolute_opacity = None,
            CacheField::Visible => self.visible = None,
            CacheField::Listening => self.listening = None,
            CacheField::Stage => self.stage = None,
        }
    }

    pub(crate) fn is_set(&self, field: CacheField) -> bool {
        match field {
            CacheField::Transform => self.transform.is_some(),
            CacheField::AbsoluteTransform => self.absolute_transform.is_some(),
            CacheField::AbsoluteOpacity => self.absolute_opacity.is_some(),
            CacheField::Visible => self.visible.is_some(),
            CacheField::Listening => self.listening.is_some(),
            CacheField::Stage => self.stage.is_some(),
        }
    }
}

/// Struct-of-arrays storage for every node of a scene.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,
    pub(crate) index: Vec<u32>,

    // -- Identity --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) class: Vec<Rc<str>>,

    // -- Per-node state (set by callers) --
    pub(crate) attrs: Vec<Attrs>,
    pub(crate) handles: Vec<HashMap<String, Handle>>,
    pub(crate) hooks: Vec<NodeHooks>,
    pub(crate) listeners: Vec<Listeners>,
    pub(crate) color_key: Vec<Option<String>>,

    // -- Derived caches --
    pub(crate) cache: Vec<NodeCache>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    pub(crate) angle_mode: AngleMode,
}

impl fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeStore")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("angle_mode", &self.angle_mode)
            .finish_non_exhaustive()
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new(AngleMode::Degrees)
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new(angle_mode: AngleMode) -> Self {
        Self {
            parent: Vec::new(),
            children: Vec::new(),
            index: Vec::new(),
            kind: Vec::new(),
            class: Vec::new(),
            attrs: Vec::new(),
            handles: Vec::new(),
            hooks: Vec::new(),
            listeners: Vec::new(),
            color_key: Vec::new(),
            cache: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            angle_mode,
        }
    }

    // -- Allocation API --

    /// Creates a detached node of the given kind and class.
    pub fn create(&mut self, kind: NodeKind, class: &str) -> NodeId {
        let class: Rc<str> = Rc::from(class);
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.index[i] = 0;
            self.kind[i] = kind;
            self.class[i] = class;
            self.attrs[i] = Attrs::new();
            self.handles[i].clear();
            self.hooks[i] = NodeHooks::default();
            self.listeners[i] = Listeners::default();
            self.color_key[i] = None;
            self.cache[i] = NodeCache::default();
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.index.push(0);
            self.kind.push(kind);
            self.class.push(class);
            self.attrs.push(Attrs::new());
            self.handles.push(HashMap::new());
            self.hooks.push(NodeHooks::default());
            self.listeners.push(Listeners::default());
            self.color_key.push(None);
            self.cache.push(NodeCache::default());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees a detached slot and returns the color key it held, if any.
    ///
    /// Children of the slot are not freed; the caller frees the whole subtree.
    pub(crate) fn free(&mut self, idx: u32) -> Option<String> {
        let i = idx as usize;
        debug_assert!(self.alive[i], "double free of slot {idx}");
        self.dirty.remove_key(idx);
        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.alive[i] = false;
        self.parent[i] = INVALID;
        self.children[i].clear();
        self.listeners[i] = Listeners::default();
        self.hooks[i] = NodeHooks::default();
        self.handles[i].clear();
        self.cache[i] = NodeCache::default();
        self.free_list.push(idx);
        self.color_key[i].take()
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Number of live nodes.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Builds the current handle for a live slot.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Parent slot of a live slot.
    #[inline]
    pub(crate) fn parent_at(&self, idx: u32) -> Option<u32> {
        let p = self.parent[idx as usize];
        (p != INVALID).then_some(p)
    }

    // -- Topology --

    /// Attaches detached `c` under `p` at `at` (appended when `None` or past
    /// the end), then invalidates every inherited cache of `c`'s subtree.
    pub(crate) fn attach(&mut self, p: u32, c: u32, at: Option<usize>) {
        debug_assert!(self.parent[c as usize] == INVALID, "child already attached");
        let siblings = &mut self.children[p as usize];
        let at = at.map_or(siblings.len(), |at| at.min(siblings.len()));
        siblings.insert(at, c);
        self.parent[c as usize] = p;
        self.reindex(p);

        for field in CacheField::ALL {
            if field.propagates() {
                let _ = self.dirty.add_dependency(c, p, field.channel());
            }
        }
        self.mark_subtree_inherited_dirty(c);
    }

    /// Detaches `c` from its parent. Returns the old parent slot.
    pub(crate) fn detach(&mut self, c: u32) -> Option<u32> {
        let p = self.parent[c as usize];
        if p == INVALID {
            return None;
        }
        self.children[p as usize].retain(|&s| s != c);
        self.parent[c as usize] = INVALID;
        self.index[c as usize] = 0;
        self.reindex(p);

        for field in CacheField::ALL {
            if field.propagates() {
                self.dirty.remove_dependency(c, p, field.channel());
            }
        }
        self.mark_subtree_inherited_dirty(c);
        Some(p)
    }

    /// Moves `c` to position `to` among its siblings. Returns `false` when the
    /// position did not change.
    pub(crate) fn reorder(&mut self, c: u32, to: usize) -> bool {
        let p = self.parent[c as usize];
        if p == INVALID {
            return false;
        }
        let siblings = &mut self.children[p as usize];
        let from = self.index[c as usize] as usize;
        let to = to.min(siblings.len().saturating_sub(1));
        if from == to {
            return false;
        }
        let moved = siblings.remove(from);
        siblings.insert(to, moved);
        self.reindex(p);
        true
    }

    /// Rewrites the `index` of every child of `p` to its position.
    fn reindex(&mut self, p: u32) {
        for (i, &c) in self.children[p as usize].iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "sibling counts are bounded by the u32 slot space"
            )]
            let i = i as u32;
            self.index[c as usize] = i;
        }
    }

    // -- Attributes --

    /// Returns the explicitly set value of `key` at slot `idx`.
    #[inline]
    pub(crate) fn attr(&self, idx: u32, key: &str) -> Option<&Value> {
        self.attrs[idx as usize].get(key)
    }

    /// Numeric attribute or `default` when unset or not a number.
    pub(crate) fn num(&self, idx: u32, key: &str, default: f64) -> f64 {
        self.attr(idx, key).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Boolean attribute or `default` when unset or not a boolean.
    pub(crate) fn flag(&self, idx: u32, key: &str, default: bool) -> bool {
        self.attr(idx, key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// String attribute, if set to a string.
    pub(crate) fn text(&self, idx: u32, key: &str) -> Option<&str> {
        self.attr(idx, key).and_then(Value::as_str)
    }

    /// Stores `value` under `key` (removing it for `null`) and invalidates
    /// every cache derived from `key`. Returns the previous explicit value.
    pub(crate) fn put(&mut self, idx: u32, key: &str, value: Value) -> Option<Value> {
        let old = if value.is_null() {
            self.attrs[idx as usize].remove(key)
        } else {
            self.attrs[idx as usize].insert(key.to_owned(), value)
        };
        for field in dirty::fields_reading(key) {
            self.mark(idx, field);
        }
        old
    }

    // -- Invalidation --

    /// Invalidates `field` of a node (and of its descendants when the field
    /// is inherited). Nothing is recomputed until the next derived read.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn invalidate(&mut self, id: NodeId, field: CacheField) {
        self.validate(id);
        self.mark(id.idx, field);
    }

    pub(crate) fn mark(&mut self, idx: u32, field: CacheField) {
        if field.propagates() {
            self.dirty.mark_with(idx, field.channel(), &EagerPolicy);
        } else {
            self.dirty.mark(idx, field.channel());
        }
    }

    /// Marks the subtree rooted at `idx` dirty for every inherited field.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        for field in CacheField::ALL {
            if field.propagates() {
                self.dirty.mark_with(idx, field.channel(), &EagerPolicy);
            }
        }
    }

    /// Drains every channel and drops the affected cache entries.
    pub(crate) fn sync(&mut self) {
        for field in CacheField::ALL {
            let drained: Vec<u32> = if field.propagates() {
                self.dirty
                    .drain(field.channel())
                    .affected()
                    .deterministic()
                    .run()
                    .collect()
            } else {
                self.dirty
                    .drain(field.channel())
                    .deterministic()
                    .run()
                    .collect()
            };
            for idx in drained {
                if idx < self.len && self.alive[idx as usize] {
                    self.cache[idx as usize].clear(field);
                }
            }
        }
    }

    /// Whether `field` currently holds a memoized value for the node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn is_cached(&mut self, id: NodeId, field: CacheField) -> bool {
        self.validate(id);
        self.sync();
        self.cache[id.idx as usize].is_set(field)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}
