// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoized derived properties.
//!
//! Every read starts with [`NodeStore::sync`], which drains the dirty
//! channels and drops stale entries; the value is then recomputed from the
//! parent's (itself memoized) value and stored again.

use crate::dirty::CacheField;
use crate::transform::Transform;

use super::id::{INVALID, NodeId};
use super::kind::NodeKind;
use super::store::NodeStore;

/// How much of a node's local transform its descendants inherit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TransformsEnabled {
    All,
    Position,
    None,
}

impl NodeStore {
    // -- Handle API --

    /// The node's own transform, built from its position, rotation, scale,
    /// skew, and offset attributes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn transform(&mut self, id: NodeId) -> Transform {
        self.validate(id);
        self.sync();
        self.local_transform_of(id.idx)
    }

    /// The composition of every ancestor's transform with the node's own.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn absolute_transform(&mut self, id: NodeId) -> Transform {
        self.validate(id);
        self.absolute_transform_at(id.idx)
    }

    /// The product of the node's opacity and every ancestor's.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn absolute_opacity(&mut self, id: NodeId) -> f64 {
        self.validate(id);
        self.sync();
        self.absolute_opacity_of(id.idx)
    }

    /// Whether the node and all of its ancestors are visible.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn is_visible(&mut self, id: NodeId) -> bool {
        self.validate(id);
        self.visible_at(id.idx)
    }

    /// Whether the node and all of its ancestors are listening.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn is_listening(&mut self, id: NodeId) -> bool {
        self.validate(id);
        self.listening_at(id.idx)
    }

    /// The stage at the root of the node's tree, if the tree has one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn stage_of(&mut self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.stage_at(id.idx).map(|s| self.id_at(s))
    }

    // -- Raw-index API --

    pub(crate) fn absolute_transform_at(&mut self, idx: u32) -> Transform {
        self.sync();
        self.absolute_transform_of(idx)
    }

    pub(crate) fn absolute_opacity_at(&mut self, idx: u32) -> f64 {
        self.sync();
        self.absolute_opacity_of(idx)
    }

    pub(crate) fn visible_at(&mut self, idx: u32) -> bool {
        self.sync();
        self.inherited_flag(idx, CacheField::Visible)
    }

    pub(crate) fn listening_at(&mut self, idx: u32) -> bool {
        self.sync();
        self.inherited_flag(idx, CacheField::Listening)
    }

    pub(crate) fn stage_at(&mut self, idx: u32) -> Option<u32> {
        self.sync();
        let stage = self.stage_of_slot(idx);
        (stage != INVALID).then_some(stage)
    }

    /// Folds transforms from just below `top` down to `idx`. When `top` is not
    /// an ancestor the fold runs from the root.
    pub(crate) fn absolute_transform_relative_at(&mut self, idx: u32, top: u32) -> Transform {
        self.sync();
        let mut chain = Vec::new();
        let mut cur = idx;
        while cur != INVALID && cur != top {
            chain.push(cur);
            cur = self.parent[cur as usize];
        }
        chain
            .into_iter()
            .rev()
            .fold(Transform::IDENTITY, |at, n| self.inherit(at, n))
    }

    /// The nearest ancestor-or-self of kind `Layer`.
    pub(crate) fn layer_at(&self, idx: u32) -> Option<u32> {
        let mut cur = idx;
        while cur != INVALID {
            if self.kind[cur as usize] == NodeKind::Layer {
                return Some(cur);
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    // -- Computation (assumes a fresh sync) --

    fn local_transform_of(&mut self, idx: u32) -> Transform {
        if let Some(t) = self.cache[idx as usize].transform {
            return t;
        }
        let rotation = self.angle_mode.to_radians(self.num(idx, "rotation", 0.0));
        let t = Transform::IDENTITY
            .translate(self.num(idx, "x", 0.0), self.num(idx, "y", 0.0))
            .rotate(rotation)
            .skew(self.num(idx, "skewX", 0.0), self.num(idx, "skewY", 0.0))
            .scale(self.num(idx, "scaleX", 1.0), self.num(idx, "scaleY", 1.0))
            .translate(-self.num(idx, "offsetX", 0.0), -self.num(idx, "offsetY", 0.0));
        self.cache[idx as usize].transform = Some(t);
        t
    }

    fn transforms_enabled(&self, idx: u32) -> TransformsEnabled {
        match self.text(idx, "transformsEnabled") {
            Some("position") => TransformsEnabled::Position,
            Some("none") => TransformsEnabled::None,
            _ => TransformsEnabled::All,
        }
    }

    /// Applies node `n`'s contribution on top of its parent's transform.
    fn inherit(&mut self, parent: Transform, n: u32) -> Transform {
        match self.transforms_enabled(n) {
            TransformsEnabled::All => parent * self.local_transform_of(n),
            TransformsEnabled::Position => parent.translate(
                self.num(n, "x", 0.0) - self.num(n, "offsetX", 0.0),
                self.num(n, "y", 0.0) - self.num(n, "offsetY", 0.0),
            ),
            TransformsEnabled::None => parent,
        }
    }

    fn absolute_transform_of(&mut self, idx: u32) -> Transform {
        if let Some(t) = self.cache[idx as usize].absolute_transform {
            return t;
        }
        let p = self.parent[idx as usize];
        let base = if p == INVALID {
            Transform::IDENTITY
        } else {
            self.absolute_transform_of(p)
        };
        let t = self.inherit(base, idx);
        self.cache[idx as usize].absolute_transform = Some(t);
        t
    }

    fn absolute_opacity_of(&mut self, idx: u32) -> f64 {
        if let Some(o) = self.cache[idx as usize].absolute_opacity {
            return o;
        }
        let own = self.num(idx, "opacity", 1.0);
        let p = self.parent[idx as usize];
        let o = if p == INVALID {
            own
        } else {
            own * self.absolute_opacity_of(p)
        };
        self.cache[idx as usize].absolute_opacity = Some(o);
        o
    }

    fn inherited_flag(&mut self, idx: u32, field: CacheField) -> bool {
        let cached = match field {
            CacheField::Visible => self.cache[idx as usize].visible,
            _ => self.cache[idx as usize].listening,
        };
        if let Some(v) = cached {
            return v;
        }
        let key = if field == CacheField::Visible {
            "visible"
        } else {
            "listening"
        };
        let p = self.parent[idx as usize];
        let v = self.flag(idx, key, true) && (p == INVALID || self.inherited_flag(p, field));
        match field {
            CacheField::Visible => self.cache[idx as usize].visible = Some(v),
            _ => self.cache[idx as usize].listening = Some(v),
        }
        v
    }

    fn stage_of_slot(&mut self, idx: u32) -> u32 {
        if let Some(s) = self.cache[idx as usize].stage {
            return s;
        }
        let p = self.parent[idx as usize];
        let s = if p != INVALID {
            self.stage_of_slot(p)
        } else if self.kind[idx as usize] == NodeKind::Stage {
            idx
        } else {
            INVALID
        };
        self.cache[idx as usize].stage = Some(s);
        s
    }
}
