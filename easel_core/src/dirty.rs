// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived-value cache fields, their dirty channels, and the dependency table.
//!
//! Each memoized node property is a [`CacheField`] backed by one
//! [`understory_dirty`] channel. [`DEPENDENCIES`] states, for every field,
//! which attributes it is derived from and whether it is inherited by
//! descendants:
//!
//! - **Propagating** fields (absolute transform, absolute opacity, visible,
//!   listening, stage) carry child → parent dependency edges and are marked
//!   with [`EagerPolicy`](understory_dirty::EagerPolicy), so invalidating a
//!   node invalidates its whole subtree.
//! - **Local** fields (the node's own transform) are marked with the default
//!   policy and only ever affect the marked node.
//!
//! Writes never recompute anything. [`NodeStore::invalidate`] marks a
//! channel, and the next derived read drains all channels and drops the
//! affected cache entries before computing.
//!
//! [`NodeStore::invalidate`]: crate::node::NodeStore::invalidate

use understory_dirty::Channel;

/// Own local transform changed.
pub const LOCAL_TRANSFORM: Channel = Channel::new(0);

/// Transform of the node or an ancestor changed.
pub const ABSOLUTE_TRANSFORM: Channel = Channel::new(1);

/// Opacity of the node or an ancestor changed.
pub const ABSOLUTE_OPACITY: Channel = Channel::new(2);

/// Visibility of the node or an ancestor changed.
pub const VISIBLE: Channel = Channel::new(3);

/// Listening flag of the node or an ancestor changed.
pub const LISTENING: Channel = Channel::new(4);

/// Ancestor chain changed, so the owning stage may differ.
pub const STAGE: Channel = Channel::new(5);

/// A memoized derived property of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheField {
    /// The node's own local transform.
    Transform,
    /// Local transform composed with every ancestor's.
    AbsoluteTransform,
    /// Own opacity times every ancestor's.
    AbsoluteOpacity,
    /// Own `visible` and every ancestor's.
    Visible,
    /// Own `listening` and every ancestor's.
    Listening,
    /// The stage at the root of the node's tree.
    Stage,
}

impl CacheField {
    /// Every cache field.
    pub const ALL: [Self; 6] = [
        Self::Transform,
        Self::AbsoluteTransform,
        Self::AbsoluteOpacity,
        Self::Visible,
        Self::Listening,
        Self::Stage,
    ];

    /// The dirty channel backing this field.
    #[must_use]
    pub const fn channel(self) -> Channel {
        match self {
            Self::Transform => LOCAL_TRANSFORM,
            Self::AbsoluteTransform => ABSOLUTE_TRANSFORM,
            Self::AbsoluteOpacity => ABSOLUTE_OPACITY,
            Self::Visible => VISIBLE,
            Self::Listening => LISTENING,
            Self::Stage => STAGE,
        }
    }

    /// Whether invalidating this field also invalidates descendants.
    #[must_use]
    pub fn propagates(self) -> bool {
        DEPENDENCIES
            .iter()
            .any(|dep| dep.field == self && dep.propagates)
    }
}

/// One row of the dependency table.
#[derive(Clone, Copy, Debug)]
pub struct CacheDependency {
    /// The derived field.
    pub field: CacheField,
    /// Attribute keys whose change invalidates the field.
    pub sources: &'static [&'static str],
    /// Whether the field is inherited by descendants.
    pub propagates: bool,
}

const TRANSFORM_ATTRS: &[&str] = &[
    "x", "y", "rotation", "scaleX", "scaleY", "skewX", "skewY", "offsetX", "offsetY",
];

const ABSOLUTE_TRANSFORM_ATTRS: &[&str] = &[
    "x",
    "y",
    "rotation",
    "scaleX",
    "scaleY",
    "skewX",
    "skewY",
    "offsetX",
    "offsetY",
    "transformsEnabled",
];

/// Which attributes each derived field reads.
///
/// Topology changes (attach, detach, destroy) invalidate every propagating
/// field of the moved subtree regardless of this table.
pub const DEPENDENCIES: [CacheDependency; 6] = [
    CacheDependency {
        field: CacheField::Transform,
        sources: TRANSFORM_ATTRS,
        propagates: false,
    },
    CacheDependency {
        field: CacheField::AbsoluteTransform,
        sources: ABSOLUTE_TRANSFORM_ATTRS,
        propagates: true,
    },
    CacheDependency {
        field: CacheField::AbsoluteOpacity,
        sources: &["opacity"],
        propagates: true,
    },
    CacheDependency {
        field: CacheField::Visible,
        sources: &["visible"],
        propagates: true,
    },
    CacheDependency {
        field: CacheField::Listening,
        sources: &["listening"],
        propagates: true,
    },
    CacheDependency {
        field: CacheField::Stage,
        sources: &[],
        propagates: true,
    },
];

/// Iterates the fields derived from attribute `key`.
pub fn fields_reading(key: &str) -> impl Iterator<Item = CacheField> + '_ {
    DEPENDENCIES
        .iter()
        .filter(move |dep| dep.sources.iter().any(|s| *s == key))
        .map(|dep| dep.field)
}
