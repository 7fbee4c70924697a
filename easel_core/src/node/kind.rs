// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node kinds and the parent/child rules between them.

use serde::{Deserialize, Serialize};

/// The structural role of a node.
///
/// Every node also has a class name (`"Rect"`, `"Circle"`, a custom shape
/// class, …); the kind decides where the node may sit in the tree and how it
/// takes part in drawing and hit testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root container bound to a host element. Holds layers.
    Stage,
    /// Container with its own scene and hit surfaces. Holds groups and shapes.
    Layer,
    /// Plain container. Holds groups and shapes.
    Group,
    /// Drawable leaf with a hit color key.
    Shape,
}

impl NodeKind {
    /// Whether nodes of this kind hold children.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        !matches!(self, Self::Shape)
    }

    /// Whether a node of this kind accepts a child of kind `child`.
    #[inline]
    #[must_use]
    pub const fn accepts(self, child: Self) -> bool {
        matches!(
            (self, child),
            (Self::Stage, Self::Layer) | (Self::Layer | Self::Group, Self::Group | Self::Shape)
        )
    }

    /// The class name of the plain node of this kind.
    #[must_use]
    pub const fn base_class(self) -> &'static str {
        match self {
            Self::Stage => "Stage",
            Self::Layer => "Layer",
            Self::Group => "Group",
            Self::Shape => "Shape",
        }
    }
}
