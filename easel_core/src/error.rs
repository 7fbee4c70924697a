// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene errors.
//!
//! Structural misuse (adding a layer to a group, building a stage without a
//! host container, deserializing an unknown class) fails the call with a
//! [`SceneError`]. Invalid attribute values are not errors: they are logged
//! and stored.

use thiserror::Error;

use crate::node::NodeId;

/// Result alias for fallible scene operations.
pub type Result<T> = core::result::Result<T, SceneError>;

/// Errors returned by structural scene operations.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The handle refers to a destroyed node.
    #[error("stale node handle {0:?}")]
    StaleNode(NodeId),

    /// The parent class does not accept children of the child's class.
    #[error("{child} cannot be a child of {parent}")]
    InvalidChild {
        /// Class name of the would-be parent.
        parent: String,
        /// Class name of the rejected child.
        child: String,
    },

    /// The node is not a container.
    #[error("{0} cannot have children")]
    NotAContainer(String),

    /// An operation needed an ancestor of a given class that the node lacks.
    #[error("{node:?} has no {ancestor} ancestor")]
    MissingAncestor {
        /// The node the operation was called on.
        node: NodeId,
        /// Class name of the required ancestor.
        ancestor: &'static str,
    },

    /// A stage was created without a host container.
    #[error("a stage needs a host container")]
    MissingContainer,

    /// No factory is registered for a class name.
    #[error("unknown node class `{0}`")]
    UnknownClass(String),

    /// JSON input could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SceneError {
    /// Builds an [`InvalidChild`](Self::InvalidChild) error.
    #[must_use]
    pub fn invalid_child(parent: &str, child: &str) -> Self {
        Self::InvalidChild {
            parent: parent.to_owned(),
            child: child.to_owned(),
        }
    }
}
