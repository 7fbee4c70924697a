// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model.
//!
//! A *node* is an element of the scene tree. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - A [`NodeKind`] deciding its place in the tree, and a class name deciding
//!   its defaults and drawing.
//! - Topology: a parent link and an ordered child list. A child's `index`
//!   always equals its position in the parent's list.
//! - An attribute map of JSON values, plus opaque [`Handle`]s for values that
//!   cannot be serialized.
//! - Memoized derived properties (see [`dirty`](crate::dirty)): local and
//!   absolute transform, absolute opacity, effective visibility and listening,
//!   and the owning stage.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.

mod cache;
mod id;
mod kind;
mod store;
mod traverse;

pub use id::{INVALID, NodeId};
pub use kind::NodeKind;
pub(crate) use store::NodeHooks;
pub use store::{Handle, NodeStore};
pub use traverse::Ancestors;
