// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode 2D scene graph with render-based hit testing.
//!
//! `easel_core` keeps a tree of stages, layers, groups and shapes in an arena
//! owned by one [`Scene`]. Every layer renders twice: once into a visible
//! scene surface and once into a hit surface where each shape is painted in
//! a flat color unique to it. Picking reads one hit pixel and maps the color
//! back to the shape, so z-order and clipping come from the raster itself.
//!
//! # Architecture
//!
//! ```text
//!   InputEvent ──► Scene::dispatch_input ──► hit surface lookup
//!                        │                         │
//!                        ▼                         ▼
//!                 drag sessions          over/out/enter/leave,
//!                 pointer capture        down/up/click/dblclick
//!                        │                         │
//!                        └──────► handlers ◄───────┘
//!                                    │
//!                        set_attr ──► dirty caches ──► batch_draw
//!                                                          │
//!   Scene::tick(now) ──► animations ──► draw pending layers
//! ```
//!
//! **[`node`]**: arena of nodes addressed by generational [`NodeId`]s, with
//! memoized derived values (absolute transform, opacity, visibility,
//! listening, stage).
//!
//! **[`dirty`]**: the table of which attributes invalidate which derived
//! values, backed by `understory_dirty` channels.
//!
//! **[`shape`]**: style resolution and the [`ShapeContext`](shape::ShapeContext)
//! handed to scene functions, which draw once for the scene surface and again
//! for the hit surface.
//!
//! **[`stage`]**: host container geometry, pointer normalization, and the
//! synthesis of enter/leave, click and double-click events.
//!
//! **[`drag`]**: drag sessions keyed by node, with distance threshold and
//! bound functions.
//!
//! **[`scheduler`]**: animations and coalesced redraws driven by the host's
//! frame clock.
//!
//! **[`serialize`]**: [`NodeData`](serialize::NodeData) trees and JSON.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) hooks for draws, picks,
//! dispatches and frames.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): enables the calls into an installed
//!   [`TraceSink`](trace::TraceSink).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod attrs;
mod capture;
pub mod class;
pub mod config;
pub mod dirty;
pub mod drag;
pub mod error;
pub mod event;
mod layer;
pub mod node;
pub mod registry;
mod scene;
pub mod scheduler;
pub mod serialize;
pub mod shape;
pub mod stage;
pub mod time;
pub mod trace;
pub mod transform;

pub use class::ClassSpec;
pub use config::SceneConfig;
pub use easel_render::{DrawError, Pixmap};
pub use error::{Result, SceneError};
pub use event::{Event, InputEvent, InputPhase, PointerFamily, Touch};
pub use kurbo;
pub use node::{NodeId, NodeKind};
pub use scene::Scene;
pub use stage::HostContainer;
pub use time::{Duration, HostTime};
pub use transform::{AngleMode, Transform};
