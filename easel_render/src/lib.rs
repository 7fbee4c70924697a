// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster drawing surfaces for the easel scene graph.
//!
//! `easel_render` is the drawing-surface contract the scene graph renders
//! through. It knows nothing about nodes or events:
//!
//! - **[`canvas`]**: [`Canvas`], a save/restore drawing context with path
//!   construction, fill/stroke/clip, image blits, and pixel read-back, backed
//!   by a `tiny_skia` pixmap.
//! - **[`surface`]**: [`SceneSurface`] and [`HitSurface`], the two parallel
//!   rasters every layer owns, and [`HitSample`] for classifying hit pixels.
//! - **[`color`]**: CSS color parsing and `#rrggbb` hit-key encoding.
//! - **[`error`]**: [`DrawError`].

pub mod canvas;
pub mod color;
pub mod error;
pub mod surface;

pub use canvas::{Brush, Canvas, ImageData, LineCap, LineJoin, Shadow};
pub use color::{Rgba, rgb_to_hex};
pub use error::DrawError;
pub use surface::{HitSample, HitSurface, SceneSurface};

/// Re-exported so callers can hand pattern images to [`Brush::Pattern`].
pub use tiny_skia::Pixmap;
