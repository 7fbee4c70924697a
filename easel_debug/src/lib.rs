// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree dumps, trace printing and JSON trace recording for easel.
//!
//! This crate provides [`TraceSink`](easel_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`pretty::format_tree`]: an indented dump of a node subtree.
//! - [`recorder::RecorderSink`]: keeps events in memory and exports them as
//!   JSON.

pub mod pretty;
pub mod recorder;
