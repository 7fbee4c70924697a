// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing errors.

use thiserror::Error;

/// Errors raised while drawing into a [`Canvas`](crate::Canvas).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// A user drawing callback reported a failure.
    #[error("draw callback failed: {0}")]
    Callback(String),

    /// The requested surface size cannot back a pixel buffer.
    #[error("cannot allocate a {width}x{height} surface")]
    Surface {
        /// Requested width in device pixels.
        width: u32,
        /// Requested height in device pixels.
        height: u32,
    },
}

impl DrawError {
    /// Convenience constructor for callback failures.
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}
