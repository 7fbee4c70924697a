// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine-wide configuration.

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::time::Duration;
use crate::transform::AngleMode;

/// Settings shared by every node of one [`Scene`](crate::Scene).
///
/// Every field has a default, so a partial JSON object is a valid
/// configuration:
///
/// ```
/// # use easel_core::config::SceneConfig;
/// let config = SceneConfig::from_json(r#"{ "drag_distance": 8 }"#).unwrap();
/// assert_eq!(config.drag_distance, 8.0);
/// assert_eq!(config.drag_buttons, vec![0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Unit of `rotation` attributes and decomposed rotations.
    pub angle_mode: AngleMode,
    /// Device pixels per logical pixel for newly allocated surfaces.
    pub pixel_ratio: f64,
    /// Pointer travel (in logical pixels) before a drag starts, unless a node
    /// or one of its ancestors sets `dragDistance`.
    pub drag_distance: f64,
    /// Mouse buttons that may start a drag.
    pub drag_buttons: Vec<u8>,
    /// Rolling window within which a second click counts as a double click.
    pub dbl_click_window: Duration,
    /// Keep hit surfaces and pointer events live while a drag is in progress.
    pub hit_on_drag_enabled: bool,
    /// Capture the pointer on the shape under a pointer-down automatically.
    pub capture_pointer_events_enabled: bool,
    /// Dispatch `pointer*` family input at all.
    pub pointer_events_enabled: bool,
    /// Schedule a batched redraw whenever an attribute changes.
    pub auto_draw_enabled: bool,
    /// Seed for color-key generation. `None` draws from OS entropy.
    pub color_key_seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            angle_mode: AngleMode::Degrees,
            pixel_ratio: 1.0,
            drag_distance: 3.0,
            drag_buttons: vec![0],
            dbl_click_window: Duration::from_millis(400),
            hit_on_drag_enabled: false,
            capture_pointer_events_enabled: false,
            pointer_events_enabled: true,
            auto_draw_enabled: true,
            color_key_seed: None,
        }
    }
}

impl SceneConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A configuration with a fixed color-key seed, for reproducible tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            color_key_seed: Some(seed),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = SceneConfig::default();
        assert_eq!(c.drag_distance, 3.0);
        assert_eq!(c.dbl_click_window, Duration(400_000));
        assert_eq!(c.angle_mode, AngleMode::Degrees);
        assert!(c.auto_draw_enabled);
        assert!(!c.hit_on_drag_enabled);
    }

    #[test]
    fn json_overrides_selected_fields() {
        let c = SceneConfig::from_json(
            r#"{ "angle_mode": "radians", "hit_on_drag_enabled": true, "dbl_click_window": 250000 }"#,
        )
        .unwrap();
        assert_eq!(c.angle_mode, AngleMode::Radians);
        assert!(c.hit_on_drag_enabled);
        assert_eq!(c.dbl_click_window, Duration::from_millis(250));
        assert_eq!(c.pixel_ratio, 1.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            SceneConfig::from_json("{ nope"),
            Err(SceneError::Json(_))
        ));
    }
}
