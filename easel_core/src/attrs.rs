// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute maps, declared defaults, compound keys, and value validation.
//!
//! Attributes are plain JSON values stored sparsely: a missing key reads as
//! its declared default. Defaults come from three tiers, most specific
//! first: the node's class (see [`ClassSpec`](crate::ClassSpec)), its
//! [`NodeKind`], and the properties every node shares.

use serde_json::{Value, json};
use tracing::warn;

use crate::node::NodeKind;

/// A sparse attribute map.
pub type Attrs = serde_json::Map<String, Value>;

/// The declared default of `key` for a node of `kind`, ignoring class defaults.
#[must_use]
pub fn kind_default(kind: NodeKind, key: &str) -> Option<Value> {
    let specific = match kind {
        NodeKind::Shape => shape_default(key),
        NodeKind::Layer => match key {
            "clearBeforeDraw" => Some(json!(true)),
            _ => None,
        },
        NodeKind::Stage | NodeKind::Group => None,
    };
    specific.or_else(|| node_default(key))
}

fn node_default(key: &str) -> Option<Value> {
    Some(match key {
        "x" | "y" | "rotation" | "skewX" | "skewY" | "offsetX" | "offsetY" | "width"
        | "height" => json!(0),
        "scaleX" | "scaleY" | "opacity" => json!(1),
        "visible" | "listening" => json!(true),
        "draggable" => json!(false),
        "transformsEnabled" => json!("all"),
        _ => return None,
    })
}

fn shape_default(key: &str) -> Option<Value> {
    Some(match key {
        "strokeWidth" => json!(2),
        "fillEnabled" | "strokeEnabled" | "shadowEnabled" => json!(true),
        "fillAfterStrokeEnabled" => json!(false),
        "hitStrokeWidth" => json!("auto"),
        "shadowOpacity" => json!(1),
        _ => return None,
    })
}

/// Sub-keys written by a compound setter, as `(component, attribute)` pairs.
///
/// `set_attr(id, "scale", {"x": 2, "y": 3})` writes `scaleX = 2` and
/// `scaleY = 3`.
#[must_use]
pub fn compound(key: &str) -> Option<[(&'static str, &'static str); 2]> {
    Some(match key {
        "position" => [("x", "x"), ("y", "y")],
        "scale" => [("x", "scaleX"), ("y", "scaleY")],
        "skew" => [("x", "skewX"), ("y", "skewY")],
        "offset" => [("x", "offsetX"), ("y", "offsetY")],
        "size" => [("width", "width"), ("height", "height")],
        "shadowOffset" => [("x", "shadowOffsetX"), ("y", "shadowOffsetY")],
        "fillLinearGradientStartPoint" => [
            ("x", "fillLinearGradientStartPointX"),
            ("y", "fillLinearGradientStartPointY"),
        ],
        "fillLinearGradientEndPoint" => [
            ("x", "fillLinearGradientEndPointX"),
            ("y", "fillLinearGradientEndPointY"),
        ],
        "fillRadialGradientStartPoint" => [
            ("x", "fillRadialGradientStartPointX"),
            ("y", "fillRadialGradientStartPointY"),
        ],
        "fillRadialGradientEndPoint" => [
            ("x", "fillRadialGradientEndPointX"),
            ("y", "fillRadialGradientEndPointY"),
        ],
        _ => return None,
    })
}

/// The value shape an attribute is expected to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expected {
    /// A finite number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// Any string.
    String,
    /// A number or the string `"auto"`.
    NumberOrAuto,
    /// An array of numbers.
    NumberArray,
    /// A number or an array of numbers.
    NumberOrNumbers,
    /// An array alternating stop offsets and CSS colors.
    ColorStops,
}

impl Expected {
    /// The expected shape for a known attribute key.
    #[must_use]
    pub fn of(key: &str) -> Option<Self> {
        Some(match key {
            "x" | "y" | "width" | "height" | "rotation" | "scaleX" | "scaleY" | "skewX"
            | "skewY" | "offsetX" | "offsetY" | "opacity" | "dragDistance" | "radius"
            | "strokeWidth" | "shadowOffsetX" | "shadowOffsetY"
            | "shadowOpacity" | "shadowBlur" | "clipX" | "clipY" | "clipWidth"
            | "clipHeight" | "fillLinearGradientStartPointX"
            | "fillLinearGradientStartPointY" | "fillLinearGradientEndPointX"
            | "fillLinearGradientEndPointY" | "fillRadialGradientStartPointX"
            | "fillRadialGradientStartPointY" | "fillRadialGradientEndPointX"
            | "fillRadialGradientEndPointY" | "fillRadialGradientEndRadius" => Self::Number,
            "visible" | "listening" | "draggable" | "fillEnabled" | "strokeEnabled"
            | "shadowEnabled" | "fillAfterStrokeEnabled" | "clearBeforeDraw" => Self::Boolean,
            "id" | "name" | "fill" | "stroke" | "shadowColor" | "lineCap" | "lineJoin"
            | "transformsEnabled" => Self::String,
            "hitStrokeWidth" => Self::NumberOrAuto,
            "cornerRadius" => Self::NumberOrNumbers,
            "dash" => Self::NumberArray,
            "fillLinearGradientColorStops" | "fillRadialGradientColorStops" => Self::ColorStops,
            _ => return None,
        })
    }

    /// Whether `value` has this shape.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Number => value.as_f64().is_some_and(f64::is_finite),
            Self::Boolean => value.is_boolean(),
            Self::String => value.is_string(),
            Self::NumberOrAuto => value.is_number() || value.as_str() == Some("auto"),
            Self::NumberArray => value
                .as_array()
                .is_some_and(|a| a.iter().all(Value::is_number)),
            Self::NumberOrNumbers => {
                value.is_number() || Self::NumberArray.accepts(value)
            }
            Self::ColorStops => value.as_array().is_some_and(|a| {
                a.len() % 2 == 0
                    && a.chunks(2)
                        .all(|pair| pair[0].is_number() && pair[1].is_string())
            }),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::String => "a string",
            Self::NumberOrAuto => "a number or \"auto\"",
            Self::NumberArray => "an array of numbers",
            Self::NumberOrNumbers => "a number or an array of numbers",
            Self::ColorStops => "an array of [offset, color] pairs",
        }
    }
}

/// Logs a warning when `value` does not fit the declared shape of `key`.
/// Returns whether the value is valid. `null` (reset to default) always is.
pub fn validate(key: &str, value: &Value) -> bool {
    if value.is_null() {
        return true;
    }
    match Expected::of(key) {
        Some(expected) if !expected.accepts(value) => {
            warn!(
                attr = key,
                %value,
                "invalid value for attribute `{key}`, expected {}; storing it anyway",
                expected.describe()
            );
            false
        }
        _ => true,
    }
}

/// Converts a JSON object into an attribute map. Anything else logs a
/// warning and yields an empty map; `null` yields an empty map silently.
#[must_use]
pub fn from_value(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map,
        Value::Null => Attrs::new(),
        other => {
            warn!(%other, "attributes must be a JSON object; ignoring");
            Attrs::new()
        }
    }
}

/// Whether a write of `new` over `old` changes nothing observable.
///
/// Arrays and objects always count as changes, since callers may have
/// mutated a shared value in place before writing it back.
#[must_use]
pub fn is_noop_write(old: Option<&Value>, new: &Value) -> bool {
    match old {
        Some(old) => !new.is_array() && !new.is_object() && same_value(old, new),
        None => new.is_null(),
    }
}

/// Value equality where numbers compare by magnitude, so `5` equals `5.0`.
#[must_use]
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}
