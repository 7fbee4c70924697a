// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2-D affine transform with compose, decompose, invert, and point mapping.
//!
//! [`Transform`] stores the six coefficients `[a, b, c, d, e, f]` of
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! in the same order as [`kurbo::Affine`], so conversions are free. The
//! builder-style operations (`translate`, `rotate`, `skew`, `scale`,
//! `multiply`) all post-multiply: the new operation applies to points
//! *before* the existing transform.

use core::f64::consts::FRAC_PI_2;
use core::ops::Mul;

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Unit used for rotation and skew-angle attributes and for decomposed
/// rotation values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    /// Angles are in degrees.
    #[default]
    Degrees,
    /// Angles are in radians.
    Radians,
}

impl AngleMode {
    /// Converts an angle in this unit to radians.
    #[inline]
    #[must_use]
    pub fn to_radians(self, angle: f64) -> f64 {
        match self {
            Self::Degrees => angle.to_radians(),
            Self::Radians => angle,
        }
    }

    /// Converts an angle in radians to this unit.
    #[inline]
    #[must_use]
    pub fn from_radians(self, radians: f64) -> f64 {
        match self {
            Self::Degrees => radians.to_degrees(),
            Self::Radians => radians,
        }
    }
}

/// A 2-D affine transform stored as `[a, b, c, d, e, f]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// The six matrix coefficients.
    pub m: [f64; 6],
}

/// The components recovered by [`Transform::decompose`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Decomposed {
    /// Horizontal translation.
    pub x: f64,
    /// Vertical translation.
    pub y: f64,
    /// Rotation, in the [`AngleMode`] passed to `decompose`.
    pub rotation: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Horizontal skew factor.
    pub skew_x: f64,
    /// Vertical skew factor.
    pub skew_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Creates a transform from its six coefficients.
    #[inline]
    #[must_use]
    pub const fn new(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// Appends a translation.
    #[must_use]
    pub fn translate(self, x: f64, y: f64) -> Self {
        let [a, b, c, d, e, f] = self.m;
        Self::new([a, b, c, d, e + a * x + c * y, f + b * x + d * y])
    }

    /// Appends a non-uniform scale.
    #[must_use]
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        let [a, b, c, d, e, f] = self.m;
        Self::new([a * sx, b * sx, c * sy, d * sy, e, f])
    }

    /// Appends a rotation by `radians` (clockwise in y-down space).
    #[must_use]
    pub fn rotate(self, radians: f64) -> Self {
        let (s, cos) = radians.sin_cos();
        let [a, b, c, d, e, f] = self.m;
        Self::new([
            a * cos + c * s,
            b * cos + d * s,
            -a * s + c * cos,
            -b * s + d * cos,
            e,
            f,
        ])
    }

    /// Appends a skew with factors `sx` (x by y) and `sy` (y by x).
    #[must_use]
    pub fn skew(self, sx: f64, sy: f64) -> Self {
        let [a, b, c, d, e, f] = self.m;
        Self::new([a + c * sy, b + d * sy, c + a * sx, d + b * sx, e, f])
    }

    /// Returns `self × other`: `other` applies to points first.
    #[must_use]
    pub fn multiply(self, other: Self) -> Self {
        let [a, b, c, d, e, f] = self.m;
        let [n0, n1, n2, n3, n4, n5] = other.m;
        Self::new([
            a * n0 + c * n1,
            b * n0 + d * n1,
            a * n2 + c * n3,
            b * n2 + d * n3,
            a * n4 + c * n5 + e,
            b * n4 + d * n5 + f,
        ])
    }

    /// Returns the determinant of the linear part.
    #[inline]
    #[must_use]
    pub fn determinant(self) -> f64 {
        self.m[0] * self.m[3] - self.m[1] * self.m[2]
    }

    /// Returns the inverse, or `None` if the transform is singular.
    #[must_use]
    pub fn invert(self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let [a, b, c, d, e, f] = self.m;
        Some(Self::new([
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            inv * (c * f - d * e),
            inv * (b * e - a * f),
        ]))
    }

    /// Maps a point through the transform.
    #[inline]
    #[must_use]
    pub fn point(self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.m;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Returns the translation component.
    #[inline]
    #[must_use]
    pub fn translation(self) -> Vec2 {
        Vec2::new(self.m[4], self.m[5])
    }

    /// Splits the transform into translation, rotation, scale, and skew.
    ///
    /// Uses a QR-style split that assigns all shear to `skew_x` when the first
    /// column is non-zero, and to `skew_y` otherwise. When `a`, `b`, `c`, and
    /// `d` are all zero, the transform carries no rotation or scale
    /// information and those components stay at zero.
    #[must_use]
    pub fn decompose(self, mode: AngleMode) -> Decomposed {
        let [a, b, c, d, e, f] = self.m;
        let delta = a * d - b * c;
        let mut out = Decomposed {
            x: e,
            y: f,
            ..Decomposed::default()
        };
        if a != 0.0 || b != 0.0 {
            let r = a.hypot(b);
            out.rotation = if b > 0.0 {
                (a / r).acos()
            } else {
                -(a / r).acos()
            };
            out.scale_x = r;
            out.scale_y = delta / r;
            out.skew_x = (a * c + b * d) / delta;
        } else if c != 0.0 || d != 0.0 {
            let s = c.hypot(d);
            out.rotation = FRAC_PI_2
                - if d > 0.0 {
                    (-c / s).acos()
                } else {
                    -(c / s).acos()
                };
            out.scale_x = delta / s;
            out.scale_y = s;
            out.skew_y = (a * b + c * d) / delta;
        }
        out.rotation = mode.from_radians(out.rotation);
        out
    }

    /// Converts to a [`kurbo::Affine`].
    #[inline]
    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::new(self.m)
    }
}

impl Mul for Transform {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.multiply(rhs)
    }
}

impl From<Affine> for Transform {
    fn from(a: Affine) -> Self {
        Self::new(a.as_coeffs())
    }
}

impl From<Transform> for Affine {
    fn from(t: Transform) -> Self {
        t.to_affine()
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::PI;

    use proptest::prelude::*;

    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
    }

    fn assert_point(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < EPS && (p.y - y).abs() < EPS,
            "expected ({x}, {y}), got {p:?}"
        );
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
        assert_point(Transform::IDENTITY.point(Point::new(3.0, 4.0)), 3.0, 4.0);
    }

    #[test]
    fn translate_then_scale_scales_first() {
        let t = Transform::IDENTITY.translate(10.0, 20.0).scale(2.0, 3.0);
        assert_point(t.point(Point::new(1.0, 1.0)), 12.0, 23.0);
    }

    #[test]
    fn rotate_quarter_turn() {
        let t = Transform::IDENTITY.rotate(FRAC_PI_2);
        assert_point(t.point(Point::new(1.0, 0.0)), 0.0, 1.0);
    }

    #[test]
    fn skew_shears_x_by_y() {
        let t = Transform::IDENTITY.skew(0.5, 0.0);
        assert_point(t.point(Point::new(0.0, 2.0)), 1.0, 2.0);
    }

    #[test]
    fn multiply_matches_operator() {
        let a = Transform::IDENTITY.translate(5.0, 0.0);
        let b = Transform::IDENTITY.scale(2.0, 2.0);
        assert_eq!(a.multiply(b), a * b);
        assert_point((a * b).point(Point::new(1.0, 1.0)), 7.0, 2.0);
    }

    #[test]
    fn invert_round_trips_points() {
        let t = Transform::IDENTITY
            .translate(3.0, -7.0)
            .rotate(0.3)
            .scale(2.0, 0.5);
        let inv = t.invert().unwrap();
        let p = Point::new(11.0, 13.0);
        let back = inv.point(t.point(p));
        assert_point(back, p.x, p.y);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert!(Transform::IDENTITY.scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn decompose_zero_matrix_keeps_rotation_zero() {
        let d = Transform::new([0.0, 0.0, 0.0, 0.0, 4.0, 5.0]).decompose(AngleMode::Degrees);
        assert_eq!(d.rotation, 0.0);
        assert_eq!(d.scale_x, 0.0);
        assert_eq!(d.scale_y, 0.0);
        assert_eq!((d.x, d.y), (4.0, 5.0));
    }

    #[test]
    fn decompose_second_branch() {
        // First column zero, second column (0, 2): pure y scale with zero x.
        let d = Transform::new([0.0, 0.0, 0.0, 2.0, 0.0, 0.0]).decompose(AngleMode::Radians);
        assert!(approx(d.scale_y, 2.0), "{d:?}");
        assert!(approx(d.rotation, 0.0), "{d:?}");
    }

    #[test]
    fn decompose_reports_degrees_by_mode() {
        let t = Transform::IDENTITY.rotate(PI / 6.0);
        assert!(approx(t.decompose(AngleMode::Degrees).rotation, 30.0));
        assert!(approx(t.decompose(AngleMode::Radians).rotation, PI / 6.0));
    }

    #[test]
    fn affine_conversion_preserves_coefficients() {
        let t = Transform::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let a: Affine = t.into();
        assert_eq!(a.as_coeffs(), t.m);
        assert_eq!(Transform::from(a), t);
    }

    proptest! {
        #[test]
        fn decompose_inverts_compose(
            x in -1000.0..1000.0f64,
            y in -1000.0..1000.0f64,
            rotation in -3.1..3.1f64,
            scale_x in 0.05..20.0f64,
            scale_y in prop_oneof![0.05..20.0f64, -20.0..-0.05f64],
            skew_x in -2.0..2.0f64,
        ) {
            let t = Transform::IDENTITY
                .translate(x, y)
                .rotate(rotation)
                .skew(skew_x, 0.0)
                .scale(scale_x, scale_y);
            let d = t.decompose(AngleMode::Radians);
            prop_assert!(approx(d.x, x), "x: {d:?}");
            prop_assert!(approx(d.y, y), "y: {d:?}");
            prop_assert!(approx(d.rotation, rotation), "rotation: {d:?}");
            prop_assert!(approx(d.scale_x, scale_x), "scale_x: {d:?}");
            prop_assert!(approx(d.scale_y, scale_y), "scale_y: {d:?}");
            prop_assert!(approx(d.skew_x, skew_x), "skew_x: {d:?}");
            prop_assert!(approx(d.skew_y, 0.0), "skew_y: {d:?}");
        }
    }
}
