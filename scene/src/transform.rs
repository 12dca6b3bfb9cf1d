//! Transform algebra: the `translate · scale · rotate(θ, cx, cy)` record
//! stored on elements, its attribute-string form, and an affine matrix view
//! used to compose ancestor transforms.
//!
//! Only the three functions above are modelled. Any other transform function
//! in the input (`matrix`, `skewX`, ...) is dropped on parse.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::parse::parse_number;
use crate::serialize::fmt_number;

/// Structured element transform. Every component is optional; absent
/// components are the identity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// Translation along x.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Translation along y.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Horizontal scale factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    /// Vertical scale factor; falls back to `scale_x` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    /// Rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Rotation centre x in local coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_cx: Option<f64>,
    /// Rotation centre y in local coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_cy: Option<f64>,
}

impl Transform {
    /// A pure translation.
    #[must_use]
    pub fn translate(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    /// Effective x translation.
    #[must_use]
    pub fn tx(&self) -> f64 {
        self.x.unwrap_or(0.0)
    }

    /// Effective y translation.
    #[must_use]
    pub fn ty(&self) -> f64 {
        self.y.unwrap_or(0.0)
    }

    /// Effective horizontal scale.
    #[must_use]
    pub fn sx(&self) -> f64 {
        self.scale_x.unwrap_or(1.0)
    }

    /// Effective vertical scale. A lone `scale_x` is a uniform scale.
    #[must_use]
    pub fn sy(&self) -> f64 {
        self.scale_y.or(self.scale_x).unwrap_or(1.0)
    }

    /// Whether no component is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with the translation shifted by `(dx, dy)`.
    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self { x: Some(self.tx() + dx), y: Some(self.ty() + dy), ..self }
    }

    /// Map a local point through scale then translation. Rotation is not applied.
    #[must_use]
    pub fn map_point(&self, p: Point) -> Point {
        Point::new(p.x * self.sx() + self.tx(), p.y * self.sy() + self.ty())
    }

    /// [`Transform::map_point`] as a matrix: scale then translation.
    #[must_use]
    pub fn to_placement(&self) -> Affine {
        Affine::translate(self.tx(), self.ty()).then(Affine::scale(self.sx(), self.sy()))
    }

    /// Full affine matrix including rotation.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        let mut m = Affine::translate(self.tx(), self.ty()).then(Affine::scale(self.sx(), self.sy()));
        if let Some(deg) = self.rotation {
            let cx = self.rotation_cx.unwrap_or(0.0);
            let cy = self.rotation_cy.unwrap_or(0.0);
            m = m
                .then(Affine::translate(cx, cy))
                .then(Affine::rotate(deg))
                .then(Affine::translate(-cx, -cy));
        }
        m
    }
}

/// Parse an SVG `transform` attribute into a [`Transform`].
///
/// Returns `None` for an empty string or when no supported function is found.
#[must_use]
pub fn parse_transform(raw: &str) -> Option<Transform> {
    let mut t = Transform::default();

    if let Some(args) = function_args(raw, "translate") {
        t.x = args.first().copied().flatten();
        t.y = args.get(1).copied().flatten();
    }
    if let Some(args) = function_args(raw, "scale") {
        t.scale_x = args.first().copied().flatten();
        t.scale_y = args.get(1).copied().flatten();
    }
    if let Some(args) = function_args(raw, "rotate") {
        t.rotation = args.first().copied().flatten();
        // A centre needs both coordinates.
        if let (Some(cx), Some(cy)) = (args.get(1).copied().flatten(), args.get(2).copied().flatten()) {
            t.rotation_cx = Some(cx);
            t.rotation_cy = Some(cy);
        }
    }

    if t.is_empty() { None } else { Some(t) }
}

/// Serialize a [`Transform`] as `translate(..) scale(..) rotate(..)`.
///
/// Returns `None` when nothing would be emitted.
#[must_use]
pub fn serialize_transform(t: &Transform) -> Option<String> {
    let mut segments = Vec::new();

    match (t.x, t.y) {
        (None, None) => {}
        (Some(x), None) => segments.push(format!("translate({})", fmt_number(x))),
        (x, Some(y)) => segments.push(format!("translate({} {})", fmt_number(x.unwrap_or(0.0)), fmt_number(y))),
    }
    match (t.scale_x, t.scale_y) {
        (None, None) => {}
        (Some(sx), None) => segments.push(format!("scale({})", fmt_number(sx))),
        (sx, Some(sy)) => segments.push(format!("scale({} {})", fmt_number(sx.unwrap_or(1.0)), fmt_number(sy))),
    }
    if let Some(deg) = t.rotation {
        match (t.rotation_cx, t.rotation_cy) {
            (Some(cx), Some(cy)) => {
                segments.push(format!("rotate({} {} {})", fmt_number(deg), fmt_number(cx), fmt_number(cy)));
            }
            _ => segments.push(format!("rotate({})", fmt_number(deg))),
        }
    }

    if segments.is_empty() { None } else { Some(segments.join(" ")) }
}

/// Positional arguments of the first `name(...)` call in `raw`. Each slot is
/// `None` when that argument is not a finite number.
fn function_args(raw: &str, name: &str) -> Option<Vec<Option<f64>>> {
    let open = format!("{name}(");
    let start = raw.find(&open)? + open.len();
    let len = raw[start..].find(')')?;
    let inner = raw[start..start + len].trim();
    if inner.is_empty() {
        return None;
    }
    Some(
        inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(parse_number)
            .collect(),
    )
}

/// 2-D affine matrix in SVG `matrix(a b c d e f)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(x: f64, y: f64) -> Self {
        Self { e: x, f: y, ..Self::IDENTITY }
    }

    #[must_use]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Rotation by `deg` degrees about the origin.
    #[must_use]
    pub fn rotate(deg: f64) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// `self · next`: `next` is applied to points first.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self {
            a: self.a * next.a + self.c * next.b,
            b: self.b * next.a + self.d * next.b,
            c: self.a * next.c + self.c * next.d,
            d: self.b * next.c + self.d * next.d,
            e: self.a * next.e + self.c * next.f + self.e,
            f: self.b * next.e + self.d * next.f + self.f,
        }
    }

    /// Inverse matrix; `None` when singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }
}
