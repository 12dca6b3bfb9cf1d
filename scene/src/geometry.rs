//! Geometry kernel: points, axis-aligned bounds, per-variant bounds
//! estimation, and anchor points.
//!
//! Bounds are reported in the element's parent space: local geometry first,
//! then the element's own transform (scale then translate). Rotation is not
//! applied. Ancestor transforms are the caller's concern.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    ASCENT_RATIO, DEFAULT_FONT_SIZE, DEFAULT_LINE_STROKE, GLYPH_WIDTH_RATIO, LINE_HEIGHT_RATIO, MIN_TEXT_WIDTH,
    PATH_PLACEHOLDER_EXTENT, USE_PLACEHOLDER_EXTENT,
};
use crate::doc::{Element, Shape, Text};
use crate::transform::Transform;

/// A point in canvas or local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned bounding box with non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Construct bounds, folding a negative width or height into the origin.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self { x, y, width, height }
    }

    /// Smallest bounds containing both corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Smallest bounds containing `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self { x, y, width: self.right().max(other.right()) - x, height: self.bottom().max(other.bottom()) - y }
    }

    /// Grow by `margin` on every side.
    #[must_use]
    pub fn inflate(&self, margin: f64) -> Self {
        Self::new(self.x - margin, self.y - margin, self.width + 2.0 * margin, self.height + 2.0 * margin)
    }

    /// Whether the two boxes overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right() && other.x <= self.right() && self.y <= other.bottom() && other.y <= self.bottom()
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Map through a transform: `x·sx + tx`, `w·sx`, and likewise for y.
    #[must_use]
    pub fn transformed(&self, t: &Transform) -> Self {
        Self::new(
            self.x * t.sx() + t.tx(),
            self.y * t.sy() + t.ty(),
            self.width * t.sx(),
            self.height * t.sy(),
        )
    }
}

// =============================================================
// Measuring
// =============================================================

/// A measuring surface that can supply exact bounds for an element.
///
/// Returned bounds must be in the same space as [`element_bounds`]: local
/// geometry under the element's own transform. Returning `None` falls back to
/// the built-in estimate.
pub trait Measure {
    fn measure(&self, el: &Element) -> Option<Bounds>;
}

/// Measuring surface that knows nothing; every element is estimated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimate;

impl Measure for Estimate {
    fn measure(&self, _el: &Element) -> Option<Bounds> {
        None
    }
}

/// Bounds of an element, estimated where the measuring surface declines.
/// `None` for a group with no visible children at any depth.
#[must_use]
pub fn element_bounds(el: &Element, measure: &dyn Measure) -> Option<Bounds> {
    if let Some(b) = measure.measure(el) {
        return Some(b);
    }
    let local = local_bounds(el, measure)?;
    Some(match &el.transform {
        Some(t) => local.transformed(t),
        None => local,
    })
}

/// [`element_bounds`] with no measuring surface.
#[must_use]
pub fn bounds(el: &Element) -> Option<Bounds> {
    element_bounds(el, &Estimate)
}

fn local_bounds(el: &Element, measure: &dyn Measure) -> Option<Bounds> {
    let b = match &el.shape {
        Shape::Rect(r) => Bounds::new(r.x, r.y, r.width, r.height),
        Shape::Circle(c) => Bounds::new(c.cx - c.r, c.cy - c.r, c.r * 2.0, c.r * 2.0),
        Shape::Ellipse(e) => Bounds::new(e.cx - e.rx, e.cy - e.ry, e.rx * 2.0, e.ry * 2.0),
        Shape::Line(l) => {
            let pad = el.style.stroke_width.unwrap_or(DEFAULT_LINE_STROKE) / 2.0;
            Bounds::from_corners(l.start(), l.end()).inflate(pad)
        }
        Shape::Path(_) => Bounds::new(0.0, 0.0, PATH_PLACEHOLDER_EXTENT, PATH_PLACEHOLDER_EXTENT),
        Shape::Text(t) => text_bounds(t),
        Shape::Image(i) => Bounds::new(i.x, i.y, i.width, i.height),
        Shape::Use(u) => Bounds::new(
            u.x,
            u.y,
            u.width.unwrap_or(USE_PLACEHOLDER_EXTENT),
            u.height.unwrap_or(USE_PLACEHOLDER_EXTENT),
        ),
        Shape::Group(g) => {
            return g
                .children
                .iter()
                .filter(|child| child.visible)
                .filter_map(|child| element_bounds(child, measure))
                .reduce(|acc, b| acc.union(&b));
        }
    };
    Some(b)
}

#[allow(clippy::cast_precision_loss)]
fn text_bounds(t: &Text) -> Bounds {
    let size = t.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    let advance = |s: &str| s.chars().count() as f64 * size * GLYPH_WIDTH_RATIO;

    let (width, height) = if t.tspans.is_empty() {
        (advance(&t.text), size)
    } else {
        let widest = t.tspans.iter().map(|span| advance(&span.text)).fold(0.0, f64::max);
        (widest, size * t.tspans.len() as f64 * LINE_HEIGHT_RATIO)
    };
    let width = width.max(MIN_TEXT_WIDTH);

    let x = match t.text_anchor.as_deref() {
        Some("middle") => t.x - width / 2.0,
        Some("end") => t.x - width,
        _ => t.x,
    };
    Bounds::new(x, t.y - size * ASCENT_RATIO, width, height)
}

// =============================================================
// Anchors
// =============================================================

/// Named anchor positions, in the order [`anchors_of`] returns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl Anchor {
    pub const ALL: [Self; 5] = [Self::Top, Self::Bottom, Self::Left, Self::Right, Self::Center];
}

/// Top, bottom, left, right, and centre of a box.
#[must_use]
pub fn anchors_of(b: &Bounds) -> [Point; 5] {
    let c = b.center();
    [
        Point::new(c.x, b.y),
        Point::new(c.x, b.bottom()),
        Point::new(b.x, c.y),
        Point::new(b.right(), c.y),
        c,
    ]
}

/// Anchor points of an element; lines and empty groups have none.
#[must_use]
pub fn anchor_points(el: &Element, measure: &dyn Measure) -> Vec<Point> {
    if el.is_line() {
        return Vec::new();
    }
    element_bounds(el, measure).map_or_else(Vec::new, |b| anchors_of(&b).to_vec())
}

/// Index and distance of the point in `candidates` nearest to `p`.
#[must_use]
pub fn nearest(p: Point, candidates: &[Point]) -> Option<(usize, f64)> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, p.distance(*c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
