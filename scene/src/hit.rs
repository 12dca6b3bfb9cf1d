//! Spatial queries over the top-level elements: point hits, connector snap
//! targets, and marquee selection.
//!
//! Queries run against bounds from the installed [`Measure`], so they agree
//! with the anchors that connector references follow.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::MARQUEE_MARGIN;
use crate::doc::{Element, ElementId, ElementStore};
use crate::geometry::{Anchor, Bounds, Measure, Point, anchor_points, element_bounds};

/// Resize handle position on a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [Self; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Handle moves the top edge.
    #[must_use]
    pub fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Handle moves the bottom edge.
    #[must_use]
    pub fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Handle moves the right edge.
    #[must_use]
    pub fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Handle moves the left edge.
    #[must_use]
    pub fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Handle position on `b`.
    #[must_use]
    pub fn position(self, b: &Bounds) -> Point {
        let c = b.center();
        let x = if self.west() {
            b.x
        } else if self.east() {
            b.right()
        } else {
            c.x
        };
        let y = if self.north() {
            b.y
        } else if self.south() {
            b.bottom()
        } else {
            c.y
        };
        Point::new(x, y)
    }
}

/// Nearest anchor within the snap radius.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapTarget {
    pub id: ElementId,
    pub anchor: Anchor,
    pub point: Point,
}

fn snappable(el: &Element) -> bool {
    el.visible && !el.locked && !el.is_line()
}

/// Find the anchor of a visible, unlocked, non-line element nearest to `p`
/// and no farther than `radius`. `exclude` skips one element by id.
#[must_use]
pub fn find_snap_anchor(
    elements: &ElementStore,
    measure: &dyn Measure,
    p: Point,
    radius: f64,
    exclude: Option<&str>,
) -> Option<SnapTarget> {
    let mut best: Option<(f64, SnapTarget)> = None;
    for el in elements.as_slice().iter().filter(|el| snappable(el) && Some(el.id.as_str()) != exclude) {
        for (anchor, point) in Anchor::ALL.into_iter().zip(anchor_points(el, measure)) {
            let dist = p.distance(point);
            if dist > radius || best.as_ref().is_some_and(|(d, _)| dist >= *d) {
                continue;
            }
            best = Some((dist, SnapTarget { id: el.id.clone(), anchor, point }));
        }
    }
    best.map(|(_, target)| target)
}

/// Ids of visible elements whose bounds, grown by the marquee margin,
/// intersect `rect`. Paint order is preserved.
#[must_use]
pub fn select_in_rect(elements: &ElementStore, measure: &dyn Measure, rect: &Bounds) -> Vec<ElementId> {
    elements
        .as_slice()
        .iter()
        .filter(|el| el.visible)
        .filter(|el| element_bounds(el, measure).is_some_and(|b| b.inflate(MARQUEE_MARGIN).intersects(rect)))
        .map(|el| el.id.clone())
        .collect()
}

/// Topmost visible element whose bounds contain `p`.
#[must_use]
pub fn element_at(elements: &ElementStore, measure: &dyn Measure, p: Point) -> Option<ElementId> {
    elements
        .as_slice()
        .iter()
        .rev()
        .find(|el| el.visible && element_bounds(el, measure).is_some_and(|b| b.contains(p)))
        .map(|el| el.id.clone())
}

/// Union of the bounds of the given ids; `None` when none resolve.
#[must_use]
pub fn selection_bounds(elements: &ElementStore, measure: &dyn Measure, ids: &[ElementId]) -> Option<Bounds> {
    ids.iter()
        .filter_map(|id| elements.get(id))
        .filter(|el| el.visible)
        .filter_map(|el| element_bounds(el, measure))
        .reduce(|acc, b| acc.union(&b))
}
