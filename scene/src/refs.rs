//! Reference resolution: connector endpoints bound to element anchors, and
//! the symbol library behind `<use href="#id">`.
//!
//! A bound endpoint must sit on an anchor of its target after every
//! mutation of that target. [`follow_subtree`] restores that by pairing each
//! endpoint with the nearest anchor captured before the mutation and moving
//! it to the same anchor afterwards. Anchors are compared in canvas space, so
//! a line and its target may sit in different groups.

#[cfg(test)]
#[path = "refs_test.rs"]
mod refs_test;

use std::collections::HashMap;

use crate::consts::ANCHOR_EPSILON;
use crate::doc::{Element, ElementId, ElementStore, Line, Shape};
use crate::geometry::{Measure, Point, anchor_points, nearest};
use crate::transform::Affine;

/// Which end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Start,
    End,
}

impl LineEnd {
    #[must_use]
    pub fn point(self, line: &Line) -> Point {
        match self {
            Self::Start => line.start(),
            Self::End => line.end(),
        }
    }

    #[must_use]
    pub fn reference(self, line: &Line) -> Option<&ElementId> {
        match self {
            Self::Start => line.start_ref.as_ref(),
            Self::End => line.end_ref.as_ref(),
        }
    }

    pub fn set_point(self, line: &mut Line, p: Point) {
        match self {
            Self::Start => {
                line.x1 = p.x;
                line.y1 = p.y;
            }
            Self::End => {
                line.x2 = p.x;
                line.y2 = p.y;
            }
        }
    }

    pub fn set_reference(self, line: &mut Line, target: Option<ElementId>) {
        match self {
            Self::Start => line.start_ref = target,
            Self::End => line.end_ref = target,
        }
    }
}

/// Move `end` to `p`, binding it to `target` or clearing the binding.
pub fn attach_endpoint(line: &mut Line, end: LineEnd, p: Point, target: Option<ElementId>) {
    end.set_point(line, p);
    end.set_reference(line, target);
}

/// Where an endpoint goes when its target's anchors change from `before`
/// to `after`. Endpoints on an anchor land exactly on the new anchor;
/// endpoints off-anchor keep their offset from the nearest one.
#[must_use]
pub fn follow_point(p: Point, before: &[Point], after: &[Point]) -> Option<Point> {
    let (idx, dist) = nearest(p, before)?;
    let new_anchor = *after.get(idx)?;
    if dist <= ANCHOR_EPSILON {
        return Some(new_anchor);
    }
    let old_anchor = before[idx];
    Some(Point::new(p.x + new_anchor.x - old_anchor.x, p.y + new_anchor.y - old_anchor.y))
}

/// Re-seat endpoints bound to any element of a mutated subtree, given the
/// canvas-space [`subtree_anchors`] captured before and after. Lines inside
/// the subtree rooted at `root` travel with it and are left alone.
pub fn follow_subtree(
    elements: &mut ElementStore,
    root: &str,
    before: &[(ElementId, Vec<Point>)],
    after: &[(ElementId, Vec<Point>)],
) -> usize {
    let moves: HashMap<&str, (&[Point], &[Point])> = before
        .iter()
        .filter_map(|(id, old)| {
            let (_, new) = after.iter().find(|(other, _)| other == id)?;
            Some((id.as_str(), (old.as_slice(), new.as_slice())))
        })
        .collect();
    let mut moved = 0;
    reseat(elements.as_mut_slice(), Affine::IDENTITY, root, &moves, &mut moved);
    moved
}

type AnchorMoves<'a> = HashMap<&'a str, (&'a [Point], &'a [Point])>;

/// `outer` maps the local space of `list` to the canvas. Endpoints are
/// followed in canvas space and written back in the line's own space.
fn reseat(list: &mut [Element], outer: Affine, skip: &str, moves: &AnchorMoves<'_>, moved: &mut usize) {
    for el in list {
        if el.id == skip {
            continue;
        }
        let space = el.transform.map_or(outer, |t| outer.then(t.to_placement()));
        if let Shape::Group(g) = &mut el.shape {
            reseat(&mut g.children, space, skip, moves, moved);
            continue;
        }
        let Some(line) = el.as_line_mut() else {
            continue;
        };
        let Some(back) = space.inverse() else {
            continue;
        };
        for end in [LineEnd::Start, LineEnd::End] {
            let Some(&(before, after)) = end.reference(line).and_then(|r| moves.get(r.as_str())) else {
                continue;
            };
            if before.is_empty() || after.is_empty() || before == after {
                continue;
            }
            if let Some(p) = follow_point(space.apply(end.point(line)), before, after) {
                end.set_point(line, back.apply(p));
                *moved += 1;
            }
        }
    }
}

/// Anchors of `el` and of every descendant, mapped through `outer`, the
/// placement of `el`'s parent space. Descendant anchors are carried out
/// through each group's transform on the way.
#[must_use]
pub fn subtree_anchors(el: &Element, measure: &dyn Measure, outer: Affine) -> Vec<(ElementId, Vec<Point>)> {
    let own = anchor_points(el, measure).into_iter().map(|p| outer.apply(p)).collect();
    let mut out = vec![(el.id.clone(), own)];
    let inner = el.transform.map_or(outer, |t| outer.then(t.to_placement()));
    for child in el.children() {
        out.extend(subtree_anchors(child, measure, inner));
    }
    out
}

/// Ids of lines with at least one endpoint bound to `target`.
#[must_use]
pub fn lines_bound_to(elements: &ElementStore, target: &str) -> Vec<ElementId> {
    let mut out = Vec::new();
    elements.walk(&mut |el| {
        if let Some(line) = el.as_line() {
            if line.start_ref.as_deref() == Some(target) || line.end_ref.as_deref() == Some(target) {
                out.push(el.id.clone());
            }
        }
    });
    out
}

/// Rewrite line bindings inside a copied subtree: references to copied
/// elements follow the copy, everything else is cleared.
pub fn remap_refs(el: &mut Element, ids: &HashMap<ElementId, ElementId>) {
    el.walk_mut(&mut |node| {
        if let Shape::Line(line) = &mut node.shape {
            line.start_ref = line.start_ref.take().and_then(|r| ids.get(&r).cloned());
            line.end_ref = line.end_ref.take().and_then(|r| ids.get(&r).cloned());
        }
    });
}

// =============================================================
// Symbol library
// =============================================================

/// Registered reusable elements addressed by `#id`.
#[derive(Debug, Clone, Default)]
pub struct SymbolLibrary {
    symbols: HashMap<String, Element>,
}

impl SymbolLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the element behind `id`.
    pub fn register(&mut self, id: impl Into<String>, el: Element) {
        self.symbols.insert(id.into(), el);
    }

    /// Resolve an `href` (`#id` or bare `id`). `None` on a miss.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<&Element> {
        let key = href.trim();
        let key = key.strip_prefix('#').unwrap_or(key);
        self.symbols.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}
