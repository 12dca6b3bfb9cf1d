//! Layout helpers built on the engine's mutation API: canvas alignment,
//! horizontal distribution, auto-connecting, and style copying.
//!
//! Each helper is one undo step. It commits a single snapshot up front and
//! applies its individual edits silently.

#[cfg(test)]
#[path = "arrange_test.rs"]
mod arrange_test;

use std::cmp::Ordering;

use tracing::debug;

use crate::consts::ALIGN_PADDING;
use crate::doc::{Element, ElementId, Style, fresh_id};
use crate::engine::{Engine, MutateOptions};
use crate::geometry::{Bounds, element_bounds};

const CONNECTOR_STROKE: &str = "#0f172a";
const CONNECTOR_STROKE_WIDTH: f64 = 1.6;

/// Canvas edge or centre line to align against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignEdge {
    Left,
    HorizontalCenter,
    Right,
    Top,
    VerticalCenter,
    Bottom,
}

impl Engine {
    /// Box used for alignment: the endpoint box for lines, bounds otherwise.
    fn align_box(&self, el: &Element) -> Option<Bounds> {
        match el.as_line() {
            Some(line) => Some(Bounds::from_corners(line.start(), line.end())),
            None => element_bounds(el, self.measure()),
        }
    }

    /// Move `id` so its box sits against `edge` of the canvas, inset by the
    /// align padding. Returns `false` when `id` is unknown or has no box.
    pub fn align(&mut self, id: &str, edge: AlignEdge) -> bool {
        let Some(b) = self.element(id).and_then(|el| self.align_box(el)) else {
            return false;
        };
        let (w, h) = (self.doc().width, self.doc().height);
        let (dx, dy) = match edge {
            AlignEdge::Left => (ALIGN_PADDING - b.x, 0.0),
            AlignEdge::HorizontalCenter => ((w - b.width) / 2.0 - b.x, 0.0),
            AlignEdge::Right => (w - ALIGN_PADDING - b.width - b.x, 0.0),
            AlignEdge::Top => (0.0, ALIGN_PADDING - b.y),
            AlignEdge::VerticalCenter => (0.0, (h - b.height) / 2.0 - b.y),
            AlignEdge::Bottom => (0.0, h - ALIGN_PADDING - b.height - b.y),
        };
        self.move_element(id, dx, dy, MutateOptions::RECORD)
    }

    /// Visible elements among `ids` with their bounds, in `ids` order.
    fn visible_with_bounds(&self, ids: &[ElementId]) -> Vec<(ElementId, Bounds)> {
        ids.iter()
            .filter_map(|id| self.element(id))
            .filter(|el| el.visible)
            .filter_map(|el| Some((el.id.clone(), element_bounds(el, self.measure())?)))
            .collect()
    }

    /// Space three or more visible elements so their left edges are evenly
    /// spread between the leftmost and the rightmost. Returns `false` when
    /// fewer than three qualify.
    pub fn distribute_horizontally(&mut self, ids: &[ElementId]) -> bool {
        let mut items = self.visible_with_bounds(ids);
        if items.len() < 3 {
            return false;
        }
        items.sort_by(|a, b| a.1.x.partial_cmp(&b.1.x).unwrap_or(Ordering::Equal));
        let first = items[0].1.x;
        let last = items[items.len() - 1].1.x;
        #[allow(clippy::cast_precision_loss)]
        let gap = (last - first) / (items.len() - 1) as f64;

        self.commit_snapshot();
        for (i, (id, b)) in items.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let target = first + gap * i as f64;
            self.move_element(id, target - b.x, 0.0, MutateOptions::SILENT);
        }
        debug!(count = items.len(), gap, "distributed horizontally");
        true
    }

    /// Chain two or more visible elements, ordered left to right by centre,
    /// with connector lines bound centre to centre. Returns the new line ids.
    pub fn auto_connect(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut items = self.visible_with_bounds(ids);
        if items.len() < 2 {
            return Vec::new();
        }
        items.sort_by(|a, b| a.1.center().x.partial_cmp(&b.1.center().x).unwrap_or(Ordering::Equal));

        self.commit_snapshot();
        let mut created = Vec::with_capacity(items.len() - 1);
        for pair in items.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let (a, b) = (from.1.center(), to.1.center());
            let mut line = Element::line(a.x, a.y, b.x, b.y).with_id(fresh_id());
            if let Some(l) = line.as_line_mut() {
                l.start_ref = Some(from.0.clone());
                l.end_ref = Some(to.0.clone());
            }
            line.style.stroke = Some(CONNECTOR_STROKE.to_owned());
            line.style.stroke_width = Some(CONNECTOR_STROKE_WIDTH);
            created.push(line.id.clone());
            self.elements.push(line);
        }
        debug!(lines = created.len(), "auto-connected elements");
        created
    }

    /// Copy fill, stroke, stroke width, and opacity from the first listed
    /// element onto the rest. Returns how many elements were restyled.
    pub fn copy_style_from_first(&mut self, ids: &[ElementId]) -> usize {
        let [first, rest @ ..] = ids else {
            return 0;
        };
        if rest.is_empty() {
            return 0;
        }
        let Some(base) = self.element(first).map(|el| el.style.clone()) else {
            return 0;
        };

        self.commit_snapshot();
        let mut restyled = 0;
        for id in rest {
            if self.update_element_with(id, |el| copy_paint(&mut el.style, &base), MutateOptions::SILENT) {
                restyled += 1;
            }
        }
        restyled
    }
}

fn copy_paint(style: &mut Style, base: &Style) {
    style.fill.clone_from(&base.fill);
    style.stroke.clone_from(&base.stroke);
    style.stroke_width = base.stroke_width;
    style.opacity = base.opacity;
}
