//! Pointer gestures over the engine: dragging the selection, eight-handle
//! resize, connector endpoint drags, and whole-line moves.
//!
//! A gesture starts with a `begin_*` call, which commits one undo snapshot,
//! so the whole gesture undoes as a single step. Pointer samples are rounded
//! to the configured grid. Drag and resize samples are coalesced: the host
//! calls [`GestureController::frame`] once per animation frame when
//! [`GestureController::pointer_move`] asks for one, and only the latest
//! sample is applied. Endpoint drags and line moves apply immediately.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use tracing::debug;

use crate::consts::{MIN_FONT_SIZE, MIN_RESIZE_EXTENT};
use crate::doc::{Element, ElementId, Line, Shape};
use crate::engine::{Engine, MutateOptions};
use crate::geometry::{Bounds, Point};
use crate::hit::ResizeAnchor;
use crate::refs::{LineEnd, attach_endpoint};
use crate::transform::Transform;

/// The gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    /// No active gesture.
    #[default]
    Idle,
    /// Moving the selection.
    Dragging {
        /// Elements moved by this drag.
        ids: Vec<ElementId>,
        /// Latest pointer sample.
        last: Point,
        /// Pointer position already applied to the scene.
        applied: Point,
    },
    /// Resizing one element by a handle.
    Resizing {
        /// Element being resized.
        id: ElementId,
        /// Handle grabbed.
        handle: ResizeAnchor,
        /// Pointer position at gesture start.
        start: Point,
        /// Latest pointer sample.
        pointer: Point,
        /// The element as it was when the gesture started.
        snapshot: Element,
        /// Box of `snapshot` at gesture start.
        bbox: Bounds,
    },
    /// Dragging one end of a connector.
    DraggingEndpoint {
        /// Line being edited.
        id: ElementId,
        /// Which end is held.
        end: LineEnd,
    },
    /// Moving a whole connector.
    MovingLine {
        /// Line being moved.
        id: ElementId,
        /// Pointer position at gesture start.
        start: Point,
        /// The line as it was when the gesture started.
        original: Line,
    },
}

/// Drives one gesture at a time against an [`Engine`].
#[derive(Debug, Default)]
pub struct GestureController {
    state: GestureState,
    frame_requested: bool,
    snap_indicator: Option<Point>,
}

impl GestureController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// Anchor the held endpoint is currently snapped to, if any.
    #[must_use]
    pub fn snap_indicator(&self) -> Option<Point> {
        self.snap_indicator
    }

    /// Start moving the selection: every id in `selected_ids`, or the
    /// focused element when the set is empty. Returns `false` when nothing
    /// is selected.
    pub fn begin_drag(&mut self, engine: &mut Engine, pointer: Point) -> bool {
        let ids: Vec<ElementId> = if engine.selected_ids().is_empty() {
            engine.selected_id().map(str::to_owned).into_iter().collect()
        } else {
            engine.selected_ids().to_vec()
        };
        if ids.is_empty() {
            return false;
        }
        engine.commit_snapshot();
        let p = snap_point(engine, pointer);
        debug!(count = ids.len(), "drag started");
        self.start(GestureState::Dragging { ids, last: p, applied: p });
        true
    }

    /// Start resizing `id` by `handle`. Returns `false` for unknown ids.
    pub fn begin_resize(&mut self, engine: &mut Engine, id: &str, handle: ResizeAnchor, pointer: Point) -> bool {
        let Some(snapshot) = engine.element(id).cloned() else {
            return false;
        };
        let bbox = match snapshot.as_line() {
            Some(line) => Bounds::from_corners(line.start(), line.end()),
            None => match engine.bounds(id) {
                Some(b) => b,
                None => return false,
            },
        };
        engine.commit_snapshot();
        let p = snap_point(engine, pointer);
        debug!(id, ?handle, "resize started");
        self.start(GestureState::Resizing { id: id.to_owned(), handle, start: p, pointer: p, snapshot, bbox });
        true
    }

    /// Start dragging one end of the line `id`. Returns `false` when `id` is
    /// not a line.
    pub fn begin_endpoint_drag(&mut self, engine: &mut Engine, id: &str, end: LineEnd) -> bool {
        if !engine.element(id).is_some_and(Element::is_line) {
            return false;
        }
        engine.commit_snapshot();
        debug!(id, ?end, "endpoint drag started");
        self.start(GestureState::DraggingEndpoint { id: id.to_owned(), end });
        true
    }

    /// Start moving the whole line `id`. Returns `false` when `id` is not a
    /// line.
    pub fn begin_line_move(&mut self, engine: &mut Engine, id: &str, pointer: Point) -> bool {
        let Some(original) = engine.element(id).and_then(Element::as_line).cloned() else {
            return false;
        };
        engine.commit_snapshot();
        let start = snap_point(engine, pointer);
        debug!(id, "line move started");
        self.start(GestureState::MovingLine { id: id.to_owned(), start, original });
        true
    }

    fn start(&mut self, state: GestureState) {
        self.state = state;
        self.frame_requested = false;
        self.snap_indicator = None;
    }

    /// Feed a pointer sample. Returns `true` when the host should schedule
    /// a [`frame`](Self::frame); repeated samples before that frame only
    /// replace the pending one.
    pub fn pointer_move(&mut self, engine: &mut Engine, pointer: Point) -> bool {
        let p = snap_point(engine, pointer);
        match &mut self.state {
            GestureState::Idle => false,
            GestureState::Dragging { last, .. } => {
                *last = p;
                self.request_frame()
            }
            GestureState::Resizing { pointer, .. } => {
                *pointer = p;
                self.request_frame()
            }
            GestureState::DraggingEndpoint { id, end } => {
                let (id, end) = (id.clone(), *end);
                self.drag_endpoint(engine, &id, end, p);
                false
            }
            GestureState::MovingLine { id, start, original } => {
                let (dx, dy) = (p.x - start.x, p.y - start.y);
                let mut moved = original.clone();
                moved.x1 += dx;
                moved.y1 += dy;
                moved.x2 += dx;
                moved.y2 += dy;
                moved.start_ref = None;
                moved.end_ref = None;
                engine.update_element_with(
                    id.as_str(),
                    |el| {
                        if let Some(line) = el.as_line_mut() {
                            *line = moved;
                        }
                    },
                    MutateOptions::SILENT,
                );
                false
            }
        }
    }

    fn request_frame(&mut self) -> bool {
        let first = !self.frame_requested;
        self.frame_requested = true;
        first
    }

    fn drag_endpoint(&mut self, engine: &mut Engine, id: &str, end: LineEnd, pointer: Point) {
        let snap = engine.find_snap_anchor(pointer, Some(id));
        let (target, bound) = match snap {
            Some(s) => (s.point, Some(s.id)),
            None => (pointer, None),
        };
        self.snap_indicator = bound.is_some().then_some(target);
        engine.update_element_with(
            id,
            |el| {
                if let Some(line) = el.as_line_mut() {
                    attach_endpoint(line, end, target, bound);
                }
            },
            MutateOptions::SILENT,
        );
    }

    /// Apply the pending drag or resize sample. Returns `true` when the
    /// scene changed.
    pub fn frame(&mut self, engine: &mut Engine) -> bool {
        self.frame_requested = false;
        match &mut self.state {
            GestureState::Dragging { ids, last, applied } => {
                let (dx, dy) = (last.x - applied.x, last.y - applied.y);
                if dx == 0.0 && dy == 0.0 {
                    return false;
                }
                for id in ids.iter() {
                    engine.move_element(id, dx, dy, MutateOptions::SILENT);
                }
                *applied = *last;
                true
            }
            GestureState::Resizing { id, handle, start, pointer, snapshot, bbox } => {
                let delta = Point::new(pointer.x - start.x, pointer.y - start.y);
                let next = resized(engine, snapshot, *bbox, *handle, delta);
                engine.update_element_with(id.as_str(), |el| *el = next, MutateOptions::SILENT)
            }
            _ => false,
        }
    }

    /// Finish the gesture, applying any sample still waiting for a frame.
    pub fn pointer_up(&mut self, engine: &mut Engine) {
        self.flush(engine);
        self.finish("released");
    }

    /// Lost pointer capture. Ends the gesture the same way as a release;
    /// there is no rollback other than [`Engine::undo`].
    pub fn pointer_cancel(&mut self, engine: &mut Engine) {
        self.flush(engine);
        self.finish("cancelled");
    }

    fn flush(&mut self, engine: &mut Engine) {
        if self.frame_requested {
            self.frame(engine);
        }
    }

    fn finish(&mut self, outcome: &'static str) {
        if !self.is_idle() {
            debug!(outcome, "gesture ended");
        }
        self.state = GestureState::Idle;
        self.frame_requested = false;
        self.snap_indicator = None;
    }
}

fn snap_point(engine: &Engine, p: Point) -> Point {
    let config = engine.config();
    Point::new(config.snap_to_grid(p.x), config.snap_to_grid(p.y))
}

/// Box produced by dragging `handle` of `bbox` by `delta`. Each dragged
/// extent is clamped to the minimum resize extent.
#[must_use]
pub fn resize_box(bbox: Bounds, handle: ResizeAnchor, delta: Point) -> Bounds {
    let mut out = bbox;
    if handle.east() {
        out.width = (bbox.width + delta.x).max(MIN_RESIZE_EXTENT);
    }
    if handle.west() {
        out.width = (bbox.width - delta.x).max(MIN_RESIZE_EXTENT);
        out.x = bbox.x + delta.x;
    }
    if handle.south() {
        out.height = (bbox.height + delta.y).max(MIN_RESIZE_EXTENT);
    }
    if handle.north() {
        out.height = (bbox.height - delta.y).max(MIN_RESIZE_EXTENT);
        out.y = bbox.y + delta.y;
    }
    out
}

/// `snapshot` refitted to the box produced by the resize.
fn resized(engine: &Engine, snapshot: &Element, bbox: Bounds, handle: ResizeAnchor, delta: Point) -> Element {
    let snap = |v: f64| engine.config().snap_to_grid(v);
    let b = resize_box(bbox, handle, delta);
    let mut next = snapshot.clone();
    match &mut next.shape {
        Shape::Rect(r) => {
            r.x = snap(b.x);
            r.y = snap(b.y);
            r.width = snap(b.width);
            r.height = snap(b.height);
        }
        Shape::Image(i) => {
            i.x = snap(b.x);
            i.y = snap(b.y);
            i.width = snap(b.width);
            i.height = snap(b.height);
        }
        Shape::Use(u) => {
            u.x = snap(b.x);
            u.y = snap(b.y);
            u.width = Some(snap(b.width));
            u.height = Some(snap(b.height));
        }
        Shape::Ellipse(e) => {
            let c = b.center();
            e.cx = snap(c.x);
            e.cy = snap(c.y);
            e.rx = snap(b.width / 2.0);
            e.ry = snap(b.height / 2.0);
        }
        Shape::Circle(c) => {
            let center = b.center();
            c.cx = snap(center.x);
            c.cy = snap(center.y);
            c.r = snap(b.width.min(b.height) / 2.0);
        }
        Shape::Line(l) => {
            let c = b.center();
            l.x1 = snap(c.x - b.width / 2.0);
            l.x2 = snap(c.x + b.width / 2.0);
            l.y1 = snap(c.y - b.height / 2.0);
            l.y2 = snap(c.y + b.height / 2.0);
            l.start_ref = None;
            l.end_ref = None;
        }
        Shape::Text(t) => {
            let size = b.height.max(MIN_FONT_SIZE);
            t.y = snap(b.y + size);
            t.font_size = Some(snap(size));
        }
        Shape::Path(_) | Shape::Group(_) => {
            // Scale composes with the existing one; translation keeps the
            // local content origin pinned to the new box corner.
            let base = snapshot.transform.unwrap_or_default();
            let rx = b.width / bbox.width.max(1.0);
            let ry = b.height / bbox.height.max(1.0);
            next.transform = Some(Transform {
                x: Some(snap(b.x) - (bbox.x - base.tx()) * rx),
                y: Some(snap(b.y) - (bbox.y - base.ty()) * ry),
                scale_x: Some(base.sx() * rx),
                scale_y: Some(base.sy() * ry),
                ..base
            });
        }
    }
    next
}
