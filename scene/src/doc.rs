//! Document model: canvas properties, the element union, sparse element
//! patches, and the owned element tree.
//!
//! Elements form a forest. A `Group` owns its children by value, so every
//! element lives in exactly one container (the top-level list or one group).
//! Ids are logical handles used for selection and connector references; they
//! never stand in for ownership.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::geometry::Point;
use crate::serialize::fmt_number;
use crate::transform::Transform;

/// Logical element identifier.
pub type ElementId = String;

/// Generate a fresh, practically unique element id.
#[must_use]
pub fn fresh_id() -> ElementId {
    let raw = Uuid::new_v4().simple().to_string();
    format!("el-{}", &raw[..12])
}

// =============================================================
// Document
// =============================================================

/// Canvas-level properties of the drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Canvas width in user units.
    pub width: f64,
    /// Canvas height in user units.
    pub height: f64,
    /// Explicit `viewBox`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_box: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl Document {
    /// A document whose `viewBox` tracks its size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, view_box: Some(size_view_box(width, height)) }
    }

    /// The `viewBox` to emit: the explicit one when non-blank, else `0 0 w h`.
    #[must_use]
    pub fn effective_view_box(&self) -> String {
        match self.view_box.as_deref().map(str::trim) {
            Some(vb) if !vb.is_empty() => vb.to_owned(),
            _ => size_view_box(self.width, self.height),
        }
    }

    /// Whether the `viewBox` is unset or still equals `0 0 width height`.
    #[must_use]
    pub fn view_box_tracks_size(&self) -> bool {
        match self.view_box.as_deref() {
            None => true,
            Some(vb) => vb == size_view_box(self.width, self.height),
        }
    }

    /// Apply a sparse update. A size change drags the `viewBox` along while
    /// it still tracks the previous size; an explicit `view_box` in the patch
    /// always wins.
    pub fn apply_patch(&mut self, patch: &DocPatch) {
        let tracks = self.view_box_tracks_size();
        if let Some(w) = patch.width {
            self.width = w;
        }
        if let Some(h) = patch.height {
            self.height = h;
        }
        if let Some(vb) = &patch.view_box {
            self.view_box.clone_from(vb);
        } else if tracks && (patch.width.is_some() || patch.height.is_some()) {
            self.view_box = Some(size_view_box(self.width, self.height));
        }
    }
}

fn size_view_box(width: f64, height: f64) -> String {
    format!("0 0 {} {}", fmt_number(width), fmt_number(height))
}

/// Sparse update for [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// `Some(None)` clears the explicit `viewBox`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_box: Option<Option<String>>,
}

// =============================================================
// Style
// =============================================================

/// Presentation attributes shared by every element variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_linecap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_linejoin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_miterlimit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

// =============================================================
// Shapes
// =============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ry: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

/// Connector segment. `start_ref` / `end_ref` bind an endpoint to the
/// anchor points of another element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ref: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ref: Option<ElementId>,
}

impl Line {
    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[must_use]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub d: String,
}

/// One `<tspan>` line of a text element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tspan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub x: f64,
    pub y: f64,
    /// Full text content; the concatenation of `tspans` when they are present.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_baseline: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tspans: Vec<Tspan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_aspect_ratio: Option<String>,
}

/// `<use>` reference. `href` is opaque (`#id`) and resolved on demand
/// against the symbol library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Use {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub children: Vec<Element>,
}

/// Variant-specific geometry of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rect(Rect),
    Circle(Circle),
    Ellipse(Ellipse),
    Line(Line),
    Path(Path),
    Text(Text),
    Image(Image),
    Use(Use),
    #[serde(rename = "g")]
    Group(Group),
}

impl Shape {
    /// The SVG tag name for this variant.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Ellipse(_) => "ellipse",
            Self::Line(_) => "line",
            Self::Path(_) => "path",
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Use(_) => "use",
            Self::Group(_) => "g",
        }
    }
}

// =============================================================
// Element
// =============================================================

/// One node of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Stable identifier. Empty only on a draft passed to `add_element`.
    #[serde(default)]
    pub id: ElementId,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(flatten)]
    pub style: Style,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

fn default_visible() -> bool {
    true
}

impl Element {
    /// A visible, unlocked, unstyled element with no id yet.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self { id: ElementId::new(), shape, style: Style::default(), visible: true, locked: false, transform: None }
    }

    #[must_use]
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Shape::Rect(Rect { x, y, width, height, rx: None, ry: None }))
    }

    #[must_use]
    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self::new(Shape::Circle(Circle { cx, cy, r }))
    }

    #[must_use]
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self::new(Shape::Ellipse(Ellipse { cx, cy, rx, ry }))
    }

    #[must_use]
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Shape::Line(Line { x1, y1, x2, y2, start_ref: None, end_ref: None }))
    }

    #[must_use]
    pub fn path(d: impl Into<String>) -> Self {
        Self::new(Shape::Path(Path { d: d.into() }))
    }

    #[must_use]
    pub fn text(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self::new(Shape::Text(Text {
            x,
            y,
            text: text.into(),
            font_size: None,
            font_weight: None,
            text_anchor: None,
            dominant_baseline: None,
            tspans: Vec::new(),
        }))
    }

    #[must_use]
    pub fn image(x: f64, y: f64, width: f64, height: f64, href: impl Into<String>) -> Self {
        Self::new(Shape::Image(Image { x, y, width, height, href: href.into(), preserve_aspect_ratio: None }))
    }

    #[must_use]
    pub fn use_ref(x: f64, y: f64, href: impl Into<String>) -> Self {
        Self::new(Shape::Use(Use { x, y, width: None, height: None, href: href.into() }))
    }

    #[must_use]
    pub fn group(children: Vec<Element>) -> Self {
        Self::new(Shape::Group(Group { children }))
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn is_line(&self) -> bool {
        matches!(self.shape, Shape::Line(_))
    }

    #[must_use]
    pub fn as_line(&self) -> Option<&Line> {
        match &self.shape {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_line_mut(&mut self) -> Option<&mut Line> {
        match &mut self.shape {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Element] {
        match &self.shape {
            Shape::Group(g) => &g.children,
            _ => &[],
        }
    }

    /// The variant's positional handle: `x/y`, `cx/cy`, or the transform
    /// translation for `path` and `g`. Lines have none.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match &self.shape {
            Shape::Rect(r) => Some(Point::new(r.x, r.y)),
            Shape::Circle(c) => Some(Point::new(c.cx, c.cy)),
            Shape::Ellipse(e) => Some(Point::new(e.cx, e.cy)),
            Shape::Text(t) => Some(Point::new(t.x, t.y)),
            Shape::Image(i) => Some(Point::new(i.x, i.y)),
            Shape::Use(u) => Some(Point::new(u.x, u.y)),
            Shape::Path(_) | Shape::Group(_) => {
                let t = self.transform.unwrap_or_default();
                Some(Point::new(t.tx(), t.ty()))
            }
            Shape::Line(_) => None,
        }
    }

    /// Shift the element by `(dx, dy)` in its own coordinate space.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.shape {
            Shape::Rect(r) => {
                r.x += dx;
                r.y += dy;
            }
            Shape::Circle(c) => {
                c.cx += dx;
                c.cy += dy;
            }
            Shape::Ellipse(e) => {
                e.cx += dx;
                e.cy += dy;
            }
            Shape::Line(l) => {
                l.x1 += dx;
                l.y1 += dy;
                l.x2 += dx;
                l.y2 += dy;
            }
            Shape::Text(t) => {
                t.x += dx;
                t.y += dy;
                for span in &mut t.tspans {
                    span.x = span.x.map(|x| x + dx);
                    span.y = span.y.map(|y| y + dy);
                }
            }
            Shape::Image(i) => {
                i.x += dx;
                i.y += dy;
            }
            Shape::Use(u) => {
                u.x += dx;
                u.y += dy;
            }
            Shape::Path(_) | Shape::Group(_) => {
                self.transform = Some(self.transform.unwrap_or_default().translated(dx, dy));
            }
        }
    }

    /// Number of elements in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(Element::subtree_len).sum::<usize>()
    }

    /// Visit this element and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Mutable variant of [`Element::walk`].
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        if let Shape::Group(g) = &mut self.shape {
            for child in &mut g.children {
                child.walk_mut(f);
            }
        }
    }
}

// =============================================================
// ElementPatch
// =============================================================

/// Sparse update for an element. Only present fields are applied, and only
/// to variants that carry them; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ry: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    /// `Some(None)` detaches the start endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ref: Option<Option<ElementId>>,
    /// `Some(None)` detaches the end endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ref: Option<Option<ElementId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// Replaces the text content and drops any tspans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// `Some(None)` removes the transform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Option<Transform>>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if let Some(v) = value {
        *slot = Some(v);
    }
}

impl ElementPatch {
    /// Apply the patch in place.
    pub fn apply(&self, el: &mut Element) {
        set_opt(&mut el.style.fill, self.fill.clone());
        set_opt(&mut el.style.stroke, self.stroke.clone());
        set_opt(&mut el.style.stroke_width, self.stroke_width);
        set_opt(&mut el.style.stroke_dasharray, self.stroke_dasharray.clone());
        set_opt(&mut el.style.opacity, self.opacity);
        set(&mut el.visible, self.visible);
        set(&mut el.locked, self.locked);
        if let Some(t) = self.transform {
            el.transform = t;
        }

        match &mut el.shape {
            Shape::Rect(r) => {
                set(&mut r.x, self.x);
                set(&mut r.y, self.y);
                set(&mut r.width, self.width);
                set(&mut r.height, self.height);
                set_opt(&mut r.rx, self.rx);
                set_opt(&mut r.ry, self.ry);
            }
            Shape::Circle(c) => {
                set(&mut c.cx, self.cx);
                set(&mut c.cy, self.cy);
                set(&mut c.r, self.r);
            }
            Shape::Ellipse(e) => {
                set(&mut e.cx, self.cx);
                set(&mut e.cy, self.cy);
                set(&mut e.rx, self.rx);
                set(&mut e.ry, self.ry);
            }
            Shape::Line(l) => {
                set(&mut l.x1, self.x1);
                set(&mut l.y1, self.y1);
                set(&mut l.x2, self.x2);
                set(&mut l.y2, self.y2);
                set(&mut l.start_ref, self.start_ref.clone());
                set(&mut l.end_ref, self.end_ref.clone());
            }
            Shape::Path(p) => set(&mut p.d, self.d.clone()),
            Shape::Text(t) => {
                set(&mut t.x, self.x);
                set(&mut t.y, self.y);
                set_opt(&mut t.font_size, self.font_size);
                if let Some(text) = &self.text {
                    t.text.clone_from(text);
                    t.tspans.clear();
                }
            }
            Shape::Image(i) => {
                set(&mut i.x, self.x);
                set(&mut i.y, self.y);
                set(&mut i.width, self.width);
                set(&mut i.height, self.height);
                set(&mut i.href, self.href.clone());
            }
            Shape::Use(u) => {
                set(&mut u.x, self.x);
                set(&mut u.y, self.y);
                set_opt(&mut u.width, self.width);
                set_opt(&mut u.height, self.height);
                set(&mut u.href, self.href.clone());
            }
            Shape::Group(_) => {}
        }
    }
}

// =============================================================
// ElementStore
// =============================================================

/// Owned element forest in paint order (first is bottom-most).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl From<Vec<Element>> for ElementStore {
    fn from(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

impl ElementStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level elements.
    #[must_use]
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Element> {
        self.elements
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// Number of top-level elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append to the top-level list.
    pub fn push(&mut self, el: Element) {
        self.elements.push(el);
    }

    /// Find an element anywhere in the forest.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        find_in(&self.elements, id)
    }

    /// Mutable lookup anywhere in the forest.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        find_in_mut(&mut self.elements, id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove an element (and its subtree) from whichever container holds it.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        remove_in(&mut self.elements, id)
    }

    /// The container (top-level list or group children) holding `id`.
    pub fn container_of_mut(&mut self, id: &str) -> Option<&mut Vec<Element>> {
        container_in(&mut self.elements, id)
    }

    /// Chain of ancestor groups of `id`, outermost first. `None` when absent.
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Option<Vec<&Element>> {
        let mut chain = Vec::new();
        if ancestors_in(&self.elements, id, &mut chain) { Some(chain) } else { None }
    }

    /// Visit every element, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        for el in &self.elements {
            el.walk(f);
        }
    }

    /// Visit every element mutably, parents first.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        for el in &mut self.elements {
            el.walk_mut(f);
        }
    }

    /// Total number of elements including group descendants.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.elements.iter().map(Element::subtree_len).sum()
    }

    /// Number of `path` elements anywhere in the forest.
    #[must_use]
    pub fn path_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |el| {
            if matches!(el.shape, Shape::Path(_)) {
                count += 1;
            }
        });
        count
    }
}

fn find_in<'a>(list: &'a [Element], id: &str) -> Option<&'a Element> {
    for el in list {
        if el.id == id {
            return Some(el);
        }
        if let Some(found) = find_in(el.children(), id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(list: &'a mut [Element], id: &str) -> Option<&'a mut Element> {
    for el in list.iter_mut() {
        if el.id == id {
            return Some(el);
        }
        if let Shape::Group(g) = &mut el.shape {
            if let Some(found) = find_in_mut(&mut g.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_in(list: &mut Vec<Element>, id: &str) -> Option<Element> {
    if let Some(idx) = list.iter().position(|el| el.id == id) {
        return Some(list.remove(idx));
    }
    for el in list.iter_mut() {
        if let Shape::Group(g) = &mut el.shape {
            if let Some(removed) = remove_in(&mut g.children, id) {
                return Some(removed);
            }
        }
    }
    None
}

fn container_in<'a>(list: &'a mut Vec<Element>, id: &str) -> Option<&'a mut Vec<Element>> {
    if list.iter().any(|el| el.id == id) {
        return Some(list);
    }
    for el in list.iter_mut() {
        if let Shape::Group(g) = &mut el.shape {
            if let Some(found) = container_in(&mut g.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn ancestors_in<'a>(list: &'a [Element], id: &str, chain: &mut Vec<&'a Element>) -> bool {
    for el in list {
        if el.id == id {
            return true;
        }
        if let Shape::Group(g) = &el.shape {
            chain.push(el);
            if ancestors_in(&g.children, id, chain) {
                return true;
            }
            chain.pop();
        }
    }
    false
}
