//! Document model → SVG markup. The left inverse of [`crate::parse`].

#[cfg(test)]
#[path = "serialize_test.rs"]
mod serialize_test;

use crate::doc::{Document, Element, Shape, Style, Text};
use crate::transform::serialize_transform;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Export switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Keep hidden elements, marked with `data-visible="false"`.
    pub include_hidden: bool,
}

/// Shortest decimal form that parses back to the same value.
pub(crate) fn fmt_number(v: f64) -> String {
    if v == 0.0 { "0".to_owned() } else { format!("{v}") }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Attribute accumulator producing ` name="value"` pairs.
#[derive(Default)]
struct Attrs(String);

impl Attrs {
    fn text(&mut self, name: &str, value: &str) {
        self.0.push(' ');
        self.0.push_str(name);
        self.0.push_str("=\"");
        self.0.push_str(&escape_attr(value));
        self.0.push('"');
    }

    fn opt_text(&mut self, name: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.text(name, v);
        }
    }

    fn num(&mut self, name: &str, value: f64) {
        self.text(name, &fmt_number(value));
    }

    fn opt_num(&mut self, name: &str, value: Option<f64>) {
        if let Some(v) = value {
            self.num(name, v);
        }
    }

    fn style(&mut self, s: &Style) {
        self.opt_text("fill", s.fill.as_deref());
        self.opt_text("stroke", s.stroke.as_deref());
        self.opt_num("stroke-width", s.stroke_width);
        self.opt_text("stroke-dasharray", s.stroke_dasharray.as_deref());
        self.opt_text("stroke-linecap", s.stroke_linecap.as_deref());
        self.opt_text("stroke-linejoin", s.stroke_linejoin.as_deref());
        self.opt_num("stroke-miterlimit", s.stroke_miterlimit);
        self.opt_text("fill-rule", s.fill_rule.as_deref());
        self.opt_text("marker-start", s.marker_start.as_deref());
        self.opt_text("marker-end", s.marker_end.as_deref());
        self.opt_num("opacity", s.opacity);
        self.opt_text("filter", s.filter.as_deref());
    }
}

/// Markup for one element, or `None` when it is hidden and hidden
/// elements are excluded.
#[must_use]
pub fn element_markup(el: &Element, opts: SerializeOptions) -> Option<String> {
    if !el.visible && !opts.include_hidden {
        return None;
    }

    let mut a = Attrs::default();
    a.text("id", &el.id);
    match &el.shape {
        Shape::Rect(r) => {
            a.num("x", r.x);
            a.num("y", r.y);
            a.num("width", r.width);
            a.num("height", r.height);
            a.opt_num("rx", r.rx);
            a.opt_num("ry", r.ry);
        }
        Shape::Circle(c) => {
            a.num("cx", c.cx);
            a.num("cy", c.cy);
            a.num("r", c.r);
        }
        Shape::Ellipse(e) => {
            a.num("cx", e.cx);
            a.num("cy", e.cy);
            a.num("rx", e.rx);
            a.num("ry", e.ry);
        }
        Shape::Line(l) => {
            a.num("x1", l.x1);
            a.num("y1", l.y1);
            a.num("x2", l.x2);
            a.num("y2", l.y2);
            a.opt_text("data-start-ref", l.start_ref.as_deref());
            a.opt_text("data-end-ref", l.end_ref.as_deref());
        }
        Shape::Path(p) => a.text("d", &p.d),
        Shape::Text(t) => {
            a.num("x", t.x);
            a.num("y", t.y);
            a.opt_num("font-size", t.font_size);
            a.opt_text("font-weight", t.font_weight.as_deref());
            a.opt_text("text-anchor", t.text_anchor.as_deref());
            a.opt_text("dominant-baseline", t.dominant_baseline.as_deref());
        }
        Shape::Image(i) => {
            a.num("x", i.x);
            a.num("y", i.y);
            a.num("width", i.width);
            a.num("height", i.height);
            a.text("href", &i.href);
            a.opt_text("preserveAspectRatio", i.preserve_aspect_ratio.as_deref());
        }
        Shape::Use(u) => {
            a.text("href", &u.href);
            a.num("x", u.x);
            a.num("y", u.y);
            a.opt_num("width", u.width);
            a.opt_num("height", u.height);
        }
        Shape::Group(_) => {}
    }
    a.style(&el.style);
    if let Some(t) = el.transform.as_ref().and_then(serialize_transform) {
        a.text("transform", &t);
    }
    if !el.visible {
        a.text("data-visible", "false");
    }
    if el.locked {
        a.text("data-locked", "true");
    }

    let tag = el.shape.tag();
    let attrs = a.0;
    let markup = match &el.shape {
        Shape::Text(t) => format!("<{tag}{attrs}>{}</{tag}>", text_body(t)),
        Shape::Group(g) => {
            let body: Vec<String> = g.children.iter().filter_map(|c| element_markup(c, opts)).collect();
            format!("<{tag}{attrs}>{}</{tag}>", body.join("\n"))
        }
        _ => format!("<{tag}{attrs}/>"),
    };
    Some(markup)
}

fn text_body(t: &Text) -> String {
    if t.tspans.is_empty() {
        return escape_text(&t.text);
    }
    t.tspans
        .iter()
        .map(|span| {
            let mut a = Attrs::default();
            a.opt_num("x", span.x);
            a.opt_num("y", span.y);
            a.opt_num("dx", span.dx);
            a.opt_num("dy", span.dy);
            format!("<tspan{}>{}</tspan>", a.0, escape_text(&span.text))
        })
        .collect()
}

/// A self-contained `<svg>` document. `defs` is emitted once, ahead of
/// the element bodies.
#[must_use]
pub fn build_svg_markup(doc: &Document, elements: &[Element], defs: Option<&str>, opts: SerializeOptions) -> String {
    let defs = defs.map(str::trim).filter(|d| !d.is_empty());

    let mut root = Attrs::default();
    root.text("xmlns", SVG_NS);
    if defs.is_some_and(|d| d.contains("xlink:")) {
        root.text("xmlns:xlink", XLINK_NS);
    }
    root.num("width", doc.width);
    root.num("height", doc.height);
    root.text("viewBox", &doc.effective_view_box());

    let mut body: Vec<String> = Vec::with_capacity(elements.len() + 1);
    if let Some(d) = defs {
        body.push(format!("<defs>{d}</defs>"));
    }
    body.extend(elements.iter().filter_map(|el| element_markup(el, opts)));

    format!("<svg{}>{}</svg>", root.0, body.join("\n"))
}
