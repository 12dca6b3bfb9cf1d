//! SVG markup → document model.
//!
//! Input passes through three stages:
//!
//! 1. **Decode**: `data:image/svg+xml[;base64],` URIs are unwrapped.
//! 2. **Sanitize**: a tag scanner escapes bare `&`, drops duplicate
//!    attributes (first wins), and declares `xlink` when it is used but
//!    missing. Real-world exports trip strict XML parsers on all three.
//! 3. **Walk**: `roxmltree` parses the result and the element tree is
//!    walked into [`Element`]s. Non-renderable containers are skipped and
//!    their raw markup is kept as the opaque `defs` string.

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;

use std::collections::HashSet;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use roxmltree::Node;
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::doc::{
    Circle, Document, Element, ElementId, Ellipse, Group, Image, Line, Path, Rect, Shape, Style, Text, Tspan, Use,
    fresh_id,
};
use crate::serialize::fmt_number;
use crate::transform::parse_transform;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Tags excluded from the element forest. Their markup is preserved in `defs`.
const NON_RENDERABLE: &[&str] =
    &["defs", "symbol", "marker", "pattern", "mask", "clippath", "style", "script", "title", "desc", "metadata"];

/// Paint servers and filters that are preserved when found outside `<defs>`.
const FREE_DEFINITIONS: &[&str] = &["lineargradient", "radialgradient", "filter"];

/// Why markup was rejected.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input does not contain an <svg> element")]
    NotSvg,
    #[error("data URI payload could not be decoded: {0}")]
    Decode(String),
    #[error("xml syntax error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("document has no <svg> root")]
    MissingSvgRoot,
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSvg {
    pub doc: Document,
    pub elements: Vec<Element>,
    /// Opaque definition markup, `None` when there is none.
    pub defs: Option<String>,
}

/// Parse raw SVG text or an SVG data URI.
///
/// # Errors
///
/// Returns [`ParseError`] when the input has no `<svg` element, the data URI
/// payload cannot be decoded, or the sanitized text is not well-formed XML.
pub fn parse_svg(input: &str) -> Result<ParsedSvg, ParseError> {
    let text = decode_input(input)?;
    if !text.contains("<svg") {
        return Err(ParseError::NotSvg);
    }
    let clean = sanitize(&text);

    let opts = roxmltree::ParsingOptions { allow_dtd: true, ..roxmltree::ParsingOptions::default() };
    let xml = roxmltree::Document::parse_with_options(&clean, opts)?;
    let svg = xml.descendants().find(|n| n.has_tag_name("svg")).ok_or(ParseError::MissingSvgRoot)?;

    let doc = read_document(svg);
    let mut walker = Walker { source: &clean, defs: Vec::new(), seen: HashSet::new() };
    let mut elements = Vec::new();
    walker.walk_children(svg, &mut elements);

    let defs = walker.defs.join("\n").trim().to_owned();
    let defs = if defs.is_empty() { None } else { Some(defs) };

    debug!(elements = elements.len(), width = doc.width, height = doc.height, "parsed svg markup");
    Ok(ParsedSvg { doc, elements, defs })
}

// =============================================================
// Numbers
// =============================================================

/// Lenient number parse: the longest numeric prefix after leading
/// whitespace (`"12px"` → 12). Non-finite results are rejected.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    match s[..i].parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

// =============================================================
// Decode
// =============================================================

fn decode_input(input: &str) -> Result<String, ParseError> {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("data:image/svg+xml") else {
        return Ok(trimmed.to_owned());
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Ok(trimmed.to_owned());
    };
    if header.ends_with(";base64") {
        let bytes = STANDARD.decode(payload.trim()).map_err(|e| ParseError::Decode(e.to_string()))?;
        return String::from_utf8(bytes).map_err(|e| ParseError::Decode(e.to_string()));
    }
    Ok(percent_decode(payload).unwrap_or_else(|| trimmed.to_owned()))
}

/// `%XX` decoding; `None` on a malformed escape or invalid UTF-8.
fn percent_decode(raw: &str) -> Option<String> {
    let b = raw.as_bytes();
    let mut out = Vec::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        if b[i] == b'%' {
            let hex = raw.get(i + 1..i + 3)?;
            let Ok(byte) = u8::from_str_radix(hex, 16) else {
                return None;
            };
            out.push(byte);
            i += 3;
        } else {
            out.push(b[i]);
            i += 1;
        }
    }
    match String::from_utf8(out) {
        Ok(text) => Some(text),
        Err(_) => None,
    }
}

// =============================================================
// Sanitize
// =============================================================

/// Make commonly malformed SVG palatable to a strict XML parser.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut i = 0;
    let b = text.as_bytes();

    while i < b.len() {
        let rest = &text[i..];
        if rest.starts_with("<!--") {
            i += copy_until(rest, "-->", &mut out);
        } else if rest.starts_with("<![CDATA[") {
            i += copy_until(rest, "]]>", &mut out);
        } else if rest.starts_with("<?") {
            i += copy_until(rest, "?>", &mut out);
        } else if rest.starts_with("<!") {
            let close = if rest.find('[').is_some_and(|o| rest.find('>').is_some_and(|c| o < c)) { "]>" } else { ">" };
            i += copy_until(rest, close, &mut out);
        } else if rest.starts_with("</") {
            i += copy_until(rest, ">", &mut out);
        } else if rest.starts_with('<') && b.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            i += sanitize_start_tag(rest, &mut out);
        } else if rest.starts_with('<') {
            out.push_str("&lt;");
            i += 1;
        } else if rest.starts_with('&') {
            push_ampersand(rest, &mut out);
            i += 1;
        } else {
            let first = rest.chars().next().map_or(1, char::len_utf8);
            let next = rest[first..].find(['<', '&']).map_or(rest.len(), |n| n + first);
            out.push_str(&rest[..next]);
            i += next;
        }
    }

    declare_xlink(out)
}

/// Copy `rest` up to and including `terminator` (or to the end). Returns bytes consumed.
fn copy_until(rest: &str, terminator: &str, out: &mut String) -> usize {
    let end = rest.find(terminator).map_or(rest.len(), |p| p + terminator.len());
    out.push_str(&rest[..end]);
    end
}

fn push_ampersand(rest: &str, out: &mut String) {
    if is_entity(rest) {
        out.push('&');
    } else {
        out.push_str("&amp;");
    }
}

/// Whether `rest` (starting at `&`) opens an entity reference XML accepts
/// without a DTD.
fn is_entity(rest: &str) -> bool {
    let Some(semi) = rest[1..].find(';') else {
        return false;
    };
    let name = &rest[1..=semi];
    if let Some(num) = name.strip_prefix('#') {
        if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            return !hex.is_empty() && hex.bytes().all(|c| c.is_ascii_hexdigit());
        }
        return !num.is_empty() && num.bytes().all(|c| c.is_ascii_digit());
    }
    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
}

/// Rewrite one start tag. Returns bytes consumed.
fn sanitize_start_tag(tag: &str, out: &mut String) -> usize {
    let b = tag.as_bytes();
    let mut i = 1;
    while i < b.len() && !b[i].is_ascii_whitespace() && b[i] != b'>' && b[i] != b'/' {
        i += 1;
    }
    out.push_str(&tag[..i]);

    let mut seen: Vec<&str> = Vec::new();
    loop {
        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= b.len() {
            return i;
        }
        if b[i] == b'>' {
            out.push('>');
            return i + 1;
        }
        if b[i] == b'/' {
            out.push('/');
            i += 1;
            continue;
        }

        let name_start = i;
        while i < b.len() && !b[i].is_ascii_whitespace() && !matches!(b[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let name = &tag[name_start..i];

        let mut j = i;
        while j < b.len() && b[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = "";
        let mut quote = '"';
        if j < b.len() && b[j] == b'=' {
            j += 1;
            while j < b.len() && b[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < b.len() && (b[j] == b'"' || b[j] == b'\'') {
                quote = char::from(b[j]);
                let start = j + 1;
                let len = tag[start..].find(quote).unwrap_or(tag.len() - start);
                value = &tag[start..start + len];
                j = (start + len + 1).min(tag.len());
            } else {
                let start = j;
                while j < b.len() && !b[j].is_ascii_whitespace() && b[j] != b'>' {
                    j += 1;
                }
                value = &tag[start..j];
            }
            i = j;
        }

        if name.is_empty() || seen.contains(&name) {
            continue;
        }
        seen.push(name);
        out.push(' ');
        out.push_str(name);
        out.push('=');
        out.push(quote);
        push_attr_value(value, quote, out);
        out.push(quote);
    }
}

fn push_attr_value(value: &str, quote: char, out: &mut String) {
    for (idx, c) in value.char_indices() {
        match c {
            '&' => push_ampersand(&value[idx..], out),
            '<' => out.push_str("&lt;"),
            c if c == quote => out.push_str(if quote == '"' { "&quot;" } else { "&apos;" }),
            c => out.push(c),
        }
    }
}

/// Add `xmlns:xlink` to the first `<svg>` tag when `xlink:` is used but undeclared.
fn declare_xlink(text: String) -> String {
    if !text.contains("xlink:") || text.contains("xmlns:xlink") {
        return text;
    }
    let Some(pos) = find_svg_open(&text) else {
        return text;
    };
    let at = pos + "<svg".len();
    let mut out = String::with_capacity(text.len() + 48);
    out.push_str(&text[..at]);
    out.push_str(" xmlns:xlink=\"");
    out.push_str(XLINK_NS);
    out.push('"');
    out.push_str(&text[at..]);
    out
}

fn find_svg_open(text: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = text[from..].find("<svg") {
        let pos = from + rel;
        let next = text.as_bytes().get(pos + 4).copied();
        if next.is_none_or(|c| c.is_ascii_whitespace() || c == b'>' || c == b'/') {
            return Some(pos);
        }
        from = pos + 4;
    }
    None
}

// =============================================================
// Document
// =============================================================

fn read_document(svg: Node<'_, '_>) -> Document {
    let view_box = svg.attribute("viewBox").map(str::trim).filter(|v| !v.is_empty());
    let vb: Vec<f64> =
        view_box.unwrap_or_default().split([' ', ',', '\t', '\n', '\r']).filter_map(parse_number).collect();

    let width = svg
        .attribute("width")
        .and_then(parse_number)
        .or_else(|| vb.get(2).copied())
        .filter(|w| *w != 0.0)
        .unwrap_or(DEFAULT_CANVAS_WIDTH);
    let height = svg
        .attribute("height")
        .and_then(parse_number)
        .or_else(|| vb.get(3).copied())
        .filter(|h| *h != 0.0)
        .unwrap_or(DEFAULT_CANVAS_HEIGHT);

    let view_box = view_box.map_or_else(
        || format!("0 0 {} {}", fmt_number(width), fmt_number(height)),
        str::to_owned,
    );
    Document { width, height, view_box: Some(view_box) }
}

// =============================================================
// Walk
// =============================================================

struct Walker<'s> {
    source: &'s str,
    defs: Vec<String>,
    seen: HashSet<ElementId>,
}

impl Walker<'_> {
    fn walk_children(&mut self, parent: Node<'_, '_>, out: &mut Vec<Element>) {
        for node in parent.children().filter(Node::is_element) {
            let tag = node.tag_name().name().to_ascii_lowercase();
            if tag == "defs" {
                self.keep_inner(node);
            } else if NON_RENDERABLE.contains(&tag.as_str()) || FREE_DEFINITIONS.contains(&tag.as_str()) {
                self.keep_outer(node);
            } else if let Some(shape) = self.read_shape(node, &tag) {
                let el = self.finish(node, shape);
                out.push(el);
            } else {
                // Unknown wrapper (`a`, `switch`, nested `svg`): children join this container.
                self.walk_children(node, out);
            }
        }
    }

    fn keep_outer(&mut self, node: Node<'_, '_>) {
        if let Some(raw) = self.source.get(node.range()) {
            self.defs.push(raw.to_owned());
        }
    }

    fn keep_inner(&mut self, node: Node<'_, '_>) {
        let (Some(first), Some(last)) = (node.first_child(), node.last_child()) else {
            return;
        };
        if let Some(raw) = self.source.get(first.range().start..last.range().end) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.defs.push(raw.to_owned());
            }
        }
    }

    fn read_shape(&mut self, node: Node<'_, '_>, tag: &str) -> Option<Shape> {
        let shape = match tag {
            "rect" => Shape::Rect(Rect {
                x: num(node, "x"),
                y: num(node, "y"),
                width: num(node, "width"),
                height: num(node, "height"),
                rx: opt_num(node, "rx"),
                ry: opt_num(node, "ry"),
            }),
            "circle" => Shape::Circle(Circle { cx: num(node, "cx"), cy: num(node, "cy"), r: num(node, "r") }),
            "ellipse" => Shape::Ellipse(Ellipse {
                cx: num(node, "cx"),
                cy: num(node, "cy"),
                rx: num(node, "rx"),
                ry: num(node, "ry"),
            }),
            "line" => Shape::Line(Line {
                x1: num(node, "x1"),
                y1: num(node, "y1"),
                x2: num(node, "x2"),
                y2: num(node, "y2"),
                start_ref: opt_str(node, "data-start-ref"),
                end_ref: opt_str(node, "data-end-ref"),
            }),
            "path" => Shape::Path(Path { d: node.attribute("d").unwrap_or_default().to_owned() }),
            "polyline" | "polygon" => Shape::Path(Path { d: points_to_path(node.attribute("points")?, tag == "polygon") }),
            "text" => Shape::Text(read_text(node)),
            "image" => Shape::Image(Image {
                x: num(node, "x"),
                y: num(node, "y"),
                width: num(node, "width"),
                height: num(node, "height"),
                href: href(node),
                preserve_aspect_ratio: opt_str(node, "preserveAspectRatio"),
            }),
            "use" => Shape::Use(Use {
                x: num(node, "x"),
                y: num(node, "y"),
                width: opt_num(node, "width"),
                height: opt_num(node, "height"),
                href: href(node),
            }),
            "g" => {
                let mut children = Vec::new();
                self.walk_children(node, &mut children);
                Shape::Group(Group { children })
            }
            _ => return None,
        };
        Some(shape)
    }

    fn finish(&mut self, node: Node<'_, '_>, shape: Shape) -> Element {
        let id = match opt_str(node, "id") {
            Some(id) if !self.seen.contains(&id) => id,
            _ => fresh_id(),
        };
        self.seen.insert(id.clone());

        let mut style = read_style(node);
        if matches!(node.tag_name().name(), "polyline" | "polygon") && style.fill.is_none() {
            style.fill = Some("none".to_owned());
        }

        Element {
            id,
            shape,
            style,
            visible: node.attribute("data-visible") != Some("false"),
            locked: node.attribute("data-locked") == Some("true"),
            transform: node.attribute("transform").and_then(parse_transform),
        }
    }
}

fn num(node: Node<'_, '_>, name: &str) -> f64 {
    opt_num(node, name).unwrap_or(0.0)
}

fn opt_num(node: Node<'_, '_>, name: &str) -> Option<f64> {
    node.attribute(name).and_then(parse_number)
}

fn opt_str(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn href(node: Node<'_, '_>) -> String {
    node.attribute("href").or_else(|| node.attribute((XLINK_NS, "href"))).unwrap_or_default().to_owned()
}

fn read_style(node: Node<'_, '_>) -> Style {
    Style {
        fill: opt_str(node, "fill"),
        stroke: opt_str(node, "stroke"),
        stroke_width: opt_num(node, "stroke-width"),
        stroke_dasharray: opt_str(node, "stroke-dasharray"),
        stroke_linecap: opt_str(node, "stroke-linecap"),
        stroke_linejoin: opt_str(node, "stroke-linejoin"),
        stroke_miterlimit: opt_num(node, "stroke-miterlimit"),
        fill_rule: opt_str(node, "fill-rule"),
        marker_start: opt_str(node, "marker-start"),
        marker_end: opt_str(node, "marker-end"),
        opacity: opt_num(node, "opacity"),
        filter: opt_str(node, "filter"),
    }
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants().filter(Node::is_text).filter_map(|n| n.text()).collect()
}

fn read_text(node: Node<'_, '_>) -> Text {
    let tspans: Vec<Tspan> = node
        .children()
        .filter(|n| n.has_tag_name("tspan"))
        .map(|n| Tspan {
            x: opt_num(n, "x"),
            y: opt_num(n, "y"),
            dx: opt_num(n, "dx"),
            dy: opt_num(n, "dy"),
            text: text_content(n),
        })
        .collect();
    let text = if tspans.is_empty() {
        text_content(node)
    } else {
        tspans.iter().map(|t| t.text.as_str()).collect()
    };

    Text {
        x: num(node, "x"),
        y: num(node, "y"),
        text,
        font_size: opt_num(node, "font-size"),
        font_weight: opt_str(node, "font-weight"),
        text_anchor: opt_str(node, "text-anchor"),
        dominant_baseline: opt_str(node, "dominant-baseline"),
        tspans,
    }
}

/// `points` list → `M x y L x y ...` with a trailing `Z` for polygons.
fn points_to_path(points: &str, close: bool) -> String {
    let coords: Vec<&str> = points.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(coords.len() / 2 + 1);
    for pair in coords.chunks_exact(2) {
        if let (Some(x), Some(y)) = (parse_number(pair[0]), parse_number(pair[1])) {
            let cmd = if segments.is_empty() { 'M' } else { 'L' };
            segments.push(format!("{cmd}{} {}", fmt_number(x), fmt_number(y)));
        }
    }
    if close {
        segments.push("Z".to_owned());
    }
    segments.join(" ")
}
