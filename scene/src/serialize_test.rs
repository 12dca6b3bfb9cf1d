#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{Line, Rect, Tspan};
use crate::parse::{ParsedSvg, parse_svg};
use crate::transform::Transform;

fn markup(el: &Element) -> String {
    element_markup(el, SerializeOptions::default()).unwrap()
}

fn reparse(parsed: &ParsedSvg) -> ParsedSvg {
    let out = build_svg_markup(&parsed.doc, &parsed.elements, parsed.defs.as_deref(), SerializeOptions::default());
    parse_svg(&out).unwrap()
}

// =============================================================
// fmt_number
// =============================================================

#[test]
fn fmt_number_shortest_form() {
    assert_eq!(fmt_number(10.0), "10");
    assert_eq!(fmt_number(0.5), "0.5");
    assert_eq!(fmt_number(-2.25), "-2.25");
    assert_eq!(fmt_number(-0.0), "0");
}

// =============================================================
// element_markup
// =============================================================

#[test]
fn rect_markup() {
    let el = Element::rect(0.0, 0.0, 10.0, 20.0).with_id("a");
    assert_eq!(markup(&el), r#"<rect id="a" x="0" y="0" width="10" height="20"/>"#);
}

#[test]
fn style_attributes_emitted_when_present() {
    let mut el = Element::circle(1.0, 2.0, 3.0).with_id("c");
    el.style.fill = Some("red".into());
    el.style.stroke_width = Some(1.5);
    el.style.marker_end = Some("url(#m)".into());
    let out = markup(&el);
    assert!(out.contains(r#"fill="red""#));
    assert!(out.contains(r#"stroke-width="1.5""#));
    assert!(out.contains(r##"marker-end="url(#m)""##));
    assert!(!out.contains("stroke=\""));
}

#[test]
fn line_markup_carries_refs() {
    let mut el = Element::line(0.0, 0.0, 5.0, 5.0).with_id("l");
    if let Some(line) = el.as_line_mut() {
        line.start_ref = Some("a".into());
    }
    let out = markup(&el);
    assert!(out.contains(r#"data-start-ref="a""#));
    assert!(!out.contains("data-end-ref"));
}

#[test]
fn locked_flag_emitted() {
    let mut el = Element::rect(0.0, 0.0, 1.0, 1.0).with_id("a");
    el.locked = true;
    assert!(markup(&el).contains(r#"data-locked="true""#));
}

#[test]
fn transform_attribute_emitted() {
    let el = Element::path("M0 0").with_id("p").with_transform(Transform::translate(3.0, 4.0));
    assert!(markup(&el).contains(r#"transform="translate(3 4)""#));
}

#[test]
fn text_content_is_escaped() {
    let el = Element::text(0.0, 0.0, "a < b & c").with_id("t");
    assert!(markup(&el).contains(">a &lt; b &amp; c</text>"));
}

#[test]
fn attribute_quotes_are_escaped() {
    let el = Element::image(0.0, 0.0, 1.0, 1.0, "say \"hi\".png").with_id("i");
    assert!(markup(&el).contains(r#"href="say &quot;hi&quot;.png""#));
}

#[test]
fn hidden_elements_omitted_by_default() {
    let mut el = Element::rect(0.0, 0.0, 1.0, 1.0).with_id("a");
    el.visible = false;
    assert_eq!(element_markup(&el, SerializeOptions::default()), None);
    let kept = element_markup(&el, SerializeOptions { include_hidden: true }).unwrap();
    assert!(kept.contains(r#"data-visible="false""#));
}

#[test]
fn hidden_group_children_omitted() {
    let mut hidden = Element::rect(0.0, 0.0, 1.0, 1.0).with_id("h");
    hidden.visible = false;
    let g = Element::group(vec![hidden, Element::rect(0.0, 0.0, 1.0, 1.0).with_id("v")]).with_id("g");
    let out = markup(&g);
    assert!(out.contains(r#"id="v""#));
    assert!(!out.contains(r#"id="h""#));
}

// =============================================================
// build_svg_markup
// =============================================================

#[test]
fn document_wrapper_and_defs_first() {
    let doc = Document::new(100.0, 50.0);
    let els = vec![Element::rect(0.0, 0.0, 1.0, 1.0).with_id("a")];
    let out = build_svg_markup(&doc, &els, Some("<marker id=\"m\"/>"), SerializeOptions::default());
    assert!(out.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">"#));
    assert!(out.contains("<defs><marker id=\"m\"/></defs>\n<rect"));
    assert!(out.ends_with("</svg>"));
    assert_eq!(out.matches("<defs>").count(), 1);
}

#[test]
fn empty_defs_not_emitted() {
    let out = build_svg_markup(&Document::default(), &[], Some("  "), SerializeOptions::default());
    assert!(!out.contains("<defs>"));
}

#[test]
fn xlink_declared_when_defs_need_it() {
    let out = build_svg_markup(
        &Document::default(),
        &[],
        Some(r##"<pattern id="p"><use xlink:href="#a"/></pattern>"##),
        SerializeOptions::default(),
    );
    assert!(out.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
    assert!(parse_svg(&out).is_ok());
}

// =============================================================
// Round trip
// =============================================================

#[test]
fn rect_round_trip_scenario() {
    let parsed = parse_svg(r#"<svg width="100" height="100"><rect id="a" x="0" y="0" width="10" height="20"/></svg>"#).unwrap();
    assert_eq!(parsed.elements.len(), 1);
    assert_eq!(parsed.elements[0].id, "a");
    assert_eq!(
        parsed.elements[0].shape,
        Shape::Rect(Rect { x: 0.0, y: 0.0, width: 10.0, height: 20.0, rx: None, ry: None })
    );
    let out = build_svg_markup(&parsed.doc, &parsed.elements, None, SerializeOptions::default());
    assert!(out.contains(r#"<rect id="a" x="0" y="0" width="10" height="20"/>"#));
}

#[test]
fn round_trip_every_variant() {
    let sources = [
        r#"<svg><rect id="r" x="1" y="2" width="3" height="4" rx="1" ry="2" fill="red"/></svg>"#,
        r##"<svg><circle id="c" cx="5" cy="5" r="2" stroke="#000" stroke-width="0.5"/></svg>"##,
        r#"<svg><ellipse id="e" cx="5" cy="5" rx="4" ry="2" opacity="0.25"/></svg>"#,
        r#"<svg><line id="l" x1="0" y1="0" x2="9" y2="9" data-start-ref="r" stroke-dasharray="4 2" marker-end="url(#m)"/></svg>"#,
        r#"<svg><path id="p" d="M0 0 C 1 1 2 2 3 3" fill-rule="evenodd" transform="translate(4 5) scale(2)"/></svg>"#,
        r#"<svg><polygon id="pg" points="0,0 4,0 4,4"/></svg>"#,
        r#"<svg><text id="t" x="1" y="20" font-size="14" font-weight="bold" text-anchor="middle">Hi &amp; bye</text></svg>"#,
        r#"<svg><text id="t2" x="1" y="20"><tspan x="1" dy="12">a</tspan><tspan x="1" dy="12">b</tspan></text></svg>"#,
        r#"<svg><image id="i" x="0" y="0" width="8" height="8" href="data:image/png;base64,AAAA" preserveAspectRatio="none"/></svg>"#,
        r##"<svg><use id="u" href="#sym" x="3" y="4" width="10"/></svg>"##,
        r#"<svg><g id="g" transform="rotate(45 5 5)" stroke="blue"><rect id="gr" width="2" height="2"/><g id="gg"><circle id="gc" r="1"/></g></g></svg>"#,
        r#"<svg><rect id="locked" width="1" height="1" data-locked="true"/></svg>"#,
    ];
    for src in sources {
        let first = parse_svg(src).unwrap();
        let second = reparse(&first);
        assert_eq!(second, first, "round trip changed {src}");
    }
}

#[test]
fn round_trip_preserves_defs() {
    let first = parse_svg(
        r#"<svg viewBox="0 0 50 50"><defs><marker id="m"><path d="M0 0 L5 5"/></marker></defs><linearGradient id="lg"/><rect id="r"/></svg>"#,
    )
    .unwrap();
    let second = reparse(&first);
    assert_eq!(second.defs, first.defs);
    assert_eq!(second.doc, first.doc);
}

#[test]
fn hidden_elements_drop_out_of_round_trip() {
    let first = parse_svg(r#"<svg><rect id="a" data-visible="false"/><rect id="b"/></svg>"#).unwrap();
    assert_eq!(first.elements.len(), 2);
    let second = reparse(&first);
    assert_eq!(second.elements.len(), 1);
    assert_eq!(second.elements[0].id, "b");
}

#[test]
fn include_hidden_round_trips_visibility() {
    let first = parse_svg(r#"<svg><rect id="a" data-visible="false"/></svg>"#).unwrap();
    let out = build_svg_markup(&first.doc, &first.elements, None, SerializeOptions { include_hidden: true });
    let second = parse_svg(&out).unwrap();
    assert_eq!(second, first);
}

#[test]
fn built_elements_round_trip() {
    let mut line = Element::line(0.5, 1.5, 2.5, 3.5).with_id("l");
    line.shape = Shape::Line(Line { x1: 0.5, y1: 1.5, x2: 2.5, y2: 3.5, start_ref: None, end_ref: Some("x".into()) });
    let mut text = Element::text(0.0, 10.0, "ab").with_id("t");
    if let Shape::Text(t) = &mut text.shape {
        t.tspans = vec![Tspan { text: "a".into(), ..Tspan::default() }, Tspan { text: "b".into(), ..Tspan::default() }];
    }
    let doc = Document::new(64.0, 32.0);
    let els = vec![line, text];
    let out = build_svg_markup(&doc, &els, None, SerializeOptions::default());
    let parsed = parse_svg(&out).unwrap();
    assert_eq!(parsed.elements, els);
    assert_eq!(parsed.doc, doc);
}
