#![allow(clippy::float_cmp)]

use super::*;
use crate::geometry::{Estimate, anchor_points};
use crate::transform::{Affine, Transform};

fn bound_line(id: &str, start: Point, start_ref: Option<&str>, end: Point, end_ref: Option<&str>) -> Element {
    let mut el = Element::line(start.x, start.y, end.x, end.y).with_id(id);
    if let Some(line) = el.as_line_mut() {
        line.start_ref = start_ref.map(str::to_owned);
        line.end_ref = end_ref.map(str::to_owned);
    }
    el
}

// =============================================================
// LineEnd
// =============================================================

#[test]
fn line_end_accessors() {
    let mut line = Line { x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0, start_ref: None, end_ref: Some("b".into()) };
    assert_eq!(LineEnd::Start.point(&line), Point::new(1.0, 2.0));
    assert_eq!(LineEnd::End.reference(&line).map(String::as_str), Some("b"));
    attach_endpoint(&mut line, LineEnd::Start, Point::new(9.0, 9.0), Some("a".into()));
    assert_eq!((line.x1, line.y1), (9.0, 9.0));
    assert_eq!(line.start_ref.as_deref(), Some("a"));
    attach_endpoint(&mut line, LineEnd::End, Point::new(0.0, 0.0), None);
    assert_eq!(line.end_ref, None);
}

// =============================================================
// follow_point
// =============================================================

#[test]
fn follow_point_exact_anchor_lands_exactly() {
    let before = [Point::new(10.0, 0.0), Point::new(10.0, 20.0)];
    let after = [Point::new(15.5, 5.25), Point::new(15.5, 25.25)];
    assert_eq!(follow_point(Point::new(10.0, 0.0), &before, &after), Some(Point::new(15.5, 5.25)));
}

#[test]
fn follow_point_keeps_offset_when_off_anchor() {
    let before = [Point::new(10.0, 0.0)];
    let after = [Point::new(30.0, 0.0)];
    assert_eq!(follow_point(Point::new(12.0, 1.0), &before, &after), Some(Point::new(32.0, 1.0)));
}

#[test]
fn follow_point_needs_anchors() {
    assert_eq!(follow_point(Point::new(0.0, 0.0), &[], &[]), None);
}

// =============================================================
// follow_subtree
// =============================================================

fn follow(store: &mut ElementStore, target: &str, before: &[Point], after: &[Point]) -> usize {
    follow_subtree(store, target, &[(target.to_owned(), before.to_vec())], &[(target.to_owned(), after.to_vec())])
}

#[test]
fn connector_follows_moved_rect() {
    let rect = Element::rect(0.0, 0.0, 20.0, 20.0).with_id("A");
    let line = bound_line("L", Point::new(10.0, 0.0), Some("A"), Point::new(100.0, 100.0), None);
    let mut store = ElementStore::from(vec![rect, line]);

    let before = anchor_points(store.get("A").unwrap(), &Estimate);
    store.get_mut("A").unwrap().translate(5.0, 5.0);
    let after = anchor_points(store.get("A").unwrap(), &Estimate);

    assert_eq!(follow(&mut store, "A", &before, &after), 1);
    let l = store.get("L").unwrap().as_line().unwrap();
    assert_eq!((l.x1, l.y1), (15.0, 5.0));
    assert_eq!((l.x2, l.y2), (100.0, 100.0));
}

#[test]
fn both_ends_bound_to_same_target() {
    let line = bound_line("L", Point::new(0.0, 10.0), Some("A"), Point::new(20.0, 10.0), Some("A"));
    let mut store = ElementStore::from(vec![line]);
    let before = [Point::new(0.0, 10.0), Point::new(20.0, 10.0)];
    let after = [Point::new(0.0, 20.0), Point::new(40.0, 20.0)];
    assert_eq!(follow(&mut store, "A", &before, &after), 2);
    let l = store.get("L").unwrap().as_line().unwrap();
    assert_eq!((l.x1, l.y1, l.x2, l.y2), (0.0, 20.0, 40.0, 20.0));
}

#[test]
fn nested_lines_follow() {
    let line = bound_line("L", Point::new(10.0, 0.0), Some("A"), Point::new(50.0, 50.0), None);
    let mut store = ElementStore::from(vec![Element::group(vec![line]).with_id("g")]);
    let before = [Point::new(10.0, 0.0)];
    let after = [Point::new(11.0, 1.0)];
    assert_eq!(follow(&mut store, "A", &before, &after), 1);
    assert_eq!(store.get("L").unwrap().as_line().unwrap().start(), Point::new(11.0, 1.0));
}

#[test]
fn unchanged_anchors_move_nothing() {
    let line = bound_line("L", Point::new(10.0, 0.0), Some("A"), Point::new(0.0, 0.0), None);
    let mut store = ElementStore::from(vec![line]);
    let anchors = [Point::new(10.0, 0.0)];
    assert_eq!(follow(&mut store, "A", &anchors, &anchors), 0);
}

#[test]
fn repeated_moves_do_not_drift() {
    let rect = Element::rect(0.0, 0.0, 20.0, 20.0).with_id("A");
    let line = bound_line("L", Point::new(20.0, 10.0), Some("A"), Point::new(100.0, 10.0), None);
    let mut store = ElementStore::from(vec![rect, line]);
    for _ in 0..1000 {
        let before = anchor_points(store.get("A").unwrap(), &Estimate);
        store.get_mut("A").unwrap().translate(0.1, 0.3);
        let after = anchor_points(store.get("A").unwrap(), &Estimate);
        follow(&mut store, "A", &before, &after);
    }
    let right = anchor_points(store.get("A").unwrap(), &Estimate)[3];
    assert_eq!(store.get("L").unwrap().as_line().unwrap().start(), right);
}

#[test]
fn subtree_anchors_map_through_group_transform() {
    let g = Element::group(vec![Element::rect(0.0, 0.0, 20.0, 20.0).with_id("r")])
        .with_id("g")
        .with_transform(Transform::translate(5.0, 5.0));
    let anchors = subtree_anchors(&g, &Estimate, Affine::IDENTITY);
    assert_eq!(anchors.len(), 2);
    assert_eq!(anchors[0].0, "g");
    assert_eq!(anchors[1].0, "r");
    assert_eq!(anchors[1].1[0], Point::new(15.0, 5.0));
}

#[test]
fn follow_subtree_leaves_inner_lines_alone() {
    let inner = bound_line("inner", Point::new(10.0, 0.0), Some("r"), Point::new(50.0, 50.0), None);
    let outer = bound_line("outer", Point::new(10.0, 0.0), Some("r"), Point::new(90.0, 90.0), None);
    let g = Element::group(vec![Element::rect(0.0, 0.0, 20.0, 20.0).with_id("r"), inner]).with_id("g");
    let mut store = ElementStore::from(vec![g, outer]);

    let before = subtree_anchors(store.get("g").unwrap(), &Estimate, Affine::IDENTITY);
    store.get_mut("g").unwrap().translate(5.0, 5.0);
    let after = subtree_anchors(store.get("g").unwrap(), &Estimate, Affine::IDENTITY);

    assert_eq!(follow_subtree(&mut store, "g", &before, &after), 1);
    assert_eq!(store.get("outer").unwrap().as_line().unwrap().start(), Point::new(15.0, 5.0));
    assert_eq!(store.get("inner").unwrap().as_line().unwrap().start(), Point::new(10.0, 0.0));
}

#[test]
fn subtree_anchors_apply_outer_placement() {
    let r = Element::rect(0.0, 0.0, 20.0, 20.0).with_id("r");
    let outer = Transform { scale_x: Some(2.0), ..Transform::default() }.to_placement();
    let anchors = subtree_anchors(&r, &Estimate, outer);
    assert_eq!(anchors[0].1[0], Point::new(20.0, 0.0));
}

#[test]
fn line_in_scaled_group_follows_in_canvas_space() {
    let line = bound_line("L", Point::new(10.0, 0.0), Some("A"), Point::new(0.0, 50.0), None);
    let scaled = Transform { scale_x: Some(2.0), ..Transform::default() };
    let mut store = ElementStore::from(vec![Element::group(vec![line]).with_id("g").with_transform(scaled)]);
    let before = [Point::new(20.0, 0.0)];
    let after = [Point::new(30.0, 10.0)];
    assert_eq!(follow(&mut store, "A", &before, &after), 1);
    assert_eq!(store.get("L").unwrap().as_line().unwrap().start(), Point::new(15.0, 5.0));
}

#[test]
fn lines_bound_to_lists_lines() {
    let store = ElementStore::from(vec![
        bound_line("L1", Point::default(), Some("A"), Point::default(), None),
        bound_line("L2", Point::default(), None, Point::default(), Some("A")),
        bound_line("L3", Point::default(), Some("B"), Point::default(), None),
    ]);
    assert_eq!(lines_bound_to(&store, "A"), vec!["L1".to_owned(), "L2".to_owned()]);
}

// =============================================================
// remap_refs
// =============================================================

#[test]
fn remap_refs_follows_copies_and_clears_rest() {
    let line = bound_line("L", Point::default(), Some("inside"), Point::default(), Some("outside"));
    let mut g = Element::group(vec![Element::rect(0.0, 0.0, 1.0, 1.0).with_id("inside"), line]);
    let ids = HashMap::from([("inside".to_owned(), "inside-2".to_owned())]);
    remap_refs(&mut g, &ids);
    let l = g.children()[1].as_line().unwrap();
    assert_eq!(l.start_ref.as_deref(), Some("inside-2"));
    assert_eq!(l.end_ref, None);
}

// =============================================================
// SymbolLibrary
// =============================================================

#[test]
fn symbol_library_resolves_hash_and_bare() {
    let mut lib = SymbolLibrary::new();
    assert!(lib.is_empty());
    lib.register("star", Element::path("M0 0").with_id("star"));
    assert_eq!(lib.len(), 1);
    assert!(lib.resolve("#star").is_some());
    assert!(lib.resolve("star").is_some());
    assert!(lib.resolve("#missing").is_none());
    lib.clear();
    assert!(lib.resolve("#star").is_none());
}
