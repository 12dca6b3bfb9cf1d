use super::*;
use crate::geometry::Estimate;

fn store() -> ElementStore {
    let mut locked = Element::rect(200.0, 0.0, 20.0, 20.0).with_id("locked");
    locked.locked = true;
    let mut hidden = Element::rect(300.0, 0.0, 20.0, 20.0).with_id("hidden");
    hidden.visible = false;
    ElementStore::from(vec![
        Element::rect(0.0, 0.0, 20.0, 20.0).with_id("a"),
        Element::rect(100.0, 0.0, 20.0, 20.0).with_id("b"),
        locked,
        hidden,
        Element::line(0.0, 50.0, 40.0, 50.0).with_id("l"),
    ])
}

// =============================================================
// ResizeAnchor
// =============================================================

#[test]
fn resize_anchor_edges() {
    assert!(ResizeAnchor::Ne.north() && ResizeAnchor::Ne.east());
    assert!(!ResizeAnchor::Ne.south() && !ResizeAnchor::Ne.west());
    assert!(ResizeAnchor::S.south());
    assert!(!ResizeAnchor::S.east() && !ResizeAnchor::S.west());
    let west: Vec<_> = ResizeAnchor::ALL.into_iter().filter(|a| a.west()).collect();
    assert_eq!(west, vec![ResizeAnchor::Sw, ResizeAnchor::W, ResizeAnchor::Nw]);
}

#[test]
fn resize_anchor_positions() {
    let b = Bounds::new(0.0, 0.0, 10.0, 20.0);
    assert_eq!(ResizeAnchor::Nw.position(&b), Point::new(0.0, 0.0));
    assert_eq!(ResizeAnchor::E.position(&b), Point::new(10.0, 10.0));
    assert_eq!(ResizeAnchor::S.position(&b), Point::new(5.0, 20.0));
}

// =============================================================
// find_snap_anchor
// =============================================================

#[test]
fn snaps_to_nearest_anchor_in_radius() {
    let s = store();
    let hit = find_snap_anchor(&s, &Estimate, Point::new(22.0, 11.0), 14.0, None).unwrap();
    assert_eq!(hit.id, "a");
    assert_eq!(hit.anchor, Anchor::Right);
    assert_eq!(hit.point, Point::new(20.0, 10.0));
}

#[test]
fn no_snap_outside_radius() {
    let s = store();
    assert!(find_snap_anchor(&s, &Estimate, Point::new(60.0, 10.0), 14.0, None).is_none());
}

#[test]
fn snap_skips_locked_hidden_and_lines() {
    let s = store();
    assert!(find_snap_anchor(&s, &Estimate, Point::new(210.0, 0.0), 14.0, None).is_none());
    assert!(find_snap_anchor(&s, &Estimate, Point::new(310.0, 0.0), 14.0, None).is_none());
    assert!(find_snap_anchor(&s, &Estimate, Point::new(20.0, 51.0), 5.0, None).is_none());
}

#[test]
fn snap_respects_exclusion() {
    let s = store();
    assert!(find_snap_anchor(&s, &Estimate, Point::new(10.0, 0.0), 14.0, Some("a")).is_none());
}

// =============================================================
// select_in_rect
// =============================================================

#[test]
fn marquee_selects_intersecting() {
    let s = store();
    let ids = select_in_rect(&s, &Estimate, &Bounds::new(-5.0, -5.0, 130.0, 10.0));
    assert_eq!(ids, vec!["a".to_owned(), "b".to_owned()]);
}

#[test]
fn marquee_margin_extends_reach() {
    let s = store();
    let ids = select_in_rect(&s, &Estimate, &Bounds::new(23.0, 0.0, 2.0, 2.0));
    assert_eq!(ids, vec!["a".to_owned()]);
}

#[test]
fn marquee_skips_hidden() {
    let s = store();
    assert!(select_in_rect(&s, &Estimate, &Bounds::new(305.0, 5.0, 1.0, 1.0)).is_empty());
}

#[test]
fn marquee_includes_locked() {
    let s = store();
    assert_eq!(select_in_rect(&s, &Estimate, &Bounds::new(205.0, 5.0, 1.0, 1.0)), vec!["locked".to_owned()]);
}

// =============================================================
// element_at / selection_bounds
// =============================================================

#[test]
fn element_at_prefers_topmost() {
    let s = ElementStore::from(vec![
        Element::rect(0.0, 0.0, 50.0, 50.0).with_id("under"),
        Element::rect(10.0, 10.0, 10.0, 10.0).with_id("over"),
    ]);
    assert_eq!(element_at(&s, &Estimate, Point::new(15.0, 15.0)).as_deref(), Some("over"));
    assert_eq!(element_at(&s, &Estimate, Point::new(40.0, 40.0)).as_deref(), Some("under"));
    assert_eq!(element_at(&s, &Estimate, Point::new(90.0, 90.0)), None);
}

#[test]
fn selection_bounds_unions() {
    let s = store();
    let b = selection_bounds(&s, &Estimate, &["a".to_owned(), "b".to_owned(), "nope".to_owned()]).unwrap();
    assert_eq!(b, Bounds::new(0.0, 0.0, 120.0, 20.0));
    assert!(selection_bounds(&s, &Estimate, &[]).is_none());
}
