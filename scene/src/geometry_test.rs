#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::Tspan;

// =============================================================
// Bounds
// =============================================================

#[test]
fn bounds_new_normalizes_negative_extent() {
    let b = Bounds::new(10.0, 10.0, -4.0, -6.0);
    assert_eq!(b, Bounds { x: 6.0, y: 4.0, width: 4.0, height: 6.0 });
}

#[test]
fn bounds_union_covers_both() {
    let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
    let b = Bounds::new(20.0, -5.0, 5.0, 5.0);
    assert_eq!(a.union(&b), Bounds::new(0.0, -5.0, 25.0, 15.0));
}

#[test]
fn bounds_intersects_touching_edges() {
    let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&Bounds::new(10.0, 10.0, 5.0, 5.0)));
    assert!(!a.intersects(&Bounds::new(10.1, 0.0, 5.0, 5.0)));
}

#[test]
fn bounds_transformed_scales_then_translates() {
    let t = Transform { x: Some(100.0), y: Some(50.0), scale_x: Some(2.0), ..Transform::default() };
    let b = Bounds::new(1.0, 2.0, 3.0, 4.0).transformed(&t);
    assert_eq!(b, Bounds::new(102.0, 54.0, 6.0, 8.0));
}

#[test]
fn bounds_transformed_negative_scale_stays_normalized() {
    let t = Transform { scale_x: Some(-1.0), scale_y: Some(1.0), ..Transform::default() };
    let b = Bounds::new(0.0, 0.0, 10.0, 10.0).transformed(&t);
    assert_eq!(b, Bounds::new(-10.0, 0.0, 10.0, 10.0));
}

// =============================================================
// Per-variant bounds
// =============================================================

#[test]
fn rect_bounds_are_its_box() {
    assert_eq!(bounds(&Element::rect(1.0, 2.0, 30.0, 40.0)), Some(Bounds::new(1.0, 2.0, 30.0, 40.0)));
}

#[test]
fn circle_bounds() {
    assert_eq!(bounds(&Element::circle(50.0, 50.0, 10.0)), Some(Bounds::new(40.0, 40.0, 20.0, 20.0)));
}

#[test]
fn ellipse_bounds() {
    assert_eq!(bounds(&Element::ellipse(50.0, 50.0, 20.0, 10.0)), Some(Bounds::new(30.0, 40.0, 40.0, 20.0)));
}

#[test]
fn line_bounds_padded_by_half_stroke() {
    let b = bounds(&Element::line(10.0, 10.0, 30.0, 10.0)).unwrap();
    assert_eq!(b, Bounds::new(9.0, 9.0, 22.0, 2.0));
}

#[test]
fn line_bounds_use_explicit_stroke_width() {
    let mut el = Element::line(0.0, 0.0, 10.0, 0.0);
    el.style.stroke_width = Some(6.0);
    assert_eq!(bounds(&el), Some(Bounds::new(-3.0, -3.0, 16.0, 6.0)));
}

#[test]
fn path_bounds_placeholder_at_transform_origin() {
    let el = Element::path("M0 0 L5 5").with_transform(Transform::translate(40.0, 60.0));
    assert_eq!(bounds(&el), Some(Bounds::new(40.0, 60.0, 100.0, 100.0)));
}

#[test]
fn text_bounds_estimated_from_length() {
    let b = bounds(&Element::text(10.0, 20.0, "abcde")).unwrap();
    assert_eq!(b.x, 10.0);
    assert!((b.y - (20.0 - 16.0 * 0.8)).abs() < 1e-9);
    assert!((b.width - 5.0 * 16.0 * 0.6).abs() < 1e-9);
    assert_eq!(b.height, 16.0);
}

#[test]
fn text_bounds_minimum_width() {
    let b = bounds(&Element::text(0.0, 0.0, "")).unwrap();
    assert_eq!(b.width, 10.0);
}

#[test]
fn text_bounds_middle_anchor_centres() {
    let mut el = Element::text(100.0, 50.0, "abcdefghij");
    if let Shape::Text(t) = &mut el.shape {
        t.font_size = Some(10.0);
        t.text_anchor = Some("middle".into());
    }
    let b = bounds(&el).unwrap();
    assert!((b.width - 60.0).abs() < 1e-9);
    assert!((b.x - 70.0).abs() < 1e-9);
}

#[test]
fn text_bounds_with_tspans_use_widest_line() {
    let mut el = Element::text(0.0, 20.0, "aabbbb");
    if let Shape::Text(t) = &mut el.shape {
        t.font_size = Some(10.0);
        t.tspans = vec![
            Tspan { text: "aa".into(), ..Tspan::default() },
            Tspan { text: "bbbb".into(), ..Tspan::default() },
        ];
    }
    let b = bounds(&el).unwrap();
    assert!((b.width - 24.0).abs() < 1e-9);
    assert!((b.height - 24.0).abs() < 1e-9);
}

#[test]
fn use_bounds_default_extent() {
    let b = bounds(&Element::use_ref(5.0, 5.0, "#sym")).unwrap();
    assert_eq!(b, Bounds::new(5.0, 5.0, 50.0, 50.0));
}

#[test]
fn rect_bounds_follow_own_transform() {
    let el = Element::rect(0.0, 0.0, 10.0, 10.0).with_transform(Transform::translate(5.0, 5.0));
    assert_eq!(bounds(&el), Some(Bounds::new(5.0, 5.0, 10.0, 10.0)));
}

// =============================================================
// Group bounds
// =============================================================

#[test]
fn group_bounds_union_of_children() {
    let g = Element::group(vec![Element::rect(0.0, 0.0, 10.0, 10.0), Element::circle(30.0, 30.0, 5.0)]);
    assert_eq!(bounds(&g), Some(Bounds::new(0.0, 0.0, 35.0, 35.0)));
}

#[test]
fn group_bounds_apply_group_transform_once() {
    let g = Element::group(vec![Element::rect(0.0, 0.0, 10.0, 10.0)]).with_transform(Transform::translate(100.0, 0.0));
    assert_eq!(bounds(&g), Some(Bounds::new(100.0, 0.0, 10.0, 10.0)));
}

#[test]
fn group_bounds_skip_hidden_children() {
    let mut hidden = Element::rect(500.0, 500.0, 10.0, 10.0);
    hidden.visible = false;
    let g = Element::group(vec![Element::rect(0.0, 0.0, 10.0, 10.0), hidden]);
    assert_eq!(bounds(&g), Some(Bounds::new(0.0, 0.0, 10.0, 10.0)));
}

#[test]
fn nested_group_bounds() {
    let inner = Element::group(vec![Element::rect(0.0, 0.0, 10.0, 10.0)]).with_transform(Transform::translate(10.0, 10.0));
    let outer = Element::group(vec![inner, Element::rect(0.0, 0.0, 5.0, 5.0)]);
    assert_eq!(bounds(&outer), Some(Bounds::new(0.0, 0.0, 20.0, 20.0)));
}

#[test]
fn empty_group_has_no_bounds() {
    assert_eq!(bounds(&Element::group(Vec::new())), None);
}

#[test]
fn empty_subgroup_does_not_stretch_parent() {
    let g = Element::group(vec![Element::group(Vec::new()), Element::rect(100.0, 100.0, 10.0, 10.0)]);
    assert_eq!(bounds(&g), Some(Bounds::new(100.0, 100.0, 10.0, 10.0)));
}

#[test]
fn hidden_only_subgroup_does_not_stretch_parent() {
    let mut hidden = Element::rect(0.0, 0.0, 5.0, 5.0);
    hidden.visible = false;
    let g = Element::group(vec![Element::group(vec![hidden]), Element::rect(100.0, 100.0, 10.0, 10.0)]);
    assert_eq!(bounds(&g), Some(Bounds::new(100.0, 100.0, 10.0, 10.0)));
}

// =============================================================
// Measure
// =============================================================

struct Fixed(Bounds);

impl Measure for Fixed {
    fn measure(&self, el: &Element) -> Option<Bounds> {
        matches!(el.shape, Shape::Path(_)).then_some(self.0)
    }
}

#[test]
fn measure_overrides_estimate() {
    let surface = Fixed(Bounds::new(1.0, 1.0, 2.0, 2.0));
    assert_eq!(element_bounds(&Element::path("M0 0"), &surface), Some(Bounds::new(1.0, 1.0, 2.0, 2.0)));
    assert_eq!(element_bounds(&Element::rect(0.0, 0.0, 5.0, 5.0), &surface), Some(Bounds::new(0.0, 0.0, 5.0, 5.0)));
}

#[test]
fn measure_reaches_group_children() {
    let surface = Fixed(Bounds::new(0.0, 0.0, 2.0, 2.0));
    let g = Element::group(vec![Element::path("M0 0")]);
    assert_eq!(element_bounds(&g, &surface), Some(Bounds::new(0.0, 0.0, 2.0, 2.0)));
}

// =============================================================
// Anchors
// =============================================================

#[test]
fn anchors_in_order() {
    let pts = anchor_points(&Element::rect(0.0, 0.0, 20.0, 10.0), &Estimate);
    assert_eq!(
        pts,
        vec![
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 5.0),
            Point::new(20.0, 5.0),
            Point::new(10.0, 5.0),
        ]
    );
    assert_eq!(Anchor::ALL.len(), pts.len());
}

#[test]
fn lines_have_no_anchors() {
    assert!(anchor_points(&Element::line(0.0, 0.0, 10.0, 10.0), &Estimate).is_empty());
}

#[test]
fn empty_groups_have_no_anchors() {
    assert!(anchor_points(&Element::group(Vec::new()), &Estimate).is_empty());
}

#[test]
fn nearest_picks_closest() {
    let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(3.0, 0.0)];
    let (idx, dist) = nearest(Point::new(4.0, 0.0), &pts).unwrap();
    assert_eq!(idx, 2);
    assert_eq!(dist, 1.0);
    assert!(nearest(Point::new(0.0, 0.0), &[]).is_none());
}
