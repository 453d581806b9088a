#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{CropInsets, PartialShape};
use crate::geom::Rect;

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

fn store_with(rect: Rect, rotation: f64) -> (SceneStore, InstanceId) {
    let mut store = SceneStore::new();
    let mut shape = PlacedShape::with_template_id("t".into(), rect, "#000");
    shape.rotation = rotation;
    let id = shape.instance_id;
    store.insert(shape);
    (store, id)
}

// =============================================================
// Frames
// =============================================================

#[test]
fn local_and_canvas_round_trip() {
    let (store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 40.0), 33.0);
    let shape = store.get(&id).unwrap();
    let p = Point::new(123.0, 98.5);
    assert!(close(to_canvas(shape, to_local(shape, p)), p));
}

#[test]
fn contains_respects_rotation() {
    // 200x20 bar centered at (200, 200), rotated 90° becomes vertical.
    let (store, id) = store_with(Rect::new(100.0, 190.0, 200.0, 20.0), 90.0);
    let shape = store.get(&id).unwrap();
    assert!(contains(shape, Point::new(200.0, 280.0)));
    assert!(!contains(shape, Point::new(280.0, 200.0)));
}

// =============================================================
// Handle positions
// =============================================================

#[test]
fn resize_handles_unrotated() {
    let (store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 40.0), 0.0);
    let shape = store.get(&id).unwrap();
    assert!(close(resize_handle(shape, ResizeAnchor::Nw), Point::new(100.0, 100.0)));
    assert!(close(resize_handle(shape, ResizeAnchor::Se), Point::new(180.0, 140.0)));
    assert!(close(resize_handle(shape, ResizeAnchor::E), Point::new(180.0, 120.0)));
    assert!(close(resize_handle(shape, ResizeAnchor::N), Point::new(140.0, 100.0)));
}

#[test]
fn rotate_handle_follows_rotation() {
    let (store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 90.0);
    let shape = store.get(&id).unwrap();
    // Unrotated handle sits above; after 90° clockwise it sits to the right.
    let h = rotate_handle(shape);
    assert!(close(h, Point::new(140.0 + 40.0 + ROTATE_HANDLE_OFFSET_PX, 140.0)));
}

#[test]
fn crop_handles_are_viewer_aligned() {
    let (mut store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 40.0), 45.0);
    store.update_shape(
        &id,
        &PartialShape { crop_insets: Some(CropInsets { top: 25.0, ..Default::default() }), ..Default::default() },
    );
    let shape = store.get(&id).unwrap();
    assert!(close(crop_handle(shape, CropEdge::Top), Point::new(140.0, 110.0)));
    assert!(close(crop_handle(shape, CropEdge::Bottom), Point::new(140.0, 140.0)));
    assert!(close(crop_handle(shape, CropEdge::Left), Point::new(100.0, 120.0)));
    assert!(close(crop_handle(shape, CropEdge::Right), Point::new(180.0, 120.0)));
}

#[test]
fn crop_value_uses_own_axis_only() {
    let (store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 40.0), 0.0);
    let shape = store.get(&id).unwrap();
    assert_eq!(crop_value_at(shape, CropEdge::Top, Point::new(999.0, 110.0)), 25.0);
    assert_eq!(crop_value_at(shape, CropEdge::Bottom, Point::new(-5.0, 130.0)), 25.0);
    assert_eq!(crop_value_at(shape, CropEdge::Left, Point::new(120.0, 0.0)), 25.0);
    assert_eq!(crop_value_at(shape, CropEdge::Right, Point::new(160.0, 0.0)), 25.0);
    assert!(crop_value_at(shape, CropEdge::Top, Point::new(0.0, 300.0)) > 100.0);
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn empty_space_misses() {
    let (store, _) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 0.0);
    assert!(hit_test(Point::new(10.0, 10.0), &store, None).is_none());
}

#[test]
fn body_hit() {
    let (store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 0.0);
    assert_eq!(hit_test(Point::new(140.0, 140.0), &store, None), Some(Hit { id, part: HitPart::Body }));
}

#[test]
fn topmost_body_wins() {
    let (mut store, _) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 0.0);
    let top = PlacedShape::with_template_id("t".into(), Rect::new(120.0, 120.0, 80.0, 80.0), "#fff");
    let top_id = top.instance_id;
    store.insert(top);
    assert_eq!(hit_test(Point::new(150.0, 150.0), &store, None).map(|h| h.id), Some(top_id));
}

#[test]
fn handles_only_for_selected_shape() {
    let (mut store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 0.0);
    let corner = Point::new(181.0, 181.0);
    assert!(hit_test(corner, &store, None).is_none());

    store.set_selected(Some(id));
    assert_eq!(hit_test(corner, &store, None), Some(Hit { id, part: HitPart::ResizeHandle(ResizeAnchor::Se) }));
}

#[test]
fn rotate_handle_hit_when_selected() {
    let (mut store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 0.0);
    store.set_selected(Some(id));
    let pt = Point::new(140.0, 100.0 - ROTATE_HANDLE_OFFSET_PX);
    assert_eq!(hit_test(pt, &store, None), Some(Hit { id, part: HitPart::RotateHandle }));
}

#[test]
fn crop_mode_hits_crop_handles_not_resize() {
    let (mut store, id) = store_with(Rect::new(100.0, 100.0, 80.0, 80.0), 0.0);
    store.set_selected(Some(id));
    let top_mid = Point::new(140.0, 100.0);
    assert_eq!(hit_test(top_mid, &store, Some(id)), Some(Hit { id, part: HitPart::CropHandle(CropEdge::Top) }));
}

#[test]
fn anchor_signs_and_corners() {
    assert_eq!(ResizeAnchor::Nw.signs(), (-1.0, -1.0));
    assert_eq!(ResizeAnchor::E.signs(), (1.0, 0.0));
    assert!(ResizeAnchor::Se.is_corner());
    assert!(!ResizeAnchor::S.is_corner());
}
