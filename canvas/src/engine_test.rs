#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::CropInsets;
use crate::input::Key;

// =============================================================
// Helpers
// =============================================================

fn template(id: &str) -> DesignElement {
    DesignElement {
        id: id.into(),
        name: id.into(),
        category: "prints".into(),
        active: true,
        image_ref: format!("/img/{id}.svg"),
    }
}

fn retired(id: &str) -> DesignElement {
    DesignElement { active: false, ..template(id) }
}

fn templates() -> Vec<DesignElement> {
    vec![template("star"), template("stripe"), retired("old")]
}

fn engine() -> EngineCore {
    let mut e = EngineCore::new();
    e.set_container(400.0, 400.0);
    e.set_catalog(templates());
    e
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn down(e: &mut EngineCore, p: Point) -> Vec<Action> {
    e.on_pointer_down(p, Button::Primary, no_mods())
}

fn up(e: &mut EngineCore, p: Point) -> Vec<Action> {
    e.on_pointer_up(p, Button::Primary, no_mods())
}

fn drag(e: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    down(e, from);
    e.on_pointer_move(to, no_mods());
    up(e, to)
}

fn press(e: &mut EngineCore, key: &str, mods: Modifiers) -> Vec<Action> {
    e.on_key_down(&Key::new(key), mods)
}

fn release(e: &mut EngineCore, key: &str) -> Vec<Action> {
    e.on_key_up(&Key::new(key), no_mods())
}

fn created_id(actions: &[Action]) -> Option<InstanceId> {
    actions.iter().find_map(|a| match a {
        Action::ShapeCreated { shape } => Some(shape.instance_id),
        _ => None,
    })
}

/// Drag `template_id` from the palette and drop it at `at`.
fn drop_at(e: &mut EngineCore, template_id: &str, at: Point) -> InstanceId {
    e.begin_create(template_id);
    e.on_pointer_move(at, no_mods());
    created_id(&up(e, at)).unwrap()
}

fn rect_of(e: &EngineCore, id: InstanceId) -> Rect {
    e.shape(&id).unwrap().rect()
}

fn is_rejected(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::Rejected { .. }))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// =============================================================
// Create
// =============================================================

#[test]
fn drop_near_corner_clamps_and_snaps() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(395.0, 395.0));
    assert_eq!(rect_of(&e, id), Rect::new(320.0, 320.0, 80.0, 80.0));
    assert_eq!(e.selection(), Some(id));
    assert_eq!(e.undo_depth(), 1);
}

#[test]
fn drop_centers_on_pointer() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 80.0, 80.0));
}

#[test]
fn dropped_shape_takes_active_color_and_template() {
    let mut e = engine();
    e.set_active_color("#336699");
    let id = drop_at(&mut e, "stripe", pt(200.0, 200.0));
    let shape = e.shape(&id).unwrap();
    assert_eq!(shape.color, "#336699");
    assert_eq!(shape.template_id, "stripe");
    assert_eq!(shape.rotation, 0.0);
    assert!(shape.crop_insets.is_none());
}

#[test]
fn default_size_caps_on_large_canvas() {
    let mut e = engine();
    e.set_container(2000.0, 1500.0);
    let id = drop_at(&mut e, "star", pt(600.0, 600.0));
    assert_eq!(rect_of(&e, id).width, 120.0);
}

#[test]
fn create_preview_follows_pointer() {
    let mut e = engine();
    e.begin_create("star");
    assert!(e.create_preview().is_none());
    e.on_pointer_move(pt(200.0, 200.0), no_mods());
    let ghost = e.create_preview().unwrap();
    assert_eq!(ghost.rect(), Rect::new(160.0, 160.0, 80.0, 80.0));
    e.on_pointer_move(pt(-10.0, 200.0), no_mods());
    assert!(e.create_preview().is_none());
}

#[test]
fn drop_outside_canvas_inserts_nothing() {
    let mut e = engine();
    e.begin_create("star");
    let actions = up(&mut e, pt(500.0, 10.0));
    assert!(created_id(&actions).is_none());
    assert!(e.doc().shapes().is_empty());
    assert!(matches!(e.input(), InputState::Idle));
    assert!(!e.can_undo());
}

#[test]
fn cancel_create_discards_ghost() {
    let mut e = engine();
    e.begin_create("star");
    e.cancel_create();
    assert!(matches!(e.input(), InputState::Idle));
    assert!(created_id(&up(&mut e, pt(100.0, 100.0))).is_none());
}

#[test]
fn escape_cancels_create() {
    let mut e = engine();
    e.begin_create("star");
    press(&mut e, "Escape", no_mods());
    assert!(matches!(e.input(), InputState::Idle));
}

#[test]
fn retired_or_unknown_template_cannot_be_created() {
    let mut e = engine();
    assert!(e.begin_create("old").is_empty());
    assert!(matches!(e.input(), InputState::Idle));
    e.begin_create("nope");
    assert!(matches!(e.input(), InputState::Idle));
}

#[test]
fn create_sets_copy_cursor() {
    let mut e = engine();
    let actions = e.begin_create("star");
    assert!(actions.contains(&Action::SetCursor { cursor: "copy".into() }));
}

// =============================================================
// Select / move
// =============================================================

#[test]
fn click_empty_space_deselects() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    let actions = down(&mut e, pt(350.0, 20.0));
    assert!(actions.contains(&Action::SelectionChanged { id: None }));
    assert_eq!(e.selection(), None);
}

#[test]
fn click_without_drag_does_not_commit() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    drag(&mut e, pt(140.0, 140.0), pt(140.0, 140.0));
    assert_eq!(e.undo_depth(), 1);
    assert_eq!(e.selection(), Some(id));
}

#[test]
fn move_is_live_then_snapped_on_release() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));

    down(&mut e, pt(140.0, 140.0));
    e.on_pointer_move(pt(253.0, 147.0), no_mods());
    assert_eq!(rect_of(&e, id), Rect::new(213.0, 107.0, 80.0, 80.0));

    up(&mut e, pt(253.0, 147.0));
    assert_eq!(rect_of(&e, id), Rect::new(220.0, 100.0, 80.0, 80.0));
    assert_eq!(e.undo_depth(), 2);
}

#[test]
fn move_is_clamped_inside_canvas() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    down(&mut e, pt(140.0, 140.0));
    e.on_pointer_move(pt(1000.0, -500.0), no_mods());
    assert_eq!(rect_of(&e, id), Rect::new(320.0, 0.0, 80.0, 80.0));
}

#[test]
fn non_primary_button_is_ignored() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    assert!(e.on_pointer_down(pt(350.0, 20.0), Button::Secondary, no_mods()).is_empty());
    assert!(e.selection().is_some());
}

#[test]
fn hover_sets_cursor_once() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    let first = e.on_pointer_move(pt(150.0, 150.0), no_mods());
    assert!(first.contains(&Action::SetCursor { cursor: "move".into() }));
    assert!(e.on_pointer_move(pt(151.0, 150.0), no_mods()).is_empty());
}

#[test]
fn escape_during_move_restores_position() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    down(&mut e, pt(140.0, 140.0));
    e.on_pointer_move(pt(300.0, 300.0), no_mods());
    press(&mut e, "Escape", no_mods());
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 80.0, 80.0));
    assert!(matches!(e.input(), InputState::Idle));
    assert_eq!(e.undo_depth(), 1);
}

// =============================================================
// Resize
// =============================================================

#[test]
fn corner_resize_keeps_opposite_corner() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));

    down(&mut e, pt(180.0, 180.0));
    assert!(matches!(e.input(), InputState::Resizing { anchor: ResizeAnchor::Se, .. }));
    e.on_pointer_move(pt(223.0, 205.0), no_mods());
    let live = rect_of(&e, id);
    assert!(approx(live.x, 100.0) && approx(live.y, 100.0));
    assert!(approx(live.width, 123.0) && approx(live.height, 105.0));

    up(&mut e, pt(223.0, 205.0));
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 120.0, 100.0));
}

#[test]
fn shift_corner_resize_keeps_aspect() {
    let orig = Rect::new(100.0, 100.0, 80.0, 40.0);
    let r = resize_rect(orig, 0.0, ResizeAnchor::Se, pt(180.0, 140.0), pt(260.0, 150.0), true);
    assert!(approx(r.width, 160.0));
    assert!(approx(r.height, 80.0));
    assert!(approx(r.x, 100.0) && approx(r.y, 100.0));
}

#[test]
fn shift_edge_resize_is_free() {
    let orig = Rect::new(100.0, 100.0, 80.0, 40.0);
    let r = resize_rect(orig, 0.0, ResizeAnchor::E, pt(180.0, 120.0), pt(200.0, 160.0), true);
    assert!(approx(r.width, 100.0));
    assert!(approx(r.height, 40.0));
}

#[test]
fn west_resize_moves_left_edge() {
    let orig = Rect::new(100.0, 100.0, 80.0, 80.0);
    let r = resize_rect(orig, 0.0, ResizeAnchor::W, pt(100.0, 140.0), pt(80.0, 140.0), false);
    assert!(approx(r.x, 80.0));
    assert!(approx(r.width, 100.0));
    assert!(approx(r.x + r.width, 180.0));
}

#[test]
fn rotated_resize_pins_opposite_handle() {
    // Rotated 90°: the local east handle sits below the center.
    let orig = Rect::new(100.0, 100.0, 80.0, 80.0);
    let r = resize_rect(orig, 90.0, ResizeAnchor::E, pt(140.0, 180.0), pt(140.0, 200.0), false);
    assert!(approx(r.width, 100.0));
    assert!(approx(r.height, 80.0));
    let c = r.center();
    assert!(approx(c.x, 140.0) && approx(c.y, 150.0));
}

#[test]
fn resize_never_collapses_live() {
    let orig = Rect::new(100.0, 100.0, 80.0, 80.0);
    let r = resize_rect(orig, 0.0, ResizeAnchor::Se, pt(180.0, 180.0), pt(0.0, 0.0), false);
    assert_eq!(r.width, MIN_LIVE_SIZE);
    assert_eq!(r.height, MIN_LIVE_SIZE);
}

#[test]
fn committed_resize_has_at_least_one_grid_unit() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    drag(&mut e, pt(180.0, 180.0), pt(90.0, 90.0));
    let r = rect_of(&e, id);
    assert_eq!(r.width, 20.0);
    assert_eq!(r.height, 20.0);
}

// =============================================================
// Rotate
// =============================================================

#[test]
fn rotate_follows_pointer_angle() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));

    // Rotate handle sits straight above the center.
    down(&mut e, pt(140.0, 100.0 - crate::consts::ROTATE_HANDLE_OFFSET_PX));
    assert!(matches!(e.input(), InputState::Rotating { .. }));

    let a = (-80.0_f64).to_radians();
    let target = pt(140.0 + 64.0 * a.cos(), 140.0 + 64.0 * a.sin());
    e.on_pointer_move(target, no_mods());
    assert!(approx(e.shape(&id).unwrap().rotation, 10.0));

    up(&mut e, target);
    assert!(approx(e.shape(&id).unwrap().rotation, 10.0));
    assert_eq!(e.undo_depth(), 2);
    // Rotation does not move the box.
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 80.0, 80.0));
}

#[test]
fn rotation_stays_normalized() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    down(&mut e, pt(140.0, 100.0 - crate::consts::ROTATE_HANDLE_OFFSET_PX));
    // Pointer left of the center turns the shape about 270°.
    e.on_pointer_move(pt(76.0, 141.0), no_mods());
    let r = e.shape(&id).unwrap().rotation;
    assert!((0.0..360.0).contains(&r));
    up(&mut e, pt(76.0, 141.0));
    assert!((0.0..360.0).contains(&e.shape(&id).unwrap().rotation));
}

// =============================================================
// Crop
// =============================================================

#[test]
fn crop_inset_is_clamped() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    assert_eq!(e.crop_target(), Some(id));
    e.set_crop_inset(CropEdge::Top, 150.0);
    assert_eq!(e.shape(&id).unwrap().crop().top, 100.0);
    e.set_crop_inset(CropEdge::Left, -3.0);
    assert_eq!(e.shape(&id).unwrap().crop().left, 0.0);
}

#[test]
fn crop_session_commits_once_on_exit() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    e.set_crop_inset(CropEdge::Top, 10.0);
    e.set_crop_inset(CropEdge::Bottom, 20.0);
    assert_eq!(e.undo_depth(), 1);

    let actions = e.exit_crop();
    assert!(actions.contains(&Action::CropModeChanged { id: None }));
    assert_eq!(e.undo_depth(), 2);
    assert_eq!(e.shape(&id).unwrap().crop(), CropInsets { top: 10.0, right: 0.0, bottom: 20.0, left: 0.0 });

    e.undo();
    assert!(e.shape(&id).unwrap().crop_insets.is_none());
}

#[test]
fn crop_handle_drag_sets_inset() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();

    // Top crop handle starts on the top edge midpoint.
    down(&mut e, pt(140.0, 100.0));
    assert!(matches!(e.input(), InputState::Cropping { drag: Some(_), .. }));
    e.on_pointer_move(pt(170.0, 120.0), no_mods());
    up(&mut e, pt(170.0, 120.0));

    assert_eq!(e.shape(&id).unwrap().crop().top, 25.0);
    assert_eq!(e.crop_target(), Some(id), "crop mode stays open after a handle drag");
}

#[test]
fn clicking_outside_crop_handles_exits_crop() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    e.set_crop_inset(CropEdge::Right, 30.0);
    down(&mut e, pt(350.0, 350.0));
    assert_eq!(e.crop_target(), None);
    assert_eq!(e.undo_depth(), 2);
}

#[test]
fn escape_exits_crop() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    press(&mut e, "Escape", no_mods());
    assert_eq!(e.crop_target(), None);
    assert_eq!(e.undo_depth(), 1, "unchanged crop session is not recorded");
}

#[test]
fn degenerate_crop_is_kept() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    e.set_crop_inset(CropEdge::Top, 70.0);
    e.set_crop_inset(CropEdge::Bottom, 60.0);
    e.exit_crop();
    assert!(e.shape(&id).unwrap().crop().is_degenerate());
}

#[test]
fn set_crop_inset_outside_crop_mode_is_ignored() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    assert!(e.set_crop_inset(CropEdge::Top, 40.0).is_empty());
    assert!(e.shape(&id).unwrap().crop_insets.is_none());
}

#[test]
fn enter_crop_requires_selection() {
    let mut e = engine();
    assert!(e.enter_crop().is_empty());
    assert_eq!(e.crop_target(), None);
}

// =============================================================
// Keyboard nudge
// =============================================================

#[test]
fn held_arrow_moves_one_step_per_frame() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));

    let actions = press(&mut e, "ArrowRight", no_mods());
    assert_eq!(actions, vec![Action::FrameRequested]);
    for _ in 0..3 {
        assert!(e.on_animation_frame().contains(&Action::FrameRequested));
    }
    assert_eq!(rect_of(&e, id).x, 160.0);
    assert_eq!(e.undo_depth(), 1, "no commit while the key is held");

    release(&mut e, "ArrowRight");
    assert_eq!(rect_of(&e, id), Rect::new(160.0, 100.0, 80.0, 80.0));
    assert_eq!(e.undo_depth(), 2);
    assert!(e.on_animation_frame().is_empty());
}

#[test]
fn diagonal_nudge() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    press(&mut e, "ArrowLeft", no_mods());
    press(&mut e, "ArrowUp", no_mods());
    e.on_animation_frame();
    release(&mut e, "ArrowLeft");
    assert_eq!(e.undo_depth(), 1, "still holding ArrowUp");
    e.on_animation_frame();
    release(&mut e, "ArrowUp");
    assert_eq!(rect_of(&e, id), Rect::new(80.0, 60.0, 80.0, 80.0));
    assert_eq!(e.undo_depth(), 2);
}

fn frame_requests(actions: &[Action]) -> usize {
    actions.iter().filter(|a| **a == Action::FrameRequested).count()
}

#[test]
fn auto_repeat_keydown_keeps_a_single_frame_chain() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));

    // The host runs one animation-frame callback per FrameRequested.
    let mut scheduled = frame_requests(&press(&mut e, "ArrowRight", no_mods()));
    for frame in 1..=3 {
        assert!(press(&mut e, "ArrowRight", no_mods()).is_empty(), "repeat keydown requests nothing");
        assert_eq!(scheduled, 1, "frame {frame}: one callback per frame");
        let callbacks = std::mem::take(&mut scheduled);
        for _ in 0..callbacks {
            scheduled += frame_requests(&e.on_animation_frame());
        }
        assert_eq!(rect_of(&e, id).x, 100.0 + NUDGE_STEP_PX * f64::from(frame));
    }

    release(&mut e, "ArrowRight");
    assert_eq!(e.undo_depth(), 2);
}

#[test]
fn second_arrow_joins_the_running_nudge() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    assert_eq!(frame_requests(&press(&mut e, "ArrowRight", no_mods())), 1);
    assert!(press(&mut e, "ArrowDown", no_mods()).is_empty());

    assert_eq!(frame_requests(&e.on_animation_frame()), 1);
    assert_eq!(rect_of(&e, id), Rect::new(120.0, 120.0, 80.0, 80.0));
}

#[test]
fn rearm_after_release_waits_for_the_pending_frame() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    press(&mut e, "ArrowRight", no_mods());
    release(&mut e, "ArrowRight");
    // The first frame is still scheduled, so a new press rides it.
    assert!(press(&mut e, "ArrowRight", no_mods()).is_empty());
    assert_eq!(frame_requests(&e.on_animation_frame()), 1);
    assert_eq!(rect_of(&e, id).x, 120.0);
}

#[test]
fn nudge_stops_at_canvas_edge() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(395.0, 395.0));
    press(&mut e, "ArrowRight", no_mods());
    e.on_animation_frame();
    e.on_animation_frame();
    release(&mut e, "ArrowRight");
    assert_eq!(rect_of(&e, id).x, 320.0);
    assert_eq!(e.undo_depth(), 1);
}

#[test]
fn arrows_without_selection_do_nothing() {
    let mut e = engine();
    assert!(press(&mut e, "ArrowDown", no_mods()).is_empty());
    assert!(e.on_animation_frame().is_empty());
}

// =============================================================
// Commands
// =============================================================

#[test]
fn duplicate_offsets_and_selects_clone() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    let actions = press(&mut e, "d", ctrl());
    let clone = created_id(&actions).unwrap();
    assert_ne!(clone, id);
    assert_eq!(e.selection(), Some(clone));
    assert_eq!(rect_of(&e, clone), Rect::new(120.0, 120.0, 80.0, 80.0));
    assert_eq!(e.undo_depth(), 2);
}

#[test]
fn delete_key_removes_selection() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    let actions = press(&mut e, "Delete", no_mods());
    assert!(actions.contains(&Action::ShapeDeleted { id }));
    assert!(e.shape(&id).is_none());
    assert_eq!(e.selection(), None);
}

#[test]
fn recolor_selected_commits() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.recolor_selected("#ff00ff");
    assert_eq!(e.shape(&id).unwrap().color, "#ff00ff");
    assert_eq!(e.undo_depth(), 2);
    e.recolor_selected("#ff00ff");
    assert_eq!(e.undo_depth(), 2, "same colour is not a change");
}

#[test]
fn reset_clears_scene_and_is_undoable() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    drop_at(&mut e, "stripe", pt(300.0, 300.0));
    e.reset_scene();
    assert!(e.doc().shapes().is_empty());
    e.undo();
    assert_eq!(e.doc().shapes().len(), 2);
}

// =============================================================
// Undo / redo
// =============================================================

#[test]
fn undo_redo_restore_exact_scenes() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    let after_drop = e.doc().scene().clone();
    drag(&mut e, pt(140.0, 140.0), pt(240.0, 140.0));
    let after_move = e.doc().scene().clone();
    assert_ne!(after_drop, after_move);

    e.undo();
    assert_eq!(*e.doc().scene(), after_drop);
    assert!(e.can_redo());

    e.redo();
    assert_eq!(*e.doc().scene(), after_move);

    e.undo();
    e.undo();
    assert!(e.shape(&id).is_none());
    assert!(!e.can_undo());
    assert!(e.undo().is_empty(), "undo on empty history is a no-op");
}

#[test]
fn keyboard_shortcuts_drive_history() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    press(&mut e, "z", ctrl());
    assert!(e.doc().shapes().is_empty());
    press(&mut e, "Z", Modifiers { ctrl: true, shift: true, ..Modifiers::default() });
    assert_eq!(e.doc().shapes().len(), 1);
    press(&mut e, "z", Modifiers { meta: true, ..Modifiers::default() });
    press(&mut e, "y", ctrl());
    assert_eq!(e.doc().shapes().len(), 1);
}

#[test]
fn new_commit_clears_redo() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    e.undo();
    assert!(e.can_redo());
    drop_at(&mut e, "stripe", pt(300.0, 300.0));
    assert!(!e.can_redo());
}

#[test]
fn undo_during_drag_is_ignored() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    down(&mut e, pt(140.0, 140.0));
    e.on_pointer_move(pt(200.0, 200.0), no_mods());
    assert!(e.undo().is_empty());
    assert!(e.shape(&id).is_some());
}

#[test]
fn undo_closes_open_nudge_first() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    press(&mut e, "ArrowDown", no_mods());
    e.on_animation_frame();
    e.undo();
    // The nudge was committed and then undone.
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 80.0, 80.0));
    assert!(e.can_redo());
}

#[test]
fn history_depth_is_bounded() {
    let mut e = EngineCore::with_history_depth(3);
    e.set_container(400.0, 400.0);
    e.set_catalog(templates());
    for i in 0..5 {
        drop_at(&mut e, "star", pt(40.0 + f64::from(i) * 60.0, 200.0));
    }
    assert_eq!(e.undo_depth(), 3);
}

#[test]
fn commits_bump_revision_and_report_history() {
    let mut e = engine();
    let before = e.revision();
    e.begin_create("star");
    let actions = up(&mut e, pt(140.0, 140.0));
    assert_eq!(e.revision(), before + 1);
    assert!(actions.iter().any(|a| matches!(a, Action::HistoryChanged { can_undo: true, can_redo: false, .. })));
}

// =============================================================
// Lock
// =============================================================

#[test]
fn locked_canvas_rejects_mutations() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.set_locked(true);

    assert!(is_rejected(&e.begin_create("star")));
    assert!(is_rejected(&e.delete_selected()));
    assert!(is_rejected(&e.duplicate_selected()));
    assert!(is_rejected(&e.enter_crop()));
    assert!(is_rejected(&e.undo()));
    assert!(is_rejected(&e.reset_scene()));

    drag(&mut e, pt(140.0, 140.0), pt(300.0, 300.0));
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 80.0, 80.0));
    assert!(press(&mut e, "ArrowRight", no_mods()).is_empty());
    assert_eq!(e.undo_depth(), 1);
}

#[test]
fn locked_canvas_still_selects() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    e.set_locked(true);
    down(&mut e, pt(350.0, 350.0));
    assert_eq!(e.selection(), None);
    down(&mut e, pt(140.0, 140.0));
    assert_eq!(e.selection(), Some(id));
    assert!(matches!(e.input(), InputState::Idle));
}

#[test]
fn locking_commits_open_crop() {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    e.set_crop_inset(CropEdge::Left, 40.0);
    e.set_locked(true);
    assert_eq!(e.crop_target(), None);
    assert_eq!(e.undo_depth(), 2);
    assert!(e.ui().locked);
}

#[test]
fn flags_travel_with_serialized_scene() {
    let mut e = engine();
    e.set_favorited(true);
    e.set_locked(true);
    let s = e.serialize();
    assert!(s.locked);
    assert!(s.favorited);
}

// =============================================================
// Restore
// =============================================================

fn saved_scene() -> SerializedScene {
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    drop_at(&mut e, "stripe", pt(300.0, 300.0));
    e.set_favorited(true);
    e.serialize()
}

#[test]
fn scene_loaded_before_catalog_waits() {
    let saved = saved_scene();
    let mut e = EngineCore::new();
    e.set_container(400.0, 400.0);

    assert!(e.load_scene(saved.clone()).is_empty());
    assert!(e.restore_pending());
    assert!(e.doc().shapes().is_empty());

    let actions = e.set_catalog(templates());
    assert!(actions.contains(&Action::SceneReplaced));
    assert!(!e.restore_pending());
    assert_eq!(e.doc().scene().shapes, saved.body);
    assert!(e.ui().favorited);
    assert!(!e.can_undo(), "restore starts a fresh history");
}

#[test]
fn catalog_before_scene_restores_immediately() {
    let saved = saved_scene();
    let mut e = engine();
    let actions = e.load_scene(saved.clone());
    assert!(actions.contains(&Action::SceneReplaced));
    assert_eq!(e.doc().scene().shapes, saved.body);
}

#[test]
fn late_catalog_does_not_clobber_edits() {
    let saved = saved_scene();
    let mut e = EngineCore::new();
    e.set_container(400.0, 400.0);
    e.load_scene(saved);
    e.set_catalog(templates());

    e.reset_scene();
    assert!(e.set_catalog(templates()).is_empty());
    assert!(e.doc().shapes().is_empty());
}

#[test]
fn missing_templates_are_reported_and_kept() {
    let saved = saved_scene();
    let mut e = EngineCore::new();
    e.set_container(400.0, 400.0);
    e.load_scene(saved);
    let actions = e.set_catalog(vec![template("star")]);
    let unresolved = actions.iter().find_map(|a| match a {
        Action::UnresolvedTemplates { ids } => Some(ids.clone()),
        _ => None,
    });
    assert_eq!(unresolved.map(|ids| ids.len()), Some(1));
    assert_eq!(e.doc().shapes().len(), 2);
}

#[test]
fn restore_resets_gesture_and_selection() {
    let saved = saved_scene();
    let mut e = engine();
    drop_at(&mut e, "star", pt(140.0, 140.0));
    e.enter_crop();
    e.load_scene(saved);
    assert_eq!(e.crop_target(), None);
    assert_eq!(e.selection(), None);
}

#[test]
fn actions_serialize_with_type_tag() {
    let v = serde_json::to_value(Action::SetCursor { cursor: "move".into() }).unwrap();
    assert_eq!(v, serde_json::json!({ "type": "set_cursor", "cursor": "move" }));
    let v = serde_json::to_value(Action::FrameRequested).unwrap();
    assert_eq!(v["type"], "frame_requested");
}

#[test]
fn shift_drag_through_engine_keeps_square() {
    let mut e = engine();
    let id = drop_at(&mut e, "star", pt(140.0, 140.0));
    down(&mut e, pt(180.0, 180.0));
    e.on_pointer_move(pt(260.0, 200.0), shift());
    up(&mut e, pt(260.0, 200.0));
    assert_eq!(rect_of(&e, id), Rect::new(100.0, 100.0, 160.0, 160.0));
}

#[test]
fn restored_geometry_is_fitted_to_the_grid() {
    let mut e = engine();
    let shape = PlacedShape::with_template_id("star".into(), Rect::new(395.0, 7.0, 80.0, 33.0), "#000000");
    let id = shape.instance_id;
    e.load_scene(SerializedScene { body: vec![shape], locked: false, favorited: false });
    assert_eq!(rect_of(&e, id), Rect::new(320.0, 0.0, 80.0, 40.0));
}
