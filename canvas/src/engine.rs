//! Interaction controller.
//!
//! `EngineCore` turns pointer, keyboard and command events into scene
//! mutations. Live gestures (move, resize, rotate, crop drags, keyboard
//! nudges) update the scene every frame without snapping so feedback stays
//! responsive; the release snaps to the grid, clamps into the canvas region
//! and pushes exactly one history entry for the whole gesture.
//!
//! The store is mutated only from here and from scene restoration; the host
//! reads state through accessors and the [`crate::render`] plan, and reacts
//! to the returned [`Action`]s.

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Catalog, DesignElement};
use crate::consts::{MIN_LIVE_SIZE, NUDGE_STEP_PX};
use crate::doc::{CropEdge, InstanceId, PartialShape, PlacedShape, SceneStore};
use crate::geom::{Point, Rect, Size, angle_deg, clamp_rect, commit_rect, default_shape_size, normalize_degrees, rotate_vec, snap_down};
use crate::hit::{self, HitPart, ResizeAnchor};
use crate::history::{History, HistoryEntry};
use crate::input::{Button, CropDrag, HeldArrows, InputState, Key, Modifiers, NudgeState, UiState};
use crate::serial::{Restore, RestoreGate, RestoredScene, SerializedScene, serialize};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ShapeCreated { shape: PlacedShape },
    ShapeUpdated { id: InstanceId, fields: PartialShape },
    ShapeDeleted { id: InstanceId },
    SelectionChanged { id: Option<InstanceId> },
    CropModeChanged { id: Option<InstanceId> },
    /// The scene was replaced wholesale (undo, redo, restore, reset).
    SceneReplaced,
    /// A history entry was pushed or the stacks moved.
    HistoryChanged { revision: u64, can_undo: bool, can_redo: bool },
    /// Shapes kept after restore whose templates the catalog lacks.
    UnresolvedTemplates { ids: Vec<InstanceId> },
    /// A mutation was refused, e.g. because the canvas is locked.
    Rejected { reason: String },
    /// Ask the host for another animation frame (keyboard nudge in progress).
    FrameRequested,
    SetCursor { cursor: String },
    RenderNeeded,
}

const LOCKED: &str = "canvas is locked";

/// Core engine state: everything that doesn't depend on the browser.
pub struct EngineCore {
    doc: SceneStore,
    catalog: Catalog,
    history: History,
    ui: UiState,
    input: InputState,
    nudge: NudgeState,
    container: Size,
    restore_gate: RestoreGate,
    revision: u64,
    cursor: String,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            doc: SceneStore::new(),
            catalog: Catalog::pending(),
            history: History::default(),
            ui: UiState::default(),
            input: InputState::default(),
            nudge: NudgeState::default(),
            container: Size::default(),
            restore_gate: RestoreGate::default(),
            revision: 0,
            cursor: "default".to_string(),
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose history keeps at most `depth` undo entries.
    #[must_use]
    pub fn with_history_depth(depth: usize) -> Self {
        Self { history: History::new(depth), ..Self::default() }
    }

    // --- Queries ---

    #[must_use]
    pub fn doc(&self) -> &SceneStore {
        &self.doc
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn container(&self) -> Size {
        self.container
    }

    /// The currently selected shape, if any.
    #[must_use]
    pub fn selection(&self) -> Option<InstanceId> {
        self.doc.selected()
    }

    /// Look up a shape in the active region.
    #[must_use]
    pub fn shape(&self, id: &InstanceId) -> Option<&PlacedShape> {
        self.doc.get(id)
    }

    /// Shape the crop tool is open on, if any.
    #[must_use]
    pub fn crop_target(&self) -> Option<InstanceId> {
        match self.input {
            InputState::Cropping { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Counter bumped by every commit, undo, redo, restore and flag change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.history.undo_len()
    }

    /// Whether a loaded scene is still waiting for the catalog.
    #[must_use]
    pub fn restore_pending(&self) -> bool {
        self.restore_gate.is_pending()
    }

    /// The create-drag ghost: the synthetic shape centered on the pointer, if over the canvas.
    #[must_use]
    pub fn create_preview(&self) -> Option<PlacedShape> {
        let InputState::Creating { shape, pointer: Some(pt) } = &self.input else {
            return None;
        };
        let mut ghost = shape.clone();
        let rect = Rect::centered(*pt, shape.width);
        let (x, y) = clamp_rect(rect.x, rect.y, rect.width, rect.height, self.container.width, self.container.height);
        ghost.x = x;
        ghost.y = y;
        Some(ghost)
    }

    /// Capture the scene for saving.
    #[must_use]
    pub fn serialize(&self) -> SerializedScene {
        serialize(&self.doc, self.ui.locked, self.ui.favorited)
    }

    // --- Data inputs ---

    /// Set the size of the canvas region in pixels.
    pub fn set_container(&mut self, width: f64, height: f64) {
        self.container = Size::new(width.max(0.0), height.max(0.0));
    }

    /// Install the catalog once its fetch resolves. Applies a waiting scene.
    pub fn set_catalog(&mut self, templates: Vec<DesignElement>) -> Vec<Action> {
        self.catalog = Catalog::from_templates(templates);
        self.poll_restore()
    }

    /// Hand over a loaded scene. It is applied as soon as the catalog is ready, once.
    pub fn load_scene(&mut self, serialized: SerializedScene) -> Vec<Action> {
        self.restore_gate.begin(serialized);
        self.poll_restore()
    }

    fn poll_restore(&mut self) -> Vec<Action> {
        match self.restore_gate.poll(&self.catalog) {
            Some(Restore::Complete(scene)) => self.apply_restore(scene, Vec::new()),
            Some(Restore::Partial { scene, unresolved }) => self.apply_restore(scene, unresolved),
            Some(Restore::Deferred) | None => Vec::new(),
        }
    }

    fn apply_restore(&mut self, restored: RestoredScene, unresolved: Vec<InstanceId>) -> Vec<Action> {
        self.input = InputState::Idle;
        self.nudge = NudgeState { frame_pending: self.nudge.frame_pending, ..NudgeState::default() };
        self.doc.clear();
        let fit = self.container.width > 0.0 && self.container.height > 0.0;
        for (region, mut scene) in restored.regions {
            if fit {
                for shape in &mut scene.shapes {
                    shape.set_rect(commit_rect(shape.rect(), self.container));
                }
            }
            self.doc.replace_region(region, scene);
        }
        self.ui.locked = restored.locked;
        self.ui.favorited = restored.favorited;
        self.history.clear();
        self.revision += 1;
        debug!(shapes = self.doc.shapes().len(), unresolved = unresolved.len(), "scene restored");

        let mut actions = vec![
            Action::SceneReplaced,
            Action::SelectionChanged { id: None },
            Action::CropModeChanged { id: None },
            self.history_changed(),
        ];
        if !unresolved.is_empty() {
            actions.push(Action::UnresolvedTemplates { ids: unresolved });
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Flags ---

    /// Lock or unlock the canvas. Locking finishes any open crop or nudge and
    /// abandons a live drag.
    pub fn set_locked(&mut self, locked: bool) -> Vec<Action> {
        if self.ui.locked == locked {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if locked {
            self.finish_interactions(&mut actions);
            self.cancel_drag(&mut actions);
        }
        self.ui.locked = locked;
        self.revision += 1;
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn set_favorited(&mut self, favorited: bool) {
        if self.ui.favorited != favorited {
            self.ui.favorited = favorited;
            self.revision += 1;
        }
    }

    /// Palette colour for shapes created from now on.
    pub fn set_active_color(&mut self, color: &str) {
        self.ui.active_color = color.to_string();
    }

    // --- Create ---

    /// Start dragging a palette template. The synthetic shape gets its
    /// instance id now but only enters the scene on drop.
    pub fn begin_create(&mut self, template_id: &str) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        self.finish_interactions(&mut actions);
        if !matches!(self.input, InputState::Idle) {
            return actions;
        }
        let Some(template) = self.catalog.get(template_id).filter(|t| t.active) else {
            return actions;
        };

        let size = default_shape_size(self.container.width, self.container.height);
        let shape = PlacedShape::new(template, Rect::new(0.0, 0.0, size, size), &self.ui.active_color);
        self.input = InputState::Creating { shape, pointer: None };
        self.push_cursor("copy", &mut actions);
        actions
    }

    /// Abandon a palette drag without inserting anything.
    pub fn cancel_create(&mut self) -> Vec<Action> {
        if !matches!(self.input, InputState::Creating { .. }) {
            return Vec::new();
        }
        self.input = InputState::Idle;
        let mut actions = Vec::new();
        self.push_cursor("default", &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = Vec::new();

        if let InputState::Cropping { id, drag: None, .. } = self.input {
            if let Some(h) = hit::hit_test(pt, &self.doc, Some(id)) {
                if let HitPart::CropHandle(edge) = h.part {
                    if let InputState::Cropping { drag, .. } = &mut self.input {
                        *drag = Some(CropDrag { edge });
                    }
                    return actions;
                }
            }
            self.exit_crop_into(&mut actions);
        }

        if !matches!(self.input, InputState::Idle) {
            return actions;
        }
        self.finish_nudge(&mut actions);

        let Some(h) = hit::hit_test(pt, &self.doc, None) else {
            if self.doc.set_selected(None) {
                actions.push(Action::SelectionChanged { id: None });
            }
            actions.push(Action::RenderNeeded);
            return actions;
        };

        if self.doc.set_selected(Some(h.id)) {
            actions.push(Action::SelectionChanged { id: Some(h.id) });
        }
        actions.push(Action::RenderNeeded);
        if self.ui.locked {
            return actions;
        }

        let Some(shape) = self.doc.get(&h.id) else {
            return actions;
        };
        let before = self.snapshot();
        self.input = match h.part {
            HitPart::Body => InputState::Moving { id: h.id, grab_dx: pt.x - shape.x, grab_dy: pt.y - shape.y, before },
            HitPart::ResizeHandle(anchor) => {
                InputState::Resizing { id: h.id, anchor, start: pt, orig: shape.rect(), rotation: shape.rotation, before }
            }
            HitPart::RotateHandle => {
                let center = shape.rect().center();
                InputState::Rotating { id: h.id, center, offset: shape.rotation - angle_deg(center, pt), before }
            }
            HitPart::CropHandle(_) => InputState::Idle,
        };
        actions
    }

    pub fn on_pointer_move(&mut self, pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        let container = self.container;

        if matches!(self.input, InputState::Idle) {
            let cursor = cursor_for(hit::hit_test(pt, &self.doc, None).map(|h| h.part));
            self.push_cursor(cursor, &mut actions);
            return actions;
        }

        let update = match &mut self.input {
            InputState::Idle | InputState::Cropping { drag: None, .. } => None,
            InputState::Creating { pointer, .. } => {
                *pointer = container.contains(pt).then_some(pt);
                actions.push(Action::RenderNeeded);
                return actions;
            }
            InputState::Moving { id, grab_dx, grab_dy, .. } => {
                let Some(shape) = self.doc.get(id) else {
                    return actions;
                };
                let (x, y) =
                    clamp_rect(pt.x - *grab_dx, pt.y - *grab_dy, shape.width, shape.height, container.width, container.height);
                Some((*id, PartialShape { x: Some(x), y: Some(y), ..Default::default() }))
            }
            InputState::Resizing { id, anchor, start, orig, rotation, .. } => {
                let rect = resize_rect(*orig, *rotation, *anchor, *start, pt, modifiers.shift);
                Some((*id, PartialShape::from_rect(rect)))
            }
            InputState::Rotating { id, center, offset, .. } => {
                let rotation = normalize_degrees(*offset + angle_deg(*center, pt));
                Some((*id, PartialShape { rotation: Some(rotation), ..Default::default() }))
            }
            InputState::Cropping { id, drag: Some(CropDrag { edge }), .. } => {
                let Some(shape) = self.doc.get(id) else {
                    return actions;
                };
                let mut crop = shape.crop();
                crop.set(*edge, hit::crop_value_at(shape, *edge, pt));
                Some((*id, PartialShape { crop_insets: Some(crop), ..Default::default() }))
            }
        };

        if let Some((id, fields)) = update {
            if self.doc.update_shape(&id, &fields) {
                actions.push(Action::ShapeUpdated { id, fields });
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = Vec::new();

        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::Creating { shape, .. } => {
                self.drop_created(shape, pt, &mut actions);
            }
            InputState::Moving { id, before, .. } | InputState::Resizing { id, before, .. } => {
                self.commit_geometry(id, before, &mut actions);
            }
            InputState::Rotating { id, before, .. } => {
                if let Some(rotation) = self.doc.get(&id).map(|s| normalize_degrees(s.rotation)) {
                    self.apply(id, PartialShape { rotation: Some(rotation), ..Default::default() }, &mut actions);
                }
                self.commit(before, &mut actions);
            }
            InputState::Cropping { id, before, .. } => {
                self.input = InputState::Cropping { id, drag: None, before };
            }
        }
        actions
    }

    fn drop_created(&mut self, mut shape: PlacedShape, pt: Point, actions: &mut Vec<Action>) {
        if !self.container.contains(pt) {
            self.push_cursor("default", actions);
            actions.push(Action::RenderNeeded);
            return;
        }
        let before = self.snapshot();
        let rect = commit_rect(Rect::centered(pt, shape.width), self.container);
        shape.set_rect(rect);
        let id = shape.instance_id;

        self.doc.insert(shape.clone());
        actions.push(Action::ShapeCreated { shape });
        if self.doc.set_selected(Some(id)) {
            actions.push(Action::SelectionChanged { id: Some(id) });
        }
        self.commit(before, actions);
        self.push_cursor("default", actions);
        actions.push(Action::RenderNeeded);
    }

    /// Snap and clamp a shape's rectangle, then commit the gesture.
    fn commit_geometry(&mut self, id: InstanceId, before: HistoryEntry, actions: &mut Vec<Action>) {
        if let Some(rect) = self.doc.get(&id).map(|s| commit_rect(s.rect(), self.container)) {
            self.apply(id, PartialShape::from_rect(rect), actions);
        }
        self.commit(before, actions);
        actions.push(Action::RenderNeeded);
    }

    // --- Crop ---

    /// Open the crop tool on the selected shape.
    pub fn enter_crop(&mut self) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        let Some(id) = self.doc.selected() else {
            return actions;
        };
        if self.crop_target() == Some(id) {
            return actions;
        }
        self.finish_interactions(&mut actions);
        if !matches!(self.input, InputState::Idle) {
            return actions;
        }
        let before = self.snapshot();
        self.input = InputState::Cropping { id, drag: None, before };
        actions.push(Action::CropModeChanged { id: Some(id) });
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Set one inset of the shape in crop mode, clamped to `[0, 100]`.
    pub fn set_crop_inset(&mut self, edge: CropEdge, value: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(id) = self.crop_target() else {
            return actions;
        };
        let Some(mut crop) = self.doc.get(&id).map(PlacedShape::crop) else {
            return actions;
        };
        crop.set(edge, value);
        self.apply(id, PartialShape { crop_insets: Some(crop), ..Default::default() }, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Close the crop tool, committing the final insets.
    pub fn exit_crop(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.exit_crop_into(&mut actions);
        actions
    }

    fn exit_crop_into(&mut self, actions: &mut Vec<Action>) {
        if !matches!(self.input, InputState::Cropping { .. }) {
            return;
        }
        let InputState::Cropping { id, before, .. } = std::mem::take(&mut self.input) else {
            return;
        };
        if let Some(crop) = self.doc.get(&id).and_then(|s| s.crop_insets) {
            if crop.is_degenerate() {
                warn!(instance_id = %id, ?crop, "crop insets overlap; visible region is empty");
            }
        }
        self.commit(before, actions);
        actions.push(Action::CropModeChanged { id: None });
        actions.push(Action::RenderNeeded);
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            if key.is_char('z') {
                return if modifiers.shift { self.redo() } else { self.undo() };
            }
            if key.is_char('y') {
                return self.redo();
            }
            if key.is_char('d') {
                return self.duplicate_selected();
            }
            return Vec::new();
        }

        if let Some(arrow) = key.arrow() {
            if self.ui.locked || !matches!(self.input, InputState::Idle) {
                return Vec::new();
            }
            let Some(id) = self.doc.selected() else {
                return Vec::new();
            };
            self.nudge.held.set(arrow, true);
            if self.nudge.active.is_none() {
                self.nudge.active = Some((id, self.snapshot()));
            }
            // Auto-repeat and extra arrows ride the frame already scheduled.
            if self.nudge.frame_pending {
                return Vec::new();
            }
            self.nudge.frame_pending = true;
            return vec![Action::FrameRequested];
        }

        match key.0.as_str() {
            "Delete" | "Backspace" => self.delete_selected(),
            "Escape" => self.escape(),
            _ => Vec::new(),
        }
    }

    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(arrow) = key.arrow() else {
            return actions;
        };
        self.nudge.held.set(arrow, false);
        if !self.nudge.held.any() {
            self.finish_nudge(&mut actions);
        }
        actions
    }

    /// Advance a held-arrow nudge by one frame.
    pub fn on_animation_frame(&mut self) -> Vec<Action> {
        self.nudge.frame_pending = false;
        let mut actions = Vec::new();
        let Some(id) = self.nudge.active.as_ref().map(|(id, _)| *id) else {
            return actions;
        };
        if !self.nudge.held.any() {
            return actions;
        }
        let Some(shape) = self.doc.get(&id) else {
            self.nudge = NudgeState::default();
            return actions;
        };

        let (dx, dy) = self.nudge.held.direction();
        let max_x = snap_down((self.container.width - shape.width).max(0.0));
        let max_y = snap_down((self.container.height - shape.height).max(0.0));
        let x = (shape.x + dx * NUDGE_STEP_PX).clamp(0.0, max_x);
        let y = (shape.y + dy * NUDGE_STEP_PX).clamp(0.0, max_y);

        self.apply(id, PartialShape { x: Some(x), y: Some(y), ..Default::default() }, &mut actions);
        self.nudge.frame_pending = true;
        actions.push(Action::FrameRequested);
        actions.push(Action::RenderNeeded);
        actions
    }

    fn finish_nudge(&mut self, actions: &mut Vec<Action>) {
        self.nudge.held = HeldArrows::default();
        let Some((id, before)) = self.nudge.active.take() else {
            return;
        };
        self.commit_geometry(id, before, actions);
    }

    fn escape(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        match self.input {
            InputState::Creating { .. } => return self.cancel_create(),
            InputState::Cropping { .. } => self.exit_crop_into(&mut actions),
            InputState::Moving { .. } | InputState::Resizing { .. } | InputState::Rotating { .. } => {
                self.cancel_drag(&mut actions);
            }
            InputState::Idle => {
                self.finish_nudge(&mut actions);
                if self.doc.set_selected(None) {
                    actions.push(Action::SelectionChanged { id: None });
                    actions.push(Action::RenderNeeded);
                }
            }
        }
        actions
    }

    // --- Commands ---

    /// Remove the selected shape.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        self.finish_interactions(&mut actions);
        if !matches!(self.input, InputState::Idle) {
            return actions;
        }
        let Some(id) = self.doc.selected() else {
            return actions;
        };
        let before = self.snapshot();
        if self.doc.remove_shape(&id).is_some() {
            actions.push(Action::ShapeDeleted { id });
            actions.push(Action::SelectionChanged { id: None });
            self.commit(before, &mut actions);
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Clone the selected shape one grid step away and select the clone.
    pub fn duplicate_selected(&mut self) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        self.finish_interactions(&mut actions);
        if !matches!(self.input, InputState::Idle) {
            return actions;
        }
        let Some(id) = self.doc.selected() else {
            return actions;
        };
        let before = self.snapshot();
        let Some(new_id) = self.doc.duplicate_shape(&id, self.container) else {
            return actions;
        };
        if let Some(shape) = self.doc.get(&new_id) {
            actions.push(Action::ShapeCreated { shape: shape.clone() });
        }
        self.doc.set_selected(Some(new_id));
        actions.push(Action::SelectionChanged { id: Some(new_id) });
        self.commit(before, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Change the selected shape's colour.
    pub fn recolor_selected(&mut self, color: &str) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        if self.input.is_dragging() {
            return actions;
        }
        let Some(id) = self.doc.selected() else {
            return actions;
        };
        let before = self.snapshot();
        self.apply(id, PartialShape { color: Some(color.to_string()), ..Default::default() }, &mut actions);
        if self.crop_target().is_none() {
            self.commit(before, &mut actions);
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Remove every shape from the active region.
    pub fn reset_scene(&mut self) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        self.finish_interactions(&mut actions);
        self.cancel_drag(&mut actions);
        let before = self.snapshot();
        self.doc.replace_all(Vec::new());
        actions.push(Action::SceneReplaced);
        actions.push(Action::SelectionChanged { id: None });
        self.commit(before, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.step_history(true)
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.step_history(false)
    }

    fn step_history(&mut self, back: bool) -> Vec<Action> {
        if self.ui.locked {
            return rejected();
        }
        let mut actions = Vec::new();
        if self.input.is_dragging() {
            return actions;
        }
        self.finish_interactions(&mut actions);

        let current = self.snapshot();
        let entry = if back { self.history.undo(current) } else { self.history.redo(current) };
        let Some(entry) = entry else {
            return actions;
        };

        let selected = self.doc.selected();
        self.doc.set_active_region(entry.region);
        self.doc.replace_region(entry.region, entry.scene);
        self.revision += 1;
        debug!(revision = self.revision, back, "history step");

        actions.push(Action::SceneReplaced);
        if self.doc.selected() != selected {
            actions.push(Action::SelectionChanged { id: self.doc.selected() });
        }
        actions.push(self.history_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Internals ---

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry { region: self.doc.active_region(), scene: self.doc.scene().clone() }
    }

    /// Push `before` unless the gesture left the scene unchanged.
    fn commit(&mut self, before: HistoryEntry, actions: &mut Vec<Action>) {
        if before.region == self.doc.active_region() && before.scene == *self.doc.scene() {
            return;
        }
        self.history.commit(before);
        self.revision += 1;
        debug!(revision = self.revision, depth = self.history.undo_len(), "history commit");
        actions.push(self.history_changed());
    }

    fn apply(&mut self, id: InstanceId, fields: PartialShape, actions: &mut Vec<Action>) {
        if self.doc.update_shape(&id, &fields) {
            actions.push(Action::ShapeUpdated { id, fields });
        }
    }

    /// Close the crop tool and end a keyboard nudge, committing both.
    fn finish_interactions(&mut self, actions: &mut Vec<Action>) {
        self.exit_crop_into(actions);
        self.finish_nudge(actions);
    }

    /// Abandon a live move/resize/rotate/create, restoring the pre-gesture scene.
    fn cancel_drag(&mut self, actions: &mut Vec<Action>) {
        match std::mem::take(&mut self.input) {
            InputState::Moving { before, .. } | InputState::Resizing { before, .. } | InputState::Rotating { before, .. } => {
                self.doc.replace_region(before.region, before.scene);
                actions.push(Action::SceneReplaced);
                actions.push(Action::RenderNeeded);
            }
            InputState::Creating { .. } => actions.push(Action::RenderNeeded),
            other @ (InputState::Idle | InputState::Cropping { .. }) => self.input = other,
        }
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { revision: self.revision, can_undo: self.can_undo(), can_redo: self.can_redo() }
    }

    fn push_cursor(&mut self, cursor: &str, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor.to_string();
            actions.push(Action::SetCursor { cursor: cursor.to_string() });
        }
    }
}

fn rejected() -> Vec<Action> {
    vec![Action::Rejected { reason: LOCKED.to_string() }]
}

fn cursor_for(part: Option<HitPart>) -> &'static str {
    match part {
        None => "default",
        Some(HitPart::Body) => "move",
        Some(HitPart::RotateHandle) => "grab",
        Some(HitPart::ResizeHandle(ResizeAnchor::N | ResizeAnchor::S) | HitPart::CropHandle(CropEdge::Top | CropEdge::Bottom)) => {
            "ns-resize"
        }
        Some(HitPart::ResizeHandle(ResizeAnchor::E | ResizeAnchor::W) | HitPart::CropHandle(CropEdge::Left | CropEdge::Right)) => {
            "ew-resize"
        }
        Some(HitPart::ResizeHandle(ResizeAnchor::Ne | ResizeAnchor::Sw)) => "nesw-resize",
        Some(HitPart::ResizeHandle(ResizeAnchor::Nw | ResizeAnchor::Se)) => "nwse-resize",
    }
}

/// Live rectangle for a resize drag.
///
/// The pointer delta is taken in the shape's rotated frame, the dragged
/// edges follow it, and the opposite handle stays fixed on the canvas.
/// With `keep_aspect`, corner handles preserve the original aspect ratio.
#[must_use]
pub fn resize_rect(orig: Rect, rotation: f64, anchor: ResizeAnchor, start: Point, pt: Point, keep_aspect: bool) -> Rect {
    let (sx, sy) = anchor.signs();
    let (dx, dy) = rotate_vec(pt.x - start.x, pt.y - start.y, -rotation);

    let mut w = (orig.width + sx * dx).max(MIN_LIVE_SIZE);
    let mut h = (orig.height + sy * dy).max(MIN_LIVE_SIZE);
    if keep_aspect && anchor.is_corner() && orig.width > 0.0 && orig.height > 0.0 {
        let ratio = orig.width / orig.height;
        if w / orig.width >= h / orig.height {
            h = w / ratio;
        } else {
            w = h * ratio;
        }
    }

    let fixed = (-sx * orig.width * 0.5, -sy * orig.height * 0.5);
    let moved = (-sx * w * 0.5, -sy * h * 0.5);
    let (ox, oy) = rotate_vec(fixed.0 - moved.0, fixed.1 - moved.1, rotation);
    let c = orig.center();
    Rect::new(c.x + ox - w * 0.5, c.y + oy - h * 0.5, w, h)
}
