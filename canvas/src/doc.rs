//! Document model: placed shapes, canvas regions, and the in-memory store.
//!
//! This module defines what is on the canvas (`PlacedShape`), a sparse-update
//! type for incremental edits (`PartialShape`), the per-edge crop insets
//! (`CropInsets`), the region identifiers a garment exposes (`Region`), and
//! the store that owns every region's scene plus the current selection
//! (`SceneStore`).
//!
//! A placed shape only *references* its template by id. The draw procedure is
//! resolved through the catalog when rendering, so shapes stay plain data
//! that serializes as-is.
//!
//! Every store operation is total: unknown ids are ignored and reported via
//! the return value, never as an error.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::DesignElement;
use crate::consts::DUPLICATE_OFFSET;
use crate::geom::{Rect, Size, clamp_rect, snap_down};

/// Unique identifier for a placed shape. Never reused within a scene's lifetime.
pub type InstanceId = Uuid;

/// Identifier of a catalog template.
pub type TemplateId = String;

/// Generate a fresh instance id.
#[must_use]
pub fn new_instance_id() -> InstanceId {
    Uuid::new_v4()
}

// =============================================================
// Regions
// =============================================================

/// A named area of the garment that owns its own scene.
///
/// Only the body is editable today; every region-keyed lookup goes through
/// this enum so adding one is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Main garment body.
    #[default]
    Body,
}

impl Region {
    /// Every region, in serialization order.
    pub const ALL: [Region; 1] = [Region::Body];

    /// Display name of the region.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Body => "Body",
        }
    }
}

// =============================================================
// Crop insets
// =============================================================

/// One edge of a shape's crop box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropEdge {
    Top,
    Right,
    Bottom,
    Left,
}

impl CropEdge {
    pub const ALL: [CropEdge; 4] = [CropEdge::Top, CropEdge::Right, CropEdge::Bottom, CropEdge::Left];
}

/// Per-edge crop as a percentage of the shape's own bounding box.
///
/// Each edge is clamped to `[0, 100]` independently. Opposite edges are not
/// coupled: `top + bottom > 100` is stored as-is and reported by
/// [`CropInsets::is_degenerate`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl CropInsets {
    /// Clamp a requested inset into `[0, 100]`. Non-finite input maps to 0.
    #[must_use]
    pub fn clamp_value(value: f64) -> f64 {
        if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 }
    }

    /// Copy with every edge clamped.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            top: Self::clamp_value(self.top),
            right: Self::clamp_value(self.right),
            bottom: Self::clamp_value(self.bottom),
            left: Self::clamp_value(self.left),
        }
    }

    #[must_use]
    pub fn get(&self, edge: CropEdge) -> f64 {
        match edge {
            CropEdge::Top => self.top,
            CropEdge::Right => self.right,
            CropEdge::Bottom => self.bottom,
            CropEdge::Left => self.left,
        }
    }

    /// Set one edge, clamping the value.
    pub fn set(&mut self, edge: CropEdge, value: f64) {
        let v = Self::clamp_value(value);
        match edge {
            CropEdge::Top => self.top = v,
            CropEdge::Right => self.right = v,
            CropEdge::Bottom => self.bottom = v,
            CropEdge::Left => self.left = v,
        }
    }

    /// Whether opposite edges overlap, leaving no visible region.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.top + self.bottom > 100.0 || self.left + self.right > 100.0
    }

    /// Whether every edge is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

// =============================================================
// Placed shapes
// =============================================================

/// One occurrence of a catalog template on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedShape {
    /// Unique identifier for this placement.
    pub instance_id: InstanceId,
    /// Catalog template this shape draws with.
    pub template_id: TemplateId,
    /// Left edge of the unrotated bounding box, relative to the region origin.
    pub x: f64,
    /// Top edge of the unrotated bounding box, relative to the region origin.
    pub y: f64,
    /// Width of the bounding box; always positive.
    pub width: f64,
    /// Height of the bounding box; always positive.
    pub height: f64,
    /// Clockwise rotation in degrees around the box center, in `[0, 360)` once committed.
    #[serde(default)]
    pub rotation: f64,
    /// Colour passed to the template's draw procedure.
    pub color: String,
    /// Optional per-edge crop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_insets: Option<CropInsets>,
}

impl PlacedShape {
    /// Create a shape for `template` occupying `rect`, with a fresh instance id.
    #[must_use]
    pub fn new(template: &DesignElement, rect: Rect, color: &str) -> Self {
        Self::with_template_id(template.id.clone(), rect, color)
    }

    /// Create a shape from a bare template id, with a fresh instance id.
    #[must_use]
    pub fn with_template_id(template_id: TemplateId, rect: Rect, color: &str) -> Self {
        Self {
            instance_id: new_instance_id(),
            template_id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rotation: 0.0,
            color: color.to_string(),
            crop_insets: None,
        }
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }

    /// Crop insets, or all-zero when none are set.
    #[must_use]
    pub fn crop(&self) -> CropInsets {
        self.crop_insets.unwrap_or_default()
    }
}

/// Sparse update for a placed shape. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialShape {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New crop insets; each edge is clamped on apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_insets: Option<CropInsets>,
}

impl PartialShape {
    /// Partial carrying the full rectangle.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    /// Partial carrying every mutable field of `shape`.
    #[must_use]
    pub fn from_shape(shape: &PlacedShape) -> Self {
        Self {
            rotation: Some(shape.rotation),
            color: Some(shape.color.clone()),
            crop_insets: shape.crop_insets,
            ..Self::from_rect(shape.rect())
        }
    }
}

// =============================================================
// Scene
// =============================================================

/// Ordered shapes of one region. Order is array identity only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    pub shapes: Vec<PlacedShape>,
}

impl Scene {
    #[must_use]
    pub fn new(shapes: Vec<PlacedShape>) -> Self {
        Self { shapes }
    }

    #[must_use]
    pub fn get(&self, id: &InstanceId) -> Option<&PlacedShape> {
        self.shapes.iter().find(|s| s.instance_id == *id)
    }

    fn get_mut(&mut self, id: &InstanceId) -> Option<&mut PlacedShape> {
        self.shapes.iter_mut().find(|s| s.instance_id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

// =============================================================
// Scene store
// =============================================================

/// Authoritative store of every region's scene plus the selection.
///
/// Operations act on the active region. Selection is by instance id and is
/// cleared whenever the selected shape leaves the active scene.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    scenes: BTreeMap<Region, Scene>,
    active: Region,
    selected: Option<InstanceId>,
}

impl SceneStore {
    /// Create a store with an empty scene for every region.
    #[must_use]
    pub fn new() -> Self {
        let scenes = Region::ALL.iter().map(|r| (*r, Scene::default())).collect();
        Self { scenes, active: Region::default(), selected: None }
    }

    /// Region that operations currently target.
    #[must_use]
    pub fn active_region(&self) -> Region {
        self.active
    }

    /// Switch the active region. Clears the selection.
    pub fn set_active_region(&mut self, region: Region) {
        if self.active != region {
            self.active = region;
            self.selected = None;
        }
    }

    /// Scene of the active region.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene_of(self.active)
    }

    /// Scene of any region.
    #[must_use]
    pub fn scene_of(&self, region: Region) -> &Scene {
        static EMPTY: Scene = Scene { shapes: Vec::new() };
        self.scenes.get(&region).unwrap_or(&EMPTY)
    }

    fn scene_mut(&mut self) -> &mut Scene {
        self.scenes.entry(self.active).or_default()
    }

    /// Look up a shape in the active region.
    #[must_use]
    pub fn get(&self, id: &InstanceId) -> Option<&PlacedShape> {
        self.scene().get(id)
    }

    /// Shapes of the active region in draw order (first is bottom-most).
    #[must_use]
    pub fn shapes(&self) -> &[PlacedShape] {
        &self.scene().shapes
    }

    /// Insert a new shape for `template` at `rect`. Returns its instance id.
    pub fn add_shape(&mut self, template: &DesignElement, rect: Rect, color: &str) -> InstanceId {
        let shape = PlacedShape::new(template, rect, color);
        let id = shape.instance_id;
        self.scene_mut().shapes.push(shape);
        id
    }

    /// Insert a fully formed shape. An existing shape with the same id is replaced in place.
    pub fn insert(&mut self, shape: PlacedShape) {
        let scene = self.scene_mut();
        if let Some(existing) = scene.get_mut(&shape.instance_id) {
            *existing = shape;
        } else {
            scene.shapes.push(shape);
        }
    }

    /// Apply a partial update. Returns false if the shape doesn't exist.
    pub fn update_shape(&mut self, id: &InstanceId, partial: &PartialShape) -> bool {
        let Some(shape) = self.scene_mut().get_mut(id) else {
            return false;
        };
        if let Some(x) = partial.x {
            shape.x = x;
        }
        if let Some(y) = partial.y {
            shape.y = y;
        }
        if let Some(w) = partial.width {
            shape.width = w;
        }
        if let Some(h) = partial.height {
            shape.height = h;
        }
        if let Some(r) = partial.rotation {
            shape.rotation = r;
        }
        if let Some(ref c) = partial.color {
            shape.color.clone_from(c);
        }
        if let Some(insets) = partial.crop_insets {
            shape.crop_insets = Some(insets.clamped());
        }
        true
    }

    /// Remove a shape, returning it if it was present.
    pub fn remove_shape(&mut self, id: &InstanceId) -> Option<PlacedShape> {
        let scene = self.scene_mut();
        let idx = scene.shapes.iter().position(|s| s.instance_id == *id)?;
        let removed = scene.shapes.remove(idx);
        if self.selected == Some(*id) {
            self.selected = None;
        }
        Some(removed)
    }

    /// Clone a shape under a fresh id, offset by one grid step and kept inside `bounds`.
    ///
    /// Returns the new id, or `None` if `id` is unknown.
    pub fn duplicate_shape(&mut self, id: &InstanceId, bounds: Size) -> Option<InstanceId> {
        let source = self.get(id)?;
        let mut clone = source.clone();
        clone.instance_id = new_instance_id();

        let (x, y) = clamp_rect(
            clone.x + DUPLICATE_OFFSET,
            clone.y + DUPLICATE_OFFSET,
            clone.width,
            clone.height,
            bounds.width,
            bounds.height,
        );
        // Keep on the grid when the free space is not a multiple of it.
        clone.x = x.min(snap_down((bounds.width - clone.width).max(0.0))).max(0.0);
        clone.y = y.min(snap_down((bounds.height - clone.height).max(0.0))).max(0.0);

        let new_id = clone.instance_id;
        self.scene_mut().shapes.push(clone);
        Some(new_id)
    }

    /// The currently selected shape id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<InstanceId> {
        self.selected
    }

    /// The currently selected shape, if any.
    #[must_use]
    pub fn selected_shape(&self) -> Option<&PlacedShape> {
        self.selected.and_then(|id| self.get(&id))
    }

    /// Select a shape or clear the selection. Unknown ids leave the selection unchanged.
    ///
    /// Returns true if the selection changed.
    pub fn set_selected(&mut self, id: Option<InstanceId>) -> bool {
        if let Some(ref target) = id {
            if !self.scene().contains(target) {
                return false;
            }
        }
        let changed = self.selected != id;
        self.selected = id;
        changed
    }

    /// Replace the active region's shapes wholesale.
    pub fn replace_all(&mut self, shapes: Vec<PlacedShape>) {
        let region = self.active;
        self.replace_region(region, Scene::new(shapes));
    }

    /// Replace one region's scene wholesale, dropping a now-dangling selection.
    pub fn replace_region(&mut self, region: Region, scene: Scene) {
        self.scenes.insert(region, scene);
        if let Some(id) = self.selected {
            if !self.scene().contains(&id) {
                self.selected = None;
            }
        }
    }

    /// Empty every region and clear the selection.
    pub fn clear(&mut self) {
        for scene in self.scenes.values_mut() {
            scene.shapes.clear();
        }
        self.selected = None;
    }
}
