//! Rendering: turns engine state into a display list for the host to paint.
//!
//! This module does not draw. It receives a read-only view of the engine and
//! produces a [`RenderPlan`]: shapes in paint order with their resolved
//! visuals and crop clips, the create-drag ghost, selection chrome, and the
//! crop overlay. The host paints the plan with whatever surface it owns
//! (Canvas2D, SVG, DOM) and never mutates engine state.
//!
//! Geometry is in canvas-region coordinates. Each item's `rect` is the
//! unrotated box; the host rotates by `rotation` degrees clockwise around the
//! box center. `clip` is expressed in the box's own frame (origin at its
//! top-left, before rotation), so crop follows the shape when it turns.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::catalog::{Catalog, Visual};
use crate::doc::{CropEdge, CropInsets, InstanceId, PlacedShape};
use crate::engine::EngineCore;
use crate::geom::{Point, Rect, Size};
use crate::hit::{self, ResizeAnchor};

/// Everything the host needs to paint one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub container: Size,
    pub locked: bool,
    /// Shapes bottom-most first.
    pub items: Vec<RenderItem>,
    /// Translucent ghost of a palette template being dragged over the canvas.
    pub preview: Option<RenderItem>,
    pub selection: Option<SelectionChrome>,
    pub crop: Option<CropOverlay>,
}

/// One shape, ready to paint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderItem {
    pub instance_id: InstanceId,
    pub rect: Rect,
    pub rotation: f64,
    pub visual: Visual,
    /// Visible part of the box in its local frame; `None` when uncropped.
    pub clip: Option<Rect>,
    pub selected: bool,
}

/// Outline and handles around the selected shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChrome {
    pub instance_id: InstanceId,
    /// Rotated box corners, clockwise from the top-left.
    pub outline: [Point; 4],
    /// Empty when the canvas is locked.
    pub resize_handles: Vec<ResizeHandle>,
    pub rotate_handle: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResizeHandle {
    pub anchor: ResizeAnchor,
    pub at: Point,
}

/// Crop tool chrome for the shape in crop mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropOverlay {
    pub instance_id: InstanceId,
    /// Viewer-aligned box the crop handles move on.
    pub frame: Rect,
    pub insets: CropInsets,
    pub handles: Vec<CropHandle>,
    /// Opposite insets overlap; nothing of the shape is visible.
    pub degenerate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropHandle {
    pub edge: CropEdge,
    pub at: Point,
}

/// Build the display list for the engine's current state.
#[must_use]
pub fn plan(core: &EngineCore) -> RenderPlan {
    let doc = core.doc();
    let selected = doc.selected();
    let locked = core.ui().locked;

    let items = doc.shapes().iter().map(|s| item(s, core.catalog(), selected == Some(s.instance_id))).collect();
    let preview = core.create_preview().map(|s| item(&s, core.catalog(), false));

    let crop_target = core.crop_target();
    let crop = crop_target.and_then(|id| doc.get(&id)).map(crop_overlay);

    // Crop chrome replaces the selection handles while the tool is open.
    let selection = doc.selected_shape().map(|s| {
        let interactive = !locked && crop_target.is_none();
        selection_chrome(s, interactive)
    });

    RenderPlan { container: core.container(), locked, items, preview, selection, crop }
}

fn item(shape: &PlacedShape, catalog: &Catalog, selected: bool) -> RenderItem {
    RenderItem {
        instance_id: shape.instance_id,
        rect: shape.rect(),
        rotation: shape.rotation,
        visual: catalog.visual(&shape.template_id, &shape.color),
        clip: clip_rect(shape),
        selected,
    }
}

/// Visible region of a cropped shape in its local frame.
///
/// Returns `None` for an uncropped shape. A degenerate crop yields a
/// zero-sized clip rather than a negative one.
#[must_use]
pub fn clip_rect(shape: &PlacedShape) -> Option<Rect> {
    let crop = shape.crop_insets?;
    if crop.is_empty() {
        return None;
    }
    let x = crop.left / 100.0 * shape.width;
    let y = crop.top / 100.0 * shape.height;
    let width = ((100.0 - crop.left - crop.right) / 100.0 * shape.width).max(0.0);
    let height = ((100.0 - crop.top - crop.bottom) / 100.0 * shape.height).max(0.0);
    Some(Rect::new(x, y, width, height))
}

/// Corners of the shape's rotated box, clockwise from the top-left.
#[must_use]
pub fn outline(shape: &PlacedShape) -> [Point; 4] {
    let (hw, hh) = (shape.width * 0.5, shape.height * 0.5);
    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(x, y)| hit::to_canvas(shape, Point::new(x, y)))
}

fn selection_chrome(shape: &PlacedShape, interactive: bool) -> SelectionChrome {
    let (resize_handles, rotate_handle) = if interactive {
        let handles = ResizeAnchor::ALL.iter().map(|&anchor| ResizeHandle { anchor, at: hit::resize_handle(shape, anchor) }).collect();
        (handles, Some(hit::rotate_handle(shape)))
    } else {
        (Vec::new(), None)
    };
    SelectionChrome { instance_id: shape.instance_id, outline: outline(shape), resize_handles, rotate_handle }
}

fn crop_overlay(shape: &PlacedShape) -> CropOverlay {
    let insets = shape.crop();
    CropOverlay {
        instance_id: shape.instance_id,
        frame: shape.rect(),
        insets,
        handles: CropEdge::ALL.iter().map(|&edge| CropHandle { edge, at: hit::crop_handle(shape, edge) }).collect(),
        degenerate: insets.is_degenerate(),
    }
}
