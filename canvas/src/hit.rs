//! Hit-testing against placed shapes and their handles.
//!
//! Resize and rotate handles live in the shape's rotated frame. Crop handles
//! are laid out on the shape's box counter-rotated back to the viewer's axes,
//! so each one moves along a screen axis regardless of rotation.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::Serialize;

use crate::consts::{HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::{CropEdge, InstanceId, PlacedShape, SceneStore};
use crate::geom::{Point, rotate_vec};

/// Which part of a shape was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
    CropHandle(CropEdge),
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [ResizeAnchor; 8] = [
        ResizeAnchor::N,
        ResizeAnchor::Ne,
        ResizeAnchor::E,
        ResizeAnchor::Se,
        ResizeAnchor::S,
        ResizeAnchor::Sw,
        ResizeAnchor::W,
        ResizeAnchor::Nw,
    ];

    /// Sign of the handle on each axis relative to the center: `-1`, `0` or `1`.
    #[must_use]
    pub fn signs(self) -> (f64, f64) {
        match self {
            Self::N => (0.0, -1.0),
            Self::Ne => (1.0, -1.0),
            Self::E => (1.0, 0.0),
            Self::Se => (1.0, 1.0),
            Self::S => (0.0, 1.0),
            Self::Sw => (-1.0, 1.0),
            Self::W => (-1.0, 0.0),
            Self::Nw => (-1.0, -1.0),
        }
    }

    /// Whether this is a corner handle (moves both axes).
    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(self, Self::Ne | Self::Se | Self::Sw | Self::Nw)
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: InstanceId,
    pub part: HitPart,
}

/// Map a canvas point into the shape's local frame (origin at center, unrotated).
#[must_use]
pub fn to_local(shape: &PlacedShape, pt: Point) -> Point {
    let c = shape.rect().center();
    let (x, y) = rotate_vec(pt.x - c.x, pt.y - c.y, -shape.rotation);
    Point::new(x, y)
}

/// Map a point in the shape's local frame back to canvas coordinates.
#[must_use]
pub fn to_canvas(shape: &PlacedShape, local: Point) -> Point {
    let c = shape.rect().center();
    let (x, y) = rotate_vec(local.x, local.y, shape.rotation);
    Point::new(c.x + x, c.y + y)
}

/// Whether `pt` falls inside the shape's rotated bounding box.
#[must_use]
pub fn contains(shape: &PlacedShape, pt: Point) -> bool {
    let local = to_local(shape, pt);
    local.x.abs() <= shape.width * 0.5 && local.y.abs() <= shape.height * 0.5
}

/// Canvas position of a resize handle.
#[must_use]
pub fn resize_handle(shape: &PlacedShape, anchor: ResizeAnchor) -> Point {
    let (sx, sy) = anchor.signs();
    to_canvas(shape, Point::new(sx * shape.width * 0.5, sy * shape.height * 0.5))
}

/// Canvas position of the rotate handle, above the top edge in the shape's frame.
#[must_use]
pub fn rotate_handle(shape: &PlacedShape) -> Point {
    to_canvas(shape, Point::new(0.0, -shape.height * 0.5 - ROTATE_HANDLE_OFFSET_PX))
}

/// Canvas position of a crop handle.
///
/// The crop overlay is the shape's box around its center with rotation
/// undone, so handles sit on viewer-aligned edges, displaced inward by the
/// current inset.
#[must_use]
pub fn crop_handle(shape: &PlacedShape, edge: CropEdge) -> Point {
    let c = shape.rect().center();
    let (left, top) = (c.x - shape.width * 0.5, c.y - shape.height * 0.5);
    let (right, bottom) = (left + shape.width, top + shape.height);
    let crop = shape.crop();
    match edge {
        CropEdge::Top => Point::new(c.x, top + crop.top / 100.0 * shape.height),
        CropEdge::Bottom => Point::new(c.x, bottom - crop.bottom / 100.0 * shape.height),
        CropEdge::Left => Point::new(left + crop.left / 100.0 * shape.width, c.y),
        CropEdge::Right => Point::new(right - crop.right / 100.0 * shape.width, c.y),
    }
}

/// Inset percentage for `edge` implied by a pointer at `pt`, constrained to the edge's axis.
///
/// The result is not clamped; callers pass it through `CropInsets::set`.
#[must_use]
pub fn crop_value_at(shape: &PlacedShape, edge: CropEdge, pt: Point) -> f64 {
    let c = shape.rect().center();
    let (left, top) = (c.x - shape.width * 0.5, c.y - shape.height * 0.5);
    match edge {
        CropEdge::Top => (pt.y - top) / shape.height * 100.0,
        CropEdge::Bottom => (top + shape.height - pt.y) / shape.height * 100.0,
        CropEdge::Left => (pt.x - left) / shape.width * 100.0,
        CropEdge::Right => (left + shape.width - pt.x) / shape.width * 100.0,
    }
}

fn near(a: Point, b: Point) -> bool {
    (a.x - b.x).hypot(a.y - b.y) <= HANDLE_RADIUS_PX
}

/// Test which shape (if any) is under `pt`.
///
/// In crop mode only the crop target's crop handles are considered first.
/// Otherwise the selected shape's rotate and resize handles win over bodies,
/// and bodies are tested top-most first.
#[must_use]
pub fn hit_test(pt: Point, doc: &SceneStore, cropping: Option<InstanceId>) -> Option<Hit> {
    if let Some(shape) = cropping.and_then(|id| doc.get(&id)) {
        for edge in CropEdge::ALL {
            if near(pt, crop_handle(shape, edge)) {
                return Some(Hit { id: shape.instance_id, part: HitPart::CropHandle(edge) });
            }
        }
    } else if let Some(shape) = doc.selected_shape() {
        if near(pt, rotate_handle(shape)) {
            return Some(Hit { id: shape.instance_id, part: HitPart::RotateHandle });
        }
        for anchor in ResizeAnchor::ALL {
            if near(pt, resize_handle(shape, anchor)) {
                return Some(Hit { id: shape.instance_id, part: HitPart::ResizeHandle(anchor) });
            }
        }
    }

    doc.shapes()
        .iter()
        .rev()
        .find(|s| contains(s, pt))
        .map(|s| Hit { id: s.instance_id, part: HitPart::Body })
}
