//! Geometry and grid snapping.
//!
//! Pure functions that turn pointer and container coordinates into
//! grid-aligned shape rectangles. Nothing here holds state or fails: given
//! finite inputs and a positive container every function returns a finite
//! result. The interaction controller calls [`commit_rect`] at every commit
//! point, which is what keeps committed geometry on the grid and inside the
//! canvas region.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SIZE_RATIO, GRID_UNIT, MAX_DEFAULT_SIZE};

/// A point in canvas-region coordinates (pixels from the region's top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of the canvas region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether `pt` lies inside `[0, width] × [0, height]`.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= 0.0 && pt.y >= 0.0 && pt.x <= self.width && pt.y <= self.height
    }
}

/// Axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Square of side `size` centered on `center`.
    #[must_use]
    pub fn centered(center: Point, size: f64) -> Self {
        Self { x: center.x - size * 0.5, y: center.y - size * 0.5, width: size, height: size }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Round `value` to the nearest multiple of [`GRID_UNIT`].
#[must_use]
pub fn snap(value: f64) -> f64 {
    (value / GRID_UNIT).round() * GRID_UNIT
}

/// Largest multiple of [`GRID_UNIT`] not greater than `value`.
#[must_use]
pub fn snap_down(value: f64) -> f64 {
    (value / GRID_UNIT).floor() * GRID_UNIT
}

/// Side length for a newly dropped shape in a `container_w × container_h` region.
///
/// `min(0.2 · min(w, h), MAX_DEFAULT_SIZE)`, snapped, and never below one grid unit.
#[must_use]
pub fn default_shape_size(container_w: f64, container_h: f64) -> f64 {
    let raw = (DEFAULT_SIZE_RATIO * container_w.min(container_h)).min(MAX_DEFAULT_SIZE);
    snap(raw).max(GRID_UNIT)
}

/// Clamp the top-left corner so a `w × h` rectangle stays inside the container.
///
/// A rectangle larger than the container is pinned to the origin on that axis.
#[must_use]
pub fn clamp_rect(x: f64, y: f64, w: f64, h: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let max_x = (container_w - w).max(0.0);
    let max_y = (container_h - h).max(0.0);
    (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}

/// Produce the committed form of a live rectangle.
///
/// Size is snapped (at least one grid unit, at most the grid-aligned container
/// extent), then position is clamped, snapped, and clamped again against the
/// grid-aligned free space so the result is both on the grid and inside the
/// container.
#[must_use]
pub fn commit_rect(rect: Rect, container: Size) -> Rect {
    let width = fit_extent(rect.width, container.width);
    let height = fit_extent(rect.height, container.height);

    let (x, y) = clamp_rect(rect.x, rect.y, width, height, container.width, container.height);
    let max_x = snap_down((container.width - width).max(0.0));
    let max_y = snap_down((container.height - height).max(0.0));

    Rect { x: snap(x).clamp(0.0, max_x), y: snap(y).clamp(0.0, max_y), width, height }
}

fn fit_extent(extent: f64, container_extent: f64) -> f64 {
    let limit = snap_down(container_extent).max(GRID_UNIT);
    snap(extent).clamp(GRID_UNIT, limit)
}

/// Map any angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

/// Angle in degrees of the vector from `center` to `pt`, measured clockwise
/// from the positive x axis in screen orientation (y down).
#[must_use]
pub fn angle_deg(center: Point, pt: Point) -> f64 {
    (pt.y - center.y).atan2(pt.x - center.x).to_degrees()
}

/// Rotate the vector `(x, y)` by `deg` degrees (clockwise on screen).
#[must_use]
pub fn rotate_vec(x: f64, y: f64, deg: f64) -> (f64, f64) {
    let (sin, cos) = deg.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}
