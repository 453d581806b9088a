//! Shared numeric constants for the canvas crate.

// ── Grid ────────────────────────────────────────────────────────

/// Snapping quantum, in canvas pixels, applied to committed position and size.
pub const GRID_UNIT: f64 = 20.0;

/// Fraction of the shorter container side used for a newly dropped shape.
pub const DEFAULT_SIZE_RATIO: f64 = 0.2;

/// Upper bound on the default size of a newly dropped shape.
pub const MAX_DEFAULT_SIZE: f64 = 120.0;

/// Smallest width/height a shape may take during a live resize.
pub const MIN_LIVE_SIZE: f64 = 1.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Distance moved per animation frame while an arrow key is held.
pub const NUDGE_STEP_PX: f64 = 20.0;

/// Offset applied to both axes when duplicating a shape.
pub const DUPLICATE_OFFSET: f64 = GRID_UNIT;

// ── Hit-testing ─────────────────────────────────────────────────

/// Hit slop in pixels for resize, rotate and crop handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the top edge of the bounding box to the rotate handle.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

// ── History ─────────────────────────────────────────────────────

/// Default maximum number of undo entries retained.
pub const DEFAULT_HISTORY_DEPTH: usize = 200;

// ── Colour ──────────────────────────────────────────────────────

/// Palette colour used for new shapes until the host picks another.
pub const DEFAULT_COLOR: &str = "#000000";
