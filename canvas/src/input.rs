//! Input model: modifier keys, mouse buttons, keys, and the gesture state machine.
//!
//! `Modifiers`, `Button` and `Key` describe a raw event. `InputState` is the
//! pointer gesture being tracked between pointer-down and pointer-up (or, for
//! crop mode, between entering and leaving the crop tool), carrying every
//! value needed to compute live updates and the committed result.
//! `NudgeState` tracks held arrow keys independently of pointer gestures.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::{CropEdge, InstanceId, PlacedShape};
use crate::geom::{Point, Rect};
use crate::hit::ResizeAnchor;
use crate::history::HistoryEntry;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Windows/Linux or Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"ArrowUp"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The arrow direction of this key, if it is an arrow key.
    #[must_use]
    pub fn arrow(&self) -> Option<Arrow> {
        match self.0.as_str() {
            "ArrowUp" => Some(Arrow::Up),
            "ArrowDown" => Some(Arrow::Down),
            "ArrowLeft" => Some(Arrow::Left),
            "ArrowRight" => Some(Arrow::Right),
            _ => None,
        }
    }

    /// Case-insensitive comparison against a single-character shortcut key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(k), None) if k.eq_ignore_ascii_case(&c))
    }
}

/// Arrow key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

/// Arrow keys currently held down. Opposite keys cancel out.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldArrows {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldArrows {
    pub fn set(&mut self, arrow: Arrow, held: bool) {
        match arrow {
            Arrow::Up => self.up = held,
            Arrow::Down => self.down = held,
            Arrow::Left => self.left = held,
            Arrow::Right => self.right = held,
        }
    }

    #[must_use]
    pub fn any(self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Unit direction on each axis: `-1`, `0` or `1`.
    #[must_use]
    pub fn direction(self) -> (f64, f64) {
        let axis = |neg: bool, pos: bool| f64::from(i8::from(pos) - i8::from(neg));
        (axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// An in-progress keyboard nudge gesture.
#[derive(Debug, Clone, Default)]
pub struct NudgeState {
    /// Keys currently held.
    pub held: HeldArrows,
    /// Shape being nudged and the scene before the first frame moved it.
    pub active: Option<(InstanceId, HistoryEntry)>,
    /// A `FrameRequested` is out and its frame has not run yet.
    pub frame_pending: bool,
}

/// Persistent UI flags visible to the renderer.
#[derive(Debug, Clone)]
pub struct UiState {
    /// When set, every shape mutation is rejected; selection still works.
    pub locked: bool,
    /// User marked the design as a favourite.
    pub favorited: bool,
    /// Colour applied to newly created shapes.
    pub active_color: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self { locked: false, favorited: false, active_color: crate::consts::DEFAULT_COLOR.to_string() }
    }
}

/// A crop handle drag inside crop mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropDrag {
    /// Edge whose inset follows the pointer.
    pub edge: CropEdge,
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to compute live
/// updates and the committed result on release. `before` is the scene as it
/// was when the gesture began; it becomes the history entry on commit.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A palette template is being dragged toward the canvas.
    Creating {
        /// Synthetic shape with its final instance id; not in the scene yet.
        shape: PlacedShape,
        /// Last pointer position over the canvas, if any.
        pointer: Option<Point>,
    },
    /// An existing shape follows the pointer.
    Moving {
        id: InstanceId,
        /// Pointer offset from the shape's top-left at grab time.
        grab_dx: f64,
        grab_dy: f64,
        before: HistoryEntry,
    },
    /// A shape is being resized by one of its eight handles.
    Resizing {
        id: InstanceId,
        /// Which corner/edge handle is being dragged.
        anchor: ResizeAnchor,
        /// Pointer position at the start of the resize.
        start: Point,
        /// Shape rectangle at the start of the resize.
        orig: Rect,
        /// Shape rotation, fixed for the whole gesture.
        rotation: f64,
        before: HistoryEntry,
    },
    /// A shape is being rotated around its center.
    Rotating {
        id: InstanceId,
        /// Pivot: the shape's center.
        center: Point,
        /// `initial rotation - initial pointer angle`, in degrees.
        offset: f64,
        before: HistoryEntry,
    },
    /// Crop tool open on one shape. Commits on exit.
    Cropping {
        id: InstanceId,
        /// Active handle drag, if any.
        drag: Option<CropDrag>,
        before: HistoryEntry,
    },
}

impl InputState {
    /// Whether a pointer drag (not crop mode) is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Creating { .. } | Self::Moving { .. } | Self::Resizing { .. } | Self::Rotating { .. })
    }

    /// Shape targeted by the current gesture, if any.
    #[must_use]
    pub fn target(&self) -> Option<InstanceId> {
        match self {
            Self::Idle => None,
            Self::Creating { shape, .. } => Some(shape.instance_id),
            Self::Moving { id, .. } | Self::Resizing { id, .. } | Self::Rotating { id, .. } | Self::Cropping { id, .. } => {
                Some(*id)
            }
        }
    }
}
