//! Input model: tool identifiers, modifier keys, mouse buttons, and the router
//! state machine.
//!
//! `ToolId` and `Modifiers` capture the user's intent at the time of an event.
//! `InputState` is what the router is currently doing with the pointer: resting
//! on a tool, panning, waiting for a placement click, or tracking a native
//! editing gesture between pointer-down and pointer-up.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::ObjectId;
use crate::hit::ResizeAnchor;
use crate::viewport::Point;

/// Every tool the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    /// Pointer / selection tool; the rest state.
    #[default]
    Select,
    /// Drag out a rectangle.
    Rect,
    /// Drag out an ellipse (circle with Shift).
    Ellipse,
    /// Drag out a straight line.
    Line,
    /// Click vertices of a closed polygon.
    Polygon,
    /// Freehand strokes.
    Pencil,
    /// Click to place editable text.
    Text,
    /// Geo-code placement.
    Tag,
}

impl ToolId {
    pub const ALL: [ToolId; 8] = [
        Self::Select,
        Self::Rect,
        Self::Ellipse,
        Self::Line,
        Self::Polygon,
        Self::Pencil,
        Self::Text,
        Self::Tag,
    ];

    /// Resolve a toolbar name. `circle` is an alias of `ellipse`, `rect` of `rectangle`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "select" => Some(Self::Select),
            "rectangle" | "rect" => Some(Self::Rect),
            "circle" | "ellipse" => Some(Self::Ellipse),
            "line" => Some(Self::Line),
            "polygon" => Some(Self::Polygon),
            "pencil" => Some(Self::Pencil),
            "text" => Some(Self::Text),
            "tag" => Some(Self::Tag),
            _ => None,
        }
    }

    /// Canonical toolbar name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Rect => "rectangle",
            Self::Ellipse => "circle",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Pencil => "pencil",
            Self::Text => "text",
            Self::Tag => "tag",
        }
    }

    /// Tool bound to a bare-key shortcut (`v`, `r`, `l`, `c`, `t`).
    #[must_use]
    pub fn from_shortcut(key: &str) -> Option<Self> {
        match key {
            "v" | "V" => Some(Self::Select),
            "r" | "R" => Some(Self::Rect),
            "l" | "L" => Some(Self::Line),
            "c" | "C" => Some(Self::Ellipse),
            "t" | "T" => Some(Self::Text),
            _ => None,
        }
    }
}

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
    /// Ctrl on Windows/Linux, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }

    /// No modifier at all.
    #[must_use]
    pub fn is_bare(self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
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
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }

    /// Case-insensitive comparison for letter shortcuts.
    #[must_use]
    pub fn is_letter(&self, letter: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&letter))
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// A native manipulation tracked by the router between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub enum EditGesture {
    /// Dragging one or more selected objects.
    Move {
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// Each moving object with its box origin at pointer-down.
        origins: Vec<(ObjectId, Point)>,
        /// Set once the pointer actually moved.
        moved: bool,
    },
    /// Dragging one of the eight resize handles of a single object.
    Resize {
        id: ObjectId,
        anchor: ResizeAnchor,
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// Object left/top/width/height at pointer-down.
        orig_left: f64,
        orig_top: f64,
        orig_width: f64,
        orig_height: f64,
    },
    /// Dragging the rotate handle of a single object.
    Rotate {
        id: ObjectId,
        /// Rotation pivot in world space.
        center: Point,
        /// Pointer angle around the pivot at pointer-down, in degrees.
        start_angle: f64,
        /// Object angle at pointer-down.
        orig_angle: f64,
    },
    /// Rubber-band selection rectangle.
    Marquee { start_world: Point, current_world: Point },
    /// Free-drawing stroke owned by the surface.
    Stroke,
    /// Inline text editing of a text object.
    Text { id: ObjectId },
}

/// Router state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// Select tool, nothing in progress.
    #[default]
    Idle,
    /// A non-select tool is current; pointer events go to it first.
    ToolActive,
    /// Dragging the viewport.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// A geo-code is armed; the next click places it.
    PlacementArmed,
    /// A native manipulation or inline edit is in progress.
    Editing(EditGesture),
}

impl InputState {
    /// Whether a gesture (pan or edit) currently owns the pointer.
    #[must_use]
    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::Panning { .. } | Self::Editing(_))
    }
}
