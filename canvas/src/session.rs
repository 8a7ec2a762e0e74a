//! Editor session: the explicit context the router carries between events.
//!
//! `EditorSettings` is the engine's configuration, deserialized from the host
//! with every field defaulted. `EditorSession` bundles the read-only plan, the
//! settings, the placement session and the current tool.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FONT_SIZE, DEFAULT_GRID_SIZE, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH};
use crate::coords::{CoordinateTranslator, Plan};
use crate::doc::Style;
use crate::input::ToolId;
use crate::placement::PlacementSession;

/// Engine configuration supplied by the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Grid spacing in plan units.
    pub grid_size: f64,
    pub snap_enabled: bool,
    pub show_grid: bool,
    /// Stroke color for new drawings.
    pub stroke: String,
    pub stroke_width: f64,
    /// Fill for new drawings; `None` is transparent.
    pub fill: Option<String>,
    pub font_size: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_enabled: true,
            show_grid: false,
            stroke: DEFAULT_STROKE.to_owned(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill: None,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl EditorSettings {
    /// Style applied to newly drawn objects.
    #[must_use]
    pub fn drawing_style(&self) -> Style {
        Style { fill: self.fill.clone(), stroke: self.stroke.clone(), stroke_width: self.stroke_width, dashed: false }
    }
}

/// Per-editor context owned by the router.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub plan: Plan,
    pub settings: EditorSettings,
    pub placement: Option<PlacementSession>,
    pub current_tool: ToolId,
    /// SVG plans: modified since the last manual save.
    pub dirty: bool,
}

impl EditorSession {
    #[must_use]
    pub fn new(plan: Plan, settings: EditorSettings) -> Self {
        Self { plan, settings, placement: None, current_tool: ToolId::Select, dirty: false }
    }

    #[must_use]
    pub fn translator(&self) -> CoordinateTranslator {
        CoordinateTranslator::for_plan(&self.plan)
    }

    /// A geo-code is armed and waiting for its placement click.
    #[must_use]
    pub fn placement_armed(&self) -> bool {
        self.placement.as_ref().is_some_and(PlacementSession::is_armed)
    }
}
