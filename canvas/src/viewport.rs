#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_GRID_SIZE, MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or plan space.
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

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A width/height pair in either screen or plan space.
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
}

/// Viewport state for pan/zoom over the plan.
///
/// `pan_x` / `pan_y` are in CSS pixels. `zoom` is a scale factor (1.0 = no
/// zoom). Plan space is the plan's native pixel space, so nothing stored in
/// plan space depends on the viewport.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    /// Grid spacing in plan units.
    pub grid_size: f64,
    /// Round object positions to the grid while dragging.
    pub snap_enabled: bool,
    /// Draw grid lines.
    pub show_grid: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            grid_size: DEFAULT_GRID_SIZE,
            snap_enabled: true,
            show_grid: false,
        }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to plan coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a plan-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to plan-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Width in plan units that renders as `nominal` screen pixels.
    #[must_use]
    pub fn screen_constant_width(&self, nominal: f64) -> f64 {
        nominal / self.zoom
    }

    /// Set the zoom factor, keeping the plan point under `anchor` fixed on screen.
    ///
    /// Returns `true` when the zoom actually changed.
    pub fn zoom_at(&mut self, anchor: Point, zoom: f64) -> bool {
        let clamped = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if !clamped.is_finite() || (clamped - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        let world = self.screen_to_world(anchor);
        self.zoom = clamped;
        self.pan_x = anchor.x - world.x * clamped;
        self.pan_y = anchor.y - world.y * clamped;
        true
    }

    /// Shift the pan offset by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Fit a plan of `plan` size into a viewport of `viewport` size, centered.
    pub fn fit(&mut self, plan: Size, viewport: Size) {
        if plan.width <= 0.0 || plan.height <= 0.0 || viewport.width <= 0.0 || viewport.height <= 0.0 {
            return;
        }
        let zoom = (viewport.width / plan.width)
            .min(viewport.height / plan.height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom = zoom;
        self.pan_x = (viewport.width - plan.width * zoom) * 0.5;
        self.pan_y = (viewport.height - plan.height * zoom) * 0.5;
    }

    /// Round a plan coordinate to the nearest grid multiple.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        crate::grid::snap_to_grid(value, self.grid_size)
    }
}
