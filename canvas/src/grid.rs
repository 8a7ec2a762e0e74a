//! Snap-to-grid rounding and grid-line generation.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use crate::consts::{GRID_LINE_COLOR, GRID_LINE_WIDTH, MAX_GRID_LINES};
use crate::doc::{ObjectKind, ObjectRole, SceneObject, Style};
use crate::viewport::{Point, Size};

/// Round `value` to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid leaves the value unchanged.
#[must_use]
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Whether an object's origin should be snapped while it moves.
///
/// Lines are anchored by their endpoints, not their box origin.
#[must_use]
pub fn snaps_on_move(obj: &SceneObject) -> bool {
    obj.kind != ObjectKind::Line
}

/// Build grid lines covering `extent` at `grid_size` spacing.
///
/// Line widths are divided by `zoom` so the grid keeps a constant on-screen
/// thickness. At most [`MAX_GRID_LINES`] (plus one) lines are drawn per
/// axis; a finer grid is drawn at a multiple of `grid_size`. The lines are
/// neither selectable nor evented.
#[must_use]
pub fn grid_lines(extent: Size, grid_size: f64, zoom: f64) -> Vec<SceneObject> {
    if !(grid_size.is_finite() && grid_size > 0.0) || extent.width <= 0.0 || extent.height <= 0.0 {
        return Vec::new();
    }
    let style = Style {
        fill: None,
        stroke: GRID_LINE_COLOR.to_owned(),
        stroke_width: GRID_LINE_WIDTH / zoom.max(f64::EPSILON),
        dashed: false,
    };
    let mut lines = Vec::new();
    let step_x = axis_step(extent.width, grid_size);
    let mut x = 0.0;
    while x <= extent.width {
        lines.push(grid_line(Point::new(x, 0.0), Point::new(x, extent.height), &style));
        x += step_x;
    }
    let step_y = axis_step(extent.height, grid_size);
    let mut y = 0.0;
    while y <= extent.height {
        lines.push(grid_line(Point::new(0.0, y), Point::new(extent.width, y), &style));
        y += step_y;
    }
    lines
}

fn axis_step(length: f64, grid_size: f64) -> f64 {
    let factor = (length / grid_size / MAX_GRID_LINES).ceil().max(1.0);
    grid_size * factor
}

fn grid_line(a: Point, b: Point, style: &Style) -> SceneObject {
    let mut line = SceneObject::with_points(ObjectKind::Line, vec![a, b])
        .with_role(ObjectRole::GridLine)
        .with_style(style.clone());
    line.selectable = false;
    line.evented = false;
    line
}
