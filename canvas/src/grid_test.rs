#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::Bounds;

#[test]
fn snap_rounds_to_nearest_multiple() {
    assert_eq!(snap_to_grid(14.0, 10.0), 10.0);
    assert_eq!(snap_to_grid(15.0, 10.0), 20.0);
    assert_eq!(snap_to_grid(-14.0, 10.0), -10.0);
    assert_eq!(snap_to_grid(0.0, 10.0), 0.0);
}

#[test]
fn snap_is_idempotent() {
    for grid in [1.0, 7.5, 10.0, 25.0] {
        for raw in [-123.4, -0.2, 0.0, 3.3, 49.99, 1234.5678] {
            let once = snap_to_grid(raw, grid);
            assert_eq!(snap_to_grid(once, grid), once, "grid {grid} raw {raw}");
        }
    }
}

#[test]
fn snap_with_invalid_grid_is_identity() {
    assert_eq!(snap_to_grid(13.7, 0.0), 13.7);
    assert_eq!(snap_to_grid(13.7, -5.0), 13.7);
    assert_eq!(snap_to_grid(13.7, f64::NAN), 13.7);
}

#[test]
fn lines_are_exempt_from_snapping() {
    let line = SceneObject::with_points(ObjectKind::Line, vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
    let rect = SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 5.0, 5.0));
    assert!(!snaps_on_move(&line));
    assert!(snaps_on_move(&rect));
}

#[test]
fn grid_lines_cover_extent() {
    let lines = grid_lines(Size::new(100.0, 50.0), 10.0, 1.0);
    // 11 vertical (0..=100) + 6 horizontal (0..=50).
    assert_eq!(lines.len(), 17);
    assert!(lines.iter().all(|l| l.role == ObjectRole::GridLine));
    assert!(lines.iter().all(|l| !l.evented && !l.selectable));
}

#[test]
fn grid_line_width_is_screen_constant() {
    let lines = grid_lines(Size::new(20.0, 20.0), 10.0, 2.0);
    assert!(lines.iter().all(|l| (l.style.stroke_width - GRID_LINE_WIDTH / 2.0).abs() < 1e-12));
}

#[test]
fn grid_lines_empty_for_degenerate_input() {
    assert!(grid_lines(Size::new(0.0, 50.0), 10.0, 1.0).is_empty());
    assert!(grid_lines(Size::new(50.0, 50.0), 0.0, 1.0).is_empty());
}

#[test]
fn fine_grid_on_large_plan_is_bounded() {
    let lines = grid_lines(Size::new(10_000.0, 10_000.0), 0.001, 1.0);
    // 501 lines per axis at most.
    assert!(!lines.is_empty());
    assert!(lines.len() <= 2 * 501, "{} lines", lines.len());

    // Coarsened spacing stays a multiple of the grid.
    let gap = lines[1].points[0].x - lines[0].points[0].x;
    assert!(gap >= 20.0 - 1e-6, "gap {gap}");
    let cells = gap / 0.001;
    assert!((cells - cells.round()).abs() < 1e-6, "gap {gap}");
}
