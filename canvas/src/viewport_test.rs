#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point ---

#[test]
fn point_new() {
    let p = Point::new(3.0, 4.0);
    assert_eq!(p.x, 3.0);
    assert_eq!(p.y, 4.0);
}

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn point_is_finite() {
    assert!(Point::new(1.0, 2.0).is_finite());
    assert!(!Point::new(f64::NAN, 2.0).is_finite());
    assert!(!Point::new(1.0, f64::INFINITY).is_finite());
}

// --- Viewport defaults ---

#[test]
fn viewport_default_is_identity() {
    let vp = Viewport::default();
    assert_eq!(vp.pan_x, 0.0);
    assert_eq!(vp.pan_y, 0.0);
    assert_eq!(vp.zoom, 1.0);
}

#[test]
fn viewport_default_grid() {
    let vp = Viewport::default();
    assert_eq!(vp.grid_size, 10.0);
    assert!(vp.snap_enabled);
    assert!(!vp.show_grid);
}

// --- screen_to_world / world_to_screen ---

#[test]
fn screen_to_world_identity() {
    let vp = Viewport::default();
    let world = vp.screen_to_world(Point::new(50.0, 75.0));
    assert!(point_approx_eq(world, Point::new(50.0, 75.0)));
}

#[test]
fn screen_to_world_with_zoom_and_pan() {
    let vp = Viewport { pan_x: 100.0, pan_y: 50.0, zoom: 2.0, ..Viewport::default() };
    let world = vp.screen_to_world(Point::new(140.0, 90.0));
    assert!(point_approx_eq(world, Point::new(20.0, 20.0)));
}

#[test]
fn world_to_screen_inverts_screen_to_world() {
    let vp = Viewport { pan_x: -33.0, pan_y: 17.5, zoom: 0.75, ..Viewport::default() };
    let screen = Point::new(412.0, 97.0);
    let back = vp.world_to_screen(vp.screen_to_world(screen));
    assert!(point_approx_eq(back, screen));
}

#[test]
fn screen_dist_to_world_divides_by_zoom() {
    let vp = Viewport { zoom: 4.0, ..Viewport::default() };
    assert!(approx_eq(vp.screen_dist_to_world(8.0), 2.0));
}

#[test]
fn screen_constant_width_shrinks_with_zoom() {
    let vp = Viewport { zoom: 2.0, ..Viewport::default() };
    assert!(approx_eq(vp.screen_constant_width(1.0), 0.5));
}

// --- zoom_at ---

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut vp = Viewport::default();
    let anchor = Point::new(200.0, 120.0);
    let before = vp.screen_to_world(anchor);
    assert!(vp.zoom_at(anchor, 2.5));
    let after = vp.screen_to_world(anchor);
    assert!(point_approx_eq(before, after));
    assert_eq!(vp.zoom, 2.5);
}

#[test]
fn zoom_at_clamps_to_limits() {
    let mut vp = Viewport::default();
    vp.zoom_at(Point::new(0.0, 0.0), 100.0);
    assert_eq!(vp.zoom, 10.0);
    vp.zoom_at(Point::new(0.0, 0.0), 0.001);
    assert_eq!(vp.zoom, 0.1);
}

#[test]
fn zoom_at_same_value_reports_no_change() {
    let mut vp = Viewport::default();
    assert!(!vp.zoom_at(Point::new(10.0, 10.0), 1.0));
}

#[test]
fn zoom_at_rejects_nan() {
    let mut vp = Viewport::default();
    assert!(!vp.zoom_at(Point::new(10.0, 10.0), f64::NAN));
    assert_eq!(vp.zoom, 1.0);
}

// --- pan / fit ---

#[test]
fn pan_by_accumulates() {
    let mut vp = Viewport::default();
    vp.pan_by(10.0, -5.0);
    vp.pan_by(2.0, 3.0);
    assert_eq!(vp.pan_x, 12.0);
    assert_eq!(vp.pan_y, -2.0);
}

#[test]
fn fit_centers_plan() {
    let mut vp = Viewport::default();
    vp.fit(Size::new(1000.0, 500.0), Size::new(500.0, 500.0));
    assert!(approx_eq(vp.zoom, 0.5));
    assert!(approx_eq(vp.pan_x, 0.0));
    assert!(approx_eq(vp.pan_y, 125.0));
}

#[test]
fn fit_ignores_degenerate_sizes() {
    let mut vp = Viewport::default();
    vp.fit(Size::new(0.0, 500.0), Size::new(500.0, 500.0));
    assert_eq!(vp.zoom, 1.0);
}

// --- snap ---

#[test]
fn snap_uses_grid_size() {
    let vp = Viewport { grid_size: 25.0, ..Viewport::default() };
    assert_eq!(vp.snap(37.0), 25.0);
    assert_eq!(vp.snap(38.0), 50.0);
}
