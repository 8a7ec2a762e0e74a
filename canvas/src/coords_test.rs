#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn svg(width: f64, height: f64) -> CoordinateTranslator {
    CoordinateTranslator::new(PlanType::Svg, Size::new(width, height))
}

fn image(width: f64, height: f64) -> CoordinateTranslator {
    CoordinateTranslator::new(PlanType::Image, Size::new(width, height))
}

// =============================================================
// PlanType / Plan
// =============================================================

#[test]
fn plan_type_svg_variants() {
    assert!(PlanType::Svg.is_svg());
    assert!(PlanType::SvgCreation.is_svg());
    assert!(!PlanType::Image.is_svg());
}

#[test]
fn plan_deserializes_type_field() {
    let plan: Plan = serde_json::from_str(r#"{"id":4,"type":"svg_creation","width":800,"height":600}"#).unwrap();
    assert_eq!(plan.plan_type, PlanType::SvgCreation);
    assert_eq!(plan.native_size(), Size::new(800.0, 600.0));
    assert!(plan.background_url.is_none());
}

// =============================================================
// Image plans: identity
// =============================================================

#[test]
fn image_point_is_identity() {
    let t = image(1000.0, 500.0);
    let p = Point::new(123.5, 77.25);
    assert_eq!(t.pixel_to_plan_unit(p).unwrap(), p);
    assert_eq!(t.plan_unit_to_pixel(p).unwrap(), p);
}

#[test]
fn image_ignores_missing_dimensions() {
    let t = image(0.0, 0.0);
    let p = Point::new(10.0, 20.0);
    assert_eq!(t.pixel_to_plan_unit(p).unwrap(), p);
}

// =============================================================
// SVG plans: percent
// =============================================================

#[test]
fn svg_center_is_fifty_percent() {
    let t = svg(1000.0, 500.0);
    let p = t.pixel_to_plan_unit(Point::new(500.0, 250.0)).unwrap();
    assert!(approx_eq(p.x, 50.0));
    assert!(approx_eq(p.y, 50.0));
}

#[test]
fn svg_percent_to_pixel() {
    let t = svg(1000.0, 500.0);
    let p = t.plan_unit_to_pixel(Point::new(25.0, 10.0)).unwrap();
    assert!(approx_eq(p.x, 250.0));
    assert!(approx_eq(p.y, 50.0));
}

#[test]
fn svg_size_conversion() {
    let t = svg(200.0, 400.0);
    let s = t.pixel_size_to_plan_unit(Size::new(20.0, 40.0)).unwrap();
    assert!(approx_eq(s.width, 10.0));
    assert!(approx_eq(s.height, 10.0));
    let back = t.plan_unit_size_to_pixel(s).unwrap();
    assert!(approx_eq(back.width, 20.0));
    assert!(approx_eq(back.height, 40.0));
}

#[test]
fn round_trip_holds_for_both_modes() {
    let points = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 999.0),
        Point::new(-12.5, 44.125),
        Point::new(3141.59, 2718.28),
    ];
    let natives = [Size::new(1000.0, 500.0), Size::new(1.0, 1.0), Size::new(3333.0, 17.0)];
    for native in natives {
        for plan_type in [PlanType::Image, PlanType::Svg, PlanType::SvgCreation] {
            let t = CoordinateTranslator::new(plan_type, native);
            for p in points {
                let back = t.plan_unit_to_pixel(t.pixel_to_plan_unit(p).unwrap()).unwrap();
                assert!((back.x - p.x).abs() < 1e-6, "{plan_type:?} {native:?} {p:?} -> {back:?}");
                assert!((back.y - p.y).abs() < 1e-6, "{plan_type:?} {native:?} {p:?} -> {back:?}");
            }
        }
    }
}

#[test]
fn svg_zero_width_is_configuration_error() {
    let t = svg(0.0, 500.0);
    let err = t.pixel_to_plan_unit(Point::new(1.0, 1.0)).unwrap_err();
    assert_eq!(err, ConfigurationError::InvalidDimension { axis: "width", value: 0.0 });
}

#[test]
fn svg_negative_height_is_configuration_error() {
    let t = svg(100.0, -1.0);
    assert!(t.plan_unit_to_pixel(Point::new(1.0, 1.0)).is_err());
}

#[test]
fn svg_nan_dimension_is_configuration_error() {
    let t = svg(f64::NAN, 100.0);
    assert!(t.pixel_size_to_plan_unit(Size::new(1.0, 1.0)).is_err());
}

// =============================================================
// position_record
// =============================================================

#[test]
fn position_record_svg_scenario() {
    let t = svg(1000.0, 500.0);
    let record = t.position_record(Point::new(500.0, 250.0), None);
    assert!(approx_eq(record.pos_x, 50.0));
    assert!(approx_eq(record.pos_y, 50.0));
    assert!(record.width.is_none());
    assert!(record.height.is_none());
}

#[test]
fn position_record_image_keeps_pixels() {
    let t = image(1000.0, 500.0);
    let record = t.position_record(Point::new(120.0, 80.0), Some(Size::new(24.0, 24.0)));
    assert_eq!(record.pos_x, 120.0);
    assert_eq!(record.pos_y, 80.0);
    assert_eq!(record.width, Some(24.0));
    assert_eq!(record.height, Some(24.0));
}

#[test]
fn position_record_degrades_to_zero() {
    let t = svg(0.0, 0.0);
    let record = t.position_record(Point::new(500.0, 250.0), Some(Size::new(10.0, 10.0)));
    assert_eq!(record.pos_x, 0.0);
    assert_eq!(record.pos_y, 0.0);
    assert_eq!(record.width, Some(0.0));
    assert_eq!(record.height, Some(0.0));
}

#[test]
fn record_to_pixels_inverts_position_record() {
    let t = svg(800.0, 600.0);
    let record = t.position_record(Point::new(200.0, 150.0), Some(Size::new(40.0, 30.0)));
    let (center, size) = t.record_to_pixels(&record).unwrap();
    assert!(approx_eq(center.x, 200.0));
    assert!(approx_eq(center.y, 150.0));
    let size = size.unwrap();
    assert!(approx_eq(size.width, 40.0));
    assert!(approx_eq(size.height, 30.0));
}

#[test]
fn record_serializes_without_absent_size() {
    let record = PositionRecord { pos_x: 1.0, pos_y: 2.0, width: None, height: None };
    let json = serde_json::to_value(record).unwrap();
    assert_eq!(json, serde_json::json!({ "pos_x": 1.0, "pos_y": 2.0 }));
}
