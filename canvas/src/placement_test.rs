#![allow(clippy::float_cmp)]

use super::*;
use crate::coords::PlanType;

const EPSILON: f64 = 1e-9;

fn plan(plan_type: PlanType, width: f64, height: f64) -> Plan {
    Plan { id: 7, plan_type, width, height, background_url: None }
}

fn code(id: GeoCodeId) -> GeoCodeRef {
    GeoCodeRef { id, code: format!("GC-{id}"), libelle: "Rayon".into() }
}

fn svg_square(left: f64, top: f64, side: f64) -> SceneObject {
    SceneObject::with_points(
        ObjectKind::Polygon,
        vec![
            Point::new(left, top),
            Point::new(left + side, top),
            Point::new(left + side, top + side),
            Point::new(left, top + side),
        ],
    )
    .with_role(ObjectRole::SvgShape)
}

// =============================================================
// Anchor resolution
// =============================================================

#[test]
fn svg_shape_click_anchors_at_centroid() {
    let mut scene = Scene::new();
    let shape = svg_square(400.0, 150.0, 200.0);
    let shape_id = shape.id;
    scene.insert(shape);
    let p = plan(PlanType::Svg, 1000.0, 500.0);

    let anchor = resolve_anchor(&scene, &p, Some(shape_id), Point::new(420.0, 170.0));
    assert!((anchor.x - 500.0).abs() < EPSILON);
    assert!((anchor.y - 250.0).abs() < EPSILON);
}

#[test]
fn background_click_uses_literal_point() {
    let scene = Scene::new();
    let p = plan(PlanType::Svg, 1000.0, 500.0);
    assert_eq!(resolve_anchor(&scene, &p, None, Point::new(12.0, 34.0)), Point::new(12.0, 34.0));
}

#[test]
fn drawn_shape_click_uses_literal_point() {
    let mut scene = Scene::new();
    let drawn = SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 100.0, 100.0));
    let drawn_id = drawn.id;
    scene.insert(drawn);
    let p = plan(PlanType::Svg, 1000.0, 500.0);
    assert_eq!(resolve_anchor(&scene, &p, Some(drawn_id), Point::new(10.0, 10.0)), Point::new(10.0, 10.0));
}

#[test]
fn image_plan_ignores_svg_shapes() {
    let mut scene = Scene::new();
    let shape = svg_square(0.0, 0.0, 100.0);
    let shape_id = shape.id;
    scene.insert(shape);
    let p = plan(PlanType::Image, 1000.0, 500.0);
    assert_eq!(resolve_anchor(&scene, &p, Some(shape_id), Point::new(10.0, 10.0)), Point::new(10.0, 10.0));
}

// =============================================================
// Linked objects
// =============================================================

#[test]
fn svg_plan_creates_centered_label() {
    let p = plan(PlanType::SvgCreation, 1000.0, 500.0);
    let obj = linked_object(&p, &code(4), Point::new(100.0, 100.0), None);
    assert_eq!(obj.kind, ObjectKind::Text);
    assert_eq!(obj.role, ObjectRole::PlacedText { geo_code_id: 4 });
    assert_eq!(obj.text.as_deref(), Some("GC-4"));
    let c = obj.center();
    assert!((c.x - 100.0).abs() < EPSILON);
    assert!((c.y - 100.0).abs() < EPSILON);
}

#[test]
fn image_plan_creates_marker() {
    let p = plan(PlanType::Image, 1000.0, 500.0);
    let obj = linked_object(&p, &code(4), Point::new(100.0, 100.0), None);
    assert_eq!(obj.kind, ObjectKind::Marker);
    assert_eq!(obj.role, ObjectRole::GeoTag { geo_code_id: 4 });
    assert_eq!(obj.bounds(), Bounds::new(88.0, 88.0, MARKER_SIZE, MARKER_SIZE));
}

#[test]
fn reference_point_falls_back_to_click() {
    let mut obj = SceneObject::new(ObjectKind::Marker, Bounds::new(f64::NAN, 0.0, 10.0, 10.0));
    assert_eq!(reference_point(&obj, Point::new(3.0, 4.0)).unwrap(), Point::new(3.0, 4.0));
    obj.left = 0.0;
    assert_eq!(reference_point(&obj, Point::new(3.0, 4.0)).unwrap(), Point::new(5.0, 5.0));
}

#[test]
fn reference_point_without_finite_input_fails() {
    let obj = SceneObject::new(ObjectKind::Marker, Bounds::new(f64::NAN, 0.0, 10.0, 10.0));
    assert_eq!(
        reference_point(&obj, Point::new(f64::INFINITY, 0.0)),
        Err(PlacementError::NoReferencePoint)
    );
}

// =============================================================
// place
// =============================================================

#[test]
fn svg_centroid_click_persists_percent() {
    let mut scene = Scene::new();
    let shape = svg_square(400.0, 150.0, 200.0);
    let shape_id = shape.id;
    scene.insert(shape);
    let p = plan(PlanType::Svg, 1000.0, 500.0);

    let placed = place(&mut scene, &p, &code(9), Some(shape_id), Point::new(500.0, 250.0)).unwrap();
    assert!((placed.record.pos_x - 50.0).abs() < EPSILON);
    assert!((placed.record.pos_y - 50.0).abs() < EPSILON);
    assert_eq!(placed.record.width, None);
}

#[test]
fn image_placement_persists_pixels_and_size() {
    let mut scene = Scene::new();
    let p = plan(PlanType::Image, 1000.0, 500.0);
    let placed = place(&mut scene, &p, &code(9), None, Point::new(120.0, 80.0)).unwrap();
    assert_eq!(placed.record.pos_x, 120.0);
    assert_eq!(placed.record.pos_y, 80.0);
    assert_eq!(placed.record.width, Some(MARKER_SIZE));
    assert_eq!(placed.record.height, Some(MARKER_SIZE));
}

#[test]
fn placed_object_is_on_top() {
    let mut scene = Scene::new();
    scene.insert(SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 50.0, 50.0)));
    let p = plan(PlanType::Image, 1000.0, 500.0);
    let placed = place(&mut scene, &p, &code(1), None, Point::new(10.0, 10.0)).unwrap();
    assert_eq!(scene.iter().last().map(|o| o.id), Some(placed.object_id));
}

#[test]
fn replacing_a_code_keeps_one_linked_object() {
    let mut scene = Scene::new();
    let p = plan(PlanType::Image, 1000.0, 500.0);
    let first = place(&mut scene, &p, &code(1), None, Point::new(10.0, 10.0)).unwrap();
    assert!(first.replaced.is_empty());
    let second = place(&mut scene, &p, &code(1), None, Point::new(90.0, 90.0)).unwrap();
    assert_eq!(second.replaced, vec![first.object_id]);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.find_linked(1).map(|o| o.id), Some(second.object_id));
}

#[test]
fn zero_native_size_degrades_record_to_zero() {
    let mut scene = Scene::new();
    let p = plan(PlanType::Svg, 0.0, 500.0);
    let placed = place(&mut scene, &p, &code(2), None, Point::new(250.0, 100.0)).unwrap();
    assert_eq!(placed.record.pos_x, 0.0);
    assert_eq!(placed.record.pos_y, 0.0);
}

// =============================================================
// load_placed_codes
// =============================================================

#[test]
fn loading_reproduces_stored_record() {
    let mut scene = Scene::new();
    let p = plan(PlanType::Svg, 1000.0, 500.0);
    let stored = PositionRecord { pos_x: 25.0, pos_y: 40.0, width: None, height: None };
    let ids = load_placed_codes(&mut scene, &p, &[PlacedCode { code: code(5), position: stored }]);
    assert_eq!(ids.len(), 1);

    let obj = scene.get(&ids[0]).unwrap();
    let translator = CoordinateTranslator::for_plan(&p);
    let record = record_for(&translator, obj, obj.center());
    assert!((record.pos_x - 25.0).abs() < 1e-9);
    assert!((record.pos_y - 40.0).abs() < 1e-9);
}

#[test]
fn loading_marker_restores_size() {
    let mut scene = Scene::new();
    let p = plan(PlanType::Image, 1000.0, 500.0);
    let stored = PositionRecord { pos_x: 100.0, pos_y: 100.0, width: Some(40.0), height: Some(30.0) };
    let ids = load_placed_codes(&mut scene, &p, &[PlacedCode { code: code(5), position: stored }]);
    let obj = scene.get(&ids[0]).unwrap();
    assert_eq!(obj.bounds(), Bounds::new(80.0, 85.0, 40.0, 30.0));
}

#[test]
fn loading_skips_unconvertible_records() {
    let mut scene = Scene::new();
    let p = plan(PlanType::Svg, -1.0, 500.0);
    let stored = PositionRecord { pos_x: 10.0, pos_y: 10.0, width: None, height: None };
    let ids = load_placed_codes(&mut scene, &p, &[PlacedCode { code: code(5), position: stored }]);
    assert!(ids.is_empty());
    assert!(scene.is_empty());
}

#[test]
fn placed_code_deserializes_flat() {
    let json = r#"{"id": 3, "code": "A-1", "libelle": "Caisse", "position": {"pos_x": 1.5, "pos_y": 2.5}}"#;
    let placed: PlacedCode = serde_json::from_str(json).unwrap();
    assert_eq!(placed.code.id, 3);
    assert_eq!(placed.position.pos_x, 1.5);
    assert_eq!(placed.position.width, None);
}
