//! Geo-code placement: turning an armed geo-code and a click into a linked
//! scene object and a position record.
//!
//! Image plans get a square marker; SVG plans get a text label showing the
//! code. On SVG plans a click inside an imported plan shape anchors the label
//! at the shape's centroid instead of the literal click point.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{LABEL_FONT_SIZE, MARKER_FILL, MARKER_SIZE, TEXT_COLOR};
use crate::coords::{CoordinateTranslator, Plan, PositionRecord};
use crate::doc::{Bounds, GeoCodeId, ObjectId, ObjectKind, ObjectRole, Scene, SceneObject, Style};
use crate::error::PlacementError;
use crate::hit;
use crate::viewport::{Point, Size};

/// Display fields of a geo-code chosen from the side list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCodeRef {
    pub id: GeoCodeId,
    pub code: String,
    #[serde(default)]
    pub libelle: String,
}

/// A geo-code with its stored position, as loaded with the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedCode {
    #[serde(flatten)]
    pub code: GeoCodeRef,
    pub position: PositionRecord,
}

/// Where the placement flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPhase {
    /// Waiting for the placement click.
    Armed,
    /// Object created; waiting for the position save to resolve.
    Saving,
}

/// An in-progress placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSession {
    pub code: GeoCodeRef,
    pub phase: PlacementPhase,
    /// Object created by the placement click.
    pub object_id: Option<ObjectId>,
}

impl PlacementSession {
    #[must_use]
    pub fn armed(code: GeoCodeRef) -> Self {
        Self { code, phase: PlacementPhase::Armed, object_id: None }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.phase == PlacementPhase::Armed
    }
}

/// Outcome of a placement click.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub object_id: ObjectId,
    pub geo_code_id: GeoCodeId,
    pub anchor: Point,
    pub record: PositionRecord,
    /// Linked objects of the same code that the new one replaced.
    pub replaced: Vec<ObjectId>,
}

/// Resolve the anchor point for a placement click.
///
/// On SVG plans a click on an imported shape anchors at its centroid; every
/// other click uses the literal point.
#[must_use]
pub fn resolve_anchor(scene: &Scene, plan: &Plan, hit_id: Option<ObjectId>, click: Point) -> Point {
    if !plan.is_svg() {
        return click;
    }
    hit_id
        .and_then(|id| scene.get(&id))
        .filter(|obj| obj.role == ObjectRole::SvgShape)
        .map_or(click, hit::centroid)
}

/// Build the linked object for `code`, centered on `anchor`.
#[must_use]
pub fn linked_object(plan: &Plan, code: &GeoCodeRef, anchor: Point, size: Option<Size>) -> SceneObject {
    if plan.is_svg() {
        let mut label = SceneObject::text_at(anchor, &code.code, LABEL_FONT_SIZE)
            .with_role(ObjectRole::PlacedText { geo_code_id: code.id })
            .with_style(Style { fill: Some(TEXT_COLOR.to_owned()), stroke_width: 0.0, ..Style::default() });
        let w = label.width;
        let h = label.height;
        label.move_to(anchor.x - w * 0.5, anchor.y - h * 0.5);
        label
    } else {
        let size = size.unwrap_or(Size::new(MARKER_SIZE, MARKER_SIZE));
        let bounds = Bounds::new(anchor.x - size.width * 0.5, anchor.y - size.height * 0.5, size.width, size.height);
        let mut marker = SceneObject::new(ObjectKind::Marker, bounds)
            .with_role(ObjectRole::GeoTag { geo_code_id: code.id })
            .with_style(Style { fill: Some(MARKER_FILL.to_owned()), ..Style::default() });
        marker.text = Some(code.code.clone());
        marker
    }
}

/// Reference point for the persisted position: the object's center, or the
/// click point when the center is unusable.
///
/// # Errors
///
/// Returns [`PlacementError::NoReferencePoint`] when neither is finite.
pub fn reference_point(obj: &SceneObject, click: Point) -> Result<Point, PlacementError> {
    let center = obj.center();
    if center.is_finite() {
        return Ok(center);
    }
    warn!(object_id = %obj.id, "placed object has no finite center; using click point");
    if click.is_finite() {
        Ok(click)
    } else {
        Err(PlacementError::NoReferencePoint)
    }
}

/// Position record for a linked object: geo-tags carry their size, labels do not.
#[must_use]
pub fn record_for(translator: &CoordinateTranslator, obj: &SceneObject, center: Point) -> PositionRecord {
    match obj.role {
        ObjectRole::GeoTag { .. } => translator.position_record(center, Some(obj.size())),
        _ => translator.position_record(center, None),
    }
}

/// Place `code` for a click at `click` that hit `hit_id`.
///
/// The new object is added on top of the stack. The caller selects it and
/// sends the record to storage.
///
/// # Errors
///
/// Returns [`PlacementError::NoReferencePoint`] when no finite position can
/// be derived; nothing is added to the scene in that case.
pub fn place(
    scene: &mut Scene,
    plan: &Plan,
    code: &GeoCodeRef,
    hit_id: Option<ObjectId>,
    click: Point,
) -> Result<Placement, PlacementError> {
    let anchor = resolve_anchor(scene, plan, hit_id, click);
    let obj = linked_object(plan, code, anchor, None);
    let center = reference_point(&obj, click)?;
    let translator = CoordinateTranslator::for_plan(plan);
    let record = record_for(&translator, &obj, center);
    let object_id = obj.id;

    // One linked object per geo-code.
    let replaced = scene.remove_where(|o| o.role.geo_code_id() == Some(code.id));
    scene.insert(obj);
    scene.bring_to_front(&object_id);

    info!(geo_code_id = code.id, x = center.x, y = center.y, "geo-code placed");
    Ok(Placement { object_id, geo_code_id: code.id, anchor, record, replaced })
}

/// Recreate linked objects for codes already positioned on the plan.
///
/// Records that cannot be converted are skipped with a warning. Returns the
/// ids of the created objects.
pub fn load_placed_codes(scene: &mut Scene, plan: &Plan, codes: &[PlacedCode]) -> Vec<ObjectId> {
    let translator = CoordinateTranslator::for_plan(plan);
    let mut created = Vec::with_capacity(codes.len());
    for placed in codes {
        let (center, size) = match translator.record_to_pixels(&placed.position) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(geo_code_id = placed.code.id, %err, "skipping stored position");
                continue;
            }
        };
        scene.remove_where(|o| o.role.geo_code_id() == Some(placed.code.id));
        let obj = linked_object(plan, &placed.code, center, size);
        created.push(obj.id);
        scene.insert(obj);
    }
    info!(plan_id = plan.id, count = created.len(), "placed geo-codes loaded");
    created
}
