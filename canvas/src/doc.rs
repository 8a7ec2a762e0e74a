//! Scene model: canvas objects, their roles, and the in-memory scene.
//!
//! This module defines what is on the canvas (`SceneObject`, `ObjectKind`,
//! `ObjectRole`, `Style`) and the store that owns all live objects in stacking
//! order (`Scene`). Index 0 of the scene is the bottom of the stack.
//!
//! Geometry is in plan space. `left`/`top`/`width`/`height` describe the
//! unrotated bounding box; `angle` rotates it clockwise around its center.
//! Point-based kinds (line, polygon, path) keep absolute vertices in `points`
//! and derive their box from them.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DEFAULT_STROKE, DEFAULT_STROKE_WIDTH};
use crate::viewport::{Point, Size};

/// Unique identifier for a scene object.
pub type ObjectId = Uuid;

/// Identifier of an external geo-code record.
pub type GeoCodeId = i64;

/// Version written into drawing snapshots.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The geometric kind of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Axis-aligned rectangle.
    Rect,
    /// Ellipse inscribed within the bounding box.
    Ellipse,
    /// Straight segment between `points[0]` and `points[1]`.
    Line,
    /// Closed filled polygon through `points`.
    Polygon,
    /// Freehand stroke through `points`.
    Path,
    /// Single- or multi-line text.
    Text,
    /// Geo-tag pin.
    Marker,
    /// Composite of `children`.
    Group,
    /// Raster or SVG plan background.
    Image,
}

impl ObjectKind {
    /// Whether geometry is carried by `points` rather than the box.
    #[must_use]
    pub fn is_point_based(self) -> bool {
        matches!(self, Self::Line | Self::Polygon | Self::Path)
    }
}

/// What an object means to the editor, independent of its geometry.
///
/// An object has exactly one role. The router switches over it to decide how
/// moves, modifications and clicks are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectRole {
    /// A user drawing persisted with the drawing snapshot.
    #[default]
    Drawing,
    /// Marker placed for a geo-code on an image plan.
    GeoTag { geo_code_id: GeoCodeId },
    /// Label placed for a geo-code on an SVG plan.
    PlacedText { geo_code_id: GeoCodeId },
    /// Shape belonging to the imported SVG plan.
    SvgShape,
    /// The plan background; at most one per scene.
    Background,
    /// Grid line; never persisted or hit.
    GridLine,
    /// Transient drawing aid such as a polygon preview.
    Guide,
}

impl ObjectRole {
    /// The linked geo-code, for geo-tags and placed texts.
    #[must_use]
    pub fn geo_code_id(self) -> Option<GeoCodeId> {
        match self {
            Self::GeoTag { geo_code_id } | Self::PlacedText { geo_code_id } => Some(geo_code_id),
            _ => None,
        }
    }

    /// Objects the user never selects or manipulates.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Background | Self::GridLine | Self::Guide)
    }
}

/// Fill and stroke styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// CSS fill color; `None` is transparent.
    #[serde(default)]
    pub fill: Option<String>,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default)]
    pub dashed: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self { fill: None, stroke: DEFAULT_STROKE.to_owned(), stroke_width: DEFAULT_STROKE_WIDTH, dashed: false }
    }
}

/// Axis-aligned box in plan space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Smallest box containing both corners, in any drag direction.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Smallest box containing every point; `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.left <= other.right() && other.left <= self.right() && self.top <= other.bottom() && other.top <= self.bottom()
    }

    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Bounds::new(left, top, self.right().max(other.right()) - left, self.bottom().max(other.bottom()) - top)
    }
}

/// A drawable entity on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees around the bounding-box center.
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Absolute vertices for point-based kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Members of a group, in their own stacking order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneObject>,
    /// Image source for the background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub role: ObjectRole,
    /// Can be selected and manipulated.
    #[serde(default = "yes")]
    pub selectable: bool,
    /// Receives pointer hits.
    #[serde(default = "yes")]
    pub evented: bool,
    /// Locked objects cannot be moved, resized or rotated.
    #[serde(default)]
    pub locked: bool,
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

impl SceneObject {
    /// New object of `kind` occupying `bounds`, with default style and role.
    #[must_use]
    pub fn new(kind: ObjectKind, bounds: Bounds) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            left: bounds.left,
            top: bounds.top,
            width: bounds.width,
            height: bounds.height,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            points: Vec::new(),
            text: None,
            font_size: None,
            children: Vec::new(),
            src: None,
            style: Style::default(),
            role: ObjectRole::Drawing,
            selectable: true,
            evented: true,
            locked: false,
        }
    }

    /// New point-based object; the box is derived from the points.
    #[must_use]
    pub fn with_points(kind: ObjectKind, points: Vec<Point>) -> Self {
        let mut obj = Self::new(kind, Bounds::default());
        obj.points = points;
        obj.sync_bounds_from_points();
        obj
    }

    /// New text object with its box estimated from the content.
    #[must_use]
    pub fn text_at(origin: Point, text: &str, font_size: f64) -> Self {
        let size = estimate_text_size(text, font_size);
        let mut obj = Self::new(ObjectKind::Text, Bounds::new(origin.x, origin.y, size.width, size.height));
        obj.text = Some(text.to_owned());
        obj.font_size = Some(font_size);
        obj
    }

    #[must_use]
    pub fn with_role(mut self, role: ObjectRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Rendered width including the scale factor.
    #[must_use]
    pub fn scaled_width(&self) -> f64 {
        self.width * self.scale_x
    }

    /// Rendered height including the scale factor.
    #[must_use]
    pub fn scaled_height(&self) -> f64 {
        self.height * self.scale_y
    }

    /// Unrotated bounding box, including scale.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.top, self.scaled_width(), self.scaled_height())
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.scaled_width(), self.scaled_height())
    }

    /// Recompute the box of a point-based object from its vertices.
    pub fn sync_bounds_from_points(&mut self) {
        if let Some(b) = Bounds::from_points(&self.points) {
            self.left = b.left;
            self.top = b.top;
            self.width = b.width;
            self.height = b.height;
            self.scale_x = 1.0;
            self.scale_y = 1.0;
        }
    }

    /// Move the object (and its points and children) by a delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// Move the object so its box origin lands on `(left, top)`.
    pub fn move_to(&mut self, left: f64, top: f64) {
        self.translate(left - self.left, top - self.top);
    }

    /// Reshape the object into `target`, scaling points and children with it.
    pub fn resize_to(&mut self, target: Bounds) {
        let from = self.bounds();
        let sx = if from.width.abs() < f64::EPSILON { 1.0 } else { target.width / from.width };
        let sy = if from.height.abs() < f64::EPSILON { 1.0 } else { target.height / from.height };
        let map = |p: Point| Point::new(target.left + (p.x - from.left) * sx, target.top + (p.y - from.top) * sy);
        for p in &mut self.points {
            *p = map(*p);
        }
        for child in &mut self.children {
            let b = child.bounds();
            let origin = map(Point::new(b.left, b.top));
            child.resize_to(Bounds::new(origin.x, origin.y, b.width * sx, b.height * sy));
        }
        self.left = target.left;
        self.top = target.top;
        self.width = target.width / self.scale_x;
        self.height = target.height / self.scale_y;
    }

    /// Copy of this object (and its children) with fresh ids.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.children = self.children.iter().map(SceneObject::duplicate).collect();
        copy
    }
}

/// Rough text box for a string at `font_size`; no font metrics are available
/// outside the browser.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_text_size(text: &str, font_size: f64) -> Size {
    let lines = text.lines().count().max(1);
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
    Size::new(
        longest as f64 * font_size * crate::consts::GLYPH_WIDTH_RATIO,
        lines as f64 * font_size * crate::consts::LINE_HEIGHT_RATIO,
    )
}

/// Serialized user drawing for image plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSnapshot {
    pub version: u32,
    pub objects: Vec<SceneObject>,
}

/// In-memory scene, ordered bottom to top.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// Add an object on top of the stack. A background goes through
    /// [`Scene::set_background`] so the single-background invariant holds.
    pub fn insert(&mut self, obj: SceneObject) {
        if obj.role == ObjectRole::Background {
            self.set_background(obj);
        } else {
            self.objects.push(obj);
        }
    }

    /// Install `obj` as the background, replacing any existing one.
    pub fn set_background(&mut self, mut obj: SceneObject) {
        self.objects.retain(|o| o.role != ObjectRole::Background);
        obj.role = ObjectRole::Background;
        obj.selectable = false;
        obj.evented = false;
        self.objects.insert(0, obj);
    }

    #[must_use]
    pub fn background(&self) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.role == ObjectRole::Background)
    }

    /// Remove an object by id, returning it if it was present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<SceneObject> {
        let idx = self.index_of(id)?;
        Some(self.objects.remove(idx))
    }

    /// Remove every object matching `pred`.
    /// Remove every object matching `pred`, returning the removed ids.
    pub fn remove_where<F>(&mut self, pred: F) -> Vec<ObjectId>
    where
        F: Fn(&SceneObject) -> bool,
    {
        let mut removed = Vec::new();
        self.objects.retain(|o| {
            let hit = pred(o);
            if hit {
                removed.push(o.id);
            }
            !hit
        });
        removed
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == *id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    #[must_use]
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == *id)
    }

    /// Objects bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    /// First object linked to `geo_code_id`.
    #[must_use]
    pub fn find_linked(&self, geo_code_id: GeoCodeId) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|o| o.role.geo_code_id() == Some(geo_code_id))
    }

    /// Number of objects currently in the scene.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the scene contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // --- Stacking order ---

    /// Lowest index a user object may occupy: above background and grid.
    fn base_layer_len(&self) -> usize {
        self.objects
            .iter()
            .take_while(|o| matches!(o.role, ObjectRole::Background | ObjectRole::GridLine))
            .count()
    }

    /// Insert an object right above the background and grid layers.
    pub fn insert_above_base(&mut self, obj: SceneObject) {
        let idx = self.base_layer_len();
        self.objects.insert(idx, obj);
    }

    /// Move an object to the top of the stack.
    pub fn bring_to_front(&mut self, id: &ObjectId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let obj = self.objects.remove(idx);
        self.objects.push(obj);
        true
    }

    /// Move an object to the bottom of the user layers.
    pub fn send_to_back(&mut self, id: &ObjectId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let obj = self.objects.remove(idx);
        self.insert_above_base(obj);
        true
    }

    /// Swap an object with the one directly above it.
    pub fn bring_forward(&mut self, id: &ObjectId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        if idx + 1 >= self.objects.len() {
            return false;
        }
        self.objects.swap(idx, idx + 1);
        true
    }

    /// Swap an object with the one directly below it, staying above the base layers.
    pub fn send_backward(&mut self, id: &ObjectId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        if idx <= self.base_layer_len() {
            return false;
        }
        self.objects.swap(idx, idx - 1);
        true
    }

    // --- Persistence ---

    /// User drawings, bottom to top, for the drawing snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DrawingSnapshot {
        DrawingSnapshot {
            version: SNAPSHOT_VERSION,
            objects: self
                .objects
                .iter()
                .filter(|o| o.role == ObjectRole::Drawing)
                .map(|o| SceneObject { selectable: true, evented: true, ..o.clone() })
                .collect(),
        }
    }

    /// Replace all user drawings with a snapshot, keeping every other role.
    pub fn load_snapshot(&mut self, snapshot: DrawingSnapshot) {
        self.objects.retain(|o| o.role != ObjectRole::Drawing);
        for mut obj in snapshot.objects {
            obj.role = ObjectRole::Drawing;
            self.objects.push(obj);
        }
    }
}
