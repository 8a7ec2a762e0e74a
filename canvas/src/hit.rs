//! Hit-testing against scene objects, selection handles and centroids.
//!
//! Tests run in the object's local (unrotated) frame: the pointer is rotated
//! back around the object's center before comparing against its geometry.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::{Bounds, ObjectId, ObjectKind, Scene, SceneObject};
use crate::viewport::Point;

/// Which part of an object was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [ResizeAnchor; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Unit offsets of the handle within the box: `(0,0)` is top-left, `(1,1)` bottom-right.
    #[must_use]
    pub fn unit(self) -> (f64, f64) {
        match self {
            Self::N => (0.5, 0.0),
            Self::Ne => (1.0, 0.0),
            Self::E => (1.0, 0.5),
            Self::Se => (1.0, 1.0),
            Self::S => (0.5, 1.0),
            Self::Sw => (0.0, 1.0),
            Self::W => (0.0, 0.5),
            Self::Nw => (0.0, 0.0),
        }
    }

    /// Cursor shown while hovering or dragging this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Se | Self::Nw => "nwse-resize",
        }
    }
}

/// Rotate `p` around `center` by `degrees` (clockwise in screen space).
#[must_use]
pub fn rotate_point(p: Point, center: Point, degrees: f64) -> Point {
    if degrees.abs() < f64::EPSILON {
        return p;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// Pointer position expressed in the object's unrotated frame.
#[must_use]
pub fn to_local(obj: &SceneObject, world: Point) -> Point {
    rotate_point(world, obj.center(), -obj.angle)
}

/// Whether `world` lands on `obj`. `slop` widens thin geometry (lines, strokes).
#[must_use]
pub fn hits_object(obj: &SceneObject, world: Point, slop: f64) -> bool {
    let local = to_local(obj, world);
    let b = obj.bounds();
    match obj.kind {
        ObjectKind::Ellipse => {
            let rx = b.width * 0.5 + slop;
            let ry = b.height * 0.5 + slop;
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            let c = b.center();
            let nx = (local.x - c.x) / rx;
            let ny = (local.y - c.y) / ry;
            nx * nx + ny * ny <= 1.0
        }
        ObjectKind::Line | ObjectKind::Path => obj
            .points
            .windows(2)
            .any(|w| dist_to_segment(local, w[0], w[1]) <= slop + obj.style.stroke_width * 0.5),
        ObjectKind::Polygon => {
            point_in_polygon(local, &obj.points)
                || closed_edges(&obj.points).any(|(a, c)| dist_to_segment(local, a, c) <= slop)
        }
        ObjectKind::Group => obj.children.iter().any(|child| hits_object(child, local, slop)),
        ObjectKind::Rect | ObjectKind::Text | ObjectKind::Marker | ObjectKind::Image => inflate(b, slop).contains(local),
    }
}

/// Topmost evented object under `world`, or `None`.
#[must_use]
pub fn topmost_at(scene: &Scene, world: Point, slop: f64) -> Option<ObjectId> {
    scene
        .iter()
        .rev()
        .filter(|o| o.evented && !o.role.is_structural())
        .find(|o| hits_object(o, world, slop))
        .map(|o| o.id)
}

/// Test the selection handles of `obj` (resize and rotate) at `world`.
///
/// `zoom` converts the fixed screen-space handle radius into plan units.
#[must_use]
pub fn hit_handles(obj: &SceneObject, world: Point, zoom: f64) -> Option<HitPart> {
    let radius = HANDLE_RADIUS_PX / zoom;
    let local = to_local(obj, world);
    let b = obj.bounds();
    if local.distance(rotate_handle_local(&b, zoom)) <= radius {
        return Some(HitPart::RotateHandle);
    }
    ResizeAnchor::ALL
        .into_iter()
        .find(|a| local.distance(handle_local(&b, *a)) <= radius)
        .map(HitPart::ResizeHandle)
}

/// Handle position in the unrotated frame.
#[must_use]
pub fn handle_local(b: &Bounds, anchor: ResizeAnchor) -> Point {
    let (ux, uy) = anchor.unit();
    Point::new(b.left + b.width * ux, b.top + b.height * uy)
}

/// Rotate handle position in the unrotated frame: centered above the top edge.
#[must_use]
pub fn rotate_handle_local(b: &Bounds, zoom: f64) -> Point {
    Point::new(b.left + b.width * 0.5, b.top - ROTATE_HANDLE_OFFSET_PX / zoom)
}

/// Visual center used to anchor labels on a shape.
///
/// Polygons use their area centroid; everything else the box center. A
/// degenerate polygon falls back to the box center.
#[must_use]
pub fn centroid(obj: &SceneObject) -> Point {
    let center = if obj.kind == ObjectKind::Polygon {
        polygon_centroid(&obj.points).unwrap_or_else(|| obj.center())
    } else {
        obj.center()
    };
    rotate_point(center, obj.center(), obj.angle)
}

/// Area centroid of a simple polygon, `None` when the area is ~0.
#[must_use]
pub fn polygon_centroid(points: &[Point]) -> Option<Point> {
    if points.len() < 3 {
        return None;
    }
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (a, b) in closed_edges(points) {
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if area2.abs() < f64::EPSILON {
        return None;
    }
    Some(Point::new(cx / (3.0 * area2), cy / (3.0 * area2)))
}

/// Selectable objects whose bounds intersect `rect`, bottom to top.
#[must_use]
pub fn objects_in_rect(scene: &Scene, rect: &Bounds) -> Vec<ObjectId> {
    scene
        .iter()
        .filter(|o| o.selectable && !o.role.is_structural())
        .filter(|o| o.bounds().intersects(rect))
        .map(|o| o.id)
        .collect()
}

/// Nearest vertex of `obj` within `radius` of `world`.
#[must_use]
pub fn nearest_vertex(obj: &SceneObject, world: Point, radius: f64) -> Option<Point> {
    let vertices: Vec<Point> = if obj.kind.is_point_based() {
        obj.points.clone()
    } else {
        let b = obj.bounds();
        [ResizeAnchor::Nw, ResizeAnchor::Ne, ResizeAnchor::Se, ResizeAnchor::Sw]
            .into_iter()
            .map(|a| rotate_point(handle_local(&b, a), obj.center(), obj.angle))
            .collect()
    };
    vertices
        .into_iter()
        .map(|v| (v.distance(world), v))
        .filter(|(d, _)| *d <= radius)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, v)| v)
}

fn inflate(b: Bounds, by: f64) -> Bounds {
    Bounds::new(b.left - by, b.top - by, b.width + by * 2.0, b.height + by * 2.0)
}

fn closed_edges(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

fn point_in_polygon(p: Point, points: &[Point]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    for (a, b) in closed_edges(points) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Shortest distance from `p` to segment `a`–`b`.
#[must_use]
pub fn dist_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 < f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}
