//! Polygon tool: a multi-click state machine.
//!
//! `Idle` → `Collecting` on the first click. Each further click appends a
//! fixed vertex; pointer moves only drag the trailing rubber-band point of the
//! dashed preview. Double-click or Enter closes the polygon when at least three
//! vertices are fixed, otherwise the attempt is dropped silently. Clicks near a
//! vertex of an imported plan shape snap onto it.

#[cfg(test)]
#[path = "polygon_test.rs"]
mod polygon_test;

use tracing::debug;

use crate::consts::{GUIDE_COLOR, GUIDE_WIDTH_PX, HANDLE_RADIUS_PX, POLYGON_DUPLICATE_EPSILON, POLYGON_FILL};
use crate::doc::{ObjectId, ObjectKind, ObjectRole, SceneObject, Style};
use crate::error::ToolActivationError;
use crate::hit;
use crate::input::{Key, Modifiers, ToolId};
use crate::tools::{CanvasTool, ToolCtx, ToolOutcome};
use crate::viewport::Point;

#[derive(Default)]
pub struct PolygonTool {
    /// Fixed vertices; empty while idle.
    points: Vec<Point>,
    /// Dashed preview polyline.
    preview: Option<ObjectId>,
}

impl PolygonTool {
    /// Fixed vertices collected so far.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Nearest vertex of an evented plan shape within the handle radius.
    fn snap(ctx: &ToolCtx<'_>, world: Point) -> Point {
        let radius = ctx.viewport.screen_dist_to_world(HANDLE_RADIUS_PX);
        ctx.surface
            .scene
            .iter()
            .filter(|o| o.role == ObjectRole::SvgShape && o.evented)
            .filter_map(|o| hit::nearest_vertex(o, world, radius))
            .min_by(|a, b| a.distance(world).total_cmp(&b.distance(world)))
            .unwrap_or(world)
    }

    fn update_preview(&mut self, ctx: &mut ToolCtx<'_>, cursor: Point) {
        let mut points = self.points.clone();
        points.push(cursor);
        match self.preview.and_then(|id| ctx.surface.scene.get_mut(&id)) {
            Some(preview) => {
                preview.points = points;
                preview.sync_bounds_from_points();
            }
            None => {
                let style = Style {
                    fill: None,
                    stroke: GUIDE_COLOR.to_owned(),
                    stroke_width: ctx.viewport.screen_constant_width(GUIDE_WIDTH_PX),
                    dashed: true,
                };
                let mut preview = SceneObject::with_points(ObjectKind::Path, points)
                    .with_role(ObjectRole::Guide)
                    .with_style(style);
                preview.selectable = false;
                preview.evented = false;
                self.preview = Some(preview.id);
                ctx.surface.scene.insert(preview);
            }
        }
    }

    fn clear(&mut self, ctx: &mut ToolCtx<'_>) {
        if let Some(id) = self.preview.take() {
            ctx.surface.scene.remove(&id);
        }
        self.points.clear();
    }

    /// Close the polygon from the fixed vertices.
    fn complete(&mut self, ctx: &mut ToolCtx<'_>) -> ToolOutcome {
        if self.points.is_empty() && self.preview.is_none() {
            return ToolOutcome::Consumed;
        }
        let points = std::mem::take(&mut self.points);
        self.clear(ctx);
        if points.len() < 3 {
            debug!(vertices = points.len(), "polygon needs three vertices; dropped");
            return ToolOutcome::Discarded;
        }
        let mut style = ctx.surface.style.clone();
        if style.fill.is_none() {
            style.fill = Some(POLYGON_FILL.to_owned());
        }
        let polygon = SceneObject::with_points(ObjectKind::Polygon, points).with_style(style);
        let id = polygon.id;
        ctx.surface.scene.insert(polygon);
        ToolOutcome::Created(id)
    }
}

impl CanvasTool for PolygonTool {
    fn id(&self) -> ToolId {
        ToolId::Polygon
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.set_marquee(false);
        ctx.surface.set_cursor(self.cursor());
        ctx.surface.make_non_interactive(|o| o.role == ObjectRole::SvgShape);
        ctx.surface.attach_listeners(ToolId::Polygon)
    }

    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>) {
        self.clear(ctx);
        ctx.surface.detach_listeners(ToolId::Polygon);
    }

    fn pointer_down(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        let vertex = Self::snap(ctx, world);
        let epsilon = ctx.viewport.screen_dist_to_world(POLYGON_DUPLICATE_EPSILON);
        if self.points.last().is_some_and(|last| last.distance(vertex) <= epsilon) {
            return ToolOutcome::Consumed;
        }
        self.points.push(vertex);
        self.update_preview(ctx, vertex);
        ToolOutcome::Changed
    }

    fn pointer_move(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        if self.points.is_empty() {
            return ToolOutcome::Consumed;
        }
        self.update_preview(ctx, world);
        ToolOutcome::Changed
    }

    fn pointer_up(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Consumed
    }

    fn double_click(&mut self, ctx: &mut ToolCtx<'_>, _world: Point) -> ToolOutcome {
        self.complete(ctx)
    }

    fn key_down(&mut self, ctx: &mut ToolCtx<'_>, key: &Key, _mods: Modifiers) -> ToolOutcome {
        if key.is("Enter") {
            self.complete(ctx)
        } else {
            ToolOutcome::Ignored
        }
    }

    fn cancel(&mut self, ctx: &mut ToolCtx<'_>) -> bool {
        let was_drawing = self.is_drawing();
        self.clear(ctx);
        was_drawing
    }

    fn is_drawing(&self) -> bool {
        !self.points.is_empty()
    }

    fn cursor(&self) -> &'static str {
        "crosshair"
    }
}
