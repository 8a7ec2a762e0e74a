//! Drag-to-create tools: rectangle, ellipse and line.
//!
//! Pointer-down drops a zero-size, non-interactive shape at the start point.
//! Every move recomputes its geometry from the fixed start and the pointer, so
//! dragging in any direction works. Pointer-up either commits the shape and
//! makes it interactive, or discards it when it is too small.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use tracing::debug;

use crate::consts::{MIN_ELLIPSE_RADIUS, MIN_LINE_LENGTH, MIN_RECT_SIZE};
use crate::doc::{Bounds, ObjectId, ObjectKind, SceneObject};
use crate::error::ToolActivationError;
use crate::input::{Modifiers, ToolId};
use crate::tools::{CanvasTool, ToolCtx, ToolOutcome};
use crate::viewport::Point;

/// Which shape the tool draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Line,
}

#[derive(Debug, Clone, Copy)]
struct Draft {
    id: ObjectId,
    start: Point,
}

pub struct ShapeTool {
    shape: ShapeKind,
    draft: Option<Draft>,
}

impl ShapeTool {
    #[must_use]
    pub fn rect() -> Self {
        Self { shape: ShapeKind::Rect, draft: None }
    }

    #[must_use]
    pub fn ellipse() -> Self {
        Self { shape: ShapeKind::Ellipse, draft: None }
    }

    #[must_use]
    pub fn line() -> Self {
        Self { shape: ShapeKind::Line, draft: None }
    }

    #[must_use]
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }
}

/// Box spanned by a drag. With `circle` the box is squared on the longer side,
/// growing away from the start point.
#[must_use]
pub fn drag_bounds(start: Point, current: Point, circle: bool) -> Bounds {
    if !circle {
        return Bounds::from_corners(start, current);
    }
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    let side = dx.abs().max(dy.abs());
    let end = Point::new(start.x + side.copysign(dx), start.y + side.copysign(dy));
    Bounds::from_corners(start, end)
}

/// Whether a finished shape is too small to keep.
#[must_use]
pub fn below_threshold(obj: &SceneObject) -> bool {
    match obj.kind {
        ObjectKind::Line => match obj.points.as_slice() {
            [a, b] => a.distance(*b) < MIN_LINE_LENGTH,
            _ => true,
        },
        ObjectKind::Ellipse => obj.width * 0.5 < MIN_ELLIPSE_RADIUS && obj.height * 0.5 < MIN_ELLIPSE_RADIUS,
        _ => obj.width < MIN_RECT_SIZE && obj.height < MIN_RECT_SIZE,
    }
}

impl ShapeTool {
    fn reshape(&self, ctx: &mut ToolCtx<'_>, draft: Draft, world: Point, mods: Modifiers) {
        let Some(obj) = ctx.surface.scene.get_mut(&draft.id) else {
            return;
        };
        match self.shape {
            ShapeKind::Line => {
                obj.points = vec![draft.start, world];
                obj.sync_bounds_from_points();
            }
            ShapeKind::Rect => obj.resize_to(drag_bounds(draft.start, world, false)),
            ShapeKind::Ellipse => obj.resize_to(drag_bounds(draft.start, world, mods.shift)),
        }
    }
}

impl CanvasTool for ShapeTool {
    fn id(&self) -> ToolId {
        match self.shape {
            ShapeKind::Rect => ToolId::Rect,
            ShapeKind::Ellipse => ToolId::Ellipse,
            ShapeKind::Line => ToolId::Line,
        }
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.set_marquee(false);
        ctx.surface.set_cursor(self.cursor());
        ctx.surface.make_non_interactive(|_| false);
        ctx.surface.attach_listeners(self.id())
    }

    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>) {
        self.cancel(ctx);
        ctx.surface.detach_listeners(self.id());
    }

    fn pointer_down(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        if self.draft.is_some() {
            return ToolOutcome::Consumed;
        }
        let style = ctx.surface.style.clone();
        let mut obj = match self.shape {
            ShapeKind::Line => SceneObject::with_points(ObjectKind::Line, vec![world, world]),
            ShapeKind::Rect => SceneObject::new(ObjectKind::Rect, Bounds::new(world.x, world.y, 0.0, 0.0)),
            ShapeKind::Ellipse => SceneObject::new(ObjectKind::Ellipse, Bounds::new(world.x, world.y, 0.0, 0.0)),
        }
        .with_style(style);
        obj.selectable = false;
        obj.evented = false;
        self.draft = Some(Draft { id: obj.id, start: world });
        ctx.surface.scene.insert(obj);
        ToolOutcome::Changed
    }

    fn pointer_move(&mut self, ctx: &mut ToolCtx<'_>, world: Point, mods: Modifiers) -> ToolOutcome {
        let Some(draft) = self.draft else {
            return ToolOutcome::Consumed;
        };
        self.reshape(ctx, draft, world, mods);
        ToolOutcome::Changed
    }

    fn pointer_up(&mut self, ctx: &mut ToolCtx<'_>, world: Point, mods: Modifiers) -> ToolOutcome {
        let Some(draft) = self.draft.take() else {
            return ToolOutcome::Consumed;
        };
        self.reshape(ctx, draft, world, mods);
        let Some(obj) = ctx.surface.scene.get_mut(&draft.id) else {
            return ToolOutcome::Discarded;
        };
        if below_threshold(obj) {
            debug!(tool = self.id().name(), width = obj.width, height = obj.height, "shape below minimum size; discarded");
            ctx.surface.scene.remove(&draft.id);
            return ToolOutcome::Discarded;
        }
        obj.selectable = true;
        obj.evented = true;
        ToolOutcome::Created(draft.id)
    }

    fn cancel(&mut self, ctx: &mut ToolCtx<'_>) -> bool {
        match self.draft.take() {
            Some(draft) => {
                ctx.surface.scene.remove(&draft.id);
                true
            }
            None => false,
        }
    }

    fn is_drawing(&self) -> bool {
        self.draft.is_some()
    }

    fn cursor(&self) -> &'static str {
        "crosshair"
    }
}
