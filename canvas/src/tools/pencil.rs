//! Freehand pencil: switches the surface into free-drawing mode.
//!
//! The tool owns no geometry. The surface captures the stroke and produces a
//! path object when it ends.

use crate::error::ToolActivationError;
use crate::input::{Modifiers, ToolId};
use crate::surface::Brush;
use crate::tools::{CanvasTool, ToolCtx, ToolOutcome};
use crate::viewport::Point;

pub struct PencilTool;

impl CanvasTool for PencilTool {
    fn id(&self) -> ToolId {
        ToolId::Pencil
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.set_marquee(false);
        ctx.surface.set_cursor(self.cursor());
        ctx.surface.make_non_interactive(|_| false);
        let brush = Brush { color: ctx.surface.style.stroke.clone(), width: ctx.surface.style.stroke_width };
        ctx.surface.set_free_drawing(Some(brush));
        ctx.surface.attach_listeners(ToolId::Pencil)
    }

    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>) {
        ctx.surface.set_free_drawing(None);
        ctx.surface.detach_listeners(ToolId::Pencil);
    }

    fn pointer_down(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        if ctx.surface.begin_stroke(world) {
            ToolOutcome::Changed
        } else {
            ToolOutcome::Consumed
        }
    }

    fn pointer_move(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        if ctx.surface.extend_stroke(world) {
            ToolOutcome::Changed
        } else {
            ToolOutcome::Consumed
        }
    }

    fn pointer_up(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        if !ctx.surface.is_stroking() {
            return ToolOutcome::Consumed;
        }
        ctx.surface.extend_stroke(world);
        match ctx.surface.finish_stroke() {
            Some(id) => {
                if let Some(path) = ctx.surface.scene.get_mut(&id) {
                    path.selectable = false;
                    path.evented = false;
                }
                ToolOutcome::Created(id)
            }
            None => ToolOutcome::Discarded,
        }
    }

    fn cancel(&mut self, ctx: &mut ToolCtx<'_>) -> bool {
        ctx.surface.cancel_stroke()
    }

    fn cursor(&self) -> &'static str {
        "crosshair"
    }
}
