//! Tag tool: current while a geo-code placement is in progress.
//!
//! Placement clicks are resolved by the router; the tool only sets up the
//! surface so plan shapes remain hit-testable for centroid anchoring.

use crate::doc::ObjectRole;
use crate::error::ToolActivationError;
use crate::input::{Modifiers, ToolId};
use crate::tools::{CanvasTool, ToolCtx, ToolOutcome};
use crate::viewport::Point;

pub struct TagTool;

impl CanvasTool for TagTool {
    fn id(&self) -> ToolId {
        ToolId::Tag
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.set_marquee(false);
        ctx.surface.set_cursor(self.cursor());
        ctx.surface.make_non_interactive(|o| o.role == ObjectRole::SvgShape);
        ctx.surface.attach_listeners(ToolId::Tag)
    }

    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>) {
        ctx.surface.detach_listeners(ToolId::Tag);
    }

    fn pointer_down(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Consumed
    }

    fn pointer_up(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Consumed
    }

    fn cursor(&self) -> &'static str {
        "crosshair"
    }
}
