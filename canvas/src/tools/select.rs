//! Select tool: the rest state.
//!
//! Pointer input is left to the router, which hit-tests, moves, resizes,
//! rotates and rubber-band selects natively.

use crate::error::ToolActivationError;
use crate::input::ToolId;
use crate::tools::{CanvasTool, ToolCtx};

pub struct SelectTool;

impl CanvasTool for SelectTool {
    fn id(&self) -> ToolId {
        ToolId::Select
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.set_marquee(true);
        ctx.surface.set_cursor(self.cursor());
        ctx.surface.restore_interactivity();
        ctx.surface.attach_listeners(ToolId::Select)
    }

    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>) {
        ctx.surface.detach_listeners(ToolId::Select);
    }

    fn cursor(&self) -> &'static str {
        "default"
    }
}
