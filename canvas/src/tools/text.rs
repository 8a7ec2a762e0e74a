//! Text tool: click on empty space to place editable text.
//!
//! Objects stay evented (but not selectable) so a click that lands on one is
//! recognized and ignored instead of covering it with new text.

use crate::consts::{HANDLE_RADIUS_PX, NEW_TEXT_CONTENT, TEXT_COLOR};
use crate::doc::SceneObject;
use crate::error::ToolActivationError;
use crate::hit;
use crate::input::{Modifiers, ToolId};
use crate::tools::{CanvasTool, ToolCtx, ToolOutcome};
use crate::viewport::Point;

pub struct TextTool;

impl CanvasTool for TextTool {
    fn id(&self) -> ToolId {
        ToolId::Text
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.set_marquee(false);
        ctx.surface.set_cursor(self.cursor());
        ctx.surface.make_non_interactive(|_| true);
        ctx.surface.attach_listeners(ToolId::Text)
    }

    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>) {
        ctx.surface.detach_listeners(ToolId::Text);
    }

    fn pointer_down(&mut self, ctx: &mut ToolCtx<'_>, world: Point, _mods: Modifiers) -> ToolOutcome {
        let slop = ctx.viewport.screen_dist_to_world(HANDLE_RADIUS_PX * 0.5);
        if hit::topmost_at(&ctx.surface.scene, world, slop).is_some() {
            return ToolOutcome::Consumed;
        }
        let mut text = SceneObject::text_at(world, NEW_TEXT_CONTENT, ctx.surface.font_size);
        text.style.fill = Some(ctx.surface.style.fill.clone().unwrap_or_else(|| TEXT_COLOR.to_owned()));
        text.style.stroke_width = 0.0;
        let id = text.id;
        ctx.surface.scene.insert(text);
        ctx.surface.select_one(id);
        ctx.surface.begin_text_edit(id);
        ToolOutcome::EditText(id)
    }

    fn pointer_up(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Consumed
    }

    fn cursor(&self) -> &'static str {
        "text"
    }
}
