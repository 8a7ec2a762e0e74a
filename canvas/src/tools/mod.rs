//! Drawing-tool framework.
//!
//! Every tool implements [`CanvasTool`]. The [`ToolRegistry`] maps each
//! [`ToolId`] to a factory, and the [`ToolManager`] owns the single active
//! tool and performs switches strictly in order: the outgoing tool's
//! `deactivate` always returns before the incoming tool's `activate` runs.
//!
//! | Tool | Module | Gesture |
//! |------|--------|---------|
//! | select | [`select`] | rest state; the router handles manipulation |
//! | rectangle, circle, line | [`shape`] | drag to create |
//! | polygon | [`polygon`] | click vertices, double-click / Enter to close |
//! | pencil | [`pencil`] | freehand stroke on the surface |
//! | text | [`text`] | click to place editable text |
//! | tag | [`tag`] | geo-code placement clicks |
//!
//! Activation errors never escape the framework: the manager logs them and
//! lands on the select tool.

pub mod pencil;
pub mod polygon;
pub mod select;
pub mod shape;
pub mod tag;
pub mod text;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use tracing::{error, info, warn};

use crate::doc::ObjectId;
use crate::error::ToolActivationError;
use crate::input::{Key, Modifiers, ToolId};
use crate::session::EditorSession;
use crate::surface::Surface;
use crate::viewport::{Point, Viewport};

/// What the router passes to every tool hook.
pub struct ToolCtx<'a> {
    pub surface: &'a mut Surface,
    pub viewport: &'a Viewport,
    pub session: &'a EditorSession,
}

/// Result of a tool hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Not handled; the router may apply native manipulation.
    Ignored,
    /// Handled, nothing visible changed.
    Consumed,
    /// Handled; the scene or a preview changed.
    Changed,
    /// An in-progress object was thrown away.
    Discarded,
    /// An object was committed to the scene.
    Created(ObjectId),
    /// A text object was created and should enter inline editing.
    EditText(ObjectId),
}

/// Contract every drawing tool implements.
pub trait CanvasTool {
    fn id(&self) -> ToolId;

    /// Become the current tool: disable the marquee, set the cursor, adjust
    /// object interactivity, attach listeners.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolActivationError`] when the listeners are held by
    /// another tool or the tool cannot start.
    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError>;

    /// Stop being the current tool: drop any preview or per-tool state and
    /// detach listeners.
    fn deactivate(&mut self, ctx: &mut ToolCtx<'_>);

    fn pointer_down(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Ignored
    }

    fn pointer_move(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Ignored
    }

    fn pointer_up(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Ignored
    }

    fn double_click(&mut self, _ctx: &mut ToolCtx<'_>, _world: Point) -> ToolOutcome {
        ToolOutcome::Ignored
    }

    fn key_down(&mut self, _ctx: &mut ToolCtx<'_>, _key: &Key, _mods: Modifiers) -> ToolOutcome {
        ToolOutcome::Ignored
    }

    /// Abandon an in-progress drawing. Returns whether anything was cancelled.
    fn cancel(&mut self, _ctx: &mut ToolCtx<'_>) -> bool {
        false
    }

    /// A drawing is in progress (drag, polygon collection, stroke).
    fn is_drawing(&self) -> bool {
        false
    }

    /// CSS cursor shown while the tool is current.
    fn cursor(&self) -> &'static str;
}

/// Constructor for a tool instance.
pub type ToolFactory = fn() -> Box<dyn CanvasTool>;

/// Static mapping from tool id to factory.
pub struct ToolRegistry {
    entries: Vec<(ToolId, ToolFactory)>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    /// Registry with no tools.
    #[must_use]
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registry with every built-in tool.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(ToolId::Select, || Box::new(select::SelectTool));
        registry.register(ToolId::Rect, || Box::new(shape::ShapeTool::rect()));
        registry.register(ToolId::Ellipse, || Box::new(shape::ShapeTool::ellipse()));
        registry.register(ToolId::Line, || Box::new(shape::ShapeTool::line()));
        registry.register(ToolId::Polygon, || Box::new(polygon::PolygonTool::default()));
        registry.register(ToolId::Pencil, || Box::new(pencil::PencilTool));
        registry.register(ToolId::Text, || Box::new(text::TextTool));
        registry.register(ToolId::Tag, || Box::new(tag::TagTool));
        registry
    }

    /// Register or replace the factory for `id`.
    pub fn register(&mut self, id: ToolId, factory: ToolFactory) {
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.push((id, factory));
    }

    /// Remove the factory for `id`.
    pub fn unregister(&mut self, id: ToolId) {
        self.entries.retain(|(existing, _)| *existing != id);
    }

    /// Resolve a toolbar name to a registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolActivationError::UnknownTool`] for names that map to no
    /// registered tool.
    pub fn resolve(&self, name: &str) -> Result<ToolId, ToolActivationError> {
        ToolId::from_name(name)
            .filter(|id| self.contains(*id))
            .ok_or_else(|| ToolActivationError::UnknownTool(name.to_owned()))
    }

    #[must_use]
    pub fn contains(&self, id: ToolId) -> bool {
        self.entries.iter().any(|(existing, _)| *existing == id)
    }

    /// Instantiate the tool registered for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolActivationError::UnknownTool`] when nothing is registered.
    pub fn create(&self, id: ToolId) -> Result<Box<dyn CanvasTool>, ToolActivationError> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, factory)| factory())
            .ok_or_else(|| ToolActivationError::UnknownTool(id.name().to_owned()))
    }
}

/// Owns the current tool and performs sequential switches.
pub struct ToolManager {
    registry: ToolRegistry,
    active: Box<dyn CanvasTool>,
}

impl ToolManager {
    /// Create the manager and activate the select tool.
    pub fn new(registry: ToolRegistry, ctx: &mut ToolCtx<'_>) -> Self {
        let mut manager = Self { registry, active: Box::new(select::SelectTool) };
        manager.force_select(ctx);
        manager
    }

    #[must_use]
    pub fn current(&self) -> ToolId {
        self.active.id()
    }

    #[must_use]
    pub fn active(&self) -> &dyn CanvasTool {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn CanvasTool {
        self.active.as_mut()
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Switch by toolbar name; unknown names fall back to select.
    pub fn switch_by_name(&mut self, name: &str, ctx: &mut ToolCtx<'_>) -> ToolId {
        match self.registry.resolve(name) {
            Ok(id) => self.switch_to(id, ctx),
            Err(err) => {
                warn!(%err, "tool switch failed; falling back to select");
                self.deactivate_current(ctx);
                self.force_select(ctx);
                ToolId::Select
            }
        }
    }

    /// Deactivate the current tool, then activate `id`. Returns the tool that
    /// ended up current: `id`, or select when `id` could not be activated.
    pub fn switch_to(&mut self, id: ToolId, ctx: &mut ToolCtx<'_>) -> ToolId {
        if id == self.current() {
            return id;
        }
        self.deactivate_current(ctx);

        let mut next = match self.registry.create(id) {
            Ok(tool) => tool,
            Err(err) => {
                warn!(%err, tool = id.name(), "tool unavailable; falling back to select");
                self.force_select(ctx);
                return ToolId::Select;
            }
        };
        match next.activate(ctx) {
            Ok(()) => {
                info!(tool = id.name(), "tool activated");
                self.active = next;
                id
            }
            Err(err) => {
                warn!(%err, tool = id.name(), "tool activation failed; falling back to select");
                next.deactivate(ctx);
                self.force_select(ctx);
                ToolId::Select
            }
        }
    }

    fn deactivate_current(&mut self, ctx: &mut ToolCtx<'_>) {
        let outgoing = self.current();
        self.active.deactivate(ctx);
        if let Some(owner) = ctx.surface.force_detach_listeners() {
            warn!(tool = outgoing.name(), owner = owner.name(), "listeners left attached after deactivate");
        }
    }

    /// Install the built-in select tool without consulting the registry.
    fn force_select(&mut self, ctx: &mut ToolCtx<'_>) {
        ctx.surface.force_detach_listeners();
        let mut tool: Box<dyn CanvasTool> = Box::new(select::SelectTool);
        if let Err(err) = tool.activate(ctx) {
            error!(%err, "select tool failed to activate");
        }
        self.active = tool;
    }
}
