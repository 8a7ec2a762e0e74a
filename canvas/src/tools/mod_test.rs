use super::*;
use crate::coords::{Plan, PlanType};
use crate::doc::{Bounds, ObjectKind, ObjectRole, SceneObject, Style};
use crate::session::EditorSettings;

struct Fixture {
    surface: Surface,
    viewport: Viewport,
    session: EditorSession,
}

impl Fixture {
    fn new() -> Self {
        let plan = Plan { id: 1, plan_type: PlanType::Image, width: 1000.0, height: 800.0, background_url: None };
        Self {
            surface: Surface::new(Style::default(), 16.0),
            viewport: Viewport::default(),
            session: EditorSession::new(plan, EditorSettings::default()),
        }
    }

    fn ctx(&mut self) -> ToolCtx<'_> {
        ToolCtx { surface: &mut self.surface, viewport: &self.viewport, session: &self.session }
    }

    fn manager(&mut self, registry: ToolRegistry) -> ToolManager {
        ToolManager::new(registry, &mut self.ctx())
    }
}

/// Tool whose activation always fails.
struct BrokenTool;

impl CanvasTool for BrokenTool {
    fn id(&self) -> ToolId {
        ToolId::Polygon
    }

    fn activate(&mut self, _ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        Err(ToolActivationError::Failed { tool: ToolId::Polygon, reason: "missing contract".into() })
    }

    fn deactivate(&mut self, _ctx: &mut ToolCtx<'_>) {}

    fn cursor(&self) -> &'static str {
        "not-allowed"
    }
}

/// Tool that attaches listeners but never detaches them.
struct LeakyTool;

impl CanvasTool for LeakyTool {
    fn id(&self) -> ToolId {
        ToolId::Line
    }

    fn activate(&mut self, ctx: &mut ToolCtx<'_>) -> Result<(), ToolActivationError> {
        ctx.surface.attach_listeners(ToolId::Line)
    }

    fn deactivate(&mut self, _ctx: &mut ToolCtx<'_>) {}

    fn cursor(&self) -> &'static str {
        "crosshair"
    }
}

// =============================================================
// Registry
// =============================================================

#[test]
fn builtin_registry_has_every_tool() {
    let registry = ToolRegistry::builtin();
    for id in ToolId::ALL {
        assert!(registry.contains(id), "{id:?}");
        assert_eq!(registry.create(id).unwrap().id(), id);
    }
}

#[test]
fn resolve_unknown_name_fails() {
    let registry = ToolRegistry::builtin();
    assert_eq!(registry.resolve("lasso").unwrap_err(), ToolActivationError::UnknownTool("lasso".into()));
    assert_eq!(registry.resolve("circle").unwrap(), ToolId::Ellipse);
}

#[test]
fn unregistered_tool_cannot_be_created() {
    let mut registry = ToolRegistry::builtin();
    registry.unregister(ToolId::Pencil);
    assert!(registry.create(ToolId::Pencil).is_err());
    assert!(registry.resolve("pencil").is_err());
}

// =============================================================
// Manager: switching
// =============================================================

#[test]
fn manager_starts_on_select_with_listeners() {
    let mut fx = Fixture::new();
    let manager = fx.manager(ToolRegistry::builtin());
    assert_eq!(manager.current(), ToolId::Select);
    assert_eq!(fx.surface.listener_owner(), Some(ToolId::Select));
    assert!(fx.surface.marquee_enabled());
}

#[test]
fn listeners_never_shared_across_switch_sequence() {
    let mut fx = Fixture::new();
    let mut manager = fx.manager(ToolRegistry::builtin());
    let sequence = [
        ToolId::Rect,
        ToolId::Polygon,
        ToolId::Polygon,
        ToolId::Text,
        ToolId::Select,
        ToolId::Pencil,
        ToolId::Tag,
        ToolId::Ellipse,
        ToolId::Line,
        ToolId::Select,
    ];
    for id in sequence {
        let landed = manager.switch_to(id, &mut fx.ctx());
        assert_eq!(landed, id, "switch to {id:?} must not hit busy listeners");
        assert_eq!(manager.current(), id);
        assert_eq!(fx.surface.listener_owner(), Some(id));
    }
}

#[test]
fn failing_activation_falls_back_to_select() {
    let mut fx = Fixture::new();
    let mut registry = ToolRegistry::builtin();
    registry.register(ToolId::Polygon, || Box::new(BrokenTool));
    let mut manager = fx.manager(registry);
    manager.switch_to(ToolId::Rect, &mut fx.ctx());

    let landed = manager.switch_to(ToolId::Polygon, &mut fx.ctx());
    assert_eq!(landed, ToolId::Select);
    assert_eq!(manager.current(), ToolId::Select);
    assert_eq!(fx.surface.listener_owner(), Some(ToolId::Select));
}

#[test]
fn missing_tool_falls_back_to_select() {
    let mut fx = Fixture::new();
    let mut registry = ToolRegistry::builtin();
    registry.unregister(ToolId::Text);
    let mut manager = fx.manager(registry);
    manager.switch_to(ToolId::Rect, &mut fx.ctx());
    assert_eq!(manager.switch_to(ToolId::Text, &mut fx.ctx()), ToolId::Select);
}

#[test]
fn unknown_name_falls_back_to_select() {
    let mut fx = Fixture::new();
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Rect, &mut fx.ctx());
    assert_eq!(manager.switch_by_name("spray", &mut fx.ctx()), ToolId::Select);
    assert_eq!(fx.surface.listener_owner(), Some(ToolId::Select));
}

#[test]
fn leaked_listeners_are_reclaimed_on_switch() {
    let mut fx = Fixture::new();
    let mut registry = ToolRegistry::builtin();
    registry.register(ToolId::Line, || Box::new(LeakyTool));
    let mut manager = fx.manager(registry);
    manager.switch_to(ToolId::Line, &mut fx.ctx());
    assert_eq!(manager.switch_to(ToolId::Rect, &mut fx.ctx()), ToolId::Rect);
    assert_eq!(fx.surface.listener_owner(), Some(ToolId::Rect));
}

#[test]
fn switching_away_cancels_in_progress_drawing() {
    let mut fx = Fixture::new();
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Rect, &mut fx.ctx());
    manager.active_mut().pointer_down(&mut fx.ctx(), Point::new(0.0, 0.0), Modifiers::default());
    assert!(manager.active().is_drawing());
    manager.switch_to(ToolId::Select, &mut fx.ctx());
    assert!(fx.surface.scene.is_empty());
}

#[test]
fn select_restores_interactivity() {
    let mut fx = Fixture::new();
    let obj = SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 10.0, 10.0));
    let id = obj.id;
    fx.surface.scene.insert(obj);
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Pencil, &mut fx.ctx());
    assert!(!fx.surface.scene.get(&id).unwrap().selectable);
    manager.switch_to(ToolId::Select, &mut fx.ctx());
    let o = fx.surface.scene.get(&id).unwrap();
    assert!(o.selectable && o.evented);
}

// =============================================================
// Pencil / text / tag
// =============================================================

#[test]
fn pencil_enables_free_drawing_until_deactivated() {
    let mut fx = Fixture::new();
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Pencil, &mut fx.ctx());
    assert!(fx.surface.is_free_drawing());
    assert_eq!(fx.surface.brush().map(|b| b.color.as_str()), Some("#1F1A17"));

    let mods = Modifiers::default();
    manager.active_mut().pointer_down(&mut fx.ctx(), Point::new(0.0, 0.0), mods);
    manager.active_mut().pointer_move(&mut fx.ctx(), Point::new(5.0, 5.0), mods);
    let outcome = manager.active_mut().pointer_up(&mut fx.ctx(), Point::new(10.0, 0.0), mods);
    assert!(matches!(outcome, ToolOutcome::Created(_)));
    assert_eq!(fx.surface.scene.iter().filter(|o| o.kind == ObjectKind::Path).count(), 1);

    manager.switch_to(ToolId::Select, &mut fx.ctx());
    assert!(!fx.surface.is_free_drawing());
}

#[test]
fn text_click_on_empty_space_creates_editable_text() {
    let mut fx = Fixture::new();
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Text, &mut fx.ctx());
    let outcome = manager.active_mut().pointer_down(&mut fx.ctx(), Point::new(200.0, 200.0), Modifiers::default());
    let ToolOutcome::EditText(id) = outcome else {
        panic!("expected EditText, got {outcome:?}");
    };
    assert_eq!(fx.surface.editing_text(), Some(id));
    assert_eq!(fx.surface.selection(), &[id]);
    assert_eq!(fx.surface.scene.get(&id).unwrap().kind, ObjectKind::Text);
}

#[test]
fn text_click_on_existing_object_is_noop() {
    let mut fx = Fixture::new();
    fx.surface.scene.insert(SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 100.0, 100.0)));
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Text, &mut fx.ctx());
    let outcome = manager.active_mut().pointer_down(&mut fx.ctx(), Point::new(50.0, 50.0), Modifiers::default());
    assert_eq!(outcome, ToolOutcome::Consumed);
    assert_eq!(fx.surface.scene.len(), 1);
    assert_eq!(fx.surface.editing_text(), None);
}

#[test]
fn tag_tool_keeps_plan_shapes_hittable() {
    let mut fx = Fixture::new();
    let shape = SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 10.0, 10.0)).with_role(ObjectRole::SvgShape);
    let drawing = SceneObject::new(ObjectKind::Rect, Bounds::new(0.0, 0.0, 10.0, 10.0));
    let (shape_id, drawing_id) = (shape.id, drawing.id);
    fx.surface.scene.insert(shape);
    fx.surface.scene.insert(drawing);
    let mut manager = fx.manager(ToolRegistry::builtin());
    manager.switch_to(ToolId::Tag, &mut fx.ctx());
    assert!(fx.surface.scene.get(&shape_id).unwrap().evented);
    assert!(!fx.surface.scene.get(&drawing_id).unwrap().evented);
    assert_eq!(fx.surface.cursor(), "crosshair");
}
