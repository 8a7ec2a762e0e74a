use tracing::{debug, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::consts::{HANDLE_RADIUS_PX, WHEEL_PIXELS_PER_STEP, ZOOM_STEP};
use crate::coords::{Plan, PositionRecord};
use crate::doc::{
    Bounds, DrawingSnapshot, GeoCodeId, ObjectId, ObjectKind, ObjectRole, SNAPSHOT_VERSION, SceneObject,
    estimate_text_size,
};
use crate::error::PlacementError;
use crate::grid;
use crate::hit::{self, HitPart, ResizeAnchor};
use crate::input::{Button, EditGesture, InputState, Key, Modifiers, ToolId, WheelDelta};
use crate::placement::{self, GeoCodeRef, PlacedCode, PlacementPhase, PlacementSession};
use crate::render;
use crate::selection::{self, Alignment, Clipboard, LayerMove};
use crate::session::{EditorSession, EditorSettings};
use crate::surface::Surface;
use crate::svg;
use crate::tools::{CanvasTool, ToolCtx, ToolManager, ToolOutcome, ToolRegistry};
use crate::viewport::{Point, Size, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Rotation snaps to multiples of this angle while Shift is held.
const ROTATE_SNAP_DEG: f64 = 15.0;

/// Smallest box a resize can produce, in plan units.
const MIN_RESIZE: f64 = 1.0;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ObjectCreated(SceneObject),
    ObjectDeleted { id: ObjectId },
    SelectionChanged(Vec<ObjectId>),
    /// Open the inline text editor over `id`.
    EditTextRequested { id: ObjectId, text: String, select_all: bool },
    /// Close the inline text editor over `id`.
    TextEditEnded { id: ObjectId },
    SetCursor(String),
    ToolChanged(ToolId),
    ViewportTransformed { zoom: f64, pan_x: f64, pan_y: f64 },
    /// Persist the position of a geo-code's linked object.
    SavePosition { geo_code_id: GeoCodeId, record: PositionRecord },
    /// The linked object of a geo-code was deleted.
    RemovePosition { geo_code_id: GeoCodeId },
    /// Image plans: schedule a debounced save of the drawing.
    AutoSaveRequested,
    SaveDrawing(DrawingSnapshot),
    SaveSvg(String),
    /// SVG plans: unsaved changes exist.
    SvgDirty,
    /// The placement session ended; the side list should drop its selection.
    PlacementCleared,
    /// Transient user notification.
    Notify(String),
    /// The key event was handled; the host should prevent its default.
    KeyConsumed,
    RenderNeeded,
}

/// Core engine state — all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub surface: Surface,
    pub viewport: Viewport,
    pub session: EditorSession,
    pub input: InputState,
    tools: ToolManager,
    clipboard: Clipboard,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    alt_held: bool,
    input_focused: bool,
}

impl EngineCore {
    /// Create an engine for `plan` with the built-in tools.
    #[must_use]
    pub fn new(plan: Plan, settings: EditorSettings) -> Self {
        Self::with_registry(plan, settings, ToolRegistry::builtin())
    }

    /// Create an engine for `plan` with a custom tool registry.
    #[must_use]
    pub fn with_registry(plan: Plan, settings: EditorSettings, registry: ToolRegistry) -> Self {
        let mut surface = Surface::new(settings.drawing_style(), settings.font_size);
        if let Some(url) = plan.background_url.as_deref() {
            let mut background = SceneObject::new(ObjectKind::Image, Bounds::new(0.0, 0.0, plan.width, plan.height));
            background.src = Some(url.to_owned());
            surface.scene.set_background(background);
        }
        let viewport = Viewport {
            grid_size: settings.grid_size,
            snap_enabled: settings.snap_enabled,
            show_grid: settings.show_grid,
            ..Viewport::default()
        };
        let session = EditorSession::new(plan, settings);
        let tools = {
            let mut ctx = ToolCtx { surface: &mut surface, viewport: &viewport, session: &session };
            ToolManager::new(registry, &mut ctx)
        };
        info!(plan_id = session.plan.id, plan_type = ?session.plan.plan_type, "editor started");
        let mut core = Self {
            surface,
            viewport,
            session,
            input: InputState::Idle,
            tools,
            clipboard: Clipboard::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            alt_held: false,
            input_focused: false,
        };
        core.refresh_grid();
        core
    }

    // --- Data inputs ---

    /// Replace the user drawing with a stored snapshot.
    pub fn load_drawing(&mut self, snapshot: DrawingSnapshot) -> Vec<Action> {
        let count = snapshot.objects.len();
        self.surface.scene.load_snapshot(snapshot);
        self.surface.prune_selection();
        self.reapply_tool_interactivity();
        debug!(count, "drawing loaded");
        vec![Action::RenderNeeded]
    }

    /// Replace the imported SVG plan shapes. They sit above the background
    /// and grid, below every drawing.
    pub fn load_svg_shapes(&mut self, shapes: Vec<SceneObject>) -> Vec<Action> {
        self.surface.scene.remove_where(|o| o.role == ObjectRole::SvgShape);
        let count = shapes.len();
        for mut shape in shapes.into_iter().rev() {
            shape.role = ObjectRole::SvgShape;
            self.surface.scene.insert_above_base(shape);
        }
        self.surface.prune_selection();
        self.reapply_tool_interactivity();
        debug!(count, "svg shapes loaded");
        vec![Action::RenderNeeded]
    }

    /// Recreate markers / labels for codes already positioned on the plan.
    pub fn load_placed_codes(&mut self, codes: &[PlacedCode]) -> Vec<Action> {
        placement::load_placed_codes(&mut self.surface.scene, &self.session.plan, codes);
        self.surface.prune_selection();
        self.reapply_tool_interactivity();
        vec![Action::RenderNeeded]
    }

    /// The host's text input gained or lost focus.
    pub fn set_input_focused(&mut self, focused: bool) {
        self.input_focused = focused;
    }

    // --- Tool / text ---

    /// Switch tools. Unavailable tools land on select with a notification.
    pub fn set_tool(&mut self, id: ToolId) -> Vec<Action> {
        let mut actions = Vec::new();
        if id != ToolId::Tag && self.session.placement.take().is_some() {
            actions.push(Action::PlacementCleared);
        }
        let landed = self.switch_tool(id);
        if landed != id {
            actions.push(Action::Notify(format!("Tool \"{}\" is unavailable", id.name())));
        }
        actions.extend(self.tool_changed_actions(landed));
        actions
    }

    /// Switch tools by toolbar name. Unknown names land on select.
    pub fn set_tool_by_name(&mut self, name: &str) -> Vec<Action> {
        match ToolId::from_name(name) {
            Some(id) => self.set_tool(id),
            None => {
                let landed = {
                    let mut ctx =
                        ToolCtx { surface: &mut self.surface, viewport: &self.viewport, session: &self.session };
                    self.tools.switch_by_name(name, &mut ctx)
                };
                self.session.current_tool = landed;
                self.input = self.rest_state();
                let mut actions = vec![Action::Notify(format!("Tool \"{name}\" is unavailable"))];
                actions.extend(self.tool_changed_actions(landed));
                actions
            }
        }
    }

    /// Commit text from the host editor. Empty text removes the object.
    pub fn commit_text(&mut self, id: &ObjectId, text: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.surface.editing_text() == Some(*id) {
            self.surface.end_text_edit();
            actions.push(Action::TextEditEnded { id: *id });
        }
        if self.input == InputState::Editing(EditGesture::Text { id: *id }) {
            self.input = self.rest_state();
        }
        let Some(obj) = self.surface.scene.get_mut(id) else {
            return actions;
        };
        if obj.role != ObjectRole::Drawing || obj.kind != ObjectKind::Text {
            return actions;
        }
        if text.trim().is_empty() {
            self.surface.scene.remove(id);
            self.surface.prune_selection();
            actions.push(Action::ObjectDeleted { id: *id });
            actions.push(Action::SelectionChanged(self.surface.selection().to_vec()));
            actions.extend(self.drawing_changed());
            actions.push(Action::RenderNeeded);
            return actions;
        }
        let font_size = obj.font_size.unwrap_or(self.surface.font_size);
        let size = estimate_text_size(text, font_size);
        obj.text = Some(text.to_owned());
        obj.width = size.width / obj.scale_x;
        obj.height = size.height / obj.scale_y;
        actions.extend(self.route_modified(id));
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Placement ---

    /// Arm `code` for placement; the next canvas click places it.
    pub fn arm_placement(&mut self, code: GeoCodeRef) -> Vec<Action> {
        info!(geo_code_id = code.id, code = %code.code, "placement armed");
        self.session.placement = Some(PlacementSession::armed(code));
        let landed = self.switch_tool(ToolId::Tag);
        self.tool_changed_actions(landed)
    }

    /// Resolve the pending position save. The placed object stays on the
    /// canvas either way; the session always ends.
    pub fn complete_placement(&mut self, result: Result<(), String>) -> Vec<Action> {
        let Some(session) = self.session.placement.take() else {
            debug!(error = %PlacementError::NotArmed, "placement completion ignored");
            return Vec::new();
        };
        let mut actions = Vec::new();
        match result.map_err(PlacementError::Rejected) {
            Ok(()) => info!(geo_code_id = session.code.id, "placement saved"),
            Err(err) => {
                warn!(geo_code_id = session.code.id, %err, "placement save failed");
                actions.push(Action::Notify(format!("{}: {err}", session.code.code)));
            }
        }
        actions.push(Action::PlacementCleared);
        let landed = self.switch_tool(ToolId::Select);
        actions.extend(self.tool_changed_actions(landed));
        actions
    }

    fn place_at(&mut self, world: Point) -> Vec<Action> {
        let Some(code) = self.session.placement.as_ref().map(|s| s.code.clone()) else {
            warn!(error = %PlacementError::NotArmed, "placement click ignored");
            return Vec::new();
        };
        let hit_id = hit::topmost_at(&self.surface.scene, world, self.hit_slop());
        match placement::place(&mut self.surface.scene, &self.session.plan, &code, hit_id, world) {
            Ok(placed) => {
                if let Some(session) = self.session.placement.as_mut() {
                    session.phase = PlacementPhase::Saving;
                    session.object_id = Some(placed.object_id);
                }
                self.surface.prune_selection();
                self.surface.select_one(placed.object_id);
                self.input = self.rest_state();
                let mut actions: Vec<Action> =
                    placed.replaced.iter().map(|&id| Action::ObjectDeleted { id }).collect();
                if let Some(obj) = self.surface.scene.get(&placed.object_id) {
                    actions.push(Action::ObjectCreated(obj.clone()));
                }
                actions.push(Action::SelectionChanged(vec![placed.object_id]));
                actions.push(Action::SavePosition { geo_code_id: placed.geo_code_id, record: placed.record });
                actions.push(Action::RenderNeeded);
                actions
            }
            Err(err) => {
                warn!(%err, geo_code_id = code.id, "placement failed");
                self.session.placement = None;
                let mut actions = vec![Action::Notify(err.to_string()), Action::PlacementCleared];
                let landed = self.switch_tool(ToolId::Select);
                actions.extend(self.tool_changed_actions(landed));
                actions
            }
        }
    }

    // --- Persistence ---

    /// The user drawing as persisted for image plans.
    #[must_use]
    pub fn drawing_snapshot(&self) -> DrawingSnapshot {
        self.surface.scene.snapshot()
    }

    /// The scene as SVG markup at the plan's native size.
    #[must_use]
    pub fn svg_markup(&self) -> String {
        svg::scene_to_svg(&self.surface.scene, self.session.plan.native_size())
    }

    /// Manual save: SVG markup on SVG plans, the drawing snapshot otherwise.
    pub fn save(&mut self) -> Vec<Action> {
        if self.session.plan.is_svg() {
            self.session.dirty = false;
            vec![Action::SaveSvg(self.svg_markup())]
        } else {
            vec![Action::SaveDrawing(self.drawing_snapshot())]
        }
    }

    // --- Asset library ---

    /// The selection as a reusable asset payload. Linked and structural
    /// objects are left out.
    #[must_use]
    pub fn selection_as_asset(&self) -> Option<DrawingSnapshot> {
        let objects: Vec<SceneObject> = self
            .surface
            .selected_objects()
            .into_iter()
            .filter(|o| o.role == ObjectRole::Drawing)
            .cloned()
            .collect();
        if objects.is_empty() {
            return None;
        }
        Some(DrawingSnapshot { version: SNAPSHOT_VERSION, objects })
    }

    /// Insert an asset as one group centered in the viewport.
    pub fn insert_asset(&mut self, asset: DrawingSnapshot) -> Vec<Action> {
        let mut objects: Vec<SceneObject> = asset.objects.iter().map(SceneObject::duplicate).collect();
        let Some(bounds) = objects.iter().map(SceneObject::bounds).reduce(|a, b| a.union(&b)) else {
            return Vec::new();
        };
        let mut inserted = if objects.len() == 1 && objects[0].kind == ObjectKind::Group {
            objects.remove(0)
        } else {
            let mut group = SceneObject::new(ObjectKind::Group, bounds);
            group.children = objects;
            group
        };
        inserted.role = ObjectRole::Drawing;
        let target = self
            .viewport
            .screen_to_world(Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5));
        let center = bounds.center();
        inserted.translate(target.x - center.x, target.y - center.y);
        let id = inserted.id;
        self.surface.scene.insert(inserted.clone());
        self.surface.select_one(id);
        let mut actions = vec![Action::ObjectCreated(inserted), Action::SelectionChanged(vec![id])];
        actions.extend(self.drawing_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Selection commands ---

    pub fn align(&mut self, mode: Alignment) -> Vec<Action> {
        let moved = selection::align(&mut self.surface, mode);
        self.modified_many(&moved)
    }

    pub fn group_selection(&mut self) -> Vec<Action> {
        let before = self.surface.selection().to_vec();
        let Some(id) = selection::group(&mut self.surface) else {
            return Vec::new();
        };
        let mut actions: Vec<Action> = before
            .into_iter()
            .filter(|old| !self.surface.scene.contains(old))
            .map(|old| Action::ObjectDeleted { id: old })
            .collect();
        if let Some(obj) = self.surface.scene.get(&id) {
            actions.push(Action::ObjectCreated(obj.clone()));
        }
        actions.push(Action::SelectionChanged(vec![id]));
        actions.extend(self.drawing_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn ungroup_selection(&mut self) -> Vec<Action> {
        let groups: Vec<ObjectId> = self
            .surface
            .selected_objects()
            .into_iter()
            .filter(|o| o.kind == ObjectKind::Group)
            .map(|o| o.id)
            .collect();
        let released = selection::ungroup(&mut self.surface);
        if released.is_empty() {
            return Vec::new();
        }
        let mut actions: Vec<Action> = groups.into_iter().map(|id| Action::ObjectDeleted { id }).collect();
        for id in &released {
            if let Some(obj) = self.surface.scene.get(id) {
                actions.push(Action::ObjectCreated(obj.clone()));
            }
        }
        actions.push(Action::SelectionChanged(released));
        actions.extend(self.drawing_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn reorder(&mut self, layer: LayerMove) -> Vec<Action> {
        if !selection::reorder(&mut self.surface, layer) {
            return Vec::new();
        }
        let mut actions = self.drawing_changed();
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn toggle_lock(&mut self) -> Vec<Action> {
        match selection::toggle_lock(&mut self.surface) {
            Some(locked) => {
                debug!(locked, "selection lock toggled");
                vec![Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    pub fn delete_selection(&mut self) -> Vec<Action> {
        let editing = self.surface.editing_text();
        let removed = selection::delete(&mut self.surface);
        if removed.is_empty() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if let Some(id) = editing.filter(|id| removed.iter().any(|o| o.id == *id)) {
            self.input = self.rest_state();
            actions.push(Action::TextEditEnded { id });
        }
        let mut drawing_changed = false;
        for obj in &removed {
            actions.push(Action::ObjectDeleted { id: obj.id });
            match obj.role.geo_code_id() {
                Some(geo_code_id) => actions.push(Action::RemovePosition { geo_code_id }),
                None => drawing_changed = true,
            }
        }
        actions.push(Action::SelectionChanged(Vec::new()));
        if drawing_changed {
            actions.extend(self.drawing_changed());
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn copy_selection(&mut self) -> Vec<Action> {
        let count = self.clipboard.copy(&self.surface);
        debug!(count, "selection copied");
        Vec::new()
    }

    pub fn paste(&mut self) -> Vec<Action> {
        let ids = self.clipboard.paste(&mut self.surface);
        if ids.is_empty() {
            return Vec::new();
        }
        let mut actions: Vec<Action> = ids
            .iter()
            .filter_map(|id| self.surface.scene.get(id))
            .map(|obj| Action::ObjectCreated(obj.clone()))
            .collect();
        actions.push(Action::SelectionChanged(ids));
        actions.extend(self.drawing_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_centered(self.viewport.zoom * ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_centered(self.viewport.zoom / ZOOM_STEP)
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        self.viewport.zoom = 1.0;
        self.viewport.pan_x = 0.0;
        self.viewport.pan_y = 0.0;
        self.viewport_changed()
    }

    /// Fit the whole plan into the viewport.
    pub fn zoom_to_fit(&mut self) -> Vec<Action> {
        self.viewport.fit(
            self.session.plan.native_size(),
            Size::new(self.viewport_width, self.viewport_height),
        );
        self.viewport_changed()
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.viewport.snap_enabled = !self.viewport.snap_enabled;
        self.session.settings.snap_enabled = self.viewport.snap_enabled;
        self.viewport.snap_enabled
    }

    pub fn set_show_grid(&mut self, show: bool) -> Vec<Action> {
        self.viewport.show_grid = show;
        self.session.settings.show_grid = show;
        self.refresh_grid();
        vec![Action::RenderNeeded]
    }

    /// Rebuild grid lines for the current zoom, or remove them when hidden.
    pub fn refresh_grid(&mut self) {
        self.surface.scene.remove_where(|o| o.role == ObjectRole::GridLine);
        if !self.viewport.show_grid {
            return;
        }
        let lines = grid::grid_lines(self.session.plan.native_size(), self.viewport.grid_size, self.viewport.zoom);
        for line in lines {
            self.surface.scene.insert_above_base(line);
        }
    }

    fn zoom_centered(&mut self, zoom: f64) -> Vec<Action> {
        let anchor = Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5);
        if self.viewport.zoom_at(anchor, zoom) {
            self.viewport_changed()
        } else {
            Vec::new()
        }
    }

    fn viewport_changed(&mut self) -> Vec<Action> {
        self.refresh_grid();
        vec![
            Action::ViewportTransformed { zoom: self.viewport.zoom, pan_x: self.viewport.pan_x, pan_y: self.viewport.pan_y },
            Action::RenderNeeded,
        ]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let world = self.viewport.screen_to_world(screen_pt);

        if let InputState::Editing(EditGesture::Text { id }) = self.input {
            self.surface.end_text_edit();
            self.input = self.rest_state();
            // Only the select tool lets the same click go on to pick an object.
            if self.tools.current() != ToolId::Select {
                return vec![Action::TextEditEnded { id }, Action::RenderNeeded];
            }
            return self.pointer_down_after_text(id, screen_pt, button, modifiers);
        }

        if button == Button::Middle || modifiers.alt || self.alt_held {
            self.input = InputState::Panning { last_screen: screen_pt };
            return vec![Action::SetCursor("grabbing".into())];
        }
        if button != Button::Primary {
            return Vec::new();
        }

        if self.session.placement_armed() {
            return self.place_at(world);
        }

        let outcome = self.with_tool(|tool, ctx| tool.pointer_down(ctx, world, modifiers));
        if self.surface.is_stroking() {
            self.input = InputState::Editing(EditGesture::Stroke);
        }
        if outcome != ToolOutcome::Ignored {
            return self.apply_outcome(outcome);
        }
        if self.tools.current() == ToolId::Select {
            return self.begin_manipulation(world, modifiers);
        }
        Vec::new()
    }

    fn pointer_down_after_text(
        &mut self,
        id: ObjectId,
        screen_pt: Point,
        button: Button,
        modifiers: Modifiers,
    ) -> Vec<Action> {
        let mut actions = vec![Action::TextEditEnded { id }];
        actions.extend(self.on_pointer_down(screen_pt, button, modifiers));
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let world = self.viewport.screen_to_world(screen_pt);
        match std::mem::take(&mut self.input) {
            InputState::Panning { last_screen } => {
                self.viewport.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen_pt };
                vec![
                    Action::ViewportTransformed {
                        zoom: self.viewport.zoom,
                        pan_x: self.viewport.pan_x,
                        pan_y: self.viewport.pan_y,
                    },
                    Action::RenderNeeded,
                ]
            }
            InputState::Editing(EditGesture::Move { start_world, origins, moved }) => {
                let (dx, dy) = self.move_delta(&origins, world.x - start_world.x, world.y - start_world.y);
                for (id, origin) in &origins {
                    if let Some(obj) = self.surface.scene.get_mut(id) {
                        obj.move_to(origin.x + dx, origin.y + dy);
                    }
                }
                let moved = moved || dx.abs() > f64::EPSILON || dy.abs() > f64::EPSILON;
                self.input = InputState::Editing(EditGesture::Move { start_world, origins, moved });
                vec![Action::RenderNeeded]
            }
            InputState::Editing(gesture @ EditGesture::Resize { .. }) => {
                self.resize_object(&gesture, world);
                self.input = InputState::Editing(gesture);
                vec![Action::RenderNeeded]
            }
            InputState::Editing(EditGesture::Rotate { id, center, start_angle, orig_angle }) => {
                let mut angle = orig_angle + pointer_angle(center, world) - start_angle;
                if modifiers.shift {
                    angle = (angle / ROTATE_SNAP_DEG).round() * ROTATE_SNAP_DEG;
                }
                if let Some(obj) = self.surface.scene.get_mut(&id) {
                    obj.angle = angle.rem_euclid(360.0);
                }
                self.input = InputState::Editing(EditGesture::Rotate { id, center, start_angle, orig_angle });
                vec![Action::RenderNeeded]
            }
            InputState::Editing(EditGesture::Marquee { start_world, .. }) => {
                self.input = InputState::Editing(EditGesture::Marquee { start_world, current_world: world });
                vec![Action::RenderNeeded]
            }
            state => {
                self.input = state;
                let outcome = self.with_tool(|tool, ctx| tool.pointer_move(ctx, world, modifiers));
                self.apply_outcome(outcome)
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let world = self.viewport.screen_to_world(screen_pt);
        match std::mem::take(&mut self.input) {
            InputState::Panning { .. } => {
                self.input = self.rest_state();
                vec![Action::SetCursor(self.current_cursor()), Action::RenderNeeded]
            }
            InputState::Editing(EditGesture::Move { origins, moved, .. }) => {
                self.input = self.rest_state();
                if !moved {
                    return vec![Action::RenderNeeded];
                }
                let ids: Vec<ObjectId> = origins.into_iter().map(|(id, _)| id).collect();
                self.modified_many(&ids)
            }
            InputState::Editing(EditGesture::Resize { id, .. } | EditGesture::Rotate { id, .. }) => {
                self.input = self.rest_state();
                let mut actions = vec![Action::SetCursor(self.current_cursor())];
                actions.extend(self.route_modified(&id));
                actions.push(Action::RenderNeeded);
                actions
            }
            InputState::Editing(EditGesture::Marquee { start_world, current_world }) => {
                self.input = self.rest_state();
                let rect = Bounds::from_corners(start_world, current_world);
                let mut ids = hit::objects_in_rect(&self.surface.scene, &rect);
                if modifiers.shift {
                    let mut merged = self.surface.selection().to_vec();
                    merged.extend(ids.into_iter().filter(|id| !self.surface.is_selected(id)));
                    ids = merged;
                }
                self.surface.select(ids);
                vec![Action::SelectionChanged(self.surface.selection().to_vec()), Action::RenderNeeded]
            }
            InputState::Editing(EditGesture::Stroke) => {
                self.input = self.rest_state();
                let outcome = self.with_tool(|tool, ctx| tool.pointer_up(ctx, world, modifiers));
                self.apply_outcome(outcome)
            }
            state => {
                self.input = state;
                if button != Button::Primary {
                    return Vec::new();
                }
                let outcome = self.with_tool(|tool, ctx| tool.pointer_up(ctx, world, modifiers));
                self.apply_outcome(outcome)
            }
        }
    }

    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        if self.session.placement_armed() {
            return Vec::new();
        }
        let world = self.viewport.screen_to_world(screen_pt);
        let outcome = self.with_tool(|tool, ctx| tool.double_click(ctx, world));
        if outcome != ToolOutcome::Ignored {
            return self.apply_outcome(outcome);
        }
        if self.tools.current() != ToolId::Select {
            return Vec::new();
        }
        let Some(id) = hit::topmost_at(&self.surface.scene, world, self.hit_slop()) else {
            return Vec::new();
        };
        if !self.surface.begin_text_edit(id) {
            return Vec::new();
        }
        self.surface.select_one(id);
        self.edit_text_actions(id)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        let factor = ZOOM_STEP.powf(-delta.dy / WHEEL_PIXELS_PER_STEP);
        if self.viewport.zoom_at(screen_pt, self.viewport.zoom * factor) {
            self.viewport_changed()
        } else {
            Vec::new()
        }
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is("Escape") {
            return self.escape();
        }
        if self.input_focused {
            return Vec::new();
        }
        if key.is("Alt") {
            self.alt_held = true;
            return vec![Action::SetCursor("grab".into())];
        }
        if self.surface.editing_text().is_some() {
            return Vec::new();
        }

        let handled = if modifiers.command() {
            self.command_shortcut(&key, modifiers)
        } else if key.is("Enter") {
            match self.with_tool(|tool, ctx| tool.key_down(ctx, &key, modifiers)) {
                ToolOutcome::Ignored => None,
                outcome => Some(self.apply_outcome(outcome)),
            }
        } else if modifiers.is_bare() {
            self.bare_shortcut(&key)
        } else {
            None
        };
        let Some(mut actions) = handled else {
            return Vec::new();
        };
        actions.push(Action::KeyConsumed);
        actions
    }

    pub fn on_key_up(&mut self, key: Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.is("Alt") {
            self.alt_held = false;
            return vec![Action::SetCursor(self.current_cursor())];
        }
        Vec::new()
    }

    /// Ctrl/Cmd shortcuts. `None` leaves the key to the browser.
    fn command_shortcut(&mut self, key: &Key, modifiers: Modifiers) -> Option<Vec<Action>> {
        if key.is_letter('c') {
            Some(self.copy_selection())
        } else if key.is_letter('v') {
            Some(self.paste())
        } else if key.is_letter('g') && modifiers.shift {
            Some(self.ungroup_selection())
        } else if key.is_letter('g') {
            Some(self.group_selection())
        } else if key.is_letter('l') && self.session.plan.is_svg() {
            Some(self.toggle_lock())
        } else {
            None
        }
    }

    fn bare_shortcut(&mut self, key: &Key) -> Option<Vec<Action>> {
        if key.is("Delete") || key.is("Backspace") {
            return Some(self.delete_selection());
        }
        ToolId::from_shortcut(&key.0).map(|id| self.set_tool(id))
    }

    /// Escape: an in-progress drawing belongs to the tool and only it is
    /// cancelled. Otherwise a pointer gesture is reverted and every remaining
    /// layer is unwound in one press: non-select tool or placement, inline
    /// text editing, selection.
    fn escape(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.tools.active().is_drawing() || self.surface.is_stroking() {
            self.with_tool(|tool, ctx| tool.cancel(ctx));
            self.surface.cancel_stroke();
            if self.input == InputState::Editing(EditGesture::Stroke) {
                self.input = self.rest_state();
            }
            debug!(tool = self.tools.current().name(), "drawing cancelled");
            return vec![Action::KeyConsumed, Action::RenderNeeded];
        }

        let mut consumed = self.revert_gesture();
        if self.tools.current() != ToolId::Select || self.session.placement.is_some() {
            if self.session.placement.take().is_some() {
                actions.push(Action::PlacementCleared);
            }
            let landed = self.switch_tool(ToolId::Select);
            actions.extend(self.tool_changed_actions(landed));
            consumed = true;
        }

        if let Some(id) = self.surface.end_text_edit() {
            if matches!(self.input, InputState::Editing(EditGesture::Text { .. })) {
                self.input = self.rest_state();
            }
            actions.push(Action::TextEditEnded { id });
            let empty = self
                .surface
                .scene
                .get(&id)
                .is_some_and(|o| o.text.as_deref().is_none_or(|t| t.trim().is_empty()));
            if empty {
                self.surface.scene.remove(&id);
                self.surface.prune_selection();
                actions.push(Action::ObjectDeleted { id });
                actions.extend(self.drawing_changed());
            }
            consumed = true;
        }

        if self.surface.clear_selection() {
            actions.push(Action::SelectionChanged(Vec::new()));
            consumed = true;
        }

        if consumed {
            actions.push(Action::KeyConsumed);
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Abandon a pan or native manipulation, restoring the geometry it had
    /// at pointer-down. Inline text editing is left alone.
    fn revert_gesture(&mut self) -> bool {
        if !self.input.is_gesture() || matches!(self.input, InputState::Editing(EditGesture::Text { .. })) {
            return false;
        }
        match std::mem::take(&mut self.input) {
            InputState::Editing(EditGesture::Move { origins, .. }) => {
                for (id, origin) in &origins {
                    if let Some(obj) = self.surface.scene.get_mut(id) {
                        obj.move_to(origin.x, origin.y);
                    }
                }
            }
            InputState::Editing(gesture @ EditGesture::Resize { .. }) => {
                if let EditGesture::Resize { start_world, .. } = &gesture {
                    let start = *start_world;
                    self.resize_object(&gesture, start);
                }
            }
            InputState::Editing(EditGesture::Rotate { id, orig_angle, .. }) => {
                if let Some(obj) = self.surface.scene.get_mut(&id) {
                    obj.angle = orig_angle;
                }
            }
            _ => {}
        }
        self.input = self.rest_state();
        debug!("gesture reverted");
        true
    }

    // --- Native manipulation ---

    fn begin_manipulation(&mut self, world: Point, modifiers: Modifiers) -> Vec<Action> {
        if let [id] = self.surface.selection() {
            let id = *id;
            if let Some(obj) = self.surface.scene.get(&id).filter(|o| o.selectable && !o.locked) {
                match hit::hit_handles(obj, world, self.viewport.zoom) {
                    Some(HitPart::ResizeHandle(anchor)) => {
                        self.input = InputState::Editing(EditGesture::Resize {
                            id,
                            anchor,
                            start_world: world,
                            orig_left: obj.left,
                            orig_top: obj.top,
                            orig_width: obj.scaled_width(),
                            orig_height: obj.scaled_height(),
                        });
                        return vec![Action::SetCursor(anchor.cursor().into())];
                    }
                    Some(HitPart::RotateHandle) => {
                        let center = obj.center();
                        self.input = InputState::Editing(EditGesture::Rotate {
                            id,
                            center,
                            start_angle: pointer_angle(center, world),
                            orig_angle: obj.angle,
                        });
                        return vec![Action::SetCursor("grabbing".into())];
                    }
                    Some(HitPart::Body) | None => {}
                }
            }
        }

        let hit_id = hit::topmost_at(&self.surface.scene, world, self.hit_slop())
            .filter(|id| self.surface.scene.get(id).is_some_and(|o| o.selectable));
        let mut actions = Vec::new();
        match hit_id {
            Some(id) if modifiers.shift => {
                self.surface.toggle_selected(id);
                actions.push(Action::SelectionChanged(self.surface.selection().to_vec()));
            }
            Some(id) => {
                if !self.surface.is_selected(&id) {
                    self.surface.select_one(id);
                    actions.push(Action::SelectionChanged(vec![id]));
                }
                let origins: Vec<(ObjectId, Point)> = self
                    .surface
                    .selected_objects()
                    .into_iter()
                    .filter(|o| !o.locked)
                    .map(|o| (o.id, Point::new(o.left, o.top)))
                    .collect();
                if !origins.is_empty() {
                    self.input = InputState::Editing(EditGesture::Move { start_world: world, origins, moved: false });
                }
            }
            None => {
                if !modifiers.shift && self.surface.clear_selection() {
                    actions.push(Action::SelectionChanged(Vec::new()));
                }
                if self.surface.marquee_enabled() {
                    self.input = InputState::Editing(EditGesture::Marquee { start_world: world, current_world: world });
                }
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Drag delta for a move gesture, snapped once for the whole selection.
    ///
    /// The selection box origin is snapped to the grid and every member
    /// shifts by the same amount. A line moved on its own is not snapped.
    fn move_delta(&self, origins: &[(ObjectId, Point)], dx: f64, dy: f64) -> (f64, f64) {
        if !self.viewport.snap_enabled {
            return (dx, dy);
        }
        if let [(id, _)] = origins {
            if !self.surface.scene.get(id).is_some_and(grid::snaps_on_move) {
                return (dx, dy);
            }
        }
        let left = origins.iter().map(|(_, p)| p.x).fold(f64::INFINITY, f64::min);
        let top = origins.iter().map(|(_, p)| p.y).fold(f64::INFINITY, f64::min);
        if !(left.is_finite() && top.is_finite()) {
            return (dx, dy);
        }
        (self.viewport.snap(left + dx) - left, self.viewport.snap(top + dy) - top)
    }

    fn resize_object(&mut self, gesture: &EditGesture, world: Point) {
        let EditGesture::Resize { id, anchor, start_world, orig_left, orig_top, orig_width, orig_height } = gesture else {
            return;
        };
        let Some(obj) = self.surface.scene.get_mut(id) else {
            return;
        };
        // Work in the object's unrotated frame.
        let delta = hit::rotate_point(
            Point::new(world.x - start_world.x, world.y - start_world.y),
            Point::default(),
            -obj.angle,
        );
        let target = resized_bounds(
            Bounds::new(*orig_left, *orig_top, *orig_width, *orig_height),
            *anchor,
            delta,
        );
        obj.resize_to(target);
    }

    // --- Routing ---

    /// Persistence consequence of a finished modification of `id`.
    fn route_modified(&mut self, id: &ObjectId) -> Vec<Action> {
        let Some(obj) = self.surface.scene.get(id) else {
            return Vec::new();
        };
        match obj.role {
            ObjectRole::GeoTag { geo_code_id } | ObjectRole::PlacedText { geo_code_id } => {
                let translator = self.session.translator();
                let record = placement::record_for(&translator, obj, obj.center());
                vec![Action::SavePosition { geo_code_id, record }]
            }
            ObjectRole::Drawing | ObjectRole::SvgShape => self.drawing_changed(),
            ObjectRole::Background | ObjectRole::GridLine | ObjectRole::Guide => Vec::new(),
        }
    }

    /// Route several modified objects; the drawing save is requested once.
    fn modified_many(&mut self, ids: &[ObjectId]) -> Vec<Action> {
        let mut actions = Vec::new();
        for id in ids {
            for action in self.route_modified(id) {
                if !actions.contains(&action) {
                    actions.push(action);
                }
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Image plans auto-save the drawing; SVG plans are marked dirty until the
    /// manual save.
    fn drawing_changed(&mut self) -> Vec<Action> {
        if self.session.plan.is_svg() {
            self.session.dirty = true;
            vec![Action::SvgDirty]
        } else {
            vec![Action::AutoSaveRequested]
        }
    }

    fn apply_outcome(&mut self, outcome: ToolOutcome) -> Vec<Action> {
        match outcome {
            ToolOutcome::Ignored | ToolOutcome::Consumed => Vec::new(),
            ToolOutcome::Changed | ToolOutcome::Discarded => vec![Action::RenderNeeded],
            ToolOutcome::Created(id) => {
                let mut actions = Vec::new();
                if let Some(obj) = self.surface.scene.get(&id) {
                    actions.push(Action::ObjectCreated(obj.clone()));
                }
                actions.extend(self.route_modified(&id));
                actions.push(Action::RenderNeeded);
                actions
            }
            ToolOutcome::EditText(id) => {
                let mut actions = Vec::new();
                if let Some(obj) = self.surface.scene.get(&id) {
                    actions.push(Action::ObjectCreated(obj.clone()));
                }
                actions.extend(self.edit_text_actions(id));
                actions
            }
        }
    }

    fn edit_text_actions(&mut self, id: ObjectId) -> Vec<Action> {
        self.input = InputState::Editing(EditGesture::Text { id });
        let text = self
            .surface
            .scene
            .get(&id)
            .and_then(|o| o.text.clone())
            .unwrap_or_default();
        vec![
            Action::SelectionChanged(vec![id]),
            Action::EditTextRequested { id, text, select_all: true },
            Action::RenderNeeded,
        ]
    }

    // --- Tool helpers ---

    fn with_tool<R>(&mut self, f: impl FnOnce(&mut dyn CanvasTool, &mut ToolCtx<'_>) -> R) -> R {
        let mut ctx = ToolCtx { surface: &mut self.surface, viewport: &self.viewport, session: &self.session };
        f(self.tools.active_mut(), &mut ctx)
    }

    fn switch_tool(&mut self, id: ToolId) -> ToolId {
        let landed = {
            let mut ctx = ToolCtx { surface: &mut self.surface, viewport: &self.viewport, session: &self.session };
            self.tools.switch_to(id, &mut ctx)
        };
        self.session.current_tool = landed;
        self.input = self.rest_state();
        landed
    }

    fn tool_changed_actions(&self, landed: ToolId) -> Vec<Action> {
        vec![Action::ToolChanged(landed), Action::SetCursor(self.current_cursor()), Action::RenderNeeded]
    }

    /// Re-run the current tool's interactivity rules over newly loaded objects.
    fn reapply_tool_interactivity(&mut self) {
        let current = self.tools.current();
        if current == ToolId::Select {
            self.surface.restore_interactivity();
            return;
        }
        self.with_tool(|tool, ctx| {
            tool.deactivate(ctx);
            if let Err(err) = tool.activate(ctx) {
                warn!(%err, tool = current.name(), "tool reactivation failed");
            }
        });
    }

    /// Router state when no gesture is in progress.
    fn rest_state(&self) -> InputState {
        if self.session.placement_armed() {
            InputState::PlacementArmed
        } else if self.tools.current() == ToolId::Select {
            InputState::Idle
        } else {
            InputState::ToolActive
        }
    }

    fn current_cursor(&self) -> String {
        if self.alt_held { "grab".to_owned() } else { self.surface.cursor().to_owned() }
    }

    fn hit_slop(&self) -> f64 {
        self.viewport.screen_dist_to_world(HANDLE_RADIUS_PX * 0.5)
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        self.surface.selection()
    }

    #[must_use]
    pub fn current_tool(&self) -> ToolId {
        self.tools.current()
    }

    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.surface.scene.get(id)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.session.dirty
    }

    #[must_use]
    pub fn placement(&self) -> Option<&PlacementSession> {
        self.session.placement.as_ref()
    }

    /// Rubber-band rectangle while a marquee selection is in progress.
    #[must_use]
    pub fn marquee(&self) -> Option<Bounds> {
        match &self.input {
            InputState::Editing(EditGesture::Marquee { start_world, current_world }) => {
                Some(Bounds::from_corners(*start_world, *current_world))
            }
            _ => None,
        }
    }
}

/// Angle of `p` around `center`, in degrees.
fn pointer_angle(center: Point, p: Point) -> f64 {
    (p.y - center.y).atan2(p.x - center.x).to_degrees()
}

/// Box produced by dragging `anchor` of `orig` by `delta` (unrotated frame).
/// Dragging past the opposite edge flips the box.
#[must_use]
pub fn resized_bounds(orig: Bounds, anchor: ResizeAnchor, delta: Point) -> Bounds {
    let (ux, uy) = anchor.unit();
    let (mut left, mut right) = (orig.left, orig.right());
    let (mut top, mut bottom) = (orig.top, orig.bottom());
    if ux < 0.25 {
        left += delta.x;
    } else if ux > 0.75 {
        right += delta.x;
    }
    if uy < 0.25 {
        top += delta.y;
    } else if uy > 0.75 {
        bottom += delta.y;
    }
    let b = Bounds::from_corners(Point::new(left, top), Point::new(right, bottom));
    Bounds::new(b.left, b.top, b.width.max(MIN_RESIZE), b.height.max(MIN_RESIZE))
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    background: Option<HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, plan: Plan, settings: EditorSettings) -> Self {
        Self { canvas, background: None, core: EngineCore::new(plan, settings) }
    }

    /// Provide the decoded background image once the host has loaded it.
    pub fn set_background_image(&mut self, image: HtmlImageElement) {
        self.background = Some(image);
    }

    /// Apply the actions the engine can handle itself (cursor changes) and
    /// hand every action back for the host.
    pub fn apply(&self, actions: Vec<Action>) -> Vec<Action> {
        for action in &actions {
            if let Action::SetCursor(cursor) = action {
                if let Err(err) = self.canvas.style().set_property("cursor", cursor) {
                    warn!(?err, "failed to set cursor");
                }
            }
        }
        actions
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_down(screen_pt, button, modifiers);
        self.apply(actions)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_move(screen_pt, modifiers);
        self.apply(actions)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_up(screen_pt, button, modifiers);
        self.apply(actions)
    }

    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        let actions = self.core.on_double_click(screen_pt);
        self.apply(actions)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_wheel(screen_pt, delta, modifiers);
        self.apply(actions)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_key_down(key, modifiers);
        self.apply(actions)
    }

    pub fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_key_up(key, modifiers);
        self.apply(actions)
    }

    pub fn set_tool(&mut self, tool: ToolId) -> Vec<Action> {
        let actions = self.core.set_tool(tool);
        self.apply(actions)
    }

    pub fn arm_placement(&mut self, code: GeoCodeRef) -> Vec<Action> {
        let actions = self.core.arm_placement(code);
        self.apply(actions)
    }

    pub fn complete_placement(&mut self, result: Result<(), String>) -> Vec<Action> {
        let actions = self.core.complete_placement(result);
        self.apply(actions)
    }

    /// Update viewport dimensions and device pixel ratio, resizing the
    /// canvas backing store to match.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width((width_css * dpr).round() as u32);
        self.canvas.set_height((height_css * dpr).round() as u32);
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let frame = render::Frame {
            scene: &self.core.surface.scene,
            selection: self.core.selection(),
            marquee: self.core.marquee(),
            stroke: self.core.surface.stroke_points(),
            brush: self.core.surface.brush(),
            viewport: &self.core.viewport,
            background: self.background.as_ref(),
            viewport_w: self.core.viewport_width,
            viewport_h: self.core.viewport_height,
            dpr: self.core.dpr,
        };
        render::draw(&ctx, &frame)
    }
}
