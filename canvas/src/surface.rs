//! Shared canvas state the tools operate on.
//!
//! The surface owns the scene, the active selection, the pointer cursor, the
//! marquee flag, the free-drawing brush and inline text editing. It also
//! records which tool currently owns the pointer listeners: at most one tool
//! may hold them at a time.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use tracing::debug;

use crate::doc::{ObjectId, ObjectKind, ObjectRole, Scene, SceneObject, Style};
use crate::error::ToolActivationError;
use crate::input::ToolId;
use crate::viewport::Point;

/// Stroke settings for free drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub color: String,
    pub width: f64,
}

/// The drawing surface shared by the router and every tool.
#[derive(Debug)]
pub struct Surface {
    pub scene: Scene,
    /// Style applied to newly drawn objects.
    pub style: Style,
    /// Font size for new text objects.
    pub font_size: f64,
    selection: Vec<ObjectId>,
    cursor: String,
    marquee_enabled: bool,
    listener_owner: Option<ToolId>,
    brush: Option<Brush>,
    stroke: Option<Vec<Point>>,
    editing_text: Option<ObjectId>,
}

impl Surface {
    #[must_use]
    pub fn new(style: Style, font_size: f64) -> Self {
        Self {
            scene: Scene::new(),
            style,
            font_size,
            selection: Vec::new(),
            cursor: "default".to_owned(),
            marquee_enabled: true,
            listener_owner: None,
            brush: None,
            stroke: None,
            editing_text: None,
        }
    }

    // --- Listener ownership ---

    /// Attach `tool`'s pointer listeners.
    ///
    /// # Errors
    ///
    /// Returns [`ToolActivationError::ListenersBusy`] while another tool still
    /// owns the listeners.
    pub fn attach_listeners(&mut self, tool: ToolId) -> Result<(), ToolActivationError> {
        match self.listener_owner {
            Some(owner) if owner != tool => Err(ToolActivationError::ListenersBusy { owner, requested: tool }),
            _ => {
                self.listener_owner = Some(tool);
                Ok(())
            }
        }
    }

    /// Detach `tool`'s listeners. A tool cannot detach another tool's listeners.
    pub fn detach_listeners(&mut self, tool: ToolId) -> bool {
        if self.listener_owner == Some(tool) {
            self.listener_owner = None;
            true
        } else {
            false
        }
    }

    /// Drop whatever listeners are attached, regardless of owner.
    pub fn force_detach_listeners(&mut self) -> Option<ToolId> {
        self.listener_owner.take()
    }

    #[must_use]
    pub fn listener_owner(&self) -> Option<ToolId> {
        self.listener_owner
    }

    // --- Cursor / marquee ---

    pub fn set_cursor(&mut self, cursor: &str) {
        cursor.clone_into(&mut self.cursor);
    }

    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn set_marquee(&mut self, enabled: bool) {
        self.marquee_enabled = enabled;
    }

    #[must_use]
    pub fn marquee_enabled(&self) -> bool {
        self.marquee_enabled
    }

    // --- Interactivity ---

    /// Make every object unselectable; `keep_evented` decides which still receive hits.
    pub fn make_non_interactive<F>(&mut self, keep_evented: F)
    where
        F: Fn(&SceneObject) -> bool,
    {
        for obj in self.scene.iter_mut() {
            obj.selectable = false;
            obj.evented = !obj.role.is_structural() && keep_evented(obj);
        }
    }

    /// Restore selection and hits on everything except background, grid and guides.
    pub fn restore_interactivity(&mut self) {
        for obj in self.scene.iter_mut() {
            let interactive = !obj.role.is_structural();
            obj.selectable = interactive;
            obj.evented = interactive;
        }
    }

    // --- Selection ---

    /// Selected object ids, in selection order.
    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: &ObjectId) -> bool {
        self.selection.contains(id)
    }

    /// Replace the selection. Unknown ids are dropped.
    pub fn select(&mut self, ids: Vec<ObjectId>) {
        self.selection = ids.into_iter().filter(|id| self.scene.contains(id)).collect();
        self.selection.dedup();
    }

    pub fn select_one(&mut self, id: ObjectId) {
        self.select(vec![id]);
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle_selected(&mut self, id: ObjectId) {
        if let Some(idx) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(idx);
        } else if self.scene.contains(&id) {
            self.selection.push(id);
        }
    }

    /// Clear the selection; returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let had = !self.selection.is_empty();
        self.selection.clear();
        had
    }

    /// Drop selected ids that are no longer in the scene.
    pub fn prune_selection(&mut self) {
        let scene = &self.scene;
        self.selection.retain(|id| scene.contains(id));
    }

    /// Selected objects, bottom to top.
    #[must_use]
    pub fn selected_objects(&self) -> Vec<&SceneObject> {
        self.scene.iter().filter(|o| self.selection.contains(&o.id)).collect()
    }

    // --- Free drawing ---

    /// Enable free-drawing mode with `brush`, or disable it with `None`.
    pub fn set_free_drawing(&mut self, brush: Option<Brush>) {
        if brush.is_none() {
            self.stroke = None;
        }
        self.brush = brush;
    }

    #[must_use]
    pub fn is_free_drawing(&self) -> bool {
        self.brush.is_some()
    }

    #[must_use]
    pub fn brush(&self) -> Option<&Brush> {
        self.brush.as_ref()
    }

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Samples of the stroke in progress.
    #[must_use]
    pub fn stroke_points(&self) -> &[Point] {
        self.stroke.as_deref().unwrap_or(&[])
    }

    /// Start a stroke at `p`. Ignored outside free-drawing mode.
    pub fn begin_stroke(&mut self, p: Point) -> bool {
        if self.brush.is_none() {
            return false;
        }
        self.stroke = Some(vec![p]);
        true
    }

    pub fn extend_stroke(&mut self, p: Point) -> bool {
        match self.stroke.as_mut() {
            Some(points) => {
                if points.last() != Some(&p) {
                    points.push(p);
                }
                true
            }
            None => false,
        }
    }

    /// Finish the stroke, adding a path object when it has at least two samples.
    pub fn finish_stroke(&mut self) -> Option<ObjectId> {
        let points = self.stroke.take()?;
        let brush = self.brush.as_ref()?;
        if points.len() < 2 {
            debug!(samples = points.len(), "stroke too short; discarded");
            return None;
        }
        let style = Style { fill: None, stroke: brush.color.clone(), stroke_width: brush.width, dashed: false };
        let path = SceneObject::with_points(ObjectKind::Path, points).with_style(style);
        let id = path.id;
        self.scene.insert(path);
        Some(id)
    }

    /// Abandon the stroke in progress.
    pub fn cancel_stroke(&mut self) -> bool {
        self.stroke.take().is_some()
    }

    // --- Inline text editing ---

    /// Enter inline editing of a text object. Placed labels are not editable.
    pub fn begin_text_edit(&mut self, id: ObjectId) -> bool {
        let editable = self
            .scene
            .get(&id)
            .is_some_and(|o| o.kind == ObjectKind::Text && o.role == ObjectRole::Drawing);
        if editable {
            self.editing_text = Some(id);
        }
        editable
    }

    #[must_use]
    pub fn editing_text(&self) -> Option<ObjectId> {
        self.editing_text
    }

    /// Leave inline editing, returning the object that was being edited.
    pub fn end_text_edit(&mut self) -> Option<ObjectId> {
        self.editing_text.take()
    }
}
