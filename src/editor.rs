//! Editor driver — runs the I/O side of engine actions against a plan store.
//!
//! DESIGN
//! ======
//! The canvas engine is synchronous and never performs I/O; it returns
//! [`Action`]s. [`PlanEditor`] owns the engine core, executes the actions
//! that need storage (position saves, drawing and SVG saves, removals) and
//! hands everything else back to the host untouched. Results that change
//! editor state, such as the end of a placement, are fed back into the core
//! and their follow-up actions appended to the output.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never propagate out of [`PlanEditor::dispatch`]; they
//! become [`Action::Notify`] and, where a modal state was waiting on them,
//! revert it. Explicit library calls (assets, geo-code creation) return
//! [`PersistenceError`] to the caller.

use std::sync::Arc;
use std::time::Duration;

use plan_canvas::coords::{Plan, PositionRecord};
use plan_canvas::doc::{DrawingSnapshot, GeoCodeId};
use plan_canvas::engine::{Action, EngineCore};
use plan_canvas::placement::PlacementPhase;
use plan_canvas::session::EditorSettings;
use tracing::{info, warn};

use crate::autosave::{AutoSave, spawn_autosave_worker};
use crate::gateway::{AssetSummary, GeoCodeRecord, NewAsset, NewGeoCode, PersistenceError, PlanStore};

pub struct PlanEditor {
    core: EngineCore,
    store: Arc<dyn PlanStore>,
    /// Geo-codes of the plan, for the side list.
    codes: Vec<GeoCodeRecord>,
    autosave: Option<AutoSave>,
}

impl PlanEditor {
    /// Load a plan's geo-codes and open an editor over it.
    ///
    /// Image plans get a debounced auto-save worker; SVG plans save manually.
    ///
    /// # Errors
    ///
    /// Returns the store error if the geo-code list cannot be fetched.
    pub async fn open(
        store: Arc<dyn PlanStore>,
        plan: Plan,
        settings: EditorSettings,
        autosave_debounce: Duration,
    ) -> Result<(Self, Vec<Action>), PersistenceError> {
        let plan_id = plan.id;
        let codes = store.fetch_codes(plan_id).await?;
        let placed: Vec<_> = codes.iter().filter_map(GeoCodeRecord::placed).collect();
        info!(plan_id, codes = codes.len(), placed = placed.len(), "plan opened");

        let autosave = if plan.is_svg() {
            None
        } else {
            Some(spawn_autosave_worker(Arc::clone(&store), plan_id, autosave_debounce))
        };

        let mut core = EngineCore::new(plan, settings);
        let actions = core.load_placed_codes(&placed);
        Ok((Self { core, store, codes, autosave }, actions))
    }

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EngineCore {
        &mut self.core
    }

    #[must_use]
    pub fn codes(&self) -> &[GeoCodeRecord] {
        &self.codes
    }

    /// Geo-codes not yet placed on this plan.
    pub fn unplaced_codes(&self) -> impl Iterator<Item = &GeoCodeRecord> {
        self.codes.iter().filter(|c| c.position.is_none())
    }

    fn plan_id(&self) -> i64 {
        self.core.session.plan.id
    }

    /// Run an engine operation and dispatch its actions.
    pub async fn handle<F>(&mut self, op: F) -> Vec<Action>
    where
        F: FnOnce(&mut EngineCore) -> Vec<Action>,
    {
        let actions = op(&mut self.core);
        self.dispatch(actions).await
    }

    /// Execute the storage actions in `actions`; return the rest, plus any
    /// follow-ups, for the host.
    pub async fn dispatch(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::SavePosition { geo_code_id, record } => {
                    out.extend(self.save_position(geo_code_id, record).await);
                }
                Action::RemovePosition { geo_code_id } => out.extend(self.remove_position(geo_code_id).await),
                Action::AutoSaveRequested => out.extend(self.request_autosave().await),
                Action::SaveDrawing(snapshot) => out.extend(self.save_drawing(&snapshot).await),
                Action::SaveSvg(markup) => out.extend(self.save_svg(&markup).await),
                other => out.push(other),
            }
        }
        out
    }

    // --- Placement ---

    /// Arm placement of a listed geo-code.
    pub fn arm(&mut self, geo_code_id: GeoCodeId) -> Vec<Action> {
        match self.codes.iter().find(|c| c.id == geo_code_id) {
            Some(record) => {
                let code = record.code_ref();
                self.core.arm_placement(code)
            }
            None => vec![Action::Notify(format!("Unknown geo-code {geo_code_id}"))],
        }
    }

    /// Create a geo-code and arm its placement right away.
    ///
    /// # Errors
    ///
    /// Returns the store error if the geo-code cannot be created.
    pub async fn create_and_arm(&mut self, code: &NewGeoCode) -> Result<Vec<Action>, PersistenceError> {
        let created = self.store.create_geo_code(code).await?;
        info!(geo_code_id = created.id, code = %created.code_geo, "geo-code created");
        let code_ref = created.code_ref();
        self.codes.push(GeoCodeRecord {
            id: created.id,
            code: created.code_geo,
            libelle: created.libelle,
            univers_id: created.univers_id,
            position: None,
        });
        Ok(self.core.arm_placement(code_ref))
    }

    async fn save_position(&mut self, geo_code_id: GeoCodeId, record: PositionRecord) -> Vec<Action> {
        let awaiting = self
            .core
            .placement()
            .is_some_and(|s| s.phase == PlacementPhase::Saving && s.code.id == geo_code_id);

        let result = self.store.save_position(self.plan_id(), geo_code_id, record).await;
        match &result {
            Ok(position_id) => {
                info!(geo_code_id, ?position_id, "position saved");
                self.remember_position(geo_code_id, Some(record));
            }
            Err(e) => warn!(error = %e, retryable = e.retryable(), geo_code_id, "position save failed"),
        }

        if awaiting {
            return self.core.complete_placement(result.map(|_| ()).map_err(|e| e.to_string()));
        }
        match result {
            Ok(_) => Vec::new(),
            Err(e) => vec![Action::Notify(format!("Could not save position: {e}"))],
        }
    }

    async fn remove_position(&mut self, geo_code_id: GeoCodeId) -> Vec<Action> {
        match self.store.remove_position(self.plan_id(), geo_code_id).await {
            Ok(()) => {
                info!(geo_code_id, "position removed");
                self.remember_position(geo_code_id, None);
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, geo_code_id, "position removal failed");
                vec![Action::Notify(format!("Could not remove position: {e}"))]
            }
        }
    }

    fn remember_position(&mut self, geo_code_id: GeoCodeId, position: Option<PositionRecord>) {
        if let Some(record) = self.codes.iter_mut().find(|c| c.id == geo_code_id) {
            record.position = position;
        }
    }

    // --- Drawing persistence ---

    async fn request_autosave(&mut self) -> Vec<Action> {
        let snapshot = self.core.drawing_snapshot();
        if let Some(autosave) = &self.autosave {
            if !autosave.request(snapshot) {
                return vec![Action::Notify("Auto-save skipped; save manually".to_string())];
            }
            return Vec::new();
        }
        self.save_drawing(&snapshot).await
    }

    async fn save_drawing(&mut self, snapshot: &DrawingSnapshot) -> Vec<Action> {
        match self.store.save_drawing(self.plan_id(), snapshot).await {
            Ok(()) => {
                info!(plan_id = self.plan_id(), count = snapshot.objects.len(), "drawing saved");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, plan_id = self.plan_id(), "drawing save failed");
                vec![Action::Notify(format!("Could not save drawing: {e}"))]
            }
        }
    }

    async fn save_svg(&mut self, markup: &str) -> Vec<Action> {
        match self.store.save_svg(self.plan_id(), markup).await {
            Ok(()) => {
                info!(plan_id = self.plan_id(), bytes = markup.len(), "svg saved");
                vec![Action::Notify("Plan saved".to_string())]
            }
            Err(e) => {
                warn!(error = %e, plan_id = self.plan_id(), "svg save failed");
                self.core.session.dirty = true;
                vec![Action::Notify(format!("Could not save plan: {e}")), Action::SvgDirty]
            }
        }
    }

    // --- Asset library ---

    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn list_assets(&self) -> Result<Vec<AssetSummary>, PersistenceError> {
        self.store.list_assets().await
    }

    /// Store the current selection as a named asset. Returns `None` when the
    /// selection holds no drawing objects.
    ///
    /// # Errors
    ///
    /// Returns the store error if the asset cannot be created.
    pub async fn save_selection_as_asset(
        &self,
        name: &str,
        category: Option<String>,
    ) -> Result<Option<i64>, PersistenceError> {
        let Some(data) = self.core.selection_as_asset() else {
            return Ok(None);
        };
        let asset = NewAsset { name: name.to_string(), category, data };
        let id = self.store.create_asset(&asset).await?;
        info!(asset_id = id, name, "asset created");
        Ok(Some(id))
    }

    /// Fetch an asset and insert it at the viewport center.
    ///
    /// # Errors
    ///
    /// Returns the store error if the asset cannot be fetched.
    pub async fn insert_asset(&mut self, id: i64) -> Result<Vec<Action>, PersistenceError> {
        let asset = self.store.fetch_asset(id).await?;
        info!(asset_id = id, name = %asset.name, "asset inserted");
        let actions = self.core.insert_asset(asset.data);
        Ok(self.dispatch(actions).await)
    }

    /// # Errors
    ///
    /// Returns the store error if the asset cannot be deleted.
    pub async fn delete_asset(&self, id: i64) -> Result<(), PersistenceError> {
        self.store.delete_asset(id).await
    }

    /// Flush the pending auto-save and close the editor.
    pub async fn close(self) {
        if let Some(autosave) = self.autosave {
            autosave.shutdown().await;
        }
        info!(plan_id = self.core.session.plan.id, "plan closed");
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
