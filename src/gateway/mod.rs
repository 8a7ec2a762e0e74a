//! Gateway — async adapter to the external plan storage API.
//!
//! DESIGN
//! ======
//! The editor talks to storage only through [`PlanStore`], so tests can swap
//! in an in-memory store. [`http::HttpPlanStore`] is the production
//! implementation over `reqwest`. Positions cross this boundary already in
//! plan units; the canvas crate's coordinate translator is the only place
//! pixels are converted.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use plan_canvas::coords::PositionRecord;
use plan_canvas::doc::{DrawingSnapshot, GeoCodeId};

pub use http::HttpPlanStore;
pub use types::{
    Ack, Asset, AssetSummary, CreatedGeoCode, GeoCodeRecord, NewAsset, NewGeoCode, PersistenceError,
};

// =============================================================================
// PLAN STORE TRAIT
// =============================================================================

/// Storage operations the editor needs. Enables mocking in tests.
#[async_trait::async_trait]
pub trait PlanStore: Send + Sync {
    /// List the geo-codes of a plan, with positions for the placed ones.
    async fn fetch_codes(&self, plan_id: i64) -> Result<Vec<GeoCodeRecord>, PersistenceError>;

    /// Persist the position of a geo-code on a plan. Returns the position id.
    async fn save_position(
        &self,
        plan_id: i64,
        geo_code_id: GeoCodeId,
        record: PositionRecord,
    ) -> Result<Option<i64>, PersistenceError>;

    async fn remove_position(&self, plan_id: i64, geo_code_id: GeoCodeId) -> Result<(), PersistenceError>;

    /// Persist the user drawing of an image plan.
    async fn save_drawing(&self, plan_id: i64, drawing: &DrawingSnapshot) -> Result<(), PersistenceError>;

    /// Persist the full markup of an SVG plan.
    async fn save_svg(&self, plan_id: i64, svg: &str) -> Result<(), PersistenceError>;

    async fn create_geo_code(&self, code: &NewGeoCode) -> Result<CreatedGeoCode, PersistenceError>;

    async fn list_assets(&self) -> Result<Vec<AssetSummary>, PersistenceError>;

    async fn fetch_asset(&self, id: i64) -> Result<Asset, PersistenceError>;

    /// Store a new asset. Returns its id.
    async fn create_asset(&self, asset: &NewAsset) -> Result<i64, PersistenceError>;

    async fn delete_asset(&self, id: i64) -> Result<(), PersistenceError>;
}
