//! In-memory [`PlanStore`] for tests.

use std::sync::Mutex;

use plan_canvas::coords::PositionRecord;
use plan_canvas::doc::{DrawingSnapshot, GeoCodeId};

use super::PlanStore;
use super::types::{Asset, AssetSummary, CreatedGeoCode, GeoCodeRecord, NewAsset, NewGeoCode, PersistenceError};

/// A write the store received, in call order. Failed attempts are recorded too.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    SavePosition { geo_code_id: GeoCodeId, record: PositionRecord },
    RemovePosition { geo_code_id: GeoCodeId },
    SaveDrawing(DrawingSnapshot),
    SaveSvg(String),
    CreateGeoCode(NewGeoCode),
    CreateAsset(NewAsset),
    DeleteAsset(i64),
}

#[derive(Default)]
pub struct MockStore {
    pub codes: Vec<GeoCodeRecord>,
    pub assets: Mutex<Vec<Asset>>,
    calls: Mutex<Vec<StoreCall>>,
    /// Errors returned by the next writes, front first.
    failures: Mutex<Vec<PersistenceError>>,
}

impl MockStore {
    pub fn with_codes(codes: Vec<GeoCodeRecord>) -> Self {
        Self { codes, ..Self::default() }
    }

    pub fn fail_next(&self, err: PersistenceError) {
        self.failures.lock().unwrap().push(err);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn drawing_saves(&self) -> Vec<DrawingSnapshot> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::SaveDrawing(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StoreCall) -> Result<(), PersistenceError> {
        self.calls.lock().unwrap().push(call);
        let mut failures = self.failures.lock().unwrap();
        if failures.is_empty() { Ok(()) } else { Err(failures.remove(0)) }
    }
}

#[async_trait::async_trait]
impl PlanStore for MockStore {
    async fn fetch_codes(&self, _plan_id: i64) -> Result<Vec<GeoCodeRecord>, PersistenceError> {
        Ok(self.codes.clone())
    }

    async fn save_position(
        &self,
        _plan_id: i64,
        geo_code_id: GeoCodeId,
        record: PositionRecord,
    ) -> Result<Option<i64>, PersistenceError> {
        self.record(StoreCall::SavePosition { geo_code_id, record })?;
        Ok(Some(geo_code_id * 100))
    }

    async fn remove_position(&self, _plan_id: i64, geo_code_id: GeoCodeId) -> Result<(), PersistenceError> {
        self.record(StoreCall::RemovePosition { geo_code_id })
    }

    async fn save_drawing(&self, _plan_id: i64, drawing: &DrawingSnapshot) -> Result<(), PersistenceError> {
        self.record(StoreCall::SaveDrawing(drawing.clone()))
    }

    async fn save_svg(&self, _plan_id: i64, svg: &str) -> Result<(), PersistenceError> {
        self.record(StoreCall::SaveSvg(svg.to_string()))
    }

    async fn create_geo_code(&self, code: &NewGeoCode) -> Result<CreatedGeoCode, PersistenceError> {
        self.record(StoreCall::CreateGeoCode(code.clone()))?;
        Ok(CreatedGeoCode {
            id: 500,
            code_geo: code.code_geo.clone(),
            libelle: code.libelle.clone(),
            univers_id: Some(code.univers_id),
            zone: None,
        })
    }

    async fn list_assets(&self) -> Result<Vec<AssetSummary>, PersistenceError> {
        let assets = self.assets.lock().unwrap();
        Ok(assets
            .iter()
            .map(|a| AssetSummary { id: a.id, name: a.name.clone(), category: a.category.clone() })
            .collect())
    }

    async fn fetch_asset(&self, id: i64) -> Result<Asset, PersistenceError> {
        let assets = self.assets.lock().unwrap();
        assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| PersistenceError::Response { status: 404, body: "asset not found".into() })
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<i64, PersistenceError> {
        self.record(StoreCall::CreateAsset(asset.clone()))?;
        let mut assets = self.assets.lock().unwrap();
        let id = i64::try_from(assets.len()).unwrap() + 1;
        assets.push(Asset { id, name: asset.name.clone(), category: asset.category.clone(), data: asset.data.clone() });
        Ok(id)
    }

    async fn delete_asset(&self, id: i64) -> Result<(), PersistenceError> {
        self.record(StoreCall::DeleteAsset(id))?;
        self.assets.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}
