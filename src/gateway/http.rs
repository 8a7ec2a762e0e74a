//! HTTP implementation of [`PlanStore`] over the plan storage REST API.
//!
//! Thin `reqwest` wrapper. Pure parsing in `parse_json` / `parse_ack` for
//! testability.

use std::time::Duration;

use plan_canvas::coords::PositionRecord;
use plan_canvas::doc::{DrawingSnapshot, GeoCodeId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::PlanStore;
use super::types::{
    Ack, Asset, AssetSummary, CreatedGeoCode, GeoCodeRecord, NewAsset, NewGeoCode, PersistenceError,
    RemovePositionRequest, SaveDrawingRequest, SavePositionRequest, SaveSvgRequest,
};
use crate::config::GatewayConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpPlanStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPlanStore {
    /// Build a store client from parsed gateway config.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, PersistenceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| PersistenceError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone() })
    }

    async fn get(&self, path: &str) -> Result<String, PersistenceError> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "store GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PersistenceError::Request(e.to_string()))?;
        read_body(response).await
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, PersistenceError> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "store POST");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PersistenceError::Request(e.to_string()))?;
        read_body(response).await
    }

    async fn delete(&self, path: &str) -> Result<String, PersistenceError> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "store DELETE");
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| PersistenceError::Request(e.to_string()))?;
        read_body(response).await
    }
}

#[async_trait::async_trait]
impl PlanStore for HttpPlanStore {
    async fn fetch_codes(&self, plan_id: i64) -> Result<Vec<GeoCodeRecord>, PersistenceError> {
        let text = self.get(&format!("plans/{plan_id}/geocodes")).await?;
        parse_json(&text)
    }

    async fn save_position(
        &self,
        plan_id: i64,
        geo_code_id: GeoCodeId,
        record: PositionRecord,
    ) -> Result<Option<i64>, PersistenceError> {
        let body = SavePositionRequest { plan_id, geo_code_id, record };
        let text = self.post("positions/save", &body).await?;
        Ok(parse_ack(&text)?.position_id)
    }

    async fn remove_position(&self, plan_id: i64, geo_code_id: GeoCodeId) -> Result<(), PersistenceError> {
        let body = RemovePositionRequest { plan_id, geo_code_id };
        let text = self.post("positions/remove", &body).await?;
        parse_ack(&text).map(|_| ())
    }

    async fn save_drawing(&self, plan_id: i64, drawing: &DrawingSnapshot) -> Result<(), PersistenceError> {
        let body = SaveDrawingRequest { plan_id, drawing_data: drawing };
        let text = self.post(&format!("plans/{plan_id}/drawing"), &body).await?;
        parse_ack(&text).map(|_| ())
    }

    async fn save_svg(&self, plan_id: i64, svg: &str) -> Result<(), PersistenceError> {
        let body = SaveSvgRequest { plan_id, svg_content: svg };
        let text = self.post(&format!("plans/{plan_id}/svg"), &body).await?;
        parse_ack(&text).map(|_| ())
    }

    async fn create_geo_code(&self, code: &NewGeoCode) -> Result<CreatedGeoCode, PersistenceError> {
        let text = self.post("geocodes", code).await?;
        parse_json(&text)
    }

    async fn list_assets(&self) -> Result<Vec<AssetSummary>, PersistenceError> {
        let text = self.get("assets").await?;
        parse_json(&text)
    }

    async fn fetch_asset(&self, id: i64) -> Result<Asset, PersistenceError> {
        let text = self.get(&format!("assets/{id}")).await?;
        parse_json(&text)
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<i64, PersistenceError> {
        let text = self.post("assets", asset).await?;
        let created: AssetSummary = parse_json(&text)?;
        Ok(created.id)
    }

    async fn delete_asset(&self, id: i64) -> Result<(), PersistenceError> {
        let text = self.delete(&format!("assets/{id}")).await?;
        parse_ack(&text).map(|_| ())
    }
}

// =============================================================================
// PARSING
// =============================================================================

async fn read_body(response: reqwest::Response) -> Result<String, PersistenceError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| PersistenceError::Request(e.to_string()))?;
    check_status(status, text)
}

fn check_status(status: u16, body: String) -> Result<String, PersistenceError> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(PersistenceError::Response { status, body })
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, PersistenceError> {
    serde_json::from_str(text).map_err(|e| PersistenceError::Parse(e.to_string()))
}

fn parse_ack(text: &str) -> Result<Ack, PersistenceError> {
    parse_json::<Ack>(text)?.into_result()
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
