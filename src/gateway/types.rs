//! Wire types and errors for the plan storage API.

use plan_canvas::coords::PositionRecord;
use plan_canvas::doc::{DrawingSnapshot, GeoCodeId};
use plan_canvas::placement::{GeoCodeRef, PlacedCode};
use serde::{Deserialize, Serialize};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors returned by a [`super::PlanStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("storage request failed: {0}")]
    Request(String),

    /// The storage API answered with a non-success HTTP status.
    #[error("storage response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("storage response parse failed: {0}")]
    Parse(String),

    /// The storage API answered `{success: false}`.
    #[error("{0}")]
    Rejected(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl PersistenceError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Response { .. } => "E_STORE_RESPONSE",
            Self::Parse(_) => "E_STORE_PARSE",
            Self::Rejected(_) => "E_STORE_REJECTED",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether repeating the same call may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// GEO-CODES
// =============================================================================

/// A geo-code as listed for a plan, with its position when already placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCodeRecord {
    pub id: GeoCodeId,
    pub code: String,
    #[serde(default)]
    pub libelle: String,
    #[serde(rename = "universId", default)]
    pub univers_id: Option<i64>,
    #[serde(default)]
    pub position: Option<PositionRecord>,
}

impl GeoCodeRecord {
    #[must_use]
    pub fn code_ref(&self) -> GeoCodeRef {
        GeoCodeRef { id: self.id, code: self.code.clone(), libelle: self.libelle.clone() }
    }

    /// The record as a placed code, if it has a position on this plan.
    #[must_use]
    pub fn placed(&self) -> Option<PlacedCode> {
        self.position.map(|position| PlacedCode { code: self.code_ref(), position })
    }
}

/// Body of a geo-code creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGeoCode {
    pub code_geo: String,
    pub libelle: String,
    pub univers_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentaire: Option<String>,
}

/// A geo-code as returned after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedGeoCode {
    pub id: GeoCodeId,
    pub code_geo: String,
    #[serde(default)]
    pub libelle: String,
    #[serde(default)]
    pub univers_id: Option<i64>,
    #[serde(default)]
    pub zone: Option<String>,
}

impl CreatedGeoCode {
    #[must_use]
    pub fn code_ref(&self) -> GeoCodeRef {
        GeoCodeRef { id: self.id, code: self.code_geo.clone(), libelle: self.libelle.clone() }
    }
}

// =============================================================================
// POSITIONS & DRAWINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavePositionRequest {
    pub plan_id: i64,
    pub geo_code_id: GeoCodeId,
    #[serde(flatten)]
    pub record: PositionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovePositionRequest {
    pub plan_id: i64,
    pub geo_code_id: GeoCodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveDrawingRequest<'a> {
    pub plan_id: i64,
    pub drawing_data: &'a DrawingSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSvgRequest<'a> {
    pub plan_id: i64,
    pub svg_content: &'a str,
}

/// The `{success, message?}` envelope every write endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub position_id: Option<i64>,
}

impl Ack {
    /// Turn a `{success: false}` answer into [`PersistenceError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns `Rejected` carrying the server message when `success` is false.
    pub fn into_result(self) -> Result<Self, PersistenceError> {
        if self.success {
            return Ok(self);
        }
        let message = self.message.unwrap_or_else(|| "request rejected".to_string());
        Err(PersistenceError::Rejected(message))
    }
}

// =============================================================================
// ASSETS
// =============================================================================

/// An entry of the asset library listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// A reusable drawing fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub data: DrawingSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub data: DrawingSnapshot,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
