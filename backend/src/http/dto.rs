//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! The comparison table itself is re-exported from the api module since it
//! already derives Serialize/Deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::api::{ComparisonTable, SelectionSnapshot};
use crate::models::{FacilityType, GeoPoint};
use crate::services::SelectionError;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Facility data source status
    pub repository: String,
}

/// Response for session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Current selection of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub session_id: String,
    pub selection: SelectionSnapshot,
    pub remaining_slots: usize,
    /// Whether the comparison view can be opened
    pub can_compare: bool,
}

impl SelectionResponse {
    pub fn new(session_id: impl Into<String>, selection: &SelectionSnapshot) -> Self {
        Self {
            session_id: session_id.into(),
            remaining_slots: selection.remaining_slots(),
            can_compare: selection.can_compare(),
            selection: selection.clone(),
        }
    }
}

/// Request body for adding a facility to the selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    /// Facility record as shown on the listing
    pub item: Value,
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
}

/// User-facing message for a refused add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub code: String,
    pub message: String,
}

impl From<&SelectionError> for Notice {
    fn from(err: &SelectionError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Response for an add request. Refusals are not HTTP errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemResponse {
    pub added: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    #[serde(flatten)]
    pub selection: SelectionResponse,
}

/// Query parameters for the comparison endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl ComparisonQuery {
    /// The user's position, if both coordinates were sent.
    ///
    /// # Errors
    /// A message when only one coordinate is present or either is out of range.
    pub fn location(&self) -> Result<Option<GeoPoint>, String> {
        match (self.lat, self.lon) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(format!("Coordinates out of range: lat={}, lon={}", lat, lon));
                }
                Ok(Some(GeoPoint::new(lat, lon)))
            }
            _ => Err("Both lat and lon are required for a location".to_string()),
        }
    }
}
