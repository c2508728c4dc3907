//! REST facility repository.
//!
//! Reads facility records from the listing API:
//! `GET {base_url}/api/hospitals/{id}` and `GET {base_url}/api/labs/{id}`.
//! Responses are either the bare record or the `{ "success": .., "data": .. }`
//! envelope the API wraps most payloads in.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

use crate::db::repository::{ErrorContext, FacilityRepository, RepositoryError, RepositoryResult};
use crate::models::{FacilityDetail, FacilityId, FacilityType};

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for [`RestRepository`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// API root, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Facility repository backed by the listing REST API.
#[derive(Debug, Clone)]
pub struct RestRepository {
    client: reqwest::Client,
    base_url: Url,
}

impl RestRepository {
    /// Build a repository with a pooled HTTP client.
    pub fn new(config: &RestConfig) -> RepositoryResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            RepositoryError::configuration(format!(
                "Invalid facility API URL '{}': {}",
                config.base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RepositoryError::configuration(format!(
                "Facility API URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RepositoryError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// URL of one facility record.
    pub fn detail_url(&self, facility_type: FacilityType, identity: &FacilityId) -> Url {
        self.endpoint(&["api", facility_type.collection(), identity.as_str()])
    }

    async fn get_detail(
        &self,
        facility_type: FacilityType,
        identity: &FacilityId,
    ) -> RepositoryResult<FacilityDetail> {
        let url = self.detail_url(facility_type, identity);
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RepositoryError::not_found(format!(
                "{} {} not found",
                facility_type, identity
            )));
        }
        if !status.is_success() {
            return Err(RepositoryError::connection_with_context(
                format!("Facility API answered {}", status),
                ErrorContext::default().with_details(format!("status={}", status.as_u16())),
            ));
        }

        let body: Value = response.json().await?;
        let record = unwrap_envelope(body)?;
        let detail = FacilityDetail::from_wire(&record)?;
        if &detail.identity != identity {
            return Err(RepositoryError::validation(format!(
                "Requested {} but the API returned {}",
                identity, detail.identity
            )));
        }
        Ok(detail)
    }
}

/// Extract the record from `{ "success": true, "data": {..} }` or return a
/// bare record unchanged.
fn unwrap_envelope(body: Value) -> RepositoryResult<Value> {
    let Value::Object(mut object) = body else {
        return Err(RepositoryError::validation("Facility API returned a non-object body"));
    };

    if object.get("success") == Some(&Value::Bool(false)) {
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request was not successful")
            .to_string();
        return Err(RepositoryError::not_found(message));
    }

    match object.remove("data") {
        Some(data @ Value::Object(_)) => Ok(data),
        Some(other) => {
            object.insert("data".to_string(), other);
            Ok(Value::Object(object))
        }
        None => Ok(Value::Object(object)),
    }
}

#[async_trait]
impl FacilityRepository for RestRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let response = self.client.get(self.endpoint(&["api", "health"])).send().await?;
        Ok(response.status().is_success())
    }

    async fn fetch_facility_detail(
        &self,
        facility_type: FacilityType,
        identity: &FacilityId,
    ) -> RepositoryResult<FacilityDetail> {
        self.get_detail(facility_type, identity).await.map_err(|e| {
            e.with_operation("fetch_facility_detail")
                .for_facility(facility_type, identity)
        })
    }
}
