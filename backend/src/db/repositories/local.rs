//! In-memory local repository implementation.
//!
//! Stores facility records in HashMaps keyed by type and identity. Used for
//! unit tests, local development and seeded demo servers. Failure and latency
//! can be injected per facility to exercise the comparison fallback paths.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::db::repository::{ErrorContext, FacilityRepository, RepositoryError, RepositoryResult};
use crate::models::{FacilityDetail, FacilityId, FacilityType};

type FacilityKey = (FacilityType, FacilityId);

/// In-memory facility repository.
///
/// # Example
/// ```
/// use facility_compare::db::repositories::LocalRepository;
/// use facility_compare::models::FacilityType;
/// use serde_json::json;
///
/// let repo = LocalRepository::new();
/// let id = repo
///     .insert_record(FacilityType::Hospital, &json!({"_id": "h1", "name": "AIIMS"}))
///     .unwrap();
/// assert_eq!(id.as_str(), "h1");
/// assert_eq!(repo.facility_count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Debug)]
struct LocalData {
    facilities: HashMap<FacilityKey, FacilityDetail>,
    unreachable: HashSet<FacilityKey>,
    latency: HashMap<FacilityKey, Duration>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            facilities: HashMap::new(),
            unreachable: HashSet::new(),
            latency: HashMap::new(),
            is_healthy: true,
        }
    }
}

/// Seed file layout: facility API records grouped by collection.
#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    hospitals: Vec<Value>,
    #[serde(default, alias = "laboratories")]
    labs: Vec<Value>,
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository seeded from a JSON file of the form
    /// `{ "hospitals": [..], "labs": [..] }`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let seed: SeedFile = serde_json::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse seed file: {}", e))
        })?;

        let repo = Self::new();
        for record in &seed.hospitals {
            repo.insert_record(FacilityType::Hospital, record)?;
        }
        for record in &seed.labs {
            repo.insert_record(FacilityType::Laboratory, record)?;
        }
        log::info!(
            "seeded local repository with {} hospitals and {} labs",
            seed.hospitals.len(),
            seed.labs.len()
        );
        Ok(repo)
    }

    /// Store a decoded record, replacing any previous one with the same identity.
    pub fn insert(&self, facility_type: FacilityType, detail: FacilityDetail) {
        let key = (facility_type, detail.identity.clone());
        self.data.write().facilities.insert(key, detail);
    }

    /// Decode and store a facility API record.
    ///
    /// # Returns
    /// The identity the record was stored under.
    pub fn insert_record(
        &self,
        facility_type: FacilityType,
        record: &Value,
    ) -> RepositoryResult<FacilityId> {
        let detail = FacilityDetail::from_wire(record)?;
        let identity = detail.identity.clone();
        self.insert(facility_type, detail);
        Ok(identity)
    }

    /// Make fetches of one facility fail with a connection error.
    pub fn mark_unreachable(&self, facility_type: FacilityType, identity: &FacilityId) {
        self.data
            .write()
            .unreachable
            .insert((facility_type, identity.clone()));
    }

    /// Undo [`mark_unreachable`](Self::mark_unreachable).
    pub fn mark_reachable(&self, facility_type: FacilityType, identity: &FacilityId) {
        self.data
            .write()
            .unreachable
            .remove(&(facility_type, identity.clone()));
    }

    /// Delay every fetch of one facility by `delay`.
    pub fn set_latency(&self, facility_type: FacilityType, identity: &FacilityId, delay: Duration) {
        self.data
            .write()
            .latency
            .insert((facility_type, identity.clone()), delay);
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all records and injected failures.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of facilities stored.
    pub fn facility_count(&self) -> usize {
        self.data.read().facilities.len()
    }

    /// Check if a facility exists.
    pub fn has_facility(&self, facility_type: FacilityType, identity: &FacilityId) -> bool {
        self.data
            .read()
            .facilities
            .contains_key(&(facility_type, identity.clone()))
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Facility store is not healthy"));
        }
        Ok(())
    }

    fn lookup(&self, key: &FacilityKey) -> RepositoryResult<FacilityDetail> {
        let data = self.data.read();
        if data.unreachable.contains(key) {
            return Err(RepositoryError::connection_with_context(
                "Facility source unreachable",
                ErrorContext::new("fetch_facility_detail"),
            ));
        }
        data.facilities.get(key).cloned().ok_or_else(|| {
            RepositoryError::not_found(format!("{} {} not found", key.0, key.1))
        })
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FacilityRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn fetch_facility_detail(
        &self,
        facility_type: FacilityType,
        identity: &FacilityId,
    ) -> RepositoryResult<FacilityDetail> {
        let key = (facility_type, identity.clone());
        let delay = self.data.read().latency.get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_health()
            .and_then(|_| self.lookup(&key))
            .map_err(|e| {
                e.with_operation("fetch_facility_detail")
                    .for_facility(facility_type, identity)
            })
    }
}
