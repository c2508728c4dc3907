//! Facility data source trait.
//!
//! The comparison engine never talks to storage directly. It asks a
//! [`FacilityRepository`] for the canonical record of each selected facility,
//! so the in-memory and REST backends can be swapped via dependency injection.

use async_trait::async_trait;

use crate::models::{FacilityDetail, FacilityId, FacilityType};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Source of canonical facility records.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one instance is shared by every
/// session and every concurrent fetch of a comparison batch.
///
/// # Error Handling
/// A failed fetch must surface as `Err` so the aggregator can fall back to
/// the summary it already holds for that slot.
#[async_trait]
pub trait FacilityRepository: Send + Sync {
    /// Check if the data source is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Fetch the full record of one facility.
    ///
    /// # Arguments
    /// * `facility_type` - Collection the facility lives in
    /// * `identity` - Canonical facility identity
    ///
    /// # Returns
    /// * `Ok(FacilityDetail)` - Record whose identity equals `identity`
    /// * `Err(RepositoryError::NotFound)` - If the facility doesn't exist
    /// * `Err(RepositoryError)` - If the fetch fails
    async fn fetch_facility_detail(
        &self,
        facility_type: FacilityType,
        identity: &FacilityId,
    ) -> RepositoryResult<FacilityDetail>;
}
