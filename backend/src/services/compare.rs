//! Comparison aggregation.
//!
//! [`ComparisonService`] re-fetches the canonical record of every selected
//! facility, falls back to the selection summary when a fetch fails, and
//! keeps the most recent batch. Every load takes a sequence number; a batch
//! that completes after a newer load was issued is discarded.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::NavigationTarget;
use crate::db::repository::FacilityRepository;
use crate::models::{FacilityDetail, FacilityId, FacilitySummary, FacilityType, GeoPoint};

use super::selection::{SelectionSnapshot, MIN_COMPARE_ITEMS};

/// Aggregator errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("At least {min} items are needed for a comparison, {count} selected")]
    InsufficientSelection { count: usize, min: usize },

    #[error("No comparison has been loaded yet")]
    NothingLoaded,
}

impl CompareError {
    pub fn code(&self) -> &'static str {
        match self {
            CompareError::InsufficientSelection { .. } => "INSUFFICIENT_SELECTION",
            CompareError::NothingLoaded => "NOTHING_LOADED",
        }
    }
}

pub type CompareResult<T> = Result<T, CompareError>;

/// Moves the user between views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavigationTarget);
}

/// One completed batch of detail records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedComparison {
    pub facility_type: FacilityType,
    /// One record per selected item, in selection order.
    pub items: Vec<FacilityDetail>,
    pub last_updated: DateTime<Utc>,
    /// Items whose fetch failed and were rebuilt from the selection summary.
    pub degraded: Vec<FacilityId>,
    pub sequence: u64,
}

impl LoadedComparison {
    /// Every fetch of the batch failed.
    pub fn all_failed(&self) -> bool {
        !self.items.is_empty() && self.degraded.len() == self.items.len()
    }

    pub fn is_degraded(&self, identity: &FacilityId) -> bool {
        self.degraded.contains(identity)
    }
}

/// Result of [`ComparisonService::load_comparison`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The batch became the current comparison.
    Applied(Arc<LoadedComparison>),
    /// A newer load was issued while this one was in flight. The finished
    /// batch is returned but not stored.
    Superseded {
        sequence: u64,
        latest: u64,
        batch: Arc<LoadedComparison>,
    },
}

impl LoadOutcome {
    pub fn applied(&self) -> Option<&Arc<LoadedComparison>> {
        match self {
            LoadOutcome::Applied(loaded) => Some(loaded),
            LoadOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, LoadOutcome::Superseded { .. })
    }

    /// The batch this load produced, whether or not it was stored.
    pub fn batch(&self) -> &Arc<LoadedComparison> {
        match self {
            LoadOutcome::Applied(loaded) => loaded,
            LoadOutcome::Superseded { batch, .. } => batch,
        }
    }
}

#[derive(Clone)]
struct LoadRequest {
    selection: Arc<SelectionSnapshot>,
    location: Option<GeoPoint>,
}

#[derive(Default)]
struct ServiceState {
    current: Option<Arc<LoadedComparison>>,
    last_request: Option<LoadRequest>,
}

/// Loads and refreshes the comparison of one session.
pub struct ComparisonService {
    repository: Arc<dyn FacilityRepository>,
    sequence: AtomicU64,
    state: RwLock<ServiceState>,
}

impl ComparisonService {
    pub fn new(repository: Arc<dyn FacilityRepository>) -> Self {
        Self {
            repository,
            sequence: AtomicU64::new(0),
            state: RwLock::new(ServiceState::default()),
        }
    }

    /// Fetch every selected facility and make the batch current.
    ///
    /// Fetches run concurrently and are all awaited. A failed fetch degrades
    /// that slot to the selection summary instead of failing the batch.
    ///
    /// # Errors
    /// `InsufficientSelection` if fewer than two items are selected.
    pub async fn load_comparison(
        &self,
        selection: &SelectionSnapshot,
        location: Option<GeoPoint>,
    ) -> CompareResult<LoadOutcome> {
        let facility_type = match selection.facility_type() {
            Some(t) if selection.len() >= MIN_COMPARE_ITEMS => t,
            _ => {
                return Err(CompareError::InsufficientSelection {
                    count: selection.len(),
                    min: MIN_COMPARE_ITEMS,
                })
            }
        };

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().last_request = Some(LoadRequest {
            selection: Arc::new(selection.clone()),
            location,
        });
        log::debug!(
            "loading comparison #{} of {} {}",
            sequence,
            selection.len(),
            facility_type.plural()
        );

        let fetches = selection
            .items()
            .iter()
            .map(|summary| self.fetch_or_fallback(facility_type, summary));
        let results = join_all(fetches).await;

        let mut items = Vec::with_capacity(results.len());
        let mut degraded = Vec::new();
        for (detail, fetched) in results {
            if !fetched {
                degraded.push(detail.identity.clone());
            }
            items.push(detail.with_distance_from(location.as_ref()));
        }

        let loaded = LoadedComparison {
            facility_type,
            items,
            last_updated: Utc::now(),
            degraded,
            sequence,
        };
        if loaded.all_failed() {
            log::error!(
                "comparison #{}: every fetch failed, showing selection summaries",
                sequence
            );
        }

        let loaded = Arc::new(loaded);
        let latest = self.sequence.load(Ordering::SeqCst);
        if sequence != latest {
            log::debug!("discarding comparison #{}, #{} is newer", sequence, latest);
            return Ok(LoadOutcome::Superseded {
                sequence,
                latest,
                batch: loaded,
            });
        }

        let mut state = self.state.write();
        let newer = state
            .current
            .as_ref()
            .map(|current| current.sequence)
            .filter(|stored| *stored > sequence);
        if let Some(latest) = newer {
            return Ok(LoadOutcome::Superseded {
                sequence,
                latest,
                batch: loaded,
            });
        }
        state.current = Some(loaded.clone());
        Ok(LoadOutcome::Applied(loaded))
    }

    /// Returns the record and whether it came from the data source.
    async fn fetch_or_fallback(
        &self,
        facility_type: FacilityType,
        summary: &FacilitySummary,
    ) -> (FacilityDetail, bool) {
        match self
            .repository
            .fetch_facility_detail(facility_type, &summary.identity)
            .await
        {
            Ok(detail) if detail.identity == summary.identity => (detail, true),
            Ok(detail) => {
                log::warn!(
                    "fetch for {} returned {}, using summary",
                    summary.identity,
                    detail.identity
                );
                (FacilityDetail::from_summary(summary), false)
            }
            Err(e) => {
                log::warn!("fetch for {} failed, using summary: {}", summary.identity, e);
                (FacilityDetail::from_summary(summary), false)
            }
        }
    }

    /// Reload the last requested selection and location in full.
    pub async fn refresh(&self) -> CompareResult<LoadOutcome> {
        let request = self
            .state
            .read()
            .last_request
            .clone()
            .ok_or(CompareError::NothingLoaded)?;
        self.load_comparison(&request.selection, request.location)
            .await
    }

    /// Entry point of the comparison view.
    ///
    /// Below two items the navigator is sent to the listing and `Ok(None)` is
    /// returned.
    pub async fn open(
        &self,
        selection: &SelectionSnapshot,
        location: Option<GeoPoint>,
        navigator: &dyn Navigator,
    ) -> CompareResult<Option<LoadOutcome>> {
        match self.load_comparison(selection, location).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(CompareError::InsufficientSelection { count, .. }) => {
                log::debug!("{} item(s) selected, returning to listing", count);
                navigator.navigate(NavigationTarget::Listing);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The most recently applied batch.
    pub fn current(&self) -> Option<Arc<LoadedComparison>> {
        self.state.read().current.clone()
    }

    /// Number of loads issued so far.
    pub fn issued(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod compare_tests;
