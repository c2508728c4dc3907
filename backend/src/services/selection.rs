//! Session-scoped comparison selection.
//!
//! Holds up to [`MAX_COMPARE_ITEMS`] facilities of a single type. Every
//! mutation publishes a fresh immutable [`SelectionSnapshot`]; readers clone
//! the `Arc` and never see a half-applied change.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use crate::models::identity_of;
use crate::models::{FacilityId, FacilitySummary, FacilityType};

/// Maximum number of facilities compared at once.
pub const MAX_COMPARE_ITEMS: usize = 3;

/// Minimum number of facilities needed to open a comparison.
pub const MIN_COMPARE_ITEMS: usize = 2;

/// Refused `add` requests. Each variant's message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("This facility cannot be compared: it has no ID")]
    MissingIdentity,

    #[error("Maximum {max} items can be compared at once!")]
    CapacityReached { max: usize },

    #[error("You can only compare {} together! Clear current list first.", .locked.plural())]
    TypeMismatch {
        locked: FacilityType,
        requested: FacilityType,
    },

    #[error("{name} is already in comparison list!")]
    AlreadyAdded { identity: FacilityId, name: String },
}

impl SelectionError {
    /// Stable code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::MissingIdentity => "MISSING_IDENTITY",
            SelectionError::CapacityReached { .. } => "CAPACITY_REACHED",
            SelectionError::TypeMismatch { .. } => "TYPE_MISMATCH",
            SelectionError::AlreadyAdded { .. } => "ALREADY_ADDED",
        }
    }
}

/// Receives user-facing messages for refused `add` calls.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &SelectionError);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &SelectionError) {
        log::warn!("comparison selection refused: {}", notice);
    }
}

/// Collects notices in memory until taken.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<SelectionError>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every collected notice.
    pub fn take(&self) -> Vec<SelectionError> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: &SelectionError) {
        self.notices.lock().push(notice.clone());
    }
}

/// Immutable view of the selection at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    items: Vec<FacilitySummary>,
    #[serde(rename = "type")]
    facility_type: Option<FacilityType>,
}

impl SelectionSnapshot {
    /// Selected facilities in insertion order.
    pub fn items(&self) -> &[FacilitySummary] {
        &self.items
    }

    /// Type lock; `None` while the selection is empty.
    pub fn facility_type(&self) -> Option<FacilityType> {
        self.facility_type
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, identity: &FacilityId) -> bool {
        self.items.iter().any(|i| &i.identity == identity)
    }

    pub fn identities(&self) -> Vec<FacilityId> {
        self.items.iter().map(|i| i.identity.clone()).collect()
    }

    pub fn remaining_slots(&self) -> usize {
        MAX_COMPARE_ITEMS.saturating_sub(self.items.len())
    }

    /// Whether enough facilities are selected to open a comparison.
    pub fn can_compare(&self) -> bool {
        self.items.len() >= MIN_COMPARE_ITEMS
    }

    fn check_add(
        &self,
        summary: &FacilitySummary,
        facility_type: FacilityType,
    ) -> Result<(), SelectionError> {
        if self.items.len() >= MAX_COMPARE_ITEMS {
            return Err(SelectionError::CapacityReached {
                max: MAX_COMPARE_ITEMS,
            });
        }

        if let Some(locked) = self.facility_type {
            if locked != facility_type && !self.items.is_empty() {
                return Err(SelectionError::TypeMismatch {
                    locked,
                    requested: facility_type,
                });
            }
        }

        if self.contains(&summary.identity) {
            return Err(SelectionError::AlreadyAdded {
                identity: summary.identity.clone(),
                name: summary.display_name.clone(),
            });
        }

        Ok(())
    }
}

/// Bounded, single-type comparison selection for one session.
///
/// Constructed once per session and shared by reference with every component
/// that needs it.
pub struct SelectionStore {
    current: RwLock<Arc<SelectionSnapshot>>,
    notifier: Arc<dyn Notifier>,
}

impl SelectionStore {
    /// Create an empty store that logs refused additions.
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LogNotifier))
    }

    /// Create an empty store reporting refused additions to `notifier`.
    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            current: RwLock::new(Arc::new(SelectionSnapshot::default())),
            notifier,
        }
    }

    /// Current selection.
    pub fn snapshot(&self) -> Arc<SelectionSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Add `item` as a facility of `facility_type`.
    ///
    /// Returns `false` and notifies the user when the identity is missing, the
    /// selection is full, the type differs from the locked one, or the item is
    /// already selected. The selection is left untouched in those cases.
    pub fn add(&self, item: &Value, facility_type: FacilityType) -> bool {
        match self.try_add(item, facility_type) {
            Ok(_) => true,
            Err(notice) => {
                if notice == SelectionError::MissingIdentity {
                    log::error!("facility has no identity, not added to comparison: {}", item);
                }
                self.notifier.notify(&notice);
                false
            }
        }
    }

    /// Like [`add`](Self::add) but returns the refusal instead of notifying.
    pub fn try_add(
        &self,
        item: &Value,
        facility_type: FacilityType,
    ) -> Result<Arc<SelectionSnapshot>, SelectionError> {
        let summary =
            FacilitySummary::from_value(item).map_err(|_| SelectionError::MissingIdentity)?;

        let mut current = self.current.write();
        current.check_add(&summary, facility_type)?;

        let mut items = current.items.clone();
        log::debug!(
            "added {} ({}) to comparison, {} selected",
            summary.display_name,
            summary.identity,
            items.len() + 1
        );
        items.push(summary);

        let next = Arc::new(SelectionSnapshot {
            items,
            facility_type: Some(current.facility_type.unwrap_or(facility_type)),
        });
        *current = Arc::clone(&next);
        Ok(next)
    }

    /// Remove the facility with `identity`. Removing an absent identity is a
    /// no-op; emptying the selection releases the type lock.
    pub fn remove(&self, identity: &FacilityId) -> Arc<SelectionSnapshot> {
        let mut current = self.current.write();
        if !current.contains(identity) {
            return Arc::clone(&current);
        }

        let items: Vec<FacilitySummary> = current
            .items
            .iter()
            .filter(|i| &i.identity != identity)
            .cloned()
            .collect();
        let facility_type = if items.is_empty() {
            None
        } else {
            current.facility_type
        };
        log::debug!("removed {} from comparison, {} left", identity, items.len());

        let next = Arc::new(SelectionSnapshot {
            items,
            facility_type,
        });
        *current = Arc::clone(&next);
        next
    }

    /// Empty the selection and release the type lock.
    pub fn clear(&self) -> Arc<SelectionSnapshot> {
        let next = Arc::new(SelectionSnapshot::default());
        *self.current.write() = Arc::clone(&next);
        next
    }

    pub fn contains(&self, identity: &FacilityId) -> bool {
        self.current.read().contains(identity)
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod selection_tests;
