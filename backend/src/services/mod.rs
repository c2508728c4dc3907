//! Service layer for business logic and orchestration.
//!
//! This module contains the service layer that sits between the facility
//! repositories and the HTTP handlers: the session selection store, the
//! comparison aggregator and the table layout.

pub mod compare;
pub mod rows;
pub mod selection;

pub use compare::{
    CompareError, CompareResult, ComparisonService, LoadOutcome, LoadedComparison, Navigator,
};
pub use rows::{build_comparison_table, compute_best_index, compute_feature_union};
pub use selection::{
    identity_of, LogNotifier, NoticeLog, Notifier, SelectionError, SelectionSnapshot,
    SelectionStore, MAX_COMPARE_ITEMS,
};
