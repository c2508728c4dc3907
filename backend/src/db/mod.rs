//! Facility data access.
//!
//! This module provides abstractions for reading canonical facility records via
//! the Repository pattern, allowing different data sources to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (HTTP API, comparison view)          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services::compare) - Aggregation        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository) - Abstract Interface     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼──────────────┐   ┌───────────▼──────────┐
//! │ Local Repository │   │   REST Repository    │
//! │   (in-memory)    │   │   (listing API)      │
//! └──────────────────┘   └──────────────────────┘
//! ```
//!
//! # Usage
//! ```
//! use facility_compare::config::AppConfig;
//! use facility_compare::db::RepositoryFactory;
//!
//! let repo = RepositoryFactory::create(&AppConfig::default()).unwrap();
//! # let _ = repo;
//! ```

pub mod factory;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "rest-repo")]
pub use repositories::{RestConfig, RestRepository};
pub use repository::{ErrorContext, FacilityRepository, RepositoryError, RepositoryResult};
