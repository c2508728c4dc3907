//! Facility repository implementations.
//!
//! - `local`: In-memory implementation for unit testing and local development
//! - `rest`: Listing REST API client
pub mod local;
#[cfg(feature = "rest-repo")]
pub mod rest;

pub use local::LocalRepository;
#[cfg(feature = "rest-repo")]
pub use rest::{RestConfig, RestRepository};
