//! Application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use super::session::SessionRegistry;
use crate::db::repository::FacilityRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Facility data source shared by every session
    pub repository: Arc<dyn FacilityRepository>,
    /// Live comparison sessions
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FacilityRepository>) -> Self {
        Self {
            sessions: SessionRegistry::new(repository.clone()),
            repository,
        }
    }

    /// Like [`AppState::new`] with sessions expiring after `ttl` of
    /// inactivity.
    pub fn with_session_ttl(repository: Arc<dyn FacilityRepository>, ttl: Duration) -> Self {
        Self {
            sessions: SessionRegistry::with_ttl(repository.clone(), ttl),
            repository,
        }
    }
}
