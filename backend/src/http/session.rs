//! Per-browser comparison sessions.
//!
//! Each session owns its own selection store and comparison service; nothing
//! is shared between sessions except the facility repository. Sessions idle
//! for longer than the registry's TTL are dropped on their next lookup and by
//! [`SessionRegistry::purge_expired`].

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::db::repository::FacilityRepository;
use crate::services::{ComparisonService, SelectionStore};

/// State of one session.
pub struct Session {
    pub id: String,
    pub selection: SelectionStore,
    pub comparison: ComparisonService,
    pub created_at: DateTime<Utc>,
    last_seen: Mutex<Instant>,
}

impl Session {
    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.lock().elapsed() >= ttl
    }
}

/// Idle time after which a session is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// In-memory session registry.
#[derive(Clone)]
pub struct SessionRegistry {
    repository: Arc<dyn FacilityRepository>,
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(repository: Arc<dyn FacilityRepository>) -> Self {
        Self::with_ttl(repository, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(repository: Arc<dyn FacilityRepository>, ttl: Duration) -> Self {
        Self {
            repository,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create an empty session and return it. Expired sessions are swept
    /// first.
    pub fn create(&self) -> Arc<Session> {
        self.purge_expired();
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session {
            id: id.clone(),
            selection: SelectionStore::new(),
            comparison: ComparisonService::new(self.repository.clone()),
            created_at: Utc::now(),
            last_seen: Mutex::new(Instant::now()),
        });
        self.sessions.write().insert(id, session.clone());
        session
    }

    /// Look up a live session and mark it as used.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.read().get(id).cloned()?;
        if session.is_expired(self.ttl) {
            self.sessions.write().remove(id);
            tracing::debug!(session_id = %id, "session expired");
            return None;
        }
        session.touch();
        Some(session)
    }

    /// Drop every session idle for longer than the TTL. Returns how many
    /// were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!(purged, live = sessions.len(), "purged expired sessions");
        }
        purged
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
