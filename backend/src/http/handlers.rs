//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! selection store and comparison service of the addressed session.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use parking_lot::Mutex;
use std::sync::Arc;

use super::dto::{
    AddItemRequest, AddItemResponse, ComparisonQuery, ComparisonTable, CreateSessionResponse,
    HealthResponse, Notice, SelectionResponse,
};
use super::error::AppError;
use super::session::Session;
use super::state::AppState;
use crate::api::NavigationTarget;
use crate::models::FacilityId;
use crate::services::{build_comparison_table, LoadOutcome, Navigator};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn session(state: &AppState, session_id: &str) -> Result<Arc<Session>, AppError> {
    state
        .sessions
        .get(session_id)
        .ok_or_else(|| AppError::session_not_found(session_id))
}

/// Captures where the comparison view asked to go.
#[derive(Default)]
struct RedirectNavigator {
    target: Mutex<Option<NavigationTarget>>,
}

impl Navigator for RedirectNavigator {
    fn navigate(&self, target: NavigationTarget) {
        *self.target.lock() = Some(target);
    }
}

fn table_for(session: &Session, outcome: LoadOutcome) -> ComparisonTable {
    let loaded = match outcome {
        LoadOutcome::Applied(loaded) => loaded,
        // Nothing stored yet means the newer load is still in flight, so the
        // superseded batch is the freshest data available.
        LoadOutcome::Superseded {
            sequence,
            latest,
            batch,
        } => {
            tracing::debug!(sequence, latest, "load superseded, serving newest comparison");
            session.comparison.current().unwrap_or(batch)
        }
    };
    build_comparison_table(&loaded)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the facility
/// source is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository,
    }))
}

// =============================================================================
// Sessions and selection
// =============================================================================

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let session = state.sessions.create();
    tracing::info!(session_id = %session.id, "session created");
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id.clone(),
        }),
    ))
}

/// DELETE /v1/sessions/{session_id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(&session_id) {
        return Err(AppError::session_not_found(&session_id));
    }
    tracing::info!(session_id = %session_id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/sessions/{session_id}/selection
pub async fn get_selection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<SelectionResponse> {
    let session = session(&state, &session_id)?;
    Ok(Json(SelectionResponse::new(
        &session.id,
        &session.selection.snapshot(),
    )))
}

/// POST /v1/sessions/{session_id}/selection
///
/// A refused add answers 200 with `added: false` and the notice to show.
pub async fn add_to_selection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> HandlerResult<AddItemResponse> {
    let session = session(&state, &session_id)?;
    let (added, notice, snapshot) =
        match session.selection.try_add(&request.item, request.facility_type) {
            Ok(snapshot) => (true, None, snapshot),
            Err(refusal) => {
                tracing::info!(code = refusal.code(), "add refused: {}", refusal);
                (false, Some(Notice::from(&refusal)), session.selection.snapshot())
            }
        };

    Ok(Json(AddItemResponse {
        added,
        notice,
        selection: SelectionResponse::new(&session.id, &snapshot),
    }))
}

/// DELETE /v1/sessions/{session_id}/selection
pub async fn clear_selection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<SelectionResponse> {
    let session = session(&state, &session_id)?;
    let snapshot = session.selection.clear();
    Ok(Json(SelectionResponse::new(&session.id, &snapshot)))
}

/// DELETE /v1/sessions/{session_id}/selection/{identity}
///
/// Removing an identity that is not selected is not an error.
pub async fn remove_from_selection(
    State(state): State<AppState>,
    Path((session_id, identity)): Path<(String, String)>,
) -> HandlerResult<SelectionResponse> {
    let session = session(&state, &session_id)?;
    let identity = FacilityId::parse(&identity)
        .ok_or_else(|| AppError::BadRequest("Facility identity must not be blank".to_string()))?;
    let snapshot = session.selection.remove(&identity);
    Ok(Json(SelectionResponse::new(&session.id, &snapshot)))
}

// =============================================================================
// Comparison
// =============================================================================

/// GET /v1/sessions/{session_id}/comparison?lat=..&lon=..
///
/// Loads the session's selection. With fewer than two items selected this
/// answers 409 with a redirect to the listing.
pub async fn get_comparison(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<ComparisonQuery>,
) -> HandlerResult<ComparisonTable> {
    let session = session(&state, &session_id)?;
    let location = query.location().map_err(AppError::BadRequest)?;
    let navigator = RedirectNavigator::default();
    let selection = session.selection.snapshot();

    match session
        .comparison
        .open(&selection, location, &navigator)
        .await?
    {
        Some(outcome) => Ok(Json(table_for(&session, outcome))),
        None => Err(AppError::Conflict {
            code: "INSUFFICIENT_SELECTION",
            message: format!(
                "Select at least two facilities to compare, {} selected",
                selection.len()
            ),
            redirect: navigator.target.lock().take(),
        }),
    }
}

/// POST /v1/sessions/{session_id}/comparison/refresh
pub async fn refresh_comparison(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<ComparisonTable> {
    let session = session(&state, &session_id)?;
    let outcome = session.comparison.refresh().await?;
    Ok(Json(table_for(&session, outcome)))
}
