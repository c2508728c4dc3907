//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::NavigationTarget;
use crate::services::CompareError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Client route to go to instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, target: &NavigationTarget) -> Self {
        self.redirect = Some(target.path());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Request conflicts with the session state
    Conflict {
        code: &'static str,
        message: String,
        redirect: Option<NavigationTarget>,
    },
}

impl AppError {
    pub fn session_not_found(session_id: &str) -> Self {
        AppError::NotFound(format!("Session {} not found", session_id))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Conflict {
                code,
                message,
                redirect,
            } => {
                let mut error = ApiError::new(code, message);
                if let Some(target) = redirect {
                    error = error.with_redirect(&target);
                }
                (StatusCode::CONFLICT, error)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<CompareError> for AppError {
    fn from(err: CompareError) -> Self {
        let redirect = match err {
            CompareError::InsufficientSelection { .. } => Some(NavigationTarget::Listing),
            CompareError::NothingLoaded => None,
        };
        AppError::Conflict {
            code: err.code(),
            message: err.to_string(),
            redirect,
        }
    }
}
