//! Error types for the suspect monitor
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::fetcher::FetchError;
use crate::models::{ErrorResponse, InvalidSteamId};
use crate::reconcile::ReconcileError;
use crate::store::StoreError;

// == Monitor Error Enum ==
/// Unified error type for the suspect monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Steam Web API call failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Persistence failed
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A bounded refresh did not finish in time
    #[error("Refresh did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<InvalidSteamId> for MonitorError {
    fn from(err: InvalidSteamId) -> Self {
        MonitorError::InvalidRequest(err.to_string())
    }
}

impl MonitorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MonitorError::Fetch(err) if err.is_configuration() => StatusCode::BAD_REQUEST,
            MonitorError::Fetch(_) => StatusCode::BAD_GATEWAY,
            MonitorError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            MonitorError::Store(StoreError::NotFound(_)) | MonitorError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            MonitorError::Store(StoreError::Conflict(_)) | MonitorError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            MonitorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MonitorError::Store(_) | MonitorError::Reconcile(_) | MonitorError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the suspect monitor.
pub type Result<T> = std::result::Result<T, MonitorError>;
