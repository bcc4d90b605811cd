//! API Handlers
//!
//! HTTP request handlers for each suspect monitor endpoint.

use std::time::Duration;

use chrono::Utc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::models::{
    CacheStatsResponse, ClearCacheResponse, DeleteResponse, EnrollRequest, HealthResponse,
    ImportRequest, SteamId, Suspect, SuspectFilter, TransitionEvent, UpdateSuspectRequest,
};
use crate::orchestrator::{ImportResult, RefreshOrchestrator, RefreshResult};

/// Request header carrying a caller-supplied Steam Web API key.
pub const API_KEY_HEADER: &str = "x-steam-api-key";

/// Response header set when a listing is served without a successful refresh.
pub const REFRESH_WARNING_HEADER: &str = "x-refresh-warning";

const FALLBACK_REFRESH_WARNING: &str = "refresh failed";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: RefreshOrchestrator,
    /// Server-configured Steam Web API key
    pub api_key: Option<String>,
    /// Upper bound for refreshes triggered by requests
    pub refresh_deadline: Duration,
}

impl AppState {
    pub fn new(
        orchestrator: RefreshOrchestrator,
        api_key: Option<String>,
        refresh_deadline: Duration,
    ) -> Self {
        Self {
            orchestrator,
            api_key,
            refresh_deadline,
        }
    }

    /// The request header key when present, otherwise the configured one.
    fn api_key<'a>(&'a self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .or(self.api_key.as_deref())
    }
}

/// Handler for GET /suspects
///
/// Without filters the whole roster is refreshed first. A failed refresh
/// does not fail the request: the stored rows are returned with an
/// `x-refresh-warning` header.
pub async fn list_suspects_handler(
    State(state): State<AppState>,
    Query(filter): Query<SuspectFilter>,
    headers: HeaderMap,
) -> Result<Response> {
    let mut warning = None;
    if filter.is_empty() {
        match state
            .orchestrator
            .refresh_all_with_deadline(state.api_key(&headers), state.refresh_deadline)
            .await
        {
            Ok(result) => debug!("Listing refresh updated {}", result.updated_count),
            Err(e) => {
                warn!("Serving stale suspects: {}", e);
                warning = Some(e.to_string());
            }
        }
    }

    let suspects = state.orchestrator.store().get_all(&filter).await?;
    let mut response = Json(suspects).into_response();
    if let Some(message) = warning {
        response
            .headers_mut()
            .insert(REFRESH_WARNING_HEADER, warning_header(&message));
    }
    Ok(response)
}

/// Error text as a header value, or a fixed message when the text holds
/// bytes a header cannot carry.
fn warning_header(message: &str) -> HeaderValue {
    HeaderValue::from_str(message)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_REFRESH_WARNING))
}

/// Handler for POST /suspects
pub async fn enroll_suspect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<Suspect>)> {
    if let Some(error_msg) = req.validate() {
        return Err(MonitorError::InvalidRequest(error_msg));
    }
    let steam_id = SteamId::from_input(&req.steam_input)?;

    let suspect = state
        .orchestrator
        .enroll(
            &steam_id,
            req.clean_nickname(),
            req.category,
            state.api_key(&headers),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(suspect)))
}

/// Handler for GET /suspects/:id
pub async fn get_suspect_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Suspect>> {
    state
        .orchestrator
        .store()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| MonitorError::NotFound(format!("Suspect {id}")))
}

/// Handler for PUT /suspects/:id
///
/// Edits the operator-owned fields; synchronized fields are left alone.
pub async fn update_suspect_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSuspectRequest>,
) -> Result<Json<Suspect>> {
    if let Some(error_msg) = req.validate() {
        return Err(MonitorError::InvalidRequest(error_msg));
    }
    let suspect = state
        .orchestrator
        .store()
        .update_profile(id, req.into_changes(Utc::now()))
        .await?;
    Ok(Json(suspect))
}

/// Handler for POST /suspects/import
pub async fn import_suspects_handler(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResult>> {
    let result = state.orchestrator.import(&req.suspects).await?;
    Ok(Json(result))
}

/// Handler for DELETE /suspects/:id
pub async fn delete_suspect_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    if !state.orchestrator.store().delete(id).await? {
        return Err(MonitorError::NotFound(format!("Suspect {id}")));
    }
    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for GET /suspects/:id/history
pub async fn suspect_history_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TransitionEvent>>> {
    let store = state.orchestrator.store();
    if store.get_by_id(id).await?.is_none() {
        return Err(MonitorError::NotFound(format!("Suspect {id}")));
    }
    Ok(Json(store.history(id).await?))
}

/// Handler for POST /suspects/status/refresh
pub async fn refresh_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResult>> {
    let result = state
        .orchestrator
        .refresh_all_with_deadline(state.api_key(&headers), state.refresh_deadline)
        .await?;
    Ok(Json(result))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.orchestrator.cache().read().await.stats();
    Json(CacheStatsResponse::from(stats))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.orchestrator.cache().write().await.clear();
    Json(ClearCacheResponse::cleared())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
