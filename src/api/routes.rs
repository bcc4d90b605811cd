//! API Routes
//!
//! Configures the Axum router with all suspect monitor endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_cache_handler, delete_suspect_handler, enroll_suspect_handler,
    get_suspect_handler, health_handler, import_suspects_handler, list_suspects_handler,
    refresh_status_handler, suspect_history_handler, update_suspect_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /suspects` - List suspects (refreshes first when unfiltered)
/// - `POST /suspects` - Enroll a suspect
/// - `POST /suspects/import` - Bulk enroll without a Steam lookup
/// - `GET /suspects/:id` - Fetch one suspect
/// - `PUT /suspects/:id` - Edit nickname and category
/// - `DELETE /suspects/:id` - Delete a suspect and its history
/// - `GET /suspects/:id/history` - Status transitions, newest first
/// - `POST /suspects/status/refresh` - Refresh the whole roster
/// - `GET /cache/stats` - Snapshot cache statistics
/// - `DELETE /cache` - Clear the snapshot cache
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/suspects",
            get(list_suspects_handler).post(enroll_suspect_handler),
        )
        .route("/suspects/import", post(import_suspects_handler))
        .route("/suspects/status/refresh", post(refresh_status_handler))
        .route(
            "/suspects/:id",
            get(get_suspect_handler)
                .put(update_suspect_handler)
                .delete(delete_suspect_handler),
        )
        .route("/suspects/:id/history", get(suspect_history_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
