//! API Module
//!
//! HTTP handlers and routing for the suspect monitor REST API.
//!
//! # Endpoints
//! - `GET|POST /suspects` - List or enroll suspects
//! - `GET|DELETE /suspects/:id` - Read or delete one suspect
//! - `GET /suspects/:id/history` - Status transition history
//! - `POST /suspects/status/refresh` - Refresh every suspect
//! - `GET /cache/stats`, `DELETE /cache` - Snapshot cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
