//! Suspect Monitor - Steam presence tracking for flagged players
//!
//! Periodically synchronizes enrolled Steam identities with the Steam Web
//! API, records their status transitions, and serves them over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod reconcile;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::MonitorError;
pub use orchestrator::{ImportResult, RefreshOrchestrator, RefreshResult};
pub use tasks::spawn_cleanup_task;
