//! Domain and transport models
//!
//! Suspects and their history, Steam API snapshots, and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;
pub mod steam;
pub mod steam_id;
pub mod suspect;

pub use requests::{EnrollRequest, ImportEntry, ImportRequest, UpdateSuspectRequest};
pub use responses::{
    CacheStatsResponse, ClearCacheResponse, DeleteResponse, ErrorResponse, HealthResponse,
};
pub use steam::{PlayerBans, PlayerSnapshot, PlayerSummary, VISIBILITY_PUBLIC};
pub use steam_id::{InvalidSteamId, SteamId};
pub use suspect::{
    Category, NewSuspect, NewTransition, ProfileChanges, Status, Suspect, SuspectChanges, SuspectFilter,
    TransitionEvent, CS2_APP_ID,
};
