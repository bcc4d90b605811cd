//! Fetcher Module
//!
//! Batched, retrying access to the Steam Web API summary and ban endpoints.
//!
//! # Contract
//! - An empty id list returns an empty result without any network call.
//! - A missing API key fails with [`FetchError::Configuration`] before any
//!   request is issued and is never retried.
//! - The source may return fewer records than ids requested; that is not an
//!   error.

mod error;
mod fixture;
pub mod retry;
mod steam;

use async_trait::async_trait;

use crate::models::{PlayerBans, PlayerSummary, SteamId};

pub use error::FetchError;
pub use fixture::FixturePlayerSource;
pub use retry::{retry_with_timeouts, RetryPolicy};
pub use steam::{SteamClient, DEFAULT_STEAM_API_BASE_URL};

/// Port for the external player data source.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    /// Fetches presence summaries for `ids`.
    async fn fetch_summaries(
        &self,
        ids: &[SteamId],
        api_key: Option<&str>,
    ) -> Result<Vec<PlayerSummary>, FetchError>;

    /// Fetches ban records for `ids`.
    async fn fetch_bans(
        &self,
        ids: &[SteamId],
        api_key: Option<&str>,
    ) -> Result<Vec<PlayerBans>, FetchError>;
}

/// Returns the trimmed key, or a configuration error when it is absent or blank.
pub fn require_api_key(api_key: Option<&str>) -> Result<&str, FetchError> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(FetchError::Configuration)
}
