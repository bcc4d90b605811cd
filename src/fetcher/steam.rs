//! Reqwest-backed Steam Web API adapter.
//!
//! Owns transport details only: URL building, status mapping and JSON
//! decoding. Timeouts and retries come from the [`RetryPolicy`].

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::retry::{retry_with_timeouts, RetryPolicy};
use super::{require_api_key, FetchError, PlayerSource};
use crate::models::steam::{BansEnvelope, SummariesEnvelope};
use crate::models::{PlayerBans, PlayerSummary, SteamId};

pub const DEFAULT_STEAM_API_BASE_URL: &str = "https://api.steampowered.com";

const SUMMARIES_PATH: &str = "/ISteamUser/GetPlayerSummaries/v0002/";
const BANS_PATH: &str = "/ISteamUser/GetPlayerBans/v1/";
const USER_AGENT: &str = concat!("suspect-monitor/", env!("CARGO_PKG_VERSION"));

/// Steam Web API client with escalating-timeout retries.
#[derive(Debug, Clone)]
pub struct SteamClient {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl SteamClient {
    /// Client against `base_url` using the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_policy(base_url, RetryPolicy::default())
    }

    /// Client with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_policy(
        base_url: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        api_key: &str,
        steam_ids: &str,
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("key", api_key), ("steamids", steam_ids)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|error| FetchError::Decode(error.to_string()))
    }

    async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        api_key: &str,
        ids: &[SteamId],
    ) -> Result<T, FetchError> {
        let steam_ids = join_ids(ids);
        retry_with_timeouts(&self.policy, endpoint, |_| {
            self.get_json(path, api_key, &steam_ids)
        })
        .await
        .map_err(|error| FetchError::from_retry(endpoint, error))
    }
}

fn join_ids(ids: &[SteamId]) -> String {
    ids.iter().map(SteamId::as_str).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl PlayerSource for SteamClient {
    async fn fetch_summaries(
        &self,
        ids: &[SteamId],
        api_key: Option<&str>,
    ) -> Result<Vec<PlayerSummary>, FetchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = require_api_key(api_key)?;

        let envelope: SummariesEnvelope = self
            .fetch_with_retry("GetPlayerSummaries", SUMMARIES_PATH, api_key, ids)
            .await?;
        Ok(envelope.response.players)
    }

    async fn fetch_bans(
        &self,
        ids: &[SteamId],
        api_key: Option<&str>,
    ) -> Result<Vec<PlayerBans>, FetchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = require_api_key(api_key)?;

        let envelope: BansEnvelope = self
            .fetch_with_retry("GetPlayerBans", BANS_PATH, api_key, ids)
            .await?;
        Ok(envelope.players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<SteamId> {
        vec![
            SteamId::parse("76561198000000001").unwrap(),
            SteamId::parse("76561198000000002").unwrap(),
        ]
    }

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&ids()), "76561198000000001,76561198000000002");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SteamClient::new("http://localhost:1/").unwrap();
        assert_eq!(client.base_url, "http://localhost:1");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        // Port 9 (discard) is never contacted: the key check comes first.
        let client = SteamClient::new("http://127.0.0.1:9").unwrap();

        let summaries = client.fetch_summaries(&ids(), None).await;
        let bans = client.fetch_bans(&ids(), Some("")).await;

        assert!(matches!(summaries, Err(FetchError::Configuration)));
        assert!(matches!(bans, Err(FetchError::Configuration)));
    }

    #[tokio::test]
    async fn test_empty_ids_short_circuit() {
        let client = SteamClient::new("http://127.0.0.1:9").unwrap();

        assert!(client.fetch_summaries(&[], None).await.unwrap().is_empty());
        assert!(client.fetch_bans(&[], Some("key")).await.unwrap().is_empty());
    }
}
