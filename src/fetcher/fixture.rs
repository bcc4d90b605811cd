//! In-process player source for tests and offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{require_api_key, FetchError, PlayerSource};
use crate::models::{PlayerBans, PlayerSummary, SteamId};

#[derive(Debug, Default)]
struct FixtureData {
    summaries: Vec<PlayerSummary>,
    bans: Vec<PlayerBans>,
    failure: Option<u16>,
}

/// Serves canned records, filtered to the requested ids, and counts calls.
///
/// Honours the same preconditions as the HTTP client: empty id lists return
/// nothing and a missing key is a configuration error.
#[derive(Debug, Clone, Default)]
pub struct FixturePlayerSource {
    data: Arc<Mutex<FixtureData>>,
    summary_calls: Arc<AtomicUsize>,
    ban_calls: Arc<AtomicUsize>,
}

impl FixturePlayerSource {
    pub fn new(summaries: Vec<PlayerSummary>, bans: Vec<PlayerBans>) -> Self {
        let source = Self::default();
        source.replace(summaries, bans);
        source
    }

    /// Swaps the canned records.
    pub fn replace(&self, summaries: Vec<PlayerSummary>, bans: Vec<PlayerBans>) {
        let mut data = self.lock();
        data.summaries = summaries;
        data.bans = bans;
    }

    /// Makes every subsequent call fail with the given HTTP status.
    pub fn fail_with_status(&self, status: u16) {
        self.lock().failure = Some(status);
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn ban_calls(&self) -> usize {
        self.ban_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixtureData> {
        // A poisoned fixture only means another test thread panicked.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, api_key: Option<&str>) -> Result<(), FetchError> {
        require_api_key(api_key)?;
        match self.lock().failure {
            Some(status) => Err(FetchError::Status(status)),
            None => Ok(()),
        }
    }
}

fn requested(ids: &[SteamId], steam_id: &str) -> bool {
    ids.iter().any(|id| id.as_str() == steam_id)
}

#[async_trait]
impl PlayerSource for FixturePlayerSource {
    async fn fetch_summaries(
        &self,
        ids: &[SteamId],
        api_key: Option<&str>,
    ) -> Result<Vec<PlayerSummary>, FetchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.check(api_key)?;
        self.summary_calls.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .lock()
            .summaries
            .iter()
            .filter(|s| requested(ids, &s.steam_id))
            .cloned()
            .collect())
    }

    async fn fetch_bans(
        &self,
        ids: &[SteamId],
        api_key: Option<&str>,
    ) -> Result<Vec<PlayerBans>, FetchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.check(api_key)?;
        self.ban_calls.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .lock()
            .bans
            .iter()
            .filter(|b| requested(ids, &b.steam_id))
            .cloned()
            .collect())
    }
}
