//! Refresh Orchestrator
//!
//! Runs one synchronization cycle: cache lookup or concurrent fetch of
//! summaries and bans, per-suspect reconciliation, and a single store
//! transaction for every resulting write.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{canonical_key, SharedCache};
use crate::error::{MonitorError, Result};
use crate::fetcher::PlayerSource;
use crate::models::{
    Category, ImportEntry, NewSuspect, PlayerSnapshot, SteamId, Suspect, SuspectFilter,
};
use crate::reconcile::{reconcile, Reconciled};
use crate::store::{StoreError, SuspectStore};

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshResult {
    /// Suspects written back to the store
    pub updated_count: usize,
    /// Per-suspect failures; those suspects keep their previous state
    pub errors: Vec<String>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    /// Rows whose Steam ID was already enrolled
    pub skipped: usize,
    pub errors: Vec<String>,
}

// == Refresh Orchestrator ==
#[derive(Clone)]
pub struct RefreshOrchestrator {
    source: Arc<dyn PlayerSource>,
    store: Arc<dyn SuspectStore>,
    cache: SharedCache<PlayerSnapshot>,
    cache_ttl: u64,
}

impl RefreshOrchestrator {
    pub fn new(
        source: Arc<dyn PlayerSource>,
        store: Arc<dyn SuspectStore>,
        cache: SharedCache<PlayerSnapshot>,
        cache_ttl: u64,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            cache_ttl,
        }
    }

    pub fn cache(&self) -> &SharedCache<PlayerSnapshot> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn SuspectStore> {
        &self.store
    }

    /// Steam IDs of every enrolled suspect.
    pub async fn roster_ids(&self) -> Result<Vec<SteamId>> {
        let suspects = self.store.get_all(&SuspectFilter::default()).await?;
        Ok(suspects.into_iter().map(|s| s.steam_id).collect())
    }

    // == Refresh ==
    /// Synchronizes the suspects behind `steam_ids` with the external source.
    ///
    /// A whole-batch fetch failure is returned as an error and nothing is
    /// written. Ids that are not enrolled, or whose data cannot be merged,
    /// are reported in [`RefreshResult::errors`] and skipped. Every other
    /// write lands in one transaction: either all of them persist or none do.
    pub async fn refresh(&self, steam_ids: &[SteamId], api_key: Option<&str>) -> Result<RefreshResult> {
        if steam_ids.is_empty() {
            return Ok(RefreshResult::default());
        }

        let mut ids = steam_ids.to_vec();
        ids.sort();
        ids.dedup();

        let key = canonical_key(&ids);
        let snapshot = self.snapshot(&ids, &key, api_key).await?;
        let summaries = snapshot.summaries_by_id();
        let bans = snapshot.bans_by_id();

        let suspects = self.store.get_all(&SuspectFilter::default()).await?;
        let by_steam_id: HashMap<&SteamId, &Suspect> =
            suspects.iter().map(|s| (&s.steam_id, s)).collect();

        let now = Utc::now();
        let mut result = RefreshResult::default();
        let mut pending: Vec<Reconciled> = Vec::with_capacity(ids.len());

        for id in &ids {
            let Some(suspect) = by_steam_id.get(id) else {
                result
                    .errors
                    .push(format!("Error updating {id}: suspect is not enrolled"));
                continue;
            };

            let summary = summaries.get(id.as_str()).copied();
            let ban = bans.get(id.as_str()).copied();
            match reconcile(suspect, summary, ban, now) {
                Ok(reconciled) => pending.push(reconciled),
                Err(e) => {
                    warn!("Skipping {}: {}", id, e);
                    result.errors.push(format!("Error updating {id}: {e}"));
                }
            }
        }

        if !pending.is_empty() {
            let mut tx = self.store.begin().await?;
            for reconciled in pending {
                tx.update_fields(reconciled.updated.id, reconciled.changes)
                    .await?;
                if let Some(event) = reconciled.event {
                    debug!(
                        "Suspect {} transitioned {:?} -> {}",
                        event.suspect_id, event.old_status, event.new_status
                    );
                    tx.insert_history(event).await?;
                }
                result.updated_count += 1;
            }
            tx.commit().await?;
        }

        info!(
            "Refresh complete: {} updated, {} errors",
            result.updated_count,
            result.errors.len()
        );
        Ok(result)
    }

    /// Refreshes every enrolled suspect.
    pub async fn refresh_all(&self, api_key: Option<&str>) -> Result<RefreshResult> {
        let ids = self.roster_ids().await?;
        self.refresh(&ids, api_key).await
    }

    /// [`refresh`](Self::refresh) bounded by `deadline`. An interrupted
    /// cycle leaves the store untouched.
    pub async fn refresh_with_deadline(
        &self,
        steam_ids: &[SteamId],
        api_key: Option<&str>,
        deadline: Duration,
    ) -> Result<RefreshResult> {
        with_deadline(deadline, self.refresh(steam_ids, api_key)).await
    }

    /// [`refresh_all`](Self::refresh_all) bounded by `deadline`.
    pub async fn refresh_all_with_deadline(
        &self,
        api_key: Option<&str>,
        deadline: Duration,
    ) -> Result<RefreshResult> {
        with_deadline(deadline, self.refresh_all(api_key)).await
    }

    async fn snapshot(
        &self,
        ids: &[SteamId],
        key: &str,
        api_key: Option<&str>,
    ) -> Result<PlayerSnapshot> {
        let cached = self.cache.write().await.get(key);
        if let Some(snapshot) = cached {
            debug!("Cache hit for {} ids", ids.len());
            return Ok(snapshot);
        }

        debug!("Cache miss for {} ids, fetching", ids.len());
        let (summaries, bans) = tokio::try_join!(
            self.source.fetch_summaries(ids, api_key),
            self.source.fetch_bans(ids, api_key),
        )?;

        let snapshot = PlayerSnapshot::new(summaries, bans);
        self.cache
            .write()
            .await
            .set(key, snapshot.clone(), self.cache_ttl);
        Ok(snapshot)
    }

    // == Enroll ==
    /// Creates a suspect from a fresh lookup and records its first transition.
    pub async fn enroll(
        &self,
        steam_id: &SteamId,
        nickname: Option<String>,
        category: Category,
        api_key: Option<&str>,
    ) -> Result<Suspect> {
        if self.store.get_by_steam_id(steam_id).await?.is_some() {
            return Err(MonitorError::Conflict(format!(
                "Suspect {steam_id} is already enrolled"
            )));
        }

        let ids = std::slice::from_ref(steam_id);
        let (summaries, bans) = tokio::try_join!(
            self.source.fetch_summaries(ids, api_key),
            self.source.fetch_bans(ids, api_key),
        )?;

        let summary = summaries
            .iter()
            .find(|s| s.steam_id == steam_id.as_str())
            .ok_or_else(|| MonitorError::NotFound(format!("Steam profile {steam_id}")))?;
        let ban = bans.iter().find(|b| b.steam_id == steam_id.as_str());

        let now = Utc::now();
        let new = NewSuspect {
            steam_id: steam_id.clone(),
            nickname,
            display_name: summary.persona_name.clone(),
            category,
            profile_url: summary
                .profile_url
                .clone()
                .or_else(|| Some(steam_id.profile_url())),
            avatar_url: summary.avatar_url.clone(),
            created_at: now,
        };

        let mut tx = self.store.begin().await?;
        let created = tx.insert(new).await?;
        let reconciled = reconcile(&created, Some(summary), ban, now)?;
        let suspect = tx.update_fields(created.id, reconciled.changes).await?;
        if let Some(event) = reconciled.event {
            tx.insert_history(event).await?;
        }
        tx.commit().await?;

        info!("Enrolled suspect {} ({})", suspect.id, steam_id);
        Ok(suspect)
    }

    // == Import ==
    /// Enrolls `entries` without a Steam lookup. They start as `unknown`
    /// and pick up live data on the next refresh.
    ///
    /// Invalid ids are reported in [`ImportResult::errors`]; ids already
    /// enrolled, or repeated within the batch, are counted as skipped.
    pub async fn import(&self, entries: &[ImportEntry]) -> Result<ImportResult> {
        let mut result = ImportResult::default();
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        for entry in entries {
            let steam_id = match SteamId::from_input(&entry.steam_id) {
                Ok(id) => id,
                Err(e) => {
                    result.errors.push(format!("Invalid Steam ID {:?}: {e}", entry.steam_id));
                    continue;
                }
            };

            let new = NewSuspect {
                profile_url: Some(steam_id.profile_url()),
                steam_id,
                nickname: entry.clean_nickname(),
                display_name: None,
                category: entry.category,
                avatar_url: None,
                created_at: now,
            };
            match tx.insert(new).await {
                Ok(_) => result.imported += 1,
                Err(StoreError::Conflict(_)) => result.skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }
        tx.commit().await?;

        info!(
            "Import complete: {} imported, {} skipped, {} errors",
            result.imported,
            result.skipped,
            result.errors.len()
        );
        Ok(result)
    }
}

async fn with_deadline<F>(deadline: Duration, refresh: F) -> Result<RefreshResult>
where
    F: Future<Output = Result<RefreshResult>>,
{
    match tokio::time::timeout(deadline, refresh).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Refresh exceeded its {:?} deadline", deadline);
            Err(MonitorError::DeadlineExceeded(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::fetcher::{FetchError, FixturePlayerSource};
    use crate::models::{
        NewTransition, PlayerBans, PlayerSummary, ProfileChanges, Status, SuspectChanges,
        TransitionEvent, VISIBILITY_PUBLIC,
    };
    use crate::store::{MemoryStore, StoreResult, StoreTransaction};
    use tokio::sync::Barrier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: Option<&str> = Some("test-key");

    fn steam_id(n: u32) -> SteamId {
        SteamId::parse(&format!("765611980000{n:05}")).unwrap()
    }

    fn summary(id: &SteamId, persona_state: i32) -> PlayerSummary {
        PlayerSummary {
            steam_id: id.to_string(),
            visibility: VISIBILITY_PUBLIC,
            persona_state,
            persona_name: Some(format!("persona {id}")),
            profile_url: None,
            avatar_url: None,
            game_id: None,
            game_server_ip: None,
            last_logoff: None,
        }
    }

    fn ban(id: &SteamId, vac: bool) -> PlayerBans {
        PlayerBans {
            steam_id: id.to_string(),
            community_banned: false,
            vac_banned: vac,
            vac_ban_count: u32::from(vac),
            days_since_last_ban: 0,
            game_ban_count: 0,
            economy_ban: None,
        }
    }

    fn orchestrator(source: &FixturePlayerSource, store: Arc<dyn SuspectStore>) -> RefreshOrchestrator {
        RefreshOrchestrator::new(Arc::new(source.clone()), store, CacheStore::shared(), 300)
    }

    async fn enrolled(store: &dyn SuspectStore, id: &SteamId) -> Suspect {
        store
            .insert(NewSuspect {
                steam_id: id.clone(),
                nickname: None,
                display_name: None,
                category: Category::Suspected,
                profile_url: None,
                avatar_url: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn checked_with(store: &dyn SuspectStore, id: &SteamId, status: Status) -> Suspect {
        let suspect = enrolled(store, id).await;
        let now = Utc::now();
        store
            .update_fields(
                suspect.id,
                SuspectChanges {
                    status,
                    display_name: None,
                    profile_url: None,
                    avatar_url: None,
                    vac_banned: false,
                    game_ban_count: 0,
                    current_game_id: None,
                    game_server_address: None,
                    last_seen_offline_at: None,
                    last_checked_at: now,
                    updated_at: now,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_ids_touch_nothing() {
        let source = FixturePlayerSource::default();
        let orch = orchestrator(&source, Arc::new(MemoryStore::new()));

        let result = orch.refresh(&[], None).await.unwrap();

        assert_eq!(result, RefreshResult::default());
        assert_eq!(source.summary_calls(), 0);
        assert_eq!(orch.cache().read().await.len(), 0);
    }

    #[tokio::test]
    async fn test_offline_to_online_end_to_end() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        let suspect = checked_with(&*store, &id, Status::Offline).await;

        let mut s = summary(&id, 1);
        s.game_id = Some("730".to_string());
        s.game_server_ip = Some("1.2.3.4:27015".to_string());
        let source = FixturePlayerSource::new(vec![s], vec![]);
        let orch = orchestrator(&source, store.clone());

        let result = orch.refresh(&[id.clone()], KEY).await.unwrap();
        assert_eq!(result.updated_count, 1);
        assert!(result.errors.is_empty());

        let stored = store.get_by_id(suspect.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Online);
        assert_eq!(stored.current_game_id, Some(730));
        assert_eq!(stored.game_server_address.as_deref(), Some("1.2.3.4:27015"));
        assert!(!stored.vac_banned);

        let history = store.history(suspect.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, Some(Status::Offline));
        assert_eq!(history[0].new_status, Status::Online);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (steam_id(1), steam_id(2));
        enrolled(&*store, &a).await;
        enrolled(&*store, &b).await;

        let source = FixturePlayerSource::new(
            vec![summary(&a, 1), summary(&b, 0)],
            vec![ban(&a, true)],
        );
        let orch = orchestrator(&source, store.clone());

        orch.refresh(&[a.clone(), b.clone()], KEY).await.unwrap();
        // Same set in a different order maps to the same cache entry.
        orch.refresh(&[b.clone(), a.clone()], KEY).await.unwrap();

        assert_eq!(source.summary_calls(), 1);
        assert_eq!(source.ban_calls(), 1);
        let stats = orch.cache().read().await.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.keys, vec![canonical_key([a.as_str(), b.as_str()])]);
    }

    #[tokio::test]
    async fn test_missing_coverage_becomes_unknown() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (steam_id(1), steam_id(2));
        enrolled(&*store, &a).await;
        let uncovered = checked_with(&*store, &b, Status::Online).await;

        let source = FixturePlayerSource::new(vec![summary(&a, 1)], vec![]);
        let orch = orchestrator(&source, store.clone());

        let result = orch.refresh(&[a, b], KEY).await.unwrap();
        assert_eq!(result.updated_count, 2);

        let stored = store.get_by_id(uncovered.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Unknown);
        assert_eq!(
            store.history(uncovered.id).await.unwrap()[0].old_status,
            Some(Status::Online)
        );
    }

    #[tokio::test]
    async fn test_unenrolled_ids_are_reported() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(9);
        let source = FixturePlayerSource::new(vec![summary(&id, 1)], vec![]);
        let orch = orchestrator(&source, store);

        let result = orch.refresh(&[id.clone()], KEY).await.unwrap();
        assert_eq!(result.updated_count, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains(id.as_str()));
    }

    #[tokio::test]
    async fn test_invalid_game_id_skips_only_that_suspect() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (steam_id(1), steam_id(2));
        let bad = enrolled(&*store, &a).await;
        enrolled(&*store, &b).await;

        let mut broken = summary(&a, 1);
        broken.game_id = Some("not-a-number".to_string());
        let source = FixturePlayerSource::new(vec![broken, summary(&b, 1)], vec![]);
        let orch = orchestrator(&source, store.clone());

        let result = orch.refresh(&[a, b], KEY).await.unwrap();
        assert_eq!(result.updated_count, 1);
        assert_eq!(result.errors.len(), 1);
        let untouched = store.get_by_id(bad.id).await.unwrap().unwrap();
        assert!(untouched.last_checked_at.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        enrolled(&*store, &id).await;
        let source = FixturePlayerSource::new(vec![summary(&id, 1)], vec![]);
        let orch = orchestrator(&source, store.clone());

        let err = orch.refresh(&[id], None).await.unwrap_err();
        assert!(matches!(err, MonitorError::Fetch(FetchError::Configuration)));
        assert_eq!(source.summary_calls(), 0);
        assert_eq!(orch.cache().read().await.len(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        let suspect = enrolled(&*store, &id).await;
        let source = FixturePlayerSource::default();
        source.fail_with_status(503);
        let orch = orchestrator(&source, store.clone());

        let err = orch.refresh(&[id], KEY).await.unwrap_err();
        assert!(matches!(err, MonitorError::Fetch(FetchError::Status(503))));
        assert!(store.history(suspect.id).await.unwrap().is_empty());
    }

    // == Failing store ==
    struct FailingStore {
        inner: MemoryStore,
        fail_on_update: usize,
    }

    struct FailingTransaction {
        inner: Box<dyn StoreTransaction>,
        updates: Arc<AtomicUsize>,
        fail_on_update: usize,
    }

    #[async_trait]
    impl SuspectStore for FailingStore {
        async fn get_all(&self, filter: &SuspectFilter) -> StoreResult<Vec<Suspect>> {
            self.inner.get_all(filter).await
        }
        async fn get_by_id(&self, id: i64) -> StoreResult<Option<Suspect>> {
            self.inner.get_by_id(id).await
        }
        async fn get_by_steam_id(&self, steam_id: &SteamId) -> StoreResult<Option<Suspect>> {
            self.inner.get_by_steam_id(steam_id).await
        }
        async fn insert(&self, suspect: NewSuspect) -> StoreResult<Suspect> {
            self.inner.insert(suspect).await
        }
        async fn update_fields(&self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect> {
            self.inner.update_fields(id, changes).await
        }
        async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<Suspect> {
            self.inner.update_profile(id, changes).await
        }
        async fn insert_history(&self, event: NewTransition) -> StoreResult<TransitionEvent> {
            self.inner.insert_history(event).await
        }
        async fn history(&self, suspect_id: i64) -> StoreResult<Vec<TransitionEvent>> {
            self.inner.history(suspect_id).await
        }
        async fn delete(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete(id).await
        }
        async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
            Ok(Box::new(FailingTransaction {
                inner: self.inner.begin().await?,
                updates: Arc::new(AtomicUsize::new(0)),
                fail_on_update: self.fail_on_update,
            }))
        }
    }

    #[async_trait]
    impl StoreTransaction for FailingTransaction {
        async fn insert(&mut self, suspect: NewSuspect) -> StoreResult<Suspect> {
            self.inner.insert(suspect).await
        }
        async fn update_fields(&mut self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect> {
            let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on_update {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.update_fields(id, changes).await
        }
        async fn insert_history(&mut self, event: NewTransition) -> StoreResult<TransitionEvent> {
            self.inner.insert_history(event).await
        }
        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.inner.commit().await
        }
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back_whole_batch() {
        let inner = MemoryStore::new();
        let ids: Vec<SteamId> = (1..=5).map(steam_id).collect();
        let mut suspects = Vec::new();
        for id in &ids {
            suspects.push(enrolled(&inner, id).await);
        }
        let store = Arc::new(FailingStore {
            inner: inner.clone(),
            fail_on_update: 3,
        });

        let source = FixturePlayerSource::new(ids.iter().map(|id| summary(id, 1)).collect(), vec![]);
        let orch = orchestrator(&source, store);

        let err = orch.refresh(&ids, KEY).await.unwrap_err();
        assert!(matches!(err, MonitorError::Store(StoreError::Unavailable(_))));

        for suspect in suspects {
            let stored = inner.get_by_id(suspect.id).await.unwrap().unwrap();
            assert_eq!(stored.status, Status::Unknown);
            assert!(stored.last_checked_at.is_none());
            assert!(inner.history(suspect.id).await.unwrap().is_empty());
        }
    }

    // == Deadline ==
    struct StalledSource;

    #[async_trait]
    impl PlayerSource for StalledSource {
        async fn fetch_summaries(
            &self,
            _ids: &[SteamId],
            _api_key: Option<&str>,
        ) -> std::result::Result<Vec<PlayerSummary>, FetchError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn fetch_bans(
            &self,
            _ids: &[SteamId],
            _api_key: Option<&str>,
        ) -> std::result::Result<Vec<PlayerBans>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        enrolled(&*store, &id).await;
        let orch = RefreshOrchestrator::new(Arc::new(StalledSource), store, CacheStore::shared(), 300);

        let err = orch
            .refresh_all_with_deadline(KEY, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::DeadlineExceeded(d) if d == Duration::from_secs(30)));
    }

    // == Concurrent fetch ==
    /// Each endpoint blocks until the other one has been called.
    struct RendezvousSource {
        barrier: Barrier,
    }

    #[async_trait]
    impl PlayerSource for RendezvousSource {
        async fn fetch_summaries(
            &self,
            ids: &[SteamId],
            _api_key: Option<&str>,
        ) -> std::result::Result<Vec<PlayerSummary>, FetchError> {
            self.barrier.wait().await;
            Ok(ids.iter().map(|id| summary(id, 1)).collect())
        }

        async fn fetch_bans(
            &self,
            _ids: &[SteamId],
            _api_key: Option<&str>,
        ) -> std::result::Result<Vec<PlayerBans>, FetchError> {
            self.barrier.wait().await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_summaries_and_bans_fetched_concurrently() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        enrolled(&*store, &id).await;
        let source = Arc::new(RendezvousSource {
            barrier: Barrier::new(2),
        });
        let orch = RefreshOrchestrator::new(source, store.clone(), CacheStore::shared(), 300);

        let result = tokio::time::timeout(Duration::from_secs(5), orch.refresh(&[id.clone()], KEY))
            .await
            .expect("sequential fetches never pass the barrier")
            .unwrap();
        assert_eq!(result.updated_count, 1);

        let enroll = tokio::time::timeout(
            Duration::from_secs(5),
            orch.enroll(&steam_id(2), None, Category::default(), KEY),
        )
        .await
        .expect("sequential fetches never pass the barrier");
        assert!(enroll.is_ok());
    }

    // == Enroll ==
    #[tokio::test]
    async fn test_enroll_records_first_transition() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        let source = FixturePlayerSource::new(vec![summary(&id, 3)], vec![ban(&id, true)]);
        let orch = orchestrator(&source, store.clone());

        let suspect = orch
            .enroll(&id, Some("spinbot".to_string()), Category::HighRisk, KEY)
            .await
            .unwrap();

        assert_eq!(suspect.status, Status::Away);
        assert!(suspect.vac_banned);
        assert_eq!(suspect.nickname.as_deref(), Some("spinbot"));
        assert_eq!(suspect.profile_url, Some(id.profile_url()));
        assert!(suspect.last_checked_at.is_some());

        let history = store.history(suspect.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, None);
        assert_eq!(history[0].new_status, Status::Away);
    }

    #[tokio::test]
    async fn test_enroll_duplicate_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(1);
        enrolled(&*store, &id).await;
        let source = FixturePlayerSource::new(vec![summary(&id, 1)], vec![]);
        let orch = orchestrator(&source, store);

        let err = orch.enroll(&id, None, Category::default(), KEY).await.unwrap_err();
        assert!(matches!(err, MonitorError::Conflict(_)));
        assert_eq!(source.summary_calls(), 0);
    }

    #[tokio::test]
    async fn test_enroll_unknown_profile() {
        let store = Arc::new(MemoryStore::new());
        let source = FixturePlayerSource::default();
        let orch = orchestrator(&source, store.clone());

        let err = orch
            .enroll(&steam_id(1), None, Category::default(), KEY)
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
        assert!(store.get_all(&SuspectFilter::default()).await.unwrap().is_empty());
    }

    // == Import ==
    fn entry(steam_id: &str) -> ImportEntry {
        ImportEntry {
            steam_id: steam_id.to_string(),
            nickname: Some(" imported ".to_string()),
            category: Category::HighRisk,
        }
    }

    #[tokio::test]
    async fn test_import_counts_imported_skipped_and_errors() {
        let store = Arc::new(MemoryStore::new());
        let existing = steam_id(1);
        enrolled(&*store, &existing).await;
        let source = FixturePlayerSource::default();
        let orch = orchestrator(&source, store.clone());

        let fresh = steam_id(2);
        let entries = vec![
            entry(existing.as_str()),
            entry(fresh.as_str()),
            entry(fresh.as_str()),
            entry("not-an-id"),
        ];
        let result = orch.import(&entries).await.unwrap();

        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("not-an-id"));
        assert_eq!(source.summary_calls(), 0);

        let imported = store.get_by_steam_id(&fresh).await.unwrap().unwrap();
        assert_eq!(imported.status, Status::Unknown);
        assert_eq!(imported.nickname.as_deref(), Some("imported"));
        assert_eq!(imported.category, Category::HighRisk);
        assert_eq!(imported.profile_url, Some(fresh.profile_url()));
        assert!(imported.last_checked_at.is_none());
    }

    #[tokio::test]
    async fn test_imported_suspect_gets_first_transition_on_refresh() {
        let store = Arc::new(MemoryStore::new());
        let id = steam_id(3);
        let source = FixturePlayerSource::new(vec![summary(&id, 0)], vec![]);
        let orch = orchestrator(&source, store.clone());

        orch.import(&[entry(id.as_str())]).await.unwrap();
        orch.refresh_all(KEY).await.unwrap();

        let suspect = store.get_by_steam_id(&id).await.unwrap().unwrap();
        assert_eq!(suspect.status, Status::Offline);
        let history = store.history(suspect.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, None);
    }
}
