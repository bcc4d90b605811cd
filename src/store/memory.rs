//! In-memory store adapter.
//!
//! A transaction holds the write lock for its whole lifetime and stages its
//! writes on a copy of the state, so readers see either all of a batch or
//! none of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::{StoreError, StoreResult, StoreTransaction, SuspectStore};
use crate::models::{
    NewSuspect, NewTransition, ProfileChanges, SteamId, Suspect, SuspectChanges, SuspectFilter,
    TransitionEvent,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    suspects: BTreeMap<i64, Suspect>,
    history: Vec<TransitionEvent>,
    last_suspect_id: i64,
    last_event_id: i64,
}

impl MemoryState {
    fn insert(&mut self, new: NewSuspect) -> StoreResult<Suspect> {
        if self.suspects.values().any(|s| s.steam_id == new.steam_id) {
            return Err(StoreError::Conflict(new.steam_id.to_string()));
        }
        self.last_suspect_id += 1;
        let suspect = Suspect::from_new(self.last_suspect_id, new);
        self.suspects.insert(suspect.id, suspect.clone());
        Ok(suspect)
    }

    fn update_fields(&mut self, id: i64, changes: &SuspectChanges) -> StoreResult<Suspect> {
        let suspect = self.suspects.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        suspect.apply(changes);
        Ok(suspect.clone())
    }

    fn insert_history(&mut self, event: NewTransition) -> StoreResult<TransitionEvent> {
        if !self.suspects.contains_key(&event.suspect_id) {
            return Err(StoreError::NotFound(event.suspect_id));
        }
        self.last_event_id += 1;
        let event = TransitionEvent::from_new(self.last_event_id, event);
        self.history.push(event.clone());
        Ok(event)
    }
}

// == Memory Store ==
/// Process-local store. Data is lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuspectStore for MemoryStore {
    async fn get_all(&self, filter: &SuspectFilter) -> StoreResult<Vec<Suspect>> {
        let state = self.state.read().await;
        let mut suspects: Vec<Suspect> = state
            .suspects
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        suspects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(suspects)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Suspect>> {
        Ok(self.state.read().await.suspects.get(&id).cloned())
    }

    async fn get_by_steam_id(&self, steam_id: &SteamId) -> StoreResult<Option<Suspect>> {
        let state = self.state.read().await;
        Ok(state
            .suspects
            .values()
            .find(|s| &s.steam_id == steam_id)
            .cloned())
    }

    async fn insert(&self, suspect: NewSuspect) -> StoreResult<Suspect> {
        self.state.write().await.insert(suspect)
    }

    async fn update_fields(&self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect> {
        self.state.write().await.update_fields(id, &changes)
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<Suspect> {
        let mut state = self.state.write().await;
        let suspect = state.suspects.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        suspect.apply_profile(&changes);
        Ok(suspect.clone())
    }

    async fn insert_history(&self, event: NewTransition) -> StoreResult<TransitionEvent> {
        self.state.write().await.insert_history(event)
    }

    async fn history(&self, suspect_id: i64) -> StoreResult<Vec<TransitionEvent>> {
        let state = self.state.read().await;
        let mut events: Vec<TransitionEvent> = state
            .history
            .iter()
            .filter(|e| e.suspect_id == suspect_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.suspects.remove(&id).is_none() {
            return Ok(false);
        }
        state.history.retain(|e| e.suspect_id != id);
        Ok(true)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }
}

// == Memory Transaction ==
struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert(&mut self, suspect: NewSuspect) -> StoreResult<Suspect> {
        self.staged.insert(suspect)
    }

    async fn update_fields(&mut self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect> {
        self.staged.update_fields(id, &changes)
    }

    async fn insert_history(&mut self, event: NewTransition) -> StoreResult<TransitionEvent> {
        self.staged.insert_history(event)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
