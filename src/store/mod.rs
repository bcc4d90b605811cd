//! Store Module
//!
//! Backend-agnostic persistence port for suspects and their status history,
//! plus the adapters selected at startup.
//!
//! # Transactions
//! [`SuspectStore::begin`] opens a [`StoreTransaction`]. Writes made through
//! it become visible only on [`StoreTransaction::commit`]; dropping the
//! transaction without committing discards every staged write.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, StoreBackend};
use crate::models::{
    NewSuspect, NewTransition, ProfileChanges, SteamId, Suspect, SuspectChanges, SuspectFilter,
    TransitionEvent,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// == Store Error ==
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Suspect not found: {0}")]
    NotFound(i64),

    #[error("Suspect already enrolled: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back into the domain model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Port for suspect persistence.
#[async_trait]
pub trait SuspectStore: Send + Sync {
    /// Suspects matching `filter`, newest first.
    async fn get_all(&self, filter: &SuspectFilter) -> StoreResult<Vec<Suspect>>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Suspect>>;

    async fn get_by_steam_id(&self, steam_id: &SteamId) -> StoreResult<Option<Suspect>>;

    /// Inserts a suspect; a duplicate Steam ID is a [`StoreError::Conflict`].
    async fn insert(&self, suspect: NewSuspect) -> StoreResult<Suspect>;

    /// Writes the synchronized fields; a missing row is [`StoreError::NotFound`].
    async fn update_fields(&self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect>;

    /// Writes the operator-owned fields; a missing row is [`StoreError::NotFound`].
    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<Suspect>;

    async fn insert_history(&self, event: NewTransition) -> StoreResult<TransitionEvent>;

    /// History of one suspect, newest first.
    async fn history(&self, suspect_id: i64) -> StoreResult<Vec<TransitionEvent>>;

    /// Deletes a suspect and its history. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Opens a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// Writes staged until commit. Dropping without commit rolls back.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert(&mut self, suspect: NewSuspect) -> StoreResult<Suspect>;

    async fn update_fields(&mut self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect>;

    async fn insert_history(&mut self, event: NewTransition) -> StoreResult<TransitionEvent>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Builds the store adapter named by the configuration.
pub async fn connect(config: &Config) -> StoreResult<Arc<dyn SuspectStore>> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::connect(&config.database_url).await?)),
    }
}
