//! SQLite store adapter.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::info;

use super::{StoreError, StoreResult, StoreTransaction, SuspectStore};
use crate::models::{
    Category, NewSuspect, NewTransition, ProfileChanges, SteamId, Status, Suspect, SuspectChanges,
    SuspectFilter, TransitionEvent,
};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS suspects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        steam_id TEXT NOT NULL UNIQUE,
        nickname TEXT,
        display_name TEXT,
        category TEXT NOT NULL,
        profile_url TEXT,
        avatar_url TEXT,
        status TEXT NOT NULL,
        vac_banned INTEGER NOT NULL DEFAULT 0,
        game_ban_count INTEGER NOT NULL DEFAULT 0,
        current_game_id INTEGER,
        game_server_address TEXT,
        last_seen_offline_at TEXT,
        last_checked_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS suspect_status_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        suspect_id INTEGER NOT NULL REFERENCES suspects(id) ON DELETE CASCADE,
        old_status TEXT,
        new_status TEXT NOT NULL,
        nickname TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_history_suspect
        ON suspect_status_history (suspect_id, created_at)
    "#,
];

const SUSPECT_COLUMNS: &str = "id, steam_id, nickname, display_name, category, profile_url, \
    avatar_url, status, vac_banned, game_ban_count, current_game_id, game_server_address, \
    last_seen_offline_at, last_checked_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SuspectRow {
    id: i64,
    steam_id: String,
    nickname: Option<String>,
    display_name: Option<String>,
    category: String,
    profile_url: Option<String>,
    avatar_url: Option<String>,
    status: String,
    vac_banned: bool,
    game_ban_count: i64,
    current_game_id: Option<i64>,
    game_server_address: Option<String>,
    last_seen_offline_at: Option<DateTime<Utc>>,
    last_checked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SuspectRow> for Suspect {
    type Error = StoreError;

    fn try_from(row: SuspectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            steam_id: SteamId::parse(&row.steam_id)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            nickname: row.nickname,
            display_name: row.display_name,
            category: Category::from_str(&row.category).map_err(StoreError::Corrupt)?,
            profile_url: row.profile_url,
            avatar_url: row.avatar_url,
            status: Status::from_str(&row.status).map_err(StoreError::Corrupt)?,
            vac_banned: row.vac_banned,
            game_ban_count: u32::try_from(row.game_ban_count)
                .map_err(|_| StoreError::Corrupt(format!("game_ban_count {}", row.game_ban_count)))?,
            current_game_id: row.current_game_id.map(game_id_from_column),
            game_server_address: row.game_server_address,
            last_seen_offline_at: row.last_seen_offline_at,
            last_checked_at: row.last_checked_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    suspect_id: i64,
    old_status: Option<String>,
    new_status: String,
    nickname: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for TransitionEvent {
    type Error = StoreError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            suspect_id: row.suspect_id,
            old_status: row
                .old_status
                .as_deref()
                .map(Status::from_str)
                .transpose()
                .map_err(StoreError::Corrupt)?,
            new_status: Status::from_str(&row.new_status).map_err(StoreError::Corrupt)?,
            nickname: row.nickname,
            created_at: row.created_at,
        })
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

// Game ids span the full u64 range; the column holds their bit pattern.
fn game_id_to_column(id: u64) -> i64 {
    i64::from_ne_bytes(id.to_ne_bytes())
}

fn game_id_from_column(value: i64) -> u64 {
    u64::from_ne_bytes(value.to_ne_bytes())
}

// == Row Operations ==
async fn insert_suspect(conn: &mut SqliteConnection, new: NewSuspect) -> StoreResult<Suspect> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO suspects (
            steam_id, nickname, display_name, category, profile_url, avatar_url,
            status, vac_banned, game_ban_count, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, ?8, ?8)
        RETURNING id
        "#,
    )
    .bind(new.steam_id.as_str())
    .bind(&new.nickname)
    .bind(&new.display_name)
    .bind(new.category.as_str())
    .bind(&new.profile_url)
    .bind(&new.avatar_url)
    .bind(Status::Unknown.as_str())
    .bind(new.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| match map_sqlx_error(err) {
        StoreError::Conflict(_) => StoreError::Conflict(new.steam_id.to_string()),
        other => other,
    })?;

    Ok(Suspect::from_new(id, new))
}

async fn update_suspect(
    conn: &mut SqliteConnection,
    id: i64,
    changes: SuspectChanges,
) -> StoreResult<Suspect> {
    let sql = format!(
        r#"
        UPDATE suspects SET
            status = ?1, display_name = ?2, profile_url = ?3, avatar_url = ?4,
            vac_banned = ?5, game_ban_count = ?6, current_game_id = ?7,
            game_server_address = ?8, last_seen_offline_at = ?9,
            last_checked_at = ?10, updated_at = ?11
        WHERE id = ?12
        RETURNING {SUSPECT_COLUMNS}
        "#
    );
    let current_game_id = changes.current_game_id.map(game_id_to_column);

    let row: Option<SuspectRow> = sqlx::query_as(&sql)
        .bind(changes.status.as_str())
        .bind(&changes.display_name)
        .bind(&changes.profile_url)
        .bind(&changes.avatar_url)
        .bind(changes.vac_banned)
        .bind(i64::from(changes.game_ban_count))
        .bind(current_game_id)
        .bind(&changes.game_server_address)
        .bind(changes.last_seen_offline_at)
        .bind(changes.last_checked_at)
        .bind(changes.updated_at)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    row.ok_or(StoreError::NotFound(id))?.try_into()
}

async fn insert_transition(
    conn: &mut SqliteConnection,
    event: NewTransition,
) -> StoreResult<TransitionEvent> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO suspect_status_history (suspect_id, old_status, new_status, nickname, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(event.suspect_id)
    .bind(event.old_status.map(|s| s.as_str()))
    .bind(event.new_status.as_str())
    .bind(&event.nickname)
    .bind(event.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            StoreError::NotFound(event.suspect_id)
        }
        other => map_sqlx_error(other),
    })?;

    Ok(TransitionEvent::from_new(id, event))
}

// == SQLite Store ==
/// Store backed by an SQLite database file (or `sqlite::memory:`).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database at `url`, creating the file and schema if needed.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is a separate database.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        info!("SQLite store ready at {}", url);
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn conn(&self) -> StoreResult<sqlx::pool::PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl SuspectStore for SqliteStore {
    async fn get_all(&self, filter: &SuspectFilter) -> StoreResult<Vec<Suspect>> {
        let sql = format!("SELECT {SUSPECT_COLUMNS} FROM suspects ORDER BY created_at DESC, id DESC");
        let rows: Vec<SuspectRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut suspects = Vec::with_capacity(rows.len());
        for row in rows {
            let suspect = Suspect::try_from(row)?;
            if filter.matches(&suspect) {
                suspects.push(suspect);
            }
        }
        Ok(suspects)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Suspect>> {
        let sql = format!("SELECT {SUSPECT_COLUMNS} FROM suspects WHERE id = ?1");
        let row: Option<SuspectRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Suspect::try_from).transpose()
    }

    async fn get_by_steam_id(&self, steam_id: &SteamId) -> StoreResult<Option<Suspect>> {
        let sql = format!("SELECT {SUSPECT_COLUMNS} FROM suspects WHERE steam_id = ?1");
        let row: Option<SuspectRow> = sqlx::query_as(&sql)
            .bind(steam_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Suspect::try_from).transpose()
    }

    async fn insert(&self, suspect: NewSuspect) -> StoreResult<Suspect> {
        let mut conn = self.conn().await?;
        insert_suspect(&mut conn, suspect).await
    }

    async fn update_fields(&self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect> {
        let mut conn = self.conn().await?;
        update_suspect(&mut conn, id, changes).await
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<Suspect> {
        let sql = format!(
            r#"
            UPDATE suspects SET
                nickname = CASE WHEN ?1 THEN ?2 ELSE nickname END,
                category = COALESCE(?3, category),
                updated_at = ?4
            WHERE id = ?5
            RETURNING {SUSPECT_COLUMNS}
            "#
        );
        let row: Option<SuspectRow> = sqlx::query_as(&sql)
            .bind(changes.nickname.is_some())
            .bind(changes.nickname.flatten())
            .bind(changes.category.map(|c| c.as_str()))
            .bind(changes.updated_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.ok_or(StoreError::NotFound(id))?.try_into()
    }

    async fn insert_history(&self, event: NewTransition) -> StoreResult<TransitionEvent> {
        let mut conn = self.conn().await?;
        insert_transition(&mut conn, event).await
    }

    async fn history(&self, suspect_id: i64) -> StoreResult<Vec<TransitionEvent>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, suspect_id, old_status, new_status, nickname, created_at
            FROM suspect_status_history
            WHERE suspect_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(suspect_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TransitionEvent::try_from).collect()
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM suspect_status_history WHERE suspect_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let deleted = sqlx::query("DELETE FROM suspects WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(deleted > 0)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}

// == SQLite Transaction ==
struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn insert(&mut self, suspect: NewSuspect) -> StoreResult<Suspect> {
        insert_suspect(&mut self.tx, suspect).await
    }

    async fn update_fields(&mut self, id: i64, changes: SuspectChanges) -> StoreResult<Suspect> {
        update_suspect(&mut self.tx, id, changes).await
    }

    async fn insert_history(&mut self, event: NewTransition) -> StoreResult<TransitionEvent> {
        insert_transition(&mut self.tx, event).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
