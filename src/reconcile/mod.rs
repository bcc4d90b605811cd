//! Reconciliation Module
//!
//! Pure merge of a fresh Steam snapshot into a stored suspect. Decides the
//! new status and whether a transition must be appended to history.
//!
//! # Transition rules
//! - A suspect that was never checked always yields an event with no old status.
//! - Afterwards an event is produced only when the status actually changes;
//!   self-transitions are never recorded.

mod status;


use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{NewTransition, PlayerBans, PlayerSummary, Suspect, SuspectChanges};

pub use status::{derive_status, derive_status_from_codes, status_from_persona_state};

// == Reconcile Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("invalid game id {value:?} reported for {steam_id}")]
    InvalidGameId { steam_id: String, value: String },
}

// == Reconciled ==
/// Outcome of merging one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Fields to write back to the store
    pub changes: SuspectChanges,
    /// The suspect with `changes` applied
    pub updated: Suspect,
    /// History row to append, if the status transitioned
    pub event: Option<NewTransition>,
}

/// Merges `summary` and `ban` into `suspect` as of `now`.
///
/// Missing summaries mean "no data this cycle": the status becomes
/// `Unknown` and the live session fields are cleared. Missing ban records
/// read as "not banned".
pub fn reconcile(
    suspect: &Suspect,
    summary: Option<&PlayerSummary>,
    ban: Option<&PlayerBans>,
    now: DateTime<Utc>,
) -> Result<Reconciled, ReconcileError> {
    let status = derive_status(summary);
    let current_game_id = parse_game_id(suspect, summary)?;

    let changes = SuspectChanges {
        status,
        display_name: summary
            .and_then(|s| non_empty(s.persona_name.as_deref()))
            .or_else(|| suspect.display_name.clone()),
        profile_url: summary
            .and_then(|s| non_empty(s.profile_url.as_deref()))
            .or_else(|| suspect.profile_url.clone()),
        avatar_url: summary
            .and_then(|s| non_empty(s.avatar_url.as_deref()))
            .or_else(|| suspect.avatar_url.clone()),
        vac_banned: ban.map(|b| b.vac_banned).unwrap_or(false),
        game_ban_count: ban.map(|b| b.game_ban_count).unwrap_or(0),
        current_game_id,
        game_server_address: summary.and_then(|s| non_empty(s.game_server_ip.as_deref())),
        last_seen_offline_at: summary
            .and_then(|s| s.last_logoff)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or(suspect.last_seen_offline_at),
        last_checked_at: now,
        updated_at: now,
    };

    let mut updated = suspect.clone();
    updated.apply(&changes);

    let old_status = match suspect.last_checked_at {
        None => Some(None),
        Some(_) if suspect.status != status => Some(Some(suspect.status)),
        Some(_) => None,
    };
    let event = old_status.map(|old_status| NewTransition {
        suspect_id: suspect.id,
        old_status,
        new_status: status,
        nickname: updated.label(),
        created_at: now,
    });

    Ok(Reconciled {
        changes,
        updated,
        event,
    })
}

fn parse_game_id(
    suspect: &Suspect,
    summary: Option<&PlayerSummary>,
) -> Result<Option<u64>, ReconcileError> {
    let Some(raw) = summary.and_then(|s| non_empty(s.game_id.as_deref())) else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| ReconcileError::InvalidGameId {
            steam_id: suspect.steam_id.to_string(),
            value: raw,
        })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
