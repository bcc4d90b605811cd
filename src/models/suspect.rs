//! Suspect Module
//!
//! The monitored identity, its status vocabulary and its transition history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SteamId;

/// Steam app id of Counter-Strike 2.
pub const CS2_APP_ID: u64 = 730;

// == Status ==
/// Presence status of a suspect. Closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Unknown,
    Offline,
    Online,
    Busy,
    Away,
    Snooze,
    LookingToTrade,
    LookingToPlay,
    Private,
}

impl Status {
    pub const ALL: [Status; 9] = [
        Status::Unknown,
        Status::Offline,
        Status::Online,
        Status::Busy,
        Status::Away,
        Status::Snooze,
        Status::LookingToTrade,
        Status::LookingToPlay,
        Status::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Offline => "offline",
            Status::Online => "online",
            Status::Busy => "busy",
            Status::Away => "away",
            Status::Snooze => "snooze",
            Status::LookingToTrade => "looking_to_trade",
            Status::LookingToPlay => "looking_to_play",
            Status::Private => "private",
        }
    }

    /// True for every presence state in which the player is signed in.
    pub fn is_online(&self) -> bool {
        !matches!(self, Status::Unknown | Status::Offline | Status::Private)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

// == Category ==
/// Operator-assigned suspicion level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Confirmed,
    HighRisk,
    Suspected,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Confirmed => "confirmed",
            Category::HighRisk => "high_risk",
            Category::Suspected => "suspected",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Category::Confirmed),
            "high_risk" => Ok(Category::HighRisk),
            "suspected" => Ok(Category::Suspected),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

// == Suspect ==
/// A monitored Steam identity as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspect {
    pub id: i64,
    pub steam_id: SteamId,
    /// Operator-assigned nickname
    pub nickname: Option<String>,
    /// Steam persona name as last seen
    pub display_name: Option<String>,
    pub category: Category,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
    pub status: Status,
    pub vac_banned: bool,
    pub game_ban_count: u32,
    pub current_game_id: Option<u64>,
    pub game_server_address: Option<String>,
    pub last_seen_offline_at: Option<DateTime<Utc>>,
    /// `None` until the first reconciliation.
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Suspect {
    /// Builds the row a store hands back for a fresh insert.
    pub fn from_new(id: i64, new: NewSuspect) -> Self {
        Self {
            id,
            steam_id: new.steam_id,
            nickname: new.nickname,
            display_name: new.display_name,
            category: new.category,
            profile_url: new.profile_url,
            avatar_url: new.avatar_url,
            status: Status::Unknown,
            vac_banned: false,
            game_ban_count: 0,
            current_game_id: None,
            game_server_address: None,
            last_seen_offline_at: None,
            last_checked_at: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    /// Applies the synchronized fields in place.
    pub fn apply(&mut self, changes: &SuspectChanges) {
        self.status = changes.status;
        self.display_name = changes.display_name.clone();
        self.profile_url = changes.profile_url.clone();
        self.avatar_url = changes.avatar_url.clone();
        self.vac_banned = changes.vac_banned;
        self.game_ban_count = changes.game_ban_count;
        self.current_game_id = changes.current_game_id;
        self.game_server_address = changes.game_server_address.clone();
        self.last_seen_offline_at = changes.last_seen_offline_at;
        self.last_checked_at = Some(changes.last_checked_at);
        self.updated_at = changes.updated_at;
    }

    /// Applies operator edits in place.
    pub fn apply_profile(&mut self, changes: &ProfileChanges) {
        if let Some(nickname) = &changes.nickname {
            self.nickname = nickname.clone();
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        self.updated_at = changes.updated_at;
    }

    /// Nickname snapshot used for history rows.
    pub fn label(&self) -> Option<String> {
        self.display_name.clone().or_else(|| self.nickname.clone())
    }
}

// == New Suspect ==
/// Fields supplied when enrolling a suspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSuspect {
    pub steam_id: SteamId,
    pub nickname: Option<String>,
    pub display_name: Option<String>,
    pub category: Category,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// == Suspect Changes ==
/// The externally synchronized subset of a suspect's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspectChanges {
    pub status: Status,
    pub display_name: Option<String>,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
    pub vac_banned: bool,
    pub game_ban_count: u32,
    pub current_game_id: Option<u64>,
    pub game_server_address: Option<String>,
    pub last_seen_offline_at: Option<DateTime<Utc>>,
    pub last_checked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// == Profile Changes ==
/// Operator-owned fields. `None` leaves a field as it is; a nickname of
/// `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub nickname: Option<Option<String>>,
    pub category: Option<Category>,
    pub updated_at: DateTime<Utc>,
}

// == Transition Events ==
/// A status transition about to be appended to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransition {
    pub suspect_id: i64,
    pub old_status: Option<Status>,
    pub new_status: Status,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted status transition. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub id: i64,
    pub suspect_id: i64,
    pub old_status: Option<Status>,
    pub new_status: Status,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn from_new(id: i64, new: NewTransition) -> Self {
        Self {
            id,
            suspect_id: new.suspect_id,
            old_status: new.old_status,
            new_status: new.new_status,
            nickname: new.nickname,
            created_at: new.created_at,
        }
    }
}

// == Suspect Filter ==
/// Listing filter. Set flags combine with AND; no flags means "everything".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SuspectFilter {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub cs2_launched: bool,
    #[serde(default)]
    pub in_game: bool,
}

impl SuspectFilter {
    pub fn is_empty(&self) -> bool {
        !(self.online || self.cs2_launched || self.in_game)
    }

    pub fn matches(&self, suspect: &Suspect) -> bool {
        let in_cs2 = suspect.current_game_id == Some(CS2_APP_ID);
        let has_server = suspect
            .game_server_address
            .as_deref()
            .is_some_and(|addr| !addr.is_empty());

        (!self.online || suspect.status.is_online())
            && (!self.cs2_launched || in_cs2)
            && (!self.in_game || (in_cs2 && has_server))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Suspect {
        Suspect::from_new(
            1,
            NewSuspect {
                steam_id: SteamId::parse("76561198358372020").unwrap(),
                nickname: Some("nick".to_string()),
                display_name: None,
                category: Category::default(),
                profile_url: None,
                avatar_url: None,
                created_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("looking to play".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&Status::LookingToTrade).unwrap();
        assert_eq!(json, "\"looking_to_trade\"");
    }

    #[test]
    fn test_apply_profile_leaves_absent_fields() {
        let mut suspect = sample();
        let later = suspect.created_at + chrono::Duration::minutes(5);

        suspect.apply_profile(&ProfileChanges {
            nickname: None,
            category: Some(Category::HighRisk),
            updated_at: later,
        });
        assert_eq!(suspect.nickname.as_deref(), Some("nick"));
        assert_eq!(suspect.category, Category::HighRisk);
        assert_eq!(suspect.updated_at, later);

        suspect.apply_profile(&ProfileChanges {
            nickname: Some(None),
            category: None,
            updated_at: later,
        });
        assert!(suspect.nickname.is_none());
        assert_eq!(suspect.category, Category::HighRisk);
    }

    #[test]
    fn test_status_is_online() {
        assert!(Status::Online.is_online());
        assert!(Status::Snooze.is_online());
        assert!(!Status::Offline.is_online());
        assert!(!Status::Private.is_online());
        assert!(!Status::Unknown.is_online());
    }

    #[test]
    fn test_new_suspect_starts_unchecked() {
        let suspect = sample();
        assert_eq!(suspect.status, Status::Unknown);
        assert!(suspect.last_checked_at.is_none());
        assert_eq!(suspect.label().as_deref(), Some("nick"));
    }

    #[test]
    fn test_filter_empty_matches_everything() {
        let filter = SuspectFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&sample()));
    }

    #[test]
    fn test_filter_in_game_requires_server() {
        let mut suspect = sample();
        suspect.status = Status::Online;
        suspect.current_game_id = Some(CS2_APP_ID);

        let in_game = SuspectFilter {
            in_game: true,
            ..Default::default()
        };
        let launched = SuspectFilter {
            cs2_launched: true,
            ..Default::default()
        };
        assert!(launched.matches(&suspect));
        assert!(!in_game.matches(&suspect));

        suspect.game_server_address = Some("1.2.3.4:27015".to_string());
        assert!(in_game.matches(&suspect));
    }

    #[test]
    fn test_filter_online() {
        let mut suspect = sample();
        let online = SuspectFilter {
            online: true,
            ..Default::default()
        };
        suspect.status = Status::Private;
        assert!(!online.matches(&suspect));
        suspect.status = Status::Away;
        assert!(online.matches(&suspect));
    }
}
