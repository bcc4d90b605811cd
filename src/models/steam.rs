//! Steam Web API snapshots
//!
//! Read-only DTOs for the `GetPlayerSummaries` and `GetPlayerBans` endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `communityvisibilitystate` value for a public profile.
pub const VISIBILITY_PUBLIC: i32 = 3;

fn default_visibility() -> i32 {
    VISIBILITY_PUBLIC
}

// == Player Summary ==
/// Public profile and presence data for one Steam ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    #[serde(rename = "steamid")]
    pub steam_id: String,
    #[serde(rename = "communityvisibilitystate", default = "default_visibility")]
    pub visibility: i32,
    #[serde(rename = "personastate", default)]
    pub persona_state: i32,
    #[serde(rename = "personaname", default)]
    pub persona_name: Option<String>,
    #[serde(rename = "profileurl", default)]
    pub profile_url: Option<String>,
    #[serde(rename = "avatarfull", default)]
    pub avatar_url: Option<String>,
    /// App id of the running game, as a decimal string.
    #[serde(rename = "gameid", default)]
    pub game_id: Option<String>,
    #[serde(rename = "gameserverip", default)]
    pub game_server_ip: Option<String>,
    /// Unix seconds.
    #[serde(rename = "lastlogoff", default)]
    pub last_logoff: Option<i64>,
}

// == Player Bans ==
/// Ban record for one Steam ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBans {
    #[serde(rename = "SteamId")]
    pub steam_id: String,
    #[serde(rename = "CommunityBanned", default)]
    pub community_banned: bool,
    #[serde(rename = "VACBanned", default)]
    pub vac_banned: bool,
    #[serde(rename = "NumberOfVACBans", default)]
    pub vac_ban_count: u32,
    #[serde(rename = "DaysSinceLastBan", default)]
    pub days_since_last_ban: u32,
    #[serde(rename = "NumberOfGameBans", default)]
    pub game_ban_count: u32,
    #[serde(rename = "EconomyBan", default)]
    pub economy_ban: Option<String>,
}

// == Response Envelopes ==
#[derive(Debug, Deserialize)]
pub struct SummariesEnvelope {
    pub response: SummariesBody,
}

#[derive(Debug, Deserialize)]
pub struct SummariesBody {
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
pub struct BansEnvelope {
    #[serde(default)]
    pub players: Vec<PlayerBans>,
}

// == Player Snapshot ==
/// Summaries and bans fetched together for one id set. This is what the
/// refresh cache stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub summaries: Vec<PlayerSummary>,
    pub bans: Vec<PlayerBans>,
}

impl PlayerSnapshot {
    pub fn new(summaries: Vec<PlayerSummary>, bans: Vec<PlayerBans>) -> Self {
        Self { summaries, bans }
    }

    /// Indexes summaries by Steam ID. Later duplicates win.
    pub fn summaries_by_id(&self) -> HashMap<&str, &PlayerSummary> {
        self.summaries
            .iter()
            .map(|s| (s.steam_id.as_str(), s))
            .collect()
    }

    /// Indexes ban records by Steam ID. Later duplicates win.
    pub fn bans_by_id(&self) -> HashMap<&str, &PlayerBans> {
        self.bans.iter().map(|b| (b.steam_id.as_str(), b)).collect()
    }
}
