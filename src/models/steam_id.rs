//! Steam ID Module
//!
//! Validated 64-bit Steam identifiers in their 17-digit decimal form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal digits in a 64-bit Steam ID.
pub const STEAM_ID_LENGTH: usize = 17;

const PROFILE_PATH_MARKER: &str = "steamcommunity.com/profiles/";
const VANITY_PATH_MARKER: &str = "steamcommunity.com/id/";

// == Invalid Steam ID ==
/// Raised when user input cannot be turned into a Steam ID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSteamId {
    #[error("Steam ID must be exactly {STEAM_ID_LENGTH} digits: {0}")]
    Malformed(String),

    #[error("Vanity profile URLs cannot be resolved: {0}")]
    VanityUrl(String),
}

// == Steam ID ==
/// A 17-digit Steam ID. Construction always validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SteamId(String);

impl SteamId {
    /// Parses a bare 17-digit ID (surrounding whitespace is ignored).
    pub fn parse(input: &str) -> Result<Self, InvalidSteamId> {
        let trimmed = input.trim();
        if is_valid_steam_id(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidSteamId::Malformed(trimmed.to_string()))
        }
    }

    /// Accepts either a bare ID or a `steamcommunity.com/profiles/<id>` URL.
    ///
    /// Vanity URLs (`/id/<name>`) are rejected with [`InvalidSteamId::VanityUrl`].
    pub fn from_input(input: &str) -> Result<Self, InvalidSteamId> {
        let trimmed = input.trim();
        if let Some(pos) = trimmed.find(PROFILE_PATH_MARKER) {
            let rest = &trimmed[pos + PROFILE_PATH_MARKER.len()..];
            let candidate = rest.split(['/', '?', '#']).next().unwrap_or_default();
            return Self::parse(candidate);
        }
        if trimmed.contains(VANITY_PATH_MARKER) {
            return Err(InvalidSteamId::VanityUrl(trimmed.to_string()));
        }
        Self::parse(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public community profile URL for this ID.
    pub fn profile_url(&self) -> String {
        format!("https://steamcommunity.com/profiles/{}", self.0)
    }
}

fn is_valid_steam_id(candidate: &str) -> bool {
    candidate.len() == STEAM_ID_LENGTH && candidate.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SteamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SteamId {
    type Err = InvalidSteamId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SteamId {
    type Error = InvalidSteamId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SteamId> for String {
    fn from(id: SteamId) -> Self {
        id.0
    }
}
