//! Request DTOs for the monitor API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use chrono::{DateTime, Utc};

use crate::models::{Category, ProfileChanges};

/// Request body for enrolling a suspect (POST /suspects)
///
/// # Fields
/// - `steam_input`: A 17-digit Steam ID or a `steamcommunity.com/profiles/...` URL
/// - `nickname`: Optional operator-assigned nickname
/// - `category`: Suspicion level (defaults to `confirmed`)
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub steam_input: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub category: Category,
}

impl EnrollRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.steam_input.trim().is_empty() {
            return Some("steam_input cannot be empty".to_string());
        }
        None
    }

    /// Nickname with surrounding whitespace removed; blank becomes `None`.
    pub fn clean_nickname(&self) -> Option<String> {
        trimmed(self.nickname.as_deref())
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Request body for editing operator fields (PUT /suspects/:id)
///
/// Absent fields are left unchanged. A blank `nickname` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSuspectRequest {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl UpdateSuspectRequest {
    pub fn validate(&self) -> Option<String> {
        if self.nickname.is_none() && self.category.is_none() {
            return Some("nothing to update: expected nickname or category".to_string());
        }
        None
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> ProfileChanges {
        ProfileChanges {
            nickname: self.nickname.as_deref().map(|n| trimmed(Some(n))),
            category: self.category,
            updated_at: now,
        }
    }
}

/// One row of a bulk import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportEntry {
    pub steam_id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub category: Category,
}

impl ImportEntry {
    pub fn clean_nickname(&self) -> Option<String> {
        trimmed(self.nickname.as_deref())
    }
}

/// Request body for bulk enrollment (POST /suspects/import)
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub suspects: Vec<ImportEntry>,
}
