// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Clans and stories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A clan competing in the arena.
///
/// Stored at: `clans/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emblem_url: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    /// Sum of XP earned by members while in the clan
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default)]
    pub created_at: String,
}

impl Clan {
    /// Add a member. Returns `false` if already a member.
    pub fn add_member(&mut self, uid: &str) -> bool {
        if self.member_ids.iter().any(|m| m == uid) {
            return false;
        }
        self.member_ids.push(uid.to_string());
        true
    }

    /// Remove a member. Returns `false` if not a member.
    pub fn remove_member(&mut self, uid: &str) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|m| m != uid);
        self.member_ids.len() != before
    }
}

/// Ephemeral promotional content shown at the top of the home screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub published_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl Story {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.published_at <= now && now < self.expires_at
    }
}
