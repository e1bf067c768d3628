// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Subscription tier of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn is_premium(self) -> bool {
        matches!(self, SubscriptionTier::Premium)
    }
}

/// User profile stored in Firestore.
///
/// Stored at: `users/{uid}`
///
/// Progress counters are only written by the session completion
/// transaction, which also keeps `level` in sync with `total_xp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identity-provider UID (also used as document ID)
    pub uid: String,
    /// Name shown in the arena and clans
    pub display_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub subscription: SubscriptionTier,

    // ─── Progression ─────────────────────────────────────────────
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Day of the last completed workout ("YYYY-MM-DD")
    #[serde(default)]
    pub last_workout_date: Option<String>,

    // ─── Lifetime Totals ─────────────────────────────────────────
    #[serde(default)]
    pub total_workouts: u32,
    #[serde(default)]
    pub total_calories: u64,
    #[serde(default)]
    pub total_minutes: u64,

    /// Body weight used for calorie estimates
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Earned badge IDs in award order
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub clan_id: Option<String>,

    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn first_level() -> u32 {
    1
}

impl User {
    /// A fresh profile as created at sign-up.
    pub fn new(uid: &str, display_name: &str, now: &str) -> Self {
        Self {
            uid: uid.to_string(),
            display_name: display_name.to_string(),
            phone: None,
            email: None,
            avatar_url: None,
            subscription: SubscriptionTier::Free,
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_workout_date: None,
            total_workouts: 0,
            total_calories: 0,
            total_minutes: 0,
            weight_kg: None,
            badges: Vec::new(),
            clan_id: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b == badge_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counters_default_on_read() {
        let json = serde_json::json!({
            "uid": "u1",
            "display_name": "Hero",
            "created_at": "2026-01-01T00:00:00Z"
        });
        let user: User = serde_json::from_value(json).unwrap();

        assert_eq!(user.level, 1);
        assert_eq!(user.total_xp, 0);
        assert_eq!(user.subscription, SubscriptionTier::Free);
        assert!(user.badges.is_empty());
    }
}
