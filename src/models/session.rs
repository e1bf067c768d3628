// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle of a session. `InProgress` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Aborted,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Aborted => "aborted",
        }
    }
}

/// One user's attempt at a workout.
///
/// Stored at: `sessions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub workout_id: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    #[serde(with = "firestore::serialize_as_optional_timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    /// Exercise IDs in completion order, no duplicates
    #[serde(default)]
    pub completed_exercises: Vec<String>,
    #[serde(default)]
    pub xp_earned: u64,
    #[serde(default)]
    pub calories_burned: u32,
    #[serde(default)]
    pub duration_minutes: u32,
    /// Badges newly earned by completing this session
    #[serde(default)]
    pub badges_awarded: Vec<String>,
}

impl Session {
    /// A new in-progress session.
    pub fn start(id: String, user_id: &str, workout_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            workout_id: workout_id.to_string(),
            started_at: now,
            finished_at: None,
            status: SessionStatus::InProgress,
            completed_exercises: Vec::new(),
            xp_earned: 0,
            calories_burned: 0,
            duration_minutes: 0,
            badges_awarded: Vec::new(),
        }
    }

    /// Record a finished exercise. Returns `false` if it was already recorded.
    pub fn mark_exercise(&mut self, exercise_id: &str) -> bool {
        if self.completed_exercises.iter().any(|e| e == exercise_id) {
            return false;
        }
        self.completed_exercises.push(exercise_id.to_string());
        true
    }

    /// Move an in-progress session to `aborted`. Returns `false` and leaves
    /// the session untouched if it already ended.
    pub fn abort(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = SessionStatus::Aborted;
        self.finished_at = Some(now);
        true
    }

    /// Whole minutes between start and `finished_at`, rounded up, at least 1.
    pub fn elapsed_minutes(&self, finished_at: DateTime<Utc>) -> u32 {
        let secs = finished_at
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0);
        let minutes = (secs + 59) / 60;
        minutes.clamp(1, i64::from(MAX_SESSION_MINUTES)) as u32
    }
}

/// Sessions left open longer than this are credited at most this long.
pub const MAX_SESSION_MINUTES: u32 = 240;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_at(start: DateTime<Utc>) -> Session {
        Session::start("s1".to_string(), "u1", "w1", start)
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Aborted.is_terminal());
    }

    #[test]
    fn test_mark_exercise_is_idempotent() {
        let mut session = session_at(Utc::now());
        assert!(session.mark_exercise("squat"));
        assert!(session.mark_exercise("plank"));
        assert!(!session.mark_exercise("squat"));
        assert_eq!(session.completed_exercises, vec!["squat", "plank"]);
    }

    #[test]
    fn test_abort_only_from_in_progress() {
        let start = DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        let end = start + Duration::minutes(7);

        let mut session = session_at(start);
        assert!(session.abort(end));
        assert_eq!(session.status, SessionStatus::Aborted);
        assert_eq!(session.finished_at, Some(end));

        // Second abort keeps the first finish time
        assert!(!session.abort(end + Duration::minutes(1)));
        assert_eq!(session.finished_at, Some(end));

        let mut completed = session_at(start);
        completed.status = SessionStatus::Completed;
        completed.finished_at = Some(end);
        assert!(!completed.abort(end + Duration::minutes(1)));
        assert_eq!(completed.status, SessionStatus::Completed);
    }

    #[test]
    fn test_elapsed_minutes_rounding_and_bounds() {
        let start = DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        let session = session_at(start);

        assert_eq!(session.elapsed_minutes(start), 1);
        assert_eq!(session.elapsed_minutes(start + Duration::seconds(61)), 2);
        assert_eq!(session.elapsed_minutes(start + Duration::minutes(30)), 30);
        assert_eq!(
            session.elapsed_minutes(start + Duration::hours(12)),
            MAX_SESSION_MINUTES
        );
        // Clock skew: finish before start
        assert_eq!(session.elapsed_minutes(start - Duration::minutes(5)), 1);
    }
}
