// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session lifecycle.
//!
//! A session is started for a workout, collects completed exercises while
//! `in_progress`, and then ends exactly once: either `completed` (rewards
//! are applied atomically) or `aborted` (no rewards).

use crate::db::{CompletionResult, FirestoreDb, SessionQueryCursor};
use crate::error::{AppError, Result};
use crate::models::{Session, SessionStatus, User, Workout};
use crate::retry::{with_backoff, Backoff};
use crate::services::gamification::Progression;
use crate::services::CatalogService;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// UTC offsets accepted for deciding the user's calendar day.
pub const MIN_UTC_OFFSET_MINUTES: i32 = -12 * 60;
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Session ID: owner, start time and a per-process sequence number.
fn new_session_id(user_id: &str, now: DateTime<Utc>) -> String {
    let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", user_id, now.timestamp_micros(), seq)
}

/// The user's calendar day at `now`, given their UTC offset.
pub fn local_day(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
}

/// What completing a session returned to the client.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub session: Session,
    /// `None` when the session had already been completed earlier.
    pub progression: Option<Progression>,
    /// Updated user, when this call applied the rewards.
    pub user: Option<User>,
}

/// Session operations on top of the database and catalog.
#[derive(Clone)]
pub struct SessionService {
    db: FirestoreDb,
    catalog: CatalogService,
    backoff: Backoff,
}

impl SessionService {
    pub fn new(db: FirestoreDb, catalog: CatalogService) -> Self {
        Self {
            db,
            catalog,
            backoff: Backoff::default(),
        }
    }

    /// Load a session owned by `user`. Other users' sessions are reported
    /// as not found.
    pub async fn get(&self, user: &User, session_id: &str) -> Result<Session> {
        match self.db.get_session(session_id).await? {
            Some(session) if session.user_id == user.uid => Ok(session),
            _ => Err(AppError::NotFound(format!("Session {}", session_id))),
        }
    }

    async fn workout(&self, workout_id: &str) -> Result<Workout> {
        self.catalog
            .workout(workout_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workout {}", workout_id)))
    }

    /// Start a new session for a workout.
    pub async fn start(&self, user: &User, workout_id: &str, now: DateTime<Utc>) -> Result<Session> {
        let settings = self.catalog.settings().await?;
        if settings.maintenance_mode {
            return Err(AppError::Maintenance);
        }

        let workout = self.workout(workout_id).await?;
        if workout.is_premium && !user.subscription.is_premium() {
            return Err(AppError::PremiumRequired(format!("Workout {}", workout_id)));
        }

        let session = Session::start(new_session_id(&user.uid, now), &user.uid, workout_id, now);
        self.db.create_session(&session).await?;

        tracing::info!(
            user_id = %user.uid,
            session_id = %session.id,
            workout_id,
            "Session started"
        );
        Ok(session)
    }

    /// Record an exercise of the session's workout as done.
    ///
    /// The append is transactional, so concurrent marks are all kept and a
    /// mark never reopens a session that ended in the meantime.
    pub async fn mark_exercise(
        &self,
        user: &User,
        session_id: &str,
        exercise_id: &str,
    ) -> Result<Session> {
        let session = self.get(user, session_id).await?;
        ensure_in_progress(&session)?;

        let workout = self.workout(&session.workout_id).await?;
        if !workout.exercise_ids.iter().any(|e| e == exercise_id) {
            return Err(AppError::BadRequest(format!(
                "Exercise {} is not part of workout {}",
                exercise_id, workout.id
            )));
        }

        let (session, added) = with_backoff(self.backoff, "mark_exercise", || {
            self.db.mark_exercise_atomic(&user.uid, session_id, exercise_id)
        })
        .await?;

        if added {
            tracing::debug!(
                user_id = %user.uid,
                session_id,
                exercise_id,
                done = session.completed_exercises.len(),
                "Exercise marked"
            );
        }
        Ok(session)
    }

    /// Complete a session and apply its rewards in one transaction.
    ///
    /// Idempotent: a second call returns the stored session without a
    /// progression. Completing an aborted session is a conflict.
    pub async fn complete(
        &self,
        user: &User,
        session_id: &str,
        now: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<CompletionOutcome> {
        let session = self.get(user, session_id).await?;
        match session.status {
            SessionStatus::Completed => {
                return Ok(CompletionOutcome {
                    session,
                    progression: None,
                    user: None,
                })
            }
            SessionStatus::Aborted => {
                return Err(AppError::Conflict(format!(
                    "Session {} was aborted",
                    session_id
                )))
            }
            SessionStatus::InProgress => {}
        }

        let workout = self.workout(&session.workout_id).await?;
        let today = local_day(now, utc_offset_minutes);

        let result = with_backoff(self.backoff, "complete_session", || {
            self.db
                .complete_session_atomic(&user.uid, session_id, &workout, now, today)
        })
        .await?;

        Ok(match result {
            CompletionResult::Completed {
                session,
                user,
                progression,
            } => CompletionOutcome {
                session,
                progression: Some(progression),
                user: Some(user),
            },
            CompletionResult::AlreadyCompleted(session) => CompletionOutcome {
                session,
                progression: None,
                user: None,
            },
        })
    }

    /// Abandon a session without rewards.
    pub async fn abort(&self, user: &User, session_id: &str, now: DateTime<Utc>) -> Result<Session> {
        let session = with_backoff(self.backoff, "abort_session", || {
            self.db.abort_session_atomic(&user.uid, session_id, now)
        })
        .await?;

        tracing::info!(user_id = %user.uid, session_id, "Session aborted");
        Ok(session)
    }

    /// Session history, newest first.
    pub async fn history(
        &self,
        user: &User,
        cursor: Option<SessionQueryCursor>,
        limit: u32,
    ) -> Result<Vec<Session>> {
        self.db.get_sessions_for_user(&user.uid, cursor, limit).await
    }
}

fn ensure_in_progress(session: &Session) -> Result<()> {
    if session.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Session {} is already {}",
            session.id,
            session.status.as_str()
        )));
    }
    Ok(())
}
