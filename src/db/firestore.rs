// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and progression counters)
//! - Catalog content (workouts, programs, exercises; read-only)
//! - Sessions (workout attempts, with transactional completion)
//! - Clans, stories and feature toggles

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    AppSettings, Clan, Exercise, Program, Session, SessionStatus, Story, User, Workout,
};
use crate::services::gamification::{self, Progression};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, NaiveDate, Utc};
use firestore::errors::FirestoreError;
use firestore::paths;
use futures_util::{stream, StreamExt};
use serde::Deserialize;

const MAX_CONCURRENT_DB_OPS: usize = 50;
/// Upper bound for unfiltered catalog listings.
const MAX_CATALOG_DOCS: u32 = 500;
const MAX_STORIES: u32 = 50;

/// Position in a user's session history (exclusive upper bound).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionQueryCursor {
    pub started_at: DateTime<Utc>,
}

/// Outcome of [`FirestoreDb::complete_session_atomic`].
#[derive(Debug, Clone)]
pub enum CompletionResult {
    /// The session was completed by this call.
    Completed {
        session: Session,
        user: User,
        progression: Progression,
    },
    /// The session had already been completed; nothing was written.
    AlreadyCompleted(Session),
}

/// A client whose reads run inside `transaction`, so documents read while
/// computing the writes are checked for concurrent modification at commit.
fn transaction_reader(
    client: &firestore::FirestoreDb,
    transaction: &firestore::FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(firestore::FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}

/// Aborted transactions and unreachable backends; everything else
/// (offline mode, bad documents, invalid queries) is permanent.
fn is_transient(err: &FirestoreError) -> bool {
    match err {
        FirestoreError::DatabaseError(db) => db.retry_possible,
        FirestoreError::NetworkError(_) => true,
        _ => false,
    }
}

/// Error mapper for transactional steps: transient failures become
/// [`AppError::Contention`] so callers can retry the whole transaction.
fn transaction_error(context: &'static str) -> impl FnOnce(FirestoreError) -> AppError {
    move |e| {
        if is_transient(&e) {
            AppError::Contention(format!("{}: {}", context, e))
        } else {
            AppError::Database(format!("{}: {}", context, e))
        }
    }
}

/// Read a session inside a transaction. Sessions owned by someone else
/// are reported as missing.
async fn read_owned_session(
    tx_reader: &firestore::FirestoreDb,
    user_id: &str,
    session_id: &str,
) -> Result<Option<Session>, AppError> {
    let session: Option<Session> = tx_reader
        .fluent()
        .select()
        .by_id_in(collections::SESSIONS)
        .obj()
        .one(session_id)
        .await
        .map_err(transaction_error("Failed to read session in transaction"))?;
    Ok(session.filter(|s| s.user_id == user_id))
}

fn finished_conflict(session: &Session) -> AppError {
    AppError::Conflict(format!(
        "Session {} is already {}",
        session.id,
        session.status.as_str()
    ))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Read one document by ID.
    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read several documents by ID, keeping the order of `ids` and
    /// skipping IDs that do not exist.
    async fn get_docs_ordered<T>(&self, collection: &str, ids: &[String]) -> Result<Vec<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        stream::iter(ids.to_vec())
            .map(|id| async move { self.get_doc::<T>(collection, &id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<T>, AppError>>>()
            .await
            .into_iter()
            .filter_map(|r| r.transpose())
            .collect()
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by UID.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    /// Create or replace a user document.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create the user document unless it already exists.
    ///
    /// Returns the stored profile and whether it was created by this call.
    pub async fn create_user_if_absent(&self, user: &User) -> Result<(User, bool), AppError> {
        let inserted: Result<(), _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await;

        match inserted {
            Ok(()) => Ok((user.clone(), true)),
            Err(e) => {
                // Insert fails if another request created the profile first.
                let existing = self.get_user(&user.uid).await?;
                existing
                    .map(|u| (u, false))
                    .ok_or_else(|| AppError::Database(e.to_string()))
            }
        }
    }

    /// Write only the user-editable profile fields.
    ///
    /// Progression counters are left untouched so this cannot clobber a
    /// concurrent session completion.
    pub async fn update_user_profile(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(User::{display_name, avatar_url, weight_kg, updated_at}))
            .in_col(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Top users by total XP.
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("total_xp", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Catalog Operations ──────────────────────────────────────

    pub async fn list_workouts(&self) -> Result<Vec<Workout>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .order_by([("title", firestore::FirestoreQueryDirection::Ascending)])
            .limit(MAX_CATALOG_DOCS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_workout(&self, id: &str) -> Result<Option<Workout>, AppError> {
        self.get_doc(collections::WORKOUTS, id).await
    }

    /// Workouts in the given order (e.g. a program's schedule).
    pub async fn get_workouts(&self, ids: &[String]) -> Result<Vec<Workout>, AppError> {
        self.get_docs_ordered(collections::WORKOUTS, ids).await
    }

    pub async fn list_programs(&self) -> Result<Vec<Program>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PROGRAMS)
            .order_by([("title", firestore::FirestoreQueryDirection::Ascending)])
            .limit(MAX_CATALOG_DOCS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_program(&self, id: &str) -> Result<Option<Program>, AppError> {
        self.get_doc(collections::PROGRAMS, id).await
    }

    pub async fn get_exercise(&self, id: &str) -> Result<Option<Exercise>, AppError> {
        self.get_doc(collections::EXERCISES, id).await
    }

    /// Exercises in the given order (e.g. a workout's sequence).
    pub async fn get_exercises(&self, ids: &[String]) -> Result<Vec<Exercise>, AppError> {
        self.get_docs_ordered(collections::EXERCISES, ids).await
    }

    // ─── Session Operations ──────────────────────────────────────

    pub async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        self.get_doc(collections::SESSIONS, id).await
    }

    /// Store a new session.
    pub async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add an exercise to an in-progress session.
    ///
    /// Runs as a transaction so concurrent marks cannot overwrite each
    /// other's list and a mark cannot land after the session ended.
    /// Returns the session and whether the exercise was newly recorded.
    pub async fn mark_exercise_atomic(
        &self,
        user_id: &str,
        session_id: &str,
        exercise_id: &str,
    ) -> Result<(Session, bool), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(transaction_error("Failed to begin transaction"))?;
        let tx_reader = transaction_reader(client, &transaction);

        let Some(mut session) = read_owned_session(&tx_reader, user_id, session_id).await? else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Session {}", session_id)));
        };

        if session.status.is_terminal() {
            let _ = transaction.rollback().await;
            return Err(finished_conflict(&session));
        }

        if !session.mark_exercise(exercise_id) {
            let _ = transaction.rollback().await;
            return Ok((session, false));
        }

        client
            .fluent()
            .update()
            .fields(paths!(Session::{completed_exercises}))
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(&session)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(transaction_error("Transaction commit failed"))?;

        Ok((session, true))
    }

    /// Abort an in-progress session.
    ///
    /// The status is re-checked inside the transaction, so an abort racing
    /// a completion either commits first (the completion then sees
    /// `aborted`) or fails at commit and is retried against `completed`.
    pub async fn abort_session_atomic(
        &self,
        user_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(transaction_error("Failed to begin transaction"))?;
        let tx_reader = transaction_reader(client, &transaction);

        let Some(mut session) = read_owned_session(&tx_reader, user_id, session_id).await? else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Session {}", session_id)));
        };

        if !session.abort(now) {
            let _ = transaction.rollback().await;
            return Err(finished_conflict(&session));
        }

        client
            .fluent()
            .update()
            .fields(paths!(Session::{status, finished_at}))
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(&session)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(transaction_error("Transaction commit failed"))?;

        tracing::info!(user_id, session_id, "Session aborted atomically");
        Ok(session)
    }

    /// A user's sessions, newest first.
    pub async fn get_sessions_for_user(
        &self,
        user_id: &str,
        cursor: Option<SessionQueryCursor>,
        limit: u32,
    ) -> Result<Vec<Session>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS);

        let user_id = user_id.to_string();
        let query = if let Some(cursor) = cursor {
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("started_at")
                        .less_than(firestore::FirestoreTimestamp(cursor.started_at)),
                ])
            })
        } else {
            query.filter(move |q| q.field("user_id").eq(user_id.clone()))
        };

        query
            .order_by([("started_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Session Completion ───────────────────────────────

    /// Atomically complete a session and apply its rewards to the user.
    ///
    /// Session status, XP/level, streak, lifetime totals, badges and the
    /// clan's XP are committed in one Firestore transaction, so a failure
    /// leaves either all of them or none of them written.
    ///
    /// Completing an already-completed session writes nothing and returns
    /// [`CompletionResult::AlreadyCompleted`].
    pub async fn complete_session_atomic(
        &self,
        user_id: &str,
        session_id: &str,
        workout: &Workout,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<CompletionResult, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(transaction_error("Failed to begin transaction"))?;
        let tx_reader = transaction_reader(client, &transaction);

        // 1. Re-read the session inside the transaction
        let Some(mut session) = read_owned_session(&tx_reader, user_id, session_id).await? else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Session {}", session_id)));
        };

        // 2. Terminal states: idempotent skip or conflict
        match session.status {
            SessionStatus::Completed => {
                tracing::debug!(user_id, session_id, "Session already completed (idempotent skip)");
                let _ = transaction.rollback().await;
                return Ok(CompletionResult::AlreadyCompleted(session));
            }
            SessionStatus::Aborted => {
                let _ = transaction.rollback().await;
                return Err(AppError::Conflict(format!(
                    "Session {} was aborted",
                    session_id
                )));
            }
            SessionStatus::InProgress => {}
        }

        // 3. Read the user
        let user: Option<User> = tx_reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(transaction_error("Failed to read user in transaction"))?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {}", user_id)));
        };

        // 4. Compute rewards in memory
        let duration_minutes = session.elapsed_minutes(now);
        let progression = gamification::apply_completion(
            &mut user,
            workout,
            duration_minutes,
            session.completed_exercises.len(),
            today,
        );
        user.updated_at = format_utc_rfc3339(now);

        session.status = SessionStatus::Completed;
        session.finished_at = Some(now);
        session.duration_minutes = progression.duration_minutes;
        session.xp_earned = progression.xp_earned;
        session.calories_burned = progression.calories_burned;
        session.badges_awarded = progression.badges_awarded.clone();

        // 5. Credit the user's clan, if any
        let clan = match user.clan_id.as_deref() {
            Some(clan_id) => {
                let clan: Option<Clan> = tx_reader
                    .fluent()
                    .select()
                    .by_id_in(collections::CLANS)
                    .obj()
                    .one(clan_id)
                    .await
                    .map_err(transaction_error("Failed to read clan in transaction"))?;
                clan.map(|mut c| {
                    c.total_xp = c.total_xp.saturating_add(progression.xp_earned);
                    c
                })
            }
            None => None,
        };

        // 6. Queue writes
        client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(&session)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.uid)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        if let Some(clan) = &clan {
            client
                .fluent()
                .update()
                .fields(paths!(Clan::{total_xp}))
                .in_col(collections::CLANS)
                .document_id(&clan.id)
                .object(clan)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add clan to transaction: {}", e))
                })?;
        }

        // 7. Commit atomically
        transaction
            .commit()
            .await
            .map_err(transaction_error("Transaction commit failed"))?;

        tracing::info!(
            user_id,
            session_id,
            xp = progression.xp_earned,
            level = progression.level,
            streak = progression.streak,
            badges = ?progression.badges_awarded,
            "Session completed atomically"
        );

        Ok(CompletionResult::Completed {
            session,
            user,
            progression,
        })
    }

    // ─── Clan Operations ─────────────────────────────────────────

    /// Clans ordered by total XP.
    pub async fn list_clans(&self, limit: u32) -> Result<Vec<Clan>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CLANS)
            .order_by([("total_xp", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_clan(&self, id: &str) -> Result<Option<Clan>, AppError> {
        self.get_doc(collections::CLANS, id).await
    }

    /// Atomically move a user into `target` (or out of any clan when `None`).
    ///
    /// The user document and both affected clans are written in one
    /// transaction. Returns the updated user.
    pub async fn set_user_clan_atomic(
        &self,
        user_id: &str,
        target: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(transaction_error("Failed to begin transaction"))?;
        let tx_reader = transaction_reader(client, &transaction);

        let user: Option<User> = tx_reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(transaction_error("Failed to read user in transaction"))?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {}", user_id)));
        };

        if user.clan_id.as_deref() == target {
            let _ = transaction.rollback().await;
            return Ok(user);
        }

        let mut changed_clans: Vec<Clan> = Vec::with_capacity(2);

        if let Some(target_id) = target {
            let clan: Option<Clan> = tx_reader
                .fluent()
                .select()
                .by_id_in(collections::CLANS)
                .obj()
                .one(target_id)
                .await
                .map_err(transaction_error("Failed to read clan in transaction"))?;
            let Some(mut clan) = clan else {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Clan {}", target_id)));
            };
            clan.add_member(user_id);
            changed_clans.push(clan);
        }

        if let Some(previous_id) = user.clan_id.as_deref() {
            let previous: Option<Clan> = tx_reader
                .fluent()
                .select()
                .by_id_in(collections::CLANS)
                .obj()
                .one(previous_id)
                .await
                .map_err(transaction_error("Failed to read clan in transaction"))?;
            // A dangling clan reference is simply dropped.
            if let Some(mut previous) = previous {
                previous.remove_member(user_id);
                changed_clans.push(previous);
            }
        }

        user.clan_id = target.map(str::to_string);
        user.updated_at = format_utc_rfc3339(now);

        client
            .fluent()
            .update()
            .fields(paths!(User::{clan_id, updated_at}))
            .in_col(collections::USERS)
            .document_id(&user.uid)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        for clan in &changed_clans {
            client
                .fluent()
                .update()
                .fields(paths!(Clan::{member_ids}))
                .in_col(collections::CLANS)
                .document_id(&clan.id)
                .object(clan)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add clan to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(transaction_error("Transaction commit failed"))?;

        tracing::info!(user_id, clan = ?target, "Clan membership updated atomically");

        Ok(user)
    }

    // ─── Stories & Settings ──────────────────────────────────────

    /// Active stories, newest first.
    pub async fn get_active_stories(&self, now: DateTime<Utc>) -> Result<Vec<Story>, AppError> {
        let stories: Vec<Story> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .order_by([("published_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_STORIES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(stories.into_iter().filter(|s| s.is_active(now)).collect())
    }

    /// Feature toggles; defaults when the settings document is missing.
    pub async fn get_settings(&self) -> Result<AppSettings, AppError> {
        Ok(self
            .get_doc(collections::SETTINGS, collections::APP_SETTINGS_DOC)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firestore::errors::{
        FirestoreDatabaseError, FirestoreErrorPublicGenericDetails, FirestoreInvalidParametersError,
        FirestoreInvalidParametersPublicDetails, FirestoreNetworkError,
    };

    fn database_error(code: &str, retry_possible: bool) -> FirestoreError {
        FirestoreError::DatabaseError(FirestoreDatabaseError::new(
            FirestoreErrorPublicGenericDetails::new(code.to_string()),
            format!("status: {}", code),
            retry_possible,
        ))
    }

    #[test]
    fn test_aborted_commit_is_contention() {
        let err = transaction_error("Transaction commit failed")(database_error("Aborted", true));
        assert!(matches!(err, AppError::Contention(_)));
        assert!(err.is_retryable());

        let network = FirestoreError::NetworkError(FirestoreNetworkError::new(
            FirestoreErrorPublicGenericDetails::new("CONNECTION_ERROR".to_string()),
            "connection reset".to_string(),
        ));
        assert!(transaction_error("read")(network).is_retryable());
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let err = transaction_error("read")(database_error("PermissionDenied", false));
        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.is_retryable());

        let invalid = FirestoreError::InvalidParametersError(FirestoreInvalidParametersError::new(
            FirestoreInvalidParametersPublicDetails::new(
                "document_id".to_string(),
                "empty".to_string(),
            ),
        ));
        assert!(!transaction_error("read")(invalid).is_retryable());
    }

    #[tokio::test]
    async fn test_offline_session_writes_fail_without_retry() {
        let db = FirestoreDb::new_mock();

        let err = db
            .abort_session_atomic("u1", "s1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.is_retryable());

        let err = db
            .mark_exercise_atomic("u1", "s1", "plank")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
