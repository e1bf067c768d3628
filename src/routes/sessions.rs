// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session routes.

use crate::db::SessionQueryCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Session, SessionStatus};
use crate::routes::load_user;
use crate::services::session::{MAX_UTC_OFFSET_MINUTES, MIN_UTC_OFFSET_MINUTES};
use crate::services::{CompletionOutcome, StreakChange};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", get(list_sessions).post(start_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/exercises", post(mark_exercise))
        .route("/api/sessions/{id}/complete", post(complete_session))
        .route("/api/sessions/{id}/abort", post(abort_session))
}

/// Session as returned to the client.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub id: String,
    pub workout_id: String,
    pub status: SessionStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub completed_exercises: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_earned: u64,
    pub calories_burned: u32,
    pub duration_minutes: u32,
    pub badges_awarded: Vec<String>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            workout_id: session.workout_id,
            status: session.status,
            started_at: format_utc_rfc3339(session.started_at),
            finished_at: session.finished_at.map(format_utc_rfc3339),
            completed_exercises: session.completed_exercises,
            xp_earned: session.xp_earned,
            calories_burned: session.calories_burned,
            duration_minutes: session.duration_minutes,
            badges_awarded: session.badges_awarded,
        }
    }
}

// ─── History ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct SessionsQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    20
}

const MAX_PER_PAGE: u32 = 100;
const CURSOR_PARTS: usize = 2;

fn parse_cursor(cursor: Option<&str>) -> Result<Option<SessionQueryCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor = || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.split(':').collect();
            if parts.len() != CURSOR_PARTS {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            let started_at =
                chrono::DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)?;

            Ok(SessionQueryCursor { started_at })
        })
        .transpose()
}

fn encode_cursor(cursor: SessionQueryCursor) -> String {
    let payload = format!(
        "{}:{}",
        cursor.started_at.timestamp(),
        cursor.started_at.timestamp_subsec_nanos()
    );
    URL_SAFE_NO_PAD.encode(payload)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionResponse>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

/// The user's session history, newest first.
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<SessionsQuery>,
) -> Result<Json<SessionsResponse>> {
    tracing::debug!(
        uid = %auth.uid,
        cursor = ?params.cursor,
        per_page = params.per_page,
        "Listing sessions"
    );

    if params.per_page == 0 {
        return Err(AppError::BadRequest(
            "'per_page' must be at least 1".to_string(),
        ));
    }
    let limit = params.per_page.min(MAX_PER_PAGE);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let user = load_user(&state, &auth).await?;
    // Fetch one extra to learn whether another page exists.
    let mut sessions = state.sessions.history(&user, cursor, limit + 1).await?;

    let has_more = sessions.len() > limit as usize;
    sessions.truncate(limit as usize);
    let next_cursor = if has_more {
        sessions.last().map(|s| {
            encode_cursor(SessionQueryCursor {
                started_at: s.started_at,
            })
        })
    } else {
        None
    };

    Ok(Json(SessionsResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
        per_page: limit,
        next_cursor,
    }))
}

// ─── Lifecycle ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct StartSessionRequest {
    #[validate(length(min = 1, max = 128))]
    workout_id: String,
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    body.validate()?;
    let user = load_user(&state, &auth).await?;
    let session = state
        .sessions
        .start(&user, &body.workout_id, chrono::Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let user = load_user(&state, &auth).await?;
    let session = state.sessions.get(&user, &id).await?;
    Ok(Json(session.into()))
}

#[derive(Deserialize, Validate)]
struct MarkExerciseRequest {
    #[validate(length(min = 1, max = 128))]
    exercise_id: String,
}

async fn mark_exercise(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<MarkExerciseRequest>,
) -> Result<Json<SessionResponse>> {
    body.validate()?;
    let user = load_user(&state, &auth).await?;
    let session = state
        .sessions
        .mark_exercise(&user, &id, &body.exercise_id)
        .await?;
    Ok(Json(session.into()))
}

#[derive(Deserialize, Validate)]
struct CompleteSessionRequest {
    /// Client's offset from UTC, used to decide which day the workout counts for
    #[serde(default)]
    #[validate(range(min = MIN_UTC_OFFSET_MINUTES, max = MAX_UTC_OFFSET_MINUTES))]
    utc_offset_minutes: i32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressionResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_earned: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub streak: u32,
    /// `started`, `extended`, `unchanged` or `reset`
    pub streak_change: String,
    pub badges_awarded: Vec<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompleteSessionResponse {
    pub session: SessionResponse,
    /// Absent when the session had already been completed.
    pub progression: Option<ProgressionResponse>,
}

fn streak_change_name(change: StreakChange) -> &'static str {
    match change {
        StreakChange::Started => "started",
        StreakChange::Extended => "extended",
        StreakChange::Unchanged => "unchanged",
        StreakChange::Reset => "reset",
    }
}

impl From<CompletionOutcome> for CompleteSessionResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        let progression = match (outcome.progression, outcome.user) {
            (Some(p), Some(user)) => Some(ProgressionResponse {
                xp_earned: p.xp_earned,
                total_xp: user.total_xp,
                level: p.level,
                leveled_up: p.leveled_up,
                streak: p.streak,
                streak_change: streak_change_name(p.streak_change).to_string(),
                badges_awarded: p.badges_awarded,
            }),
            _ => None,
        };
        Self {
            session: outcome.session.into(),
            progression,
        }
    }
}

/// Finish a session and apply XP, streak and badges.
///
/// With an empty body (`{}`) the workout counts for the UTC day.
async fn complete_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<CompleteSessionRequest>,
) -> Result<Json<CompleteSessionResponse>> {
    body.validate()?;

    let user = load_user(&state, &auth).await?;
    let outcome = state
        .sessions
        .complete(&user, &id, chrono::Utc::now(), body.utc_offset_minutes)
        .await?;

    if let Some(progression) = &outcome.progression {
        tracing::info!(
            uid = %auth.uid,
            session_id = %id,
            xp = progression.xp_earned,
            level = progression.level,
            leveled_up = progression.leveled_up,
            streak = progression.streak,
            badges = ?progression.badges_awarded,
            "Session completed"
        );
    }

    Ok(Json(outcome.into()))
}

async fn abort_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let user = load_user(&state, &auth).await?;
    let session = state
        .sessions
        .abort(&user, &id, chrono::Utc::now())
        .await?;
    Ok(Json(session.into()))
}
