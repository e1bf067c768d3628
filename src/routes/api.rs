// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, progress and achievement routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{SubscriptionTier, User, BADGES};
use crate::routes::{load_user, ClientDayQuery};
use crate::services::gamification::{effective_streak, level_progress, LevelProgress};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Name given to profiles created without one.
const DEFAULT_DISPLAY_NAME: &str = "Hero";

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(create_me).patch(update_me))
        .route("/api/me/progress", get(get_progress))
        .route("/api/badges", get(get_badges))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub uid: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub premium: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_xp: u64,
    pub level: u32,
    pub current_streak: u32,
    pub badges: Vec<String>,
    pub clan_id: Option<String>,
    pub weight_kg: Option<f64>,
}

impl UserResponse {
    /// Profile as seen on the client's calendar day `today`.
    pub fn new(user: User, today: NaiveDate) -> Self {
        let current_streak = effective_streak(&user, today);
        Self {
            premium: user.subscription == SubscriptionTier::Premium,
            uid: user.uid,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            total_xp: user.total_xp,
            level: user.level,
            current_streak,
            badges: user.badges,
            clan_id: user.clan_id,
            weight_kg: user.weight_kg,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(day): Query<ClientDayQuery>,
) -> Result<Json<UserResponse>> {
    let today = day.today(Utc::now())?;
    let user = load_user(&state, &auth).await?;
    Ok(Json(UserResponse::new(user, today)))
}

#[derive(Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 40))]
    display_name: Option<String>,
    #[validate(length(min = 5, max = 20))]
    phone: Option<String>,
    #[validate(email)]
    email: Option<String>,
}

/// Create the profile at sign-up (body may be `{}`). Returns the existing
/// profile unchanged if it was already created.
async fn create_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(day): Query<ClientDayQuery>,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    body.validate()?;
    let now = Utc::now();
    let today = day.today(now)?;

    let now = format_utc_rfc3339(now);
    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME);

    let mut user = User::new(&auth.uid, display_name, &now);
    user.phone = body.phone;
    user.email = body.email;

    let (user, created) = state.db.create_user_if_absent(&user).await?;
    if created {
        tracing::info!(uid = %auth.uid, "Profile created");
    }

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(UserResponse::new(user, today))))
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 40))]
    display_name: Option<String>,
    #[validate(url)]
    avatar_url: Option<String>,
    #[validate(range(min = 20.0, max = 400.0))]
    weight_kg: Option<f64>,
}

/// Update user-editable profile fields.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(day): Query<ClientDayQuery>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    body.validate()?;
    let now = Utc::now();
    let today = day.today(now)?;

    let mut user = load_user(&state, &auth).await?;
    if let Some(name) = body.display_name {
        let name = name.trim();
        if name.is_empty() {
            return Err(crate::error::AppError::BadRequest(
                "display_name must not be blank".to_string(),
            ));
        }
        user.display_name = name.to_string();
    }
    if body.avatar_url.is_some() {
        user.avatar_url = body.avatar_url;
    }
    if body.weight_kg.is_some() {
        user.weight_kg = body.weight_kg;
    }
    user.updated_at = format_utc_rfc3339(now);

    state.db.update_user_profile(&user).await?;
    Ok(Json(UserResponse::new(user, today)))
}

// ─── Progress ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub level: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_xp: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_into_level: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_for_next_level: u64,
    pub level_fraction: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_workout_date: Option<String>,
    pub total_workouts: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_minutes: u64,
    pub badges_earned: u32,
    pub badges_total: u32,
}

/// Level, streak and lifetime totals.
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(day): Query<ClientDayQuery>,
) -> Result<Json<ProgressResponse>> {
    let today = day.today(Utc::now())?;
    let user = load_user(&state, &auth).await?;
    Ok(Json(progress_response(user, today)))
}

fn progress_response(user: User, today: NaiveDate) -> ProgressResponse {
    let LevelProgress {
        level,
        total_xp,
        xp_into_level,
        xp_for_next_level,
        fraction,
    } = level_progress(user.total_xp);

    ProgressResponse {
        level,
        total_xp,
        xp_into_level,
        xp_for_next_level,
        level_fraction: fraction,
        current_streak: effective_streak(&user, today),
        longest_streak: user.longest_streak,
        last_workout_date: user.last_workout_date,
        total_workouts: user.total_workouts,
        total_calories: user.total_calories,
        total_minutes: user.total_minutes,
        badges_earned: user.badges.len() as u32,
        badges_total: BADGES.len() as u32,
    }
}

// ─── Badges ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BadgeResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub earned: bool,
}

/// The badge catalog with the user's earned flags.
async fn get_badges(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<BadgeResponse>>> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(badge_statuses(&user)))
}

fn badge_statuses(user: &User) -> Vec<BadgeResponse> {
    BADGES
        .iter()
        .map(|b| BadgeResponse {
            id: b.id.to_string(),
            title: b.title.to_string(),
            description: b.description.to_string(),
            earned: user.has_badge(b.id),
        })
        .collect()
}
