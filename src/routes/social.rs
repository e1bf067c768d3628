// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Arena (clans, leaderboard) and stories.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Clan, Story, User};
use crate::retry::{with_backoff, Backoff};
use crate::routes::api::UserResponse;
use crate::routes::ClientDayQuery;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/clans", get(list_clans))
        .route("/api/clans/leave", post(leave_clan))
        .route("/api/clans/{id}/join", post(join_clan))
        .route("/api/arena/leaderboard", get(get_leaderboard))
        .route("/api/stories", get(list_stories))
}

async fn ensure_arena_enabled(state: &AppState) -> Result<()> {
    if !state.catalog.settings().await?.arena_enabled {
        return Err(AppError::NotFound("Arena".to_string()));
    }
    Ok(())
}

// ─── Clans ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClanResponse {
    pub id: String,
    pub name: String,
    pub emblem_url: Option<String>,
    pub member_count: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_xp: u64,
}

impl From<&Clan> for ClanResponse {
    fn from(clan: &Clan) -> Self {
        Self {
            id: clan.id.clone(),
            name: clan.name.clone(),
            emblem_url: clan.emblem_url.clone(),
            member_count: clan.member_ids.len() as u32,
            total_xp: clan.total_xp,
        }
    }
}

/// Clans ranked by total XP.
async fn list_clans(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ClanResponse>>> {
    ensure_arena_enabled(&state).await?;
    let clans = state.catalog.clans().await?;
    Ok(Json(clans.iter().map(ClanResponse::from).collect()))
}

/// Join a clan, leaving the current one.
async fn join_clan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(day): Query<ClientDayQuery>,
) -> Result<Json<UserResponse>> {
    let now = chrono::Utc::now();
    let today = day.today(now)?;
    ensure_arena_enabled(&state).await?;
    let user = with_backoff(Backoff::default(), "join_clan", || {
        state.db.set_user_clan_atomic(&auth.uid, Some(&id), now)
    })
    .await?;
    Ok(Json(UserResponse::new(user, today)))
}

async fn leave_clan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(day): Query<ClientDayQuery>,
) -> Result<Json<UserResponse>> {
    let now = chrono::Utc::now();
    let today = day.today(now)?;
    let user = with_backoff(Backoff::default(), "leave_clan", || {
        state.db.set_user_clan_atomic(&auth.uid, None, now)
    })
    .await?;
    Ok(Json(UserResponse::new(user, today)))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    20
}

const MAX_LEADERBOARD: u32 = 100;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub uid: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub level: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_xp: u64,
    pub clan_id: Option<String>,
}

fn rank_users(users: Vec<User>) -> Vec<LeaderboardEntry> {
    users
        .into_iter()
        .enumerate()
        .map(|(i, u)| LeaderboardEntry {
            rank: i as u32 + 1,
            uid: u.uid,
            display_name: u.display_name,
            avatar_url: u.avatar_url,
            level: u.level,
            total_xp: u.total_xp,
            clan_id: u.clan_id,
        })
        .collect()
}

/// Top users by XP.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    if params.limit == 0 {
        return Err(AppError::BadRequest("'limit' must be at least 1".to_string()));
    }
    ensure_arena_enabled(&state).await?;

    let users = state
        .db
        .get_leaderboard(params.limit.min(MAX_LEADERBOARD))
        .await?;
    Ok(Json(rank_users(users)))
}

// ─── Stories ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StoryResponse {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub published_at: String,
    pub expires_at: String,
}

impl From<Story> for StoryResponse {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            title: story.title,
            image_url: story.image_url,
            link_url: story.link_url,
            published_at: format_utc_rfc3339(story.published_at),
            expires_at: format_utc_rfc3339(story.expires_at),
        }
    }
}

/// Active stories; empty while stories are switched off.
async fn list_stories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StoryResponse>>> {
    if !state.catalog.settings().await?.stories_enabled {
        return Ok(Json(Vec::new()));
    }
    let stories = state.catalog.stories().await?;
    Ok(Json(stories.into_iter().map(StoryResponse::from).collect()))
}
