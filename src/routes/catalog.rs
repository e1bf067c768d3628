// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog routes: workouts, programs, exercises and feature toggles.
//!
//! All reads go through the cached [`crate::services::CatalogService`].

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{AppSettings, Difficulty, Exercise, Program, User, Workout, WorkoutCategory};
use crate::routes::load_user;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workouts", get(list_workouts))
        .route("/api/workouts/{id}", get(get_workout))
        .route("/api/programs", get(list_programs))
        .route("/api/programs/{id}", get(get_program))
        .route("/api/exercises/{id}", get(get_exercise))
        .route("/api/settings", get(get_settings))
}

// ─── Workouts ────────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutSummary {
    pub id: String,
    pub title: String,
    pub category: WorkoutCategory,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub calories: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_reward: u64,
    pub is_premium: bool,
    /// Premium content the caller cannot start
    pub locked: bool,
    pub exercise_count: u32,
    pub cover_url: Option<String>,
}

impl WorkoutSummary {
    fn for_user(workout: &Workout, user: &User) -> Self {
        Self {
            id: workout.id.clone(),
            title: workout.title.clone(),
            category: workout.category,
            difficulty: workout.difficulty,
            duration_minutes: workout.duration_minutes,
            calories: workout.calories,
            xp_reward: workout.xp_reward,
            is_premium: workout.is_premium,
            locked: workout.is_premium && !user.subscription.is_premium(),
            exercise_count: workout.exercise_ids.len() as u32,
            cover_url: workout.cover_url.clone(),
        }
    }
}

#[derive(Deserialize, Default)]
struct WorkoutsQuery {
    category: Option<WorkoutCategory>,
    difficulty: Option<Difficulty>,
}

fn filter_workouts<'a>(
    workouts: &'a [Workout],
    query: &'a WorkoutsQuery,
) -> impl Iterator<Item = &'a Workout> + 'a {
    workouts.iter().filter(move |w| {
        query.category.is_none_or(|c| w.category == c)
            && query.difficulty.is_none_or(|d| w.difficulty == d)
    })
}

/// List workouts, optionally filtered by category and difficulty.
async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<WorkoutsQuery>,
) -> Result<Json<Vec<WorkoutSummary>>> {
    let user = load_user(&state, &auth).await?;
    let workouts = state.catalog.workouts().await?;

    Ok(Json(
        filter_workouts(&workouts, &query)
            .map(|w| WorkoutSummary::for_user(w, &user))
            .collect(),
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutDetailResponse {
    #[serde(flatten)]
    pub workout: WorkoutSummary,
    pub exercises: Vec<Exercise>,
}

/// A workout with its exercises in order.
async fn get_workout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDetailResponse>> {
    let user = load_user(&state, &auth).await?;
    let workout = state
        .catalog
        .workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {}", id)))?;

    let exercises = state.catalog.exercises_for(&workout).await?;
    if exercises.len() != workout.exercise_ids.len() {
        tracing::warn!(
            workout_id = %workout.id,
            expected = workout.exercise_ids.len(),
            found = exercises.len(),
            "Workout references missing exercises"
        );
    }

    Ok(Json(WorkoutDetailResponse {
        workout: WorkoutSummary::for_user(&workout, &user),
        exercises,
    }))
}

// ─── Programs ────────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgramSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: Difficulty,
    pub goal: String,
    pub duration_weeks: u32,
    pub workouts_per_week: u32,
    pub is_premium: bool,
    pub locked: bool,
    pub workout_count: u32,
    pub cover_url: Option<String>,
}

impl ProgramSummary {
    fn for_user(program: &Program, user: &User) -> Self {
        Self {
            id: program.id.clone(),
            title: program.title.clone(),
            description: program.description.clone(),
            level: program.level,
            goal: program.goal.clone(),
            duration_weeks: program.duration_weeks,
            workouts_per_week: program.workouts_per_week,
            is_premium: program.is_premium,
            locked: program.is_premium && !user.subscription.is_premium(),
            workout_count: program.workout_ids.len() as u32,
            cover_url: program.cover_url.clone(),
        }
    }
}

async fn ensure_programs_enabled(state: &AppState) -> Result<()> {
    if !state.catalog.settings().await?.programs_enabled {
        return Err(AppError::NotFound("Programs".to_string()));
    }
    Ok(())
}

/// List programs. Premium programs are listed but marked locked for free users.
async fn list_programs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ProgramSummary>>> {
    ensure_programs_enabled(&state).await?;
    let user = load_user(&state, &auth).await?;
    let programs = state.catalog.programs().await?;

    Ok(Json(
        programs
            .iter()
            .map(|p| ProgramSummary::for_user(p, &user))
            .collect(),
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgramDetailResponse {
    #[serde(flatten)]
    pub program: ProgramSummary,
    pub workouts: Vec<WorkoutSummary>,
}

/// A program with its schedule. Premium programs require a subscription.
async fn get_program(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProgramDetailResponse>> {
    ensure_programs_enabled(&state).await?;
    let user = load_user(&state, &auth).await?;
    let program = state
        .catalog
        .program(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Program {}", id)))?;

    if program.is_premium && !user.subscription.is_premium() {
        return Err(AppError::PremiumRequired(format!("Program {}", id)));
    }

    let workouts = state.catalog.workouts_for(&program).await?;
    Ok(Json(ProgramDetailResponse {
        program: ProgramSummary::for_user(&program, &user),
        workouts: workouts
            .iter()
            .map(|w| WorkoutSummary::for_user(w, &user))
            .collect(),
    }))
}

// ─── Exercises ───────────────────────────────────────────────

async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Exercise>> {
    state
        .catalog
        .exercise(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Exercise {}", id)))
}

// ─── Settings ────────────────────────────────────────────────

/// Feature toggles for the client.
async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<AppSettings>> {
    Ok(Json(state.catalog.settings().await?))
}
