// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Catalog content: programs, workouts and exercises.
//!
//! These documents are written by the content team and only read here.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of workout, used for filtering and calorie estimates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutCategory {
    Strength,
    Cardio,
    Hiit,
    Yoga,
    Stretching,
    #[default]
    Other,
}

/// Difficulty of a workout or program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// A leveled training curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: Difficulty,
    /// Free-form goal ("lose weight", "build strength", ...)
    #[serde(default)]
    pub goal: String,
    pub duration_weeks: u32,
    pub workouts_per_week: u32,
    #[serde(default)]
    pub is_premium: bool,
    /// Ordered workout references
    #[serde(default)]
    pub workout_ids: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// A single workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: WorkoutCategory,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Planned duration
    pub duration_minutes: u32,
    /// Advertised calorie burn for the planned duration
    #[serde(default)]
    pub calories: u32,
    /// Bonus XP for finishing every exercise
    #[serde(default)]
    pub xp_reward: u64,
    #[serde(default)]
    pub is_premium: bool,
    /// Ordered exercise references
    #[serde(default)]
    pub exercise_ids: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// A movement within a workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub muscle_group: String,
    #[serde(default)]
    pub equipment: Option<String>,
    /// Rep target (strength movements)
    #[serde(default)]
    pub reps: Option<u32>,
    /// Time target (holds, intervals)
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}
