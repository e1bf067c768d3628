// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! XP, levels, streaks and badges.
//!
//! Everything here is pure and operates on an in-memory [`User`]; the caller
//! persists the result (see `FirestoreDb::complete_session_atomic`).

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Difficulty, User, Workout, WorkoutCategory, BADGES};
use crate::time_utils::{day_key, parse_day_key};

/// XP granted for any finished workout, regardless of length.
pub const BASE_WORKOUT_XP: u64 = 50;
pub const XP_PER_MINUTE: u64 = 2;
/// XP scale of the level curve: level `n` starts at `(n - 1)^2 * XP_PER_LEVEL_UNIT`.
pub const XP_PER_LEVEL_UNIT: u64 = 100;
/// Used for calorie estimates when the user has not entered a weight.
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Level for a total XP: `floor(sqrt(total_xp / 100)) + 1`.
pub fn calculate_level(total_xp: u64) -> u32 {
    let units = total_xp / XP_PER_LEVEL_UNIT;
    // Integer square root; f64 alone can be off by one for large inputs.
    let mut root = (units as f64).sqrt() as u64;
    while root * root > units {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= units {
        root += 1;
    }
    u32::try_from(root + 1).unwrap_or(u32::MAX)
}

/// Minimum total XP for a level.
pub fn xp_for_level(level: u32) -> u64 {
    let n = u64::from(level.saturating_sub(1));
    n.saturating_mul(n).saturating_mul(XP_PER_LEVEL_UNIT)
}

/// Where a user stands within their current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    /// XP earned since reaching `level`
    pub xp_into_level: u64,
    /// XP between `level` and `level + 1`
    pub xp_for_next_level: u64,
    /// `xp_into_level / xp_for_next_level`, in `[0, 1)`
    pub fraction: f64,
}

pub fn level_progress(total_xp: u64) -> LevelProgress {
    let level = calculate_level(total_xp);
    let floor = xp_for_level(level);
    let next = xp_for_level(level.saturating_add(1));
    let span = next.saturating_sub(floor).max(1);
    let into = total_xp - floor;
    LevelProgress {
        level,
        total_xp,
        xp_into_level: into,
        xp_for_next_level: span,
        fraction: into as f64 / span as f64,
    }
}

fn difficulty_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Beginner => 1.0,
        Difficulty::Intermediate => 1.25,
        Difficulty::Advanced => 1.5,
    }
}

/// XP for training `duration_minutes` at a given difficulty.
///
/// Never less than [`BASE_WORKOUT_XP`] and non-decreasing in duration.
pub fn calculate_workout_xp(duration_minutes: u32, difficulty: Difficulty) -> u64 {
    let raw = BASE_WORKOUT_XP + XP_PER_MINUTE * u64::from(duration_minutes);
    let scaled = (raw as f64 * difficulty_multiplier(difficulty)).floor() as u64;
    scaled.max(BASE_WORKOUT_XP)
}

/// XP for a finished session.
///
/// The workout's `xp_reward` is a completion bonus, granted only when every
/// exercise of the workout was marked done.
pub fn session_xp(workout: &Workout, duration_minutes: u32, completed_exercises: usize) -> u64 {
    let mut xp = calculate_workout_xp(duration_minutes, workout.difficulty);
    if !workout.exercise_ids.is_empty() && completed_exercises >= workout.exercise_ids.len() {
        xp = xp.saturating_add(workout.xp_reward);
    }
    xp
}

fn category_met(category: WorkoutCategory) -> f64 {
    match category {
        WorkoutCategory::Strength => 5.0,
        WorkoutCategory::Cardio => 8.0,
        WorkoutCategory::Hiit => 9.0,
        WorkoutCategory::Yoga => 3.0,
        WorkoutCategory::Stretching => 2.5,
        WorkoutCategory::Other => 4.0,
    }
}

/// Estimated calories burned: `MET * weight_kg * hours`.
pub fn estimate_calories(category: WorkoutCategory, minutes: u32, weight_kg: Option<f64>) -> u32 {
    let weight = weight_kg
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(DEFAULT_WEIGHT_KG);
    let kcal = category_met(category) * weight * f64::from(minutes) / 60.0;
    kcal.round() as u32
}

/// Add XP and recompute the level. Returns `true` on level-up.
pub fn award_xp(user: &mut User, amount: u64) -> bool {
    let before = user.level;
    user.total_xp = user.total_xp.saturating_add(amount);
    user.level = calculate_level(user.total_xp);
    user.level > before
}

/// How a workout on a given day changed the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Started,
    Extended,
    Unchanged,
    Reset,
}

/// Apply a workout completed on `today` to the user's streak.
///
/// Same day: unchanged. Next day: +1. Gap of more than a day, or no usable
/// previous date: back to 1. A `today` before the stored day (clock skew)
/// leaves everything untouched.
pub fn update_streak(user: &mut User, today: NaiveDate) -> StreakChange {
    let last = user.last_workout_date.as_deref().and_then(parse_day_key);

    let change = match last {
        None => {
            user.current_streak = 1;
            StreakChange::Started
        }
        Some(last) => match (today - last).num_days() {
            d if d < 0 => return StreakChange::Unchanged,
            0 => {
                // Repairs a zero streak left by an interrupted write.
                user.current_streak = user.current_streak.max(1);
                StreakChange::Unchanged
            }
            1 => {
                user.current_streak = user.current_streak.saturating_add(1);
                StreakChange::Extended
            }
            _ => {
                user.current_streak = 1;
                StreakChange::Reset
            }
        },
    };

    user.last_workout_date = Some(day_key(today));
    user.longest_streak = user.longest_streak.max(user.current_streak);
    change
}

/// Current streak as it should be displayed on `today`.
///
/// A streak whose last workout is older than yesterday is already broken even
/// though the stored counter has not been reset yet.
pub fn effective_streak(user: &User, today: NaiveDate) -> u32 {
    match user.last_workout_date.as_deref().and_then(parse_day_key) {
        Some(last) if (today - last).num_days() <= 1 => user.current_streak,
        _ => 0,
    }
}

/// Award every catalog badge the user now qualifies for.
///
/// Returns only the newly awarded IDs; calling again with the same user
/// state returns nothing and adds no duplicates.
pub fn check_and_award_badges(user: &mut User) -> Vec<String> {
    let mut awarded = Vec::new();
    for badge in BADGES {
        if !user.has_badge(badge.id) && badge.criterion.is_met(user) {
            user.badges.push(badge.id.to_string());
            awarded.push(badge.id.to_string());
        }
    }
    awarded
}

/// Everything a completed session did to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    pub xp_earned: u64,
    pub calories_burned: u32,
    pub duration_minutes: u32,
    pub leveled_up: bool,
    pub level: u32,
    pub streak: u32,
    pub streak_change: StreakChange,
    pub badges_awarded: Vec<String>,
}

/// Apply a completed session to the user: totals, XP/level, streak, badges.
pub fn apply_completion(
    user: &mut User,
    workout: &Workout,
    duration_minutes: u32,
    completed_exercises: usize,
    today: NaiveDate,
) -> Progression {
    let xp_earned = session_xp(workout, duration_minutes, completed_exercises);
    let calories_burned = estimate_calories(workout.category, duration_minutes, user.weight_kg);

    user.total_workouts = user.total_workouts.saturating_add(1);
    user.total_minutes = user.total_minutes.saturating_add(u64::from(duration_minutes));
    user.total_calories = user.total_calories.saturating_add(u64::from(calories_burned));

    let leveled_up = award_xp(user, xp_earned);
    let streak_change = update_streak(user, today);
    let badges_awarded = check_and_award_badges(user);

    Progression {
        xp_earned,
        calories_burned,
        duration_minutes,
        leveled_up,
        level: user.level,
        streak: user.current_streak,
        streak_change,
        badges_awarded,
    }
}
