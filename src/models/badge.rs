// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Badge catalog.

use crate::models::User;

/// What a user must reach to earn a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeCriterion {
    TotalWorkouts(u32),
    Streak(u32),
    Level(u32),
    TotalCalories(u64),
    TotalMinutes(u64),
}

impl BadgeCriterion {
    /// Whether the user's current counters satisfy this criterion.
    ///
    /// Streak badges use `longest_streak` so a broken streak keeps them earned.
    pub fn is_met(self, user: &User) -> bool {
        match self {
            BadgeCriterion::TotalWorkouts(n) => user.total_workouts >= n,
            BadgeCriterion::Streak(n) => user.longest_streak.max(user.current_streak) >= n,
            BadgeCriterion::Level(n) => user.level >= n,
            BadgeCriterion::TotalCalories(n) => user.total_calories >= n,
            BadgeCriterion::TotalMinutes(n) => user.total_minutes >= n,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub criterion: BadgeCriterion,
}

/// All badges, in display order.
pub const BADGES: &[BadgeDefinition] = &[
    BadgeDefinition {
        id: "first_step",
        title: "First Step",
        description: "Complete your first workout",
        criterion: BadgeCriterion::TotalWorkouts(1),
    },
    BadgeDefinition {
        id: "apprentice",
        title: "Apprentice",
        description: "Complete 10 workouts",
        criterion: BadgeCriterion::TotalWorkouts(10),
    },
    BadgeDefinition {
        id: "warrior",
        title: "Warrior",
        description: "Complete 50 workouts",
        criterion: BadgeCriterion::TotalWorkouts(50),
    },
    BadgeDefinition {
        id: "legend",
        title: "Legend",
        description: "Complete 100 workouts",
        criterion: BadgeCriterion::TotalWorkouts(100),
    },
    BadgeDefinition {
        id: "on_fire",
        title: "On Fire",
        description: "Train 3 days in a row",
        criterion: BadgeCriterion::Streak(3),
    },
    BadgeDefinition {
        id: "unstoppable",
        title: "Unstoppable",
        description: "Train 7 days in a row",
        criterion: BadgeCriterion::Streak(7),
    },
    BadgeDefinition {
        id: "iron_will",
        title: "Iron Will",
        description: "Train 30 days in a row",
        criterion: BadgeCriterion::Streak(30),
    },
    BadgeDefinition {
        id: "rising_hero",
        title: "Rising Hero",
        description: "Reach level 5",
        criterion: BadgeCriterion::Level(5),
    },
    BadgeDefinition {
        id: "champion",
        title: "Champion",
        description: "Reach level 10",
        criterion: BadgeCriterion::Level(10),
    },
    BadgeDefinition {
        id: "furnace",
        title: "Furnace",
        description: "Burn 10,000 calories",
        criterion: BadgeCriterion::TotalCalories(10_000),
    },
    BadgeDefinition {
        id: "marathoner",
        title: "Marathoner",
        description: "Train for 1,000 minutes",
        criterion: BadgeCriterion::TotalMinutes(1_000),
    },
];

/// Look up a badge by ID.
pub fn find_badge(id: &str) -> Option<&'static BadgeDefinition> {
    BADGES.iter().find(|b| b.id == id)
}
