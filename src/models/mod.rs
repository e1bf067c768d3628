// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod badge;
pub mod catalog;
pub mod session;
pub mod settings;
pub mod social;
pub mod user;

pub use badge::{BadgeCriterion, BadgeDefinition, BADGES};
pub use catalog::{Difficulty, Exercise, Program, Workout, WorkoutCategory};
pub use session::{Session, SessionStatus};
pub use settings::AppSettings;
pub use social::{Clan, Story};
pub use user::{SubscriptionTier, User};
