// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod gamification;
pub mod identity;
pub mod session;

pub use catalog::{CatalogService, TtlCache};
pub use gamification::{LevelProgress, Progression, StreakChange};
pub use identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
pub use session::{CompletionOutcome, SessionService};
