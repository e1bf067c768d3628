// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, locale).

pub mod auth;
pub mod locale;

pub use auth::{require_auth, AuthUser};
pub use locale::localize_errors;
