// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Hero Journey: gamified workouts, programs and clans
//!
//! This crate provides the backend API for the Hero Journey fitness client:
//! catalog reads, workout sessions, and the XP / level / streak / badge
//! progression that is updated when a session completes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod retry;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CatalogService, IdentityVerifier, SessionService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub catalog: CatalogService,
    pub sessions: SessionService,
    pub identity: IdentityVerifier,
}

impl AppState {
    /// Wire the services around a database handle.
    pub fn new(config: Config, db: FirestoreDb, identity: IdentityVerifier) -> Self {
        let catalog = CatalogService::new(db.clone());
        let sessions = SessionService::new(db.clone(), catalog.clone());
        Self {
            config,
            db,
            catalog,
            sessions,
            identity,
        }
    }
}
