// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Feature toggles.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Application-wide feature toggles, stored at `settings/app`.
///
/// A missing document means every feature is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AppSettings {
    #[serde(default = "enabled")]
    pub arena_enabled: bool,
    #[serde(default = "enabled")]
    pub stories_enabled: bool,
    #[serde(default = "enabled")]
    pub programs_enabled: bool,
    /// Blocks starting new sessions
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub min_client_version: Option<String>,
}

fn enabled() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            arena_enabled: true,
            stories_enabled: true,
            programs_enabled: true,
            maintenance_mode: false,
            min_client_version: None,
        }
    }
}
