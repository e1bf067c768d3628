//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{CompletionResult, FirestoreDb, SessionQueryCursor};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUTS: &str = "workouts";
    pub const PROGRAMS: &str = "programs";
    pub const EXERCISES: &str = "exercises";
    pub const SESSIONS: &str = "sessions";
    pub const CLANS: &str = "clans";
    pub const STORIES: &str = "stories";
    /// Feature toggles (single document `settings/app`)
    pub const SETTINGS: &str = "settings";
    pub const APP_SETTINGS_DOC: &str = "app";
}
