// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached reads of catalog content.
//!
//! Catalog documents change rarely, so each entity type is cached
//! in-process with its own lifetime. Entries are refetched on the first read
//! after they expire; nothing is invalidated explicitly.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{AppSettings, Clan, Exercise, Program, Story, Workout};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const WORKOUTS_TTL: Duration = Duration::from_secs(5 * 60);
pub const PROGRAMS_TTL: Duration = Duration::from_secs(10 * 60);
pub const EXERCISES_TTL: Duration = Duration::from_secs(30 * 60);
pub const CLANS_TTL: Duration = Duration::from_secs(2 * 60);
pub const STORIES_TTL: Duration = Duration::from_secs(60);
pub const SETTINGS_TTL: Duration = Duration::from_secs(60);

/// Clans shown on the arena screen.
pub const CLAN_LIST_LIMIT: u32 = 50;

const ALL_KEY: &str = "*";

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// A string-keyed cache whose entries expire after a fixed lifetime.
#[derive(Clone)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Arc<DashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Fresh cached value, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: &str, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    fn insert_at(&self, key: &str, value: V, fetched_at: Instant) {
        self.entries
            .insert(key.to_string(), CacheEntry { value, fetched_at });
    }

    /// Return the cached value or fetch, cache and return a new one.
    ///
    /// Errors are not cached. Concurrent misses may fetch more than once.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalog reads backed by per-entity caches.
#[derive(Clone)]
pub struct CatalogService {
    db: FirestoreDb,
    workouts: TtlCache<Arc<Vec<Workout>>>,
    workout: TtlCache<Option<Workout>>,
    programs: TtlCache<Arc<Vec<Program>>>,
    program: TtlCache<Option<Program>>,
    exercise: TtlCache<Option<Exercise>>,
    clans: TtlCache<Arc<Vec<Clan>>>,
    stories: TtlCache<Arc<Vec<Story>>>,
    settings: TtlCache<AppSettings>,
}

impl CatalogService {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            db,
            workouts: TtlCache::new(WORKOUTS_TTL),
            workout: TtlCache::new(WORKOUTS_TTL),
            programs: TtlCache::new(PROGRAMS_TTL),
            program: TtlCache::new(PROGRAMS_TTL),
            exercise: TtlCache::new(EXERCISES_TTL),
            clans: TtlCache::new(CLANS_TTL),
            stories: TtlCache::new(STORIES_TTL),
            settings: TtlCache::new(SETTINGS_TTL),
        }
    }

    pub async fn workouts(&self) -> Result<Arc<Vec<Workout>>, AppError> {
        self.workouts
            .get_or_fetch(ALL_KEY, || async { Ok(Arc::new(self.db.list_workouts().await?)) })
            .await
    }

    pub async fn workout(&self, id: &str) -> Result<Option<Workout>, AppError> {
        self.workout
            .get_or_fetch(id, || self.db.get_workout(id))
            .await
    }

    pub async fn programs(&self) -> Result<Arc<Vec<Program>>, AppError> {
        self.programs
            .get_or_fetch(ALL_KEY, || async { Ok(Arc::new(self.db.list_programs().await?)) })
            .await
    }

    pub async fn program(&self, id: &str) -> Result<Option<Program>, AppError> {
        self.program
            .get_or_fetch(id, || self.db.get_program(id))
            .await
    }

    pub async fn exercise(&self, id: &str) -> Result<Option<Exercise>, AppError> {
        self.exercise
            .get_or_fetch(id, || self.db.get_exercise(id))
            .await
    }

    /// Exercises of a workout, in workout order.
    pub async fn exercises_for(&self, workout: &Workout) -> Result<Vec<Exercise>, AppError> {
        let mut found = Vec::with_capacity(workout.exercise_ids.len());
        let mut missing = Vec::new();
        for id in &workout.exercise_ids {
            match self.exercise.get(id) {
                Some(Some(exercise)) => found.push(exercise),
                Some(None) => {}
                None => missing.push(id.clone()),
            }
        }
        if missing.is_empty() {
            return Ok(found);
        }

        let fetched = self.db.get_exercises(&missing).await?;
        for exercise in &fetched {
            self.exercise.insert(&exercise.id, Some(exercise.clone()));
        }

        // Rebuild in workout order from the now-warm cache.
        Ok(workout
            .exercise_ids
            .iter()
            .filter_map(|id| {
                fetched
                    .iter()
                    .find(|e| &e.id == id)
                    .cloned()
                    .or_else(|| self.exercise.get(id).flatten())
            })
            .collect())
    }

    /// Workouts of a program, in schedule order.
    pub async fn workouts_for(&self, program: &Program) -> Result<Vec<Workout>, AppError> {
        let all = self.workouts().await?;
        let missing: Vec<String> = program
            .workout_ids
            .iter()
            .filter(|id| !all.iter().any(|w| &w.id == *id))
            .cloned()
            .collect();

        // The listing is capped; fall back to direct reads.
        let fetched = if missing.is_empty() {
            Vec::new()
        } else {
            self.db.get_workouts(&missing).await?
        };

        Ok(program
            .workout_ids
            .iter()
            .filter_map(|id| all.iter().chain(fetched.iter()).find(|w| &w.id == id).cloned())
            .collect())
    }

    pub async fn clans(&self) -> Result<Arc<Vec<Clan>>, AppError> {
        self.clans
            .get_or_fetch(ALL_KEY, || async {
                Ok(Arc::new(self.db.list_clans(CLAN_LIST_LIMIT).await?))
            })
            .await
    }

    /// Active stories. The cached list is re-filtered so expiry is exact.
    pub async fn stories(&self) -> Result<Vec<Story>, AppError> {
        let stories = self
            .stories
            .get_or_fetch(ALL_KEY, || async {
                Ok(Arc::new(self.db.get_active_stories(chrono::Utc::now()).await?))
            })
            .await?;
        let now = chrono::Utc::now();
        Ok(stories.iter().filter(|s| s.is_active(now)).cloned().collect())
    }

    pub async fn settings(&self) -> Result<AppSettings, AppError> {
        self.settings
            .get_or_fetch(ALL_KEY, || self.db.get_settings())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("k", 1, start);

        assert_eq!(cache.get_at("k", start + Duration::from_secs(59)), Some(1));
        assert_eq!(cache.get_at("k", start + Duration::from_secs(60)), None);
        assert_eq!(cache.get_at("other", start), None);
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_values() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));

        let first = cache.get_or_fetch("k", || async { Ok(7) }).await.unwrap();
        let second = cache
            .get_or_fetch("k", || async { Err(AppError::Database("unreachable".into())) })
            .await
            .unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));

        let err = cache
            .get_or_fetch("k", || async { Err(AppError::Database("down".into())) })
            .await;
        assert!(err.is_err());
        assert!(cache.is_empty());

        let ok = cache.get_or_fetch("k", || async { Ok(3) }).await.unwrap();
        assert_eq!(ok, 3);
    }

    #[tokio::test]
    async fn test_offline_catalog_surfaces_database_error() {
        let catalog = CatalogService::new(FirestoreDb::new_mock());
        let result = catalog.workouts().await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
