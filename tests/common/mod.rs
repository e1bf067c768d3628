// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use hero_journey::config::Config;
use hero_journey::db::FirestoreDb;
use hero_journey::middleware::auth::create_jwt;
use hero_journey::models::{Clan, Difficulty, User, Workout, WorkoutCategory};
use hero_journey::routes::create_router;
use hero_journey::services::IdentityVerifier;
use hero_journey::AppState;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Key ID of the identity-provider key the test app trusts.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-key-1";
#[allow(dead_code)]
const IDENTITY_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/identity_test_key.pem");
#[allow(dead_code)]
const IDENTITY_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/identity_test_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Identity verifier trusting only the fixture key.
#[allow(dead_code)]
fn test_identity(config: &Config) -> IdentityVerifier {
    let key = DecodingKey::from_rsa_pem(IDENTITY_PUBLIC_KEY).expect("Invalid test public key");
    IdentityVerifier::new_with_static_key(config, TEST_KID, key)
        .expect("Failed to build test identity verifier")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let identity = test_identity(&config);
    let state = Arc::new(AppState::new(config, test_db_offline(), identity));
    (create_router(state.clone()), state)
}

/// Create a test app backed by the emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let identity = test_identity(&config);
    let state = Arc::new(AppState::new(config, test_db().await, identity));
    (create_router(state.clone()), state)
}

/// Provider ID token for `uid`, signed with the fixture key.
///
/// `project` sets both issuer and audience; the test app expects
/// `test-project`.
#[allow(dead_code)]
pub fn test_id_token(uid: &str, project: &str, kid: &str) -> String {
    #[derive(Serialize)]
    struct IdClaims {
        iss: String,
        aud: String,
        sub: String,
        iat: u64,
        exp: u64,
        auth_time: u64,
        phone_number: String,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = IdClaims {
        iss: format!("https://securetoken.google.com/{}", project),
        aud: project.to_string(),
        sub: uid.to_string(),
        iat: now,
        exp: now + 3600,
        auth_time: now,
        phone_number: "+79990000000".to_string(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(IDENTITY_PRIVATE_KEY).expect("Invalid test private key"),
    )
    .expect("Failed to sign test ID token")
}

/// Session token for `uid` signed with the test key.
#[allow(dead_code)]
pub fn test_token(uid: &str) -> String {
    create_jwt(uid, &Config::test_default().jwt_signing_key).expect("Failed to sign test JWT")
}

/// Unique ID so emulator tests don't collide with each other.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    format!(
        "{}-{}-{}",
        prefix,
        chrono::Utc::now().timestamp_micros(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// Raw emulator client for writing fixtures the API never writes.
#[allow(dead_code)]
async fn fixture_client() -> firestore::FirestoreDb {
    let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(
                "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                    .to_string()
                    .into(),
            ),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });

    firestore::FirestoreDb::with_options_token_source(
        firestore::FirestoreDbOptions::new("test-project".to_string()),
        gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
    )
    .await
    .expect("Failed to connect to Firestore emulator")
}

/// Write a fixture document.
#[allow(dead_code)]
pub async fn put_doc<T>(collection: &str, id: &str, doc: &T)
where
    T: Serialize + Sync + Send + for<'de> serde::Deserialize<'de>,
{
    let client = fixture_client().await;
    let _: () = client
        .fluent()
        .update()
        .in_col(collection)
        .document_id(id)
        .object(doc)
        .execute()
        .await
        .expect("Failed to write fixture");
}

/// A free two-exercise workout.
#[allow(dead_code)]
pub fn sample_workout(id: &str) -> Workout {
    Workout {
        id: id.to_string(),
        title: "Morning HIIT".to_string(),
        category: WorkoutCategory::Hiit,
        difficulty: Difficulty::Beginner,
        duration_minutes: 20,
        calories: 200,
        xp_reward: 30,
        is_premium: false,
        exercise_ids: vec!["burpee".to_string(), "plank".to_string()],
        cover_url: None,
    }
}

#[allow(dead_code)]
pub fn sample_clan(id: &str) -> Clan {
    Clan {
        id: id.to_string(),
        name: "Wolves".to_string(),
        emblem_url: None,
        member_ids: Vec::new(),
        total_xp: 0,
        created_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

/// Seed a workout and a fresh user; returns the user.
#[allow(dead_code)]
pub async fn seed_user_and_workout(db: &FirestoreDb, workout: &Workout) -> User {
    put_doc(
        hero_journey::db::collections::WORKOUTS,
        &workout.id,
        workout,
    )
    .await;

    let user = User::new(&unique_id("user"), "Test Hero", "2026-01-01T00:00:00Z");
    db.upsert_user(&user).await.expect("Failed to create user");
    user
}
