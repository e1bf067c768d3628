// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token exchange tests.
//!
//! The test app trusts a fixture RSA key, so ID tokens are signed locally
//! and these run offline.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use hero_journey::config::Config;
use hero_journey::middleware::auth::{Claims, SESSION_COOKIE};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tower::ServiceExt;

mod common;

fn exchange(id_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "id_token": id_token }).to_string(),
        ))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Missing Set-Cookie")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_exchange_issues_session_token() {
    let (app, _) = common::create_test_app();
    let id_token = common::test_id_token("Xk2rPq9firebase", "test-project", common::TEST_KID);

    let response = app.oneshot(exchange(&id_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["uid"], "Xk2rPq9firebase");

    let token = body["token"].as_str().unwrap();
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&Config::test_default().jwt_signing_key),
        &Validation::new(Algorithm::HS256),
    )
    .expect("Issued token must verify with the session key")
    .claims;
    assert_eq!(claims.sub, "Xk2rPq9firebase");
}

#[tokio::test]
async fn test_issued_token_passes_auth() {
    let (app, _) = common::create_test_app();
    let id_token = common::test_id_token("hero-7", "test-project", common::TEST_KID);

    let response = app.clone().oneshot(exchange(&id_token)).await.unwrap();
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    // Validation runs after auth and before the database, so 400 proves
    // the request got past the middleware.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions?per_page=0")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions?per_page=0")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exchange_rejects_other_project() {
    let (app, _) = common::create_test_app();
    let id_token = common::test_id_token("hero-1", "someone-elses-app", common::TEST_KID);

    let response = app.oneshot(exchange(&id_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_exchange_rejects_unknown_key() {
    let (app, _) = common::create_test_app();
    let id_token = common::test_id_token("hero-1", "test-project", "rotated-key");

    let response = app.oneshot(exchange(&id_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_exchange_rejects_session_token() {
    let (app, _) = common::create_test_app();

    // Our own HS256 token is not a provider ID token
    let response = app
        .oneshot(exchange(&common::test_token("hero-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_exchange_rejects_unsafe_uid() {
    let (app, _) = common::create_test_app();
    let id_token = common::test_id_token("users/other", "test-project", common::TEST_KID);

    let response = app.oneshot(exchange(&id_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_exchange_requires_token() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(exchange("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, format!("{}=old", SESSION_COOKIE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("Max-Age=0"));
}
