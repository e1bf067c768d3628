// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation and error localization tests.
//!
//! Validation runs before any database access, so these pass offline.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tower::ServiceExt;

mod common;

fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", common::test_token("hero-1")),
        )
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    authed(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_invalid_cursor() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            authed("GET", "/api/sessions?cursor=not-a-cursor!")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cursor_with_wrong_shape() {
    let (app, _) = common::create_test_app();
    let cursor = URL_SAFE_NO_PAD.encode("1700000000");

    let response = app
        .oneshot(
            authed("GET", &format!("/api/sessions?cursor={}", cursor))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_per_page() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            authed("GET", "/api/sessions?per_page=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_session_requires_workout_id() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_request("POST", "/api/sessions", r#"{"workout_id": ""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_complete_rejects_out_of_range_offset() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/sessions/s1/complete",
            r#"{"utc_offset_minutes": 1000}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_update_rejects_bad_weight() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_request("PATCH", "/api/me", r#"{"weight_kg": 3.0}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_create_rejects_bad_email() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_request("POST", "/api/me", r#"{"email": "not-an-email"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_workout_category() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            authed("GET", "/api/workouts?category=underwater-basket-weaving")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_leaderboard_limit() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            authed("GET", "/api/arena/leaderboard?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_message_follows_accept_language() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            authed("GET", "/api/sessions?per_page=0")
                .header(header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Некоторые данные введены неверно.");
    assert!(body["details"].as_str().unwrap().contains("per_page"));
}

#[tokio::test]
async fn test_unauthorized_message_is_localized() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::ACCEPT_LANGUAGE, "ru")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Войдите, чтобы продолжить.");
}

#[tokio::test]
async fn test_provider_error_message_endpoint() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/messages/provider-error?code=auth/too-many-requests")
                .header(header::ACCEPT_LANGUAGE, "ru")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], "auth/too-many-requests");
    assert_eq!(
        body["message"],
        "Слишком много попыток. Подождите и попробуйте снова."
    );
}

#[tokio::test]
async fn test_progress_rejects_out_of_range_offset() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            authed("GET", "/api/me/progress?utc_offset_minutes=-900")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
