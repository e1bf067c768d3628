// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod sessions;
pub mod social;

use crate::error::{provider_message, AppError, Locale, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::middleware::localize_errors;
use crate::models::User;
use crate::services::session::{local_day, MAX_UTC_OFFSET_MINUTES, MIN_UTC_OFFSET_MINUTES};
use crate::AppState;
use axum::extract::Query;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Extension, Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

#[derive(Deserialize)]
struct ProviderErrorQuery {
    code: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProviderErrorResponse {
    pub code: String,
    pub message: String,
}

/// Localized message for an identity-provider error code seen by the client.
async fn provider_error_message(
    Extension(locale): Extension<Locale>,
    Query(params): Query<ProviderErrorQuery>,
) -> Json<ProviderErrorResponse> {
    let message = provider_message(&params.code, locale).to_string();
    Json(ProviderErrorResponse {
        code: params.code,
        message,
    })
}

/// Client's UTC offset, for endpoints that report day-based values such as
/// the live streak.
#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct ClientDayQuery {
    #[serde(default)]
    #[validate(range(min = MIN_UTC_OFFSET_MINUTES, max = MAX_UTC_OFFSET_MINUTES))]
    pub utc_offset_minutes: i32,
}

impl ClientDayQuery {
    /// The client's calendar day at `now`.
    pub fn today(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        self.validate()?;
        Ok(local_day(now, self.utc_offset_minutes))
    }
}

/// Load the profile of the authenticated user.
///
/// Clients call `POST /api/me` once after sign-up; until then other
/// endpoints report the profile as missing.
pub(crate) async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    state
        .db
        .get_user(&auth.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", auth.uid)))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
        ]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/messages/provider-error", get(provider_error_message))
        .merge(auth::routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(api::routes())
        .merge(catalog::routes())
        .merge(sessions::routes())
        .merge(social::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            localize_errors,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
