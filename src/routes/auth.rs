// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuance.
//!
//! The client signs in with the identity provider, then posts the provider
//! ID token here. We verify it and hand back our own session token, both as
//! an HttpOnly cookie (browsers) and in the body (mobile clients).

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, is_valid_uid, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::services::IdentityError;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/session", post(create_session))
        .route("/api/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
struct CreateSessionRequest {
    #[validate(length(min = 1, max = 8192))]
    id_token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionTokenResponse {
    pub uid: String,
    pub token: String,
    pub expires_in: u64,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Exchange a provider ID token for a session token.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(CookieJar, Json<SessionTokenResponse>)> {
    body.validate()?;

    let identity = state
        .identity
        .verify_id_token(&body.id_token)
        .await
        .map_err(|e| match e {
            IdentityError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Rejected identity token");
                AppError::InvalidToken
            }
            IdentityError::Transient(reason) => AppError::Unavailable(reason),
        })?;

    if !is_valid_uid(&identity.uid) {
        tracing::warn!("Rejected identity token with malformed subject");
        return Err(AppError::InvalidToken);
    }

    let token = create_jwt(&identity.uid, &state.config.jwt_signing_key)?;
    tracing::info!(uid = %identity.uid, "Session token issued");

    Ok((
        jar.add(session_cookie(token.clone())),
        Json(SessionTokenResponse {
            uid: identity.uid,
            token,
            expires_in: SESSION_TTL_SECS,
        }),
    ))
}

/// Clear the session cookie. Bearer-token clients just drop their token.
async fn logout(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(SESSION_TTL_SECS as i64))
        );
    }
}
