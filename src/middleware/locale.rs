// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client locale negotiation.

use crate::error::{localize_response, Locale};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Locale from `Accept-Language`, or the configured default.
pub fn request_locale(headers: &HeaderMap, default: Locale) -> Locale {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.trim().is_empty())
        .map(Locale::from_tag)
        .unwrap_or(default)
}

/// Make the locale available to handlers and localize error bodies.
pub async fn localize_errors(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = request_locale(request.headers(), state.config.default_locale);
    request.extensions_mut().insert(locale);
    let response = next.run(request).await;
    localize_response(response, locale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_locale() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_locale(&headers, Locale::Ru), Locale::Ru);

        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.8"));
        assert_eq!(request_locale(&headers, Locale::Ru), Locale::En);

        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ru"));
        assert_eq!(request_locale(&headers, Locale::En), Locale::Ru);
    }
}
