// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Besides the HTTP mapping, errors can be rendered as short user-facing
//! messages in the client's locale. Identity-provider error codes reported
//! by the client (e.g. `auth/too-many-requests`) share the same table.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Premium subscription required: {0}")]
    PremiumRequired(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service in maintenance mode")]
    Maintenance,

    #[error("Database error: {0}")]
    Database(String),

    /// An upstream dependency (e.g. identity-provider keys) could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Transaction aborted by a concurrent write, or the backend was
    /// briefly unavailable. Safe to retry.
    #[error("Database contention: {0}")]
    Contention(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Client locale used for user-facing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    /// Parse a language tag such as `ru`, `ru-RU` or `en_US`.
    ///
    /// Unknown languages fall back to English.
    pub fn from_tag(tag: &str) -> Self {
        let lang = tag
            .split(|c| c == '-' || c == '_' || c == ',' || c == ';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match lang.as_str() {
            "ru" => Locale::Ru,
            _ => Locale::En,
        }
    }
}

/// Message keys shared by app errors and provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKey {
    SignInRequired,
    SessionExpired,
    PremiumRequired,
    NotFound,
    InvalidInput,
    AlreadyFinished,
    Maintenance,
    InvalidPhone,
    WrongPassword,
    UserNotFound,
    TooManyRequests,
    Network,
    Busy,
    Generic,
}

fn localized(key: MessageKey, locale: Locale) -> &'static str {
    use MessageKey::*;
    match (key, locale) {
        (SignInRequired, Locale::En) => "Please sign in to continue.",
        (SignInRequired, Locale::Ru) => "Войдите, чтобы продолжить.",
        (SessionExpired, Locale::En) => "Your session has expired. Please sign in again.",
        (SessionExpired, Locale::Ru) => "Сессия истекла. Войдите снова.",
        (PremiumRequired, Locale::En) => "This content requires a Premium subscription.",
        (PremiumRequired, Locale::Ru) => "Этот контент доступен только с Premium-подпиской.",
        (NotFound, Locale::En) => "We couldn't find what you were looking for.",
        (NotFound, Locale::Ru) => "Ничего не найдено.",
        (InvalidInput, Locale::En) => "Some of the entered data is invalid.",
        (InvalidInput, Locale::Ru) => "Некоторые данные введены неверно.",
        (AlreadyFinished, Locale::En) => "This workout session is already finished.",
        (AlreadyFinished, Locale::Ru) => "Эта тренировка уже завершена.",
        (Maintenance, Locale::En) => "We're doing maintenance. Please try again later.",
        (Maintenance, Locale::Ru) => "Идут технические работы. Попробуйте позже.",
        (InvalidPhone, Locale::En) => "Invalid phone number.",
        (InvalidPhone, Locale::Ru) => "Неверный номер телефона.",
        (WrongPassword, Locale::En) => "Wrong password.",
        (WrongPassword, Locale::Ru) => "Неверный пароль.",
        (UserNotFound, Locale::En) => "No account found for these credentials.",
        (UserNotFound, Locale::Ru) => "Пользователь не найден.",
        (TooManyRequests, Locale::En) => "Too many attempts. Please wait and try again.",
        (TooManyRequests, Locale::Ru) => "Слишком много попыток. Подождите и попробуйте снова.",
        (Network, Locale::En) => "Network error. Check your connection.",
        (Network, Locale::Ru) => "Ошибка сети. Проверьте подключение.",
        (Busy, Locale::En) => "The server is busy. Please try again.",
        (Busy, Locale::Ru) => "Сервер занят. Попробуйте ещё раз.",
        (Generic, Locale::En) => "Something went wrong. Please try again.",
        (Generic, Locale::Ru) => "Что-то пошло не так. Попробуйте ещё раз.",
    }
}

/// Map an identity-provider error code to a user-facing message.
///
/// Unknown codes get the generic message and are logged.
pub fn provider_message(code: &str, locale: Locale) -> &'static str {
    let key = match code {
        "auth/invalid-phone-number" | "auth/missing-phone-number" => MessageKey::InvalidPhone,
        "auth/wrong-password" | "auth/invalid-credential" | "auth/invalid-verification-code" => {
            MessageKey::WrongPassword
        }
        "auth/user-not-found" => MessageKey::UserNotFound,
        "auth/too-many-requests" | "auth/quota-exceeded" => MessageKey::TooManyRequests,
        "auth/network-request-failed" | "unavailable" => MessageKey::Network,
        "auth/id-token-expired" | "auth/user-token-expired" => MessageKey::SessionExpired,
        "permission-denied" => MessageKey::PremiumRequired,
        "not-found" => MessageKey::NotFound,
        "invalid-argument" => MessageKey::InvalidInput,
        _ => {
            tracing::warn!(code, "Unmapped provider error code");
            MessageKey::Generic
        }
    };
    localized(key, locale)
}

impl AppError {
    fn message_key(&self) -> MessageKey {
        match self {
            AppError::Unauthorized => MessageKey::SignInRequired,
            AppError::InvalidToken => MessageKey::SessionExpired,
            AppError::PremiumRequired(_) => MessageKey::PremiumRequired,
            AppError::NotFound(_) => MessageKey::NotFound,
            AppError::BadRequest(_) => MessageKey::InvalidInput,
            AppError::Conflict(_) => MessageKey::AlreadyFinished,
            AppError::Maintenance => MessageKey::Maintenance,
            AppError::Contention(_) | AppError::Unavailable(_) => MessageKey::Busy,
            AppError::Database(_) | AppError::Internal(_) => MessageKey::Generic,
        }
    }

    /// User-facing message for this error in the given locale.
    pub fn user_message(&self, locale: Locale) -> &'static str {
        localized(self.message_key(), locale)
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Contention(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Attached to error responses so the body can be re-rendered in the
/// client's locale (see `middleware::locale`).
#[derive(Debug, Clone)]
struct RenderedError {
    error: &'static str,
    key: MessageKey,
    details: Option<String>,
}

impl RenderedError {
    fn render(self, status: StatusCode, locale: Locale) -> Response {
        let body = ErrorResponse {
            error: self.error,
            message: localized(self.key, locale),
            details: self.details.clone(),
        };
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Re-render an error response produced by [`AppError`] in `locale`.
///
/// Other responses are returned unchanged.
pub fn localize_response(mut response: Response, locale: Locale) -> Response {
    if locale == Locale::default() {
        return response;
    }
    match response.extensions_mut().remove::<RenderedError>() {
        Some(rendered) => rendered.render(response.status(), locale),
        None => response,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::PremiumRequired(msg) => {
                (StatusCode::FORBIDDEN, "premium_required", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Maintenance => (StatusCode::SERVICE_UNAVAILABLE, "maintenance", None),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Contention(msg) => {
                tracing::warn!(error = %msg, "Database contention");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            AppError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Upstream unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        RenderedError {
            error,
            key: self.message_key(),
            details,
        }
        .render(status, Locale::default())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
