// ABOUTME: Unified error type with stable error codes and HTTP status mapping
// ABOUTME: Every handler returns AppError so clients always see a {"error": string} body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Error handling
//!
//! Errors fall into four buckets: client input problems (400), identity
//! problems (401/403), missing entities (404), and everything else, which is
//! logged in full and reported to the caller as a generic 500.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across the workspace
pub type AppResult<T> = Result<T, AppError>;

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request failed validation
    InvalidInput,
    /// A required field was absent or empty
    MissingRequiredField,
    /// The entity already exists (duplicate review, application, report...)
    ResourceAlreadyExists,
    /// No identity token was supplied
    AuthRequired,
    /// The identity token could not be verified
    AuthInvalid,
    /// Identity verified but not allowed to perform the action
    PermissionDenied,
    /// Entity absent
    ResourceNotFound,
    /// A backing service is not configured or reachable
    ServiceUnavailable,
    /// Store failure
    DatabaseError,
    /// Payment processor or other third-party failure
    ExternalServiceError,
    /// Invalid configuration
    ConfigError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::ResourceAlreadyExists => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::PermissionDenied => 403,
            Self::ResourceNotFound => 404,
            Self::ServiceUnavailable => 503,
            Self::DatabaseError
            | Self::ExternalServiceError
            | Self::ConfigError
            | Self::InternalError => 500,
        }
    }

    /// Whether the detailed message may be shown to the caller
    #[must_use]
    pub const fn is_client_visible(self) -> bool {
        self.http_status() < 500
    }

    /// Message shown to callers when the detail is hidden
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "Service temporarily unavailable. Please try again later.",
            _ => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidInput => "invalid_input",
            Self::MissingRequiredField => "missing_required_field",
            Self::ResourceAlreadyExists => "resource_already_exists",
            Self::AuthRequired => "auth_required",
            Self::AuthInvalid => "auth_invalid",
            Self::PermissionDenied => "permission_denied",
            Self::ResourceNotFound => "resource_not_found",
            Self::ServiceUnavailable => "service_unavailable",
            Self::DatabaseError => "database_error",
            Self::ExternalServiceError => "external_service_error",
            Self::ConfigError => "config_error",
            Self::InternalError => "internal_error",
        };
        f.write_str(s)
    }
}

/// Application error carrying a code and a human-readable message
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Error classification
    pub code: ErrorCode,
    /// Detail message (hidden from callers for 5xx codes)
    pub message: String,
}

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 400 - request failed validation
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// 400 - a required field is missing
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message)
    }

    /// 400 - duplicate entity
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// 401 - no token supplied
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthRequired, message)
    }

    /// 401 - token rejected
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// 403 - identity mismatch or role mismatch
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// 404 - the named entity does not exist
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, what)
    }

    /// 503 - backing service not available (detail is logged, not returned)
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// 500 - store failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// 500 - third-party failure
    pub fn external_service(service: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{service}: {}", message.into()),
        )
    }

    /// 500 - configuration problem
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// 500 - unexpected failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Message safe to return to the caller
    #[must_use]
    pub fn public_message(&self) -> &str {
        if self.code.is_client_visible() {
            &self.message
        } else {
            self.code.public_message()
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {e}"))
    }
}

/// Wire shape of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Caller-facing message
    pub error: String,
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };

    use super::{AppError, ErrorResponse};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                tracing::error!(code = %self.code, "{}", self.message);
            } else {
                tracing::debug!(code = %self.code, "{}", self.message);
            }

            let body = ErrorResponse {
                error: self.public_message().to_owned(),
            };
            (status, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::already_exists("You have already reviewed this coach");
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.public_message(), "You have already reviewed this coach");
    }

    #[test]
    fn server_errors_are_generic() {
        let err = AppError::database("UNIQUE constraint failed: coaches.user_id");
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn unavailable_maps_to_503() {
        let err = AppError::service_unavailable("stripe not configured");
        assert_eq!(err.http_status(), 503);
        assert!(err.public_message().starts_with("Service temporarily unavailable"));
    }
}
