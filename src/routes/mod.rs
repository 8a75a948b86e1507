// ABOUTME: Route module organization for the ReviewMyCoach HTTP endpoints
// ABOUTME: Groups handlers by domain and holds the small query helpers they share
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Route module for the ReviewMyCoach API
//!
//! Each domain module exposes a `*Routes` type whose `routes` function returns
//! an axum `Router` bound to the shared [`ServerResources`](crate::resources::ServerResources).
//! Handlers stay thin and delegate to the database managers and domain modules.

use serde::Deserialize;

use crate::errors::{AppError, AppResult};

/// Account profile and visibility routes
pub mod account;
/// Coach dashboard analytics routes
pub mod analytics;
/// Subscription checkout and connected account routes
pub mod billing;
/// Coach profile, search and review routes
pub mod coaches;
/// Health check route
pub mod health;
/// Job board and application routes
pub mod jobs;
/// JSON body extractor with the standard error envelope
pub mod json;
/// Direct messaging routes
pub mod messages;
/// Moderation report routes
pub mod reports;
/// Coach service catalog routes
pub mod services;
/// Discovery tag routes
pub mod tags;

pub use account::AccountRoutes;
pub use analytics::AnalyticsRoutes;
pub use billing::BillingRoutes;
pub use coaches::CoachesRoutes;
pub use health::HealthRoutes;
pub use jobs::JobsRoutes;
pub use json::Json;
pub use messages::MessagesRoutes;
pub use reports::ReportsRoutes;
pub use services::ServicesRoutes;
pub use tags::TagsRoutes;

/// Query string carrying only the fallback identity token
#[derive(Debug, Deserialize, Default)]
pub struct IdTokenQuery {
    /// Token used when no `Authorization` header or session cookie is sent
    #[serde(rename = "idToken")]
    pub id_token: Option<String>,
}

/// Parse a `limit` query value, falling back to `default` and clamping to `max`
///
/// # Errors
///
/// Returns an invalid input error when the value is not a positive integer
pub fn parse_limit(raw: Option<&str>, default: u32, max: u32) -> AppResult<u32> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(AppError::invalid_input("Invalid limit parameter")),
        Ok(limit) => Ok(limit.min(max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_limit_uses_default() {
        assert_eq!(parse_limit(None, 20, 100).ok(), Some(20));
        assert_eq!(parse_limit(Some("  "), 20, 100).ok(), Some(20));
    }

    #[test]
    fn large_limit_is_clamped() {
        assert_eq!(parse_limit(Some("12"), 20, 100).ok(), Some(12));
        assert_eq!(parse_limit(Some("5000"), 20, 100).ok(), Some(100));
    }

    #[test]
    fn bad_limit_is_rejected() {
        for raw in ["0", "-3", "ten"] {
            let err = parse_limit(Some(raw), 20, 100).err();
            assert_eq!(
                err.map(|e| e.http_status()),
                Some(400),
                "limit {raw} should be rejected"
            );
        }
    }
}
