// ABOUTME: Liveness endpoint reporting service version and store reachability
// ABOUTME: Answers 503 when the store does not respond
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::resources::ServerResources;

/// Overall health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Everything answers
    Healthy,
    /// The store is unreachable
    Unhealthy,
}

/// Body of `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall health
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Store state: `connected` or `unavailable`
    pub database: String,
}

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Response {
        let (status, database, code) = match resources.database.health_check().await {
            Ok(()) => (HealthStatus::Healthy, "connected", StatusCode::OK),
            Err(e) => {
                error!(error = %e, "Health check failed");
                (
                    HealthStatus::Unhealthy,
                    "unavailable",
                    StatusCode::SERVICE_UNAVAILABLE,
                )
            }
        };

        let body = HealthResponse {
            status,
            service: env!("CARGO_PKG_NAME").to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            database: database.to_owned(),
        };
        (code, Json(body)).into_response()
    }
}
