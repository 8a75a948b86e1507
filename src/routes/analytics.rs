// ABOUTME: Route handler for the coach dashboard analytics
// ABOUTME: Coaches may only read their own figures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    analytics::{coach_analytics, parse_time_range, AnalyticsWindow, CoachAnalytics},
    auth::authenticate,
    errors::AppError,
    resources::ServerResources,
};

/// Query parameters for `GET /api/analytics`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// Coach; must be the caller
    pub user_id: Option<String>,
    /// Months to cover, default 12
    pub time_range: Option<String>,
    /// Token when no header is sent
    pub id_token: Option<String>,
}

/// Analytics envelope
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    /// Figures for the window
    pub analytics: CoachAnalytics,
}

/// Analytics routes handler
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create the analytics route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analytics", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle GET /api/analytics
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<AnalyticsQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, query.id_token.as_deref()).await?;
        let user_id = query
            .user_id
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::missing_field("userId is required"))?;
        identity.require_user(user_id)?;
        let months = parse_time_range(query.time_range.as_deref())?;

        let coach = resources
            .database
            .coaches()
            .get_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;

        let window = AnalyticsWindow::ending_at(Utc::now(), months)?;
        let analytics = coach_analytics(&resources.database, &coach.id, &window).await?;
        Ok((StatusCode::OK, Json(AnalyticsResponse { analytics })).into_response())
    }
}
