// ABOUTME: Route handlers for user-submitted moderation reports
// ABOUTME: Any user may report an item once; only admins may read the queue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Json;
use crate::{
    auth::authenticate, database::CreateReportRequest, errors::AppError, models::Report,
    resources::ServerResources,
};

/// Response for a filed report
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    /// Always true on 200
    pub success: bool,
    /// New report id
    pub report_id: String,
    /// Human-readable outcome
    pub message: String,
}

/// Moderation queue
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportsResponse {
    /// Newest first
    pub reports: Vec<Report>,
}

/// Reports routes handler
pub struct ReportsRoutes;

impl ReportsRoutes {
    /// Create all report routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/reports",
                get(Self::handle_list).post(Self::handle_create),
            )
            .with_state(resources)
    }

    /// Handle POST /api/reports
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateReportRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        let report = resources
            .database
            .reports()
            .create(&identity.uid, &body)
            .await?;
        info!(
            report_id = %report.id,
            item_type = %report.reported_item_type,
            "Report submitted"
        );

        let response = CreateReportResponse {
            success: true,
            report_id: report.id,
            message: "Report submitted successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/reports
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        identity.require_admin()?;
        let reports = resources.database.reports().list().await?;
        Ok((StatusCode::OK, Json(ReportsResponse { reports })).into_response())
    }
}
