// ABOUTME: Route handlers for the caller's own user profile and coach profile visibility
// ABOUTME: Identity comes from the bearer header, the session cookie or an idToken field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{IdTokenQuery, Json};
use crate::{
    auth::{authenticate, WithIdToken},
    database::UpsertProfileRequest,
    errors::AppError,
    resources::ServerResources,
};

/// Body of `POST /api/account/profile-visibility`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    /// New visibility
    pub is_public: Option<bool>,
}

/// Visibility read response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResponse {
    /// Whether the profile appears in search
    pub is_public: bool,
}

/// Visibility update response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityUpdateResponse {
    /// Human-readable outcome
    pub message: String,
    /// Stored visibility
    pub is_public: bool,
}

/// Account routes handler
pub struct AccountRoutes;

impl AccountRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/account/profile",
                get(Self::handle_get_profile).post(Self::handle_upsert_profile),
            )
            .route(
                "/api/account/profile-visibility",
                get(Self::handle_get_visibility).post(Self::handle_set_visibility),
            )
            .with_state(resources)
    }

    /// Handle GET /api/account/profile
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        let profile = resources
            .database
            .accounts()
            .get(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Profile not found"))?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle POST /api/account/profile
    async fn handle_upsert_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<UpsertProfileRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        let profile = resources
            .database
            .accounts()
            .upsert(&identity.uid, identity.email.as_deref(), &body)
            .await?;
        info!(user_id = %profile.id, role = profile.role.as_str(), "User profile saved");
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle GET /api/account/profile-visibility
    async fn handle_get_visibility(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<IdTokenQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, query.id_token.as_deref()).await?;
        let coach = resources
            .database
            .coaches()
            .get_by_user_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;
        let response = VisibilityResponse {
            is_public: coach.is_public,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/account/profile-visibility
    async fn handle_set_visibility(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<VisibilityRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let is_public = request
            .body
            .is_public
            .ok_or_else(|| AppError::missing_field("Profile visibility status is required"))?;

        let updated = resources
            .database
            .coaches()
            .set_visibility(&identity.uid, is_public)
            .await?;
        if !updated {
            return Err(AppError::not_found("Coach profile not found"));
        }

        let visibility = if is_public { "public" } else { "private" };
        info!(user_id = %identity.uid, visibility, "Profile visibility changed");
        let response = VisibilityUpdateResponse {
            message: format!("Profile is now {visibility}"),
            is_public,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
