// ABOUTME: Route handlers for coach discovery, profiles, usernames and reviews
// ABOUTME: Search and profile reads are public; onboarding, edits and reviews need a verified identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Coaches routes
//!
//! Profile reads record a profile view for analytics. View recording is
//! best-effort and never fails the read.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{parse_limit, Json};
use crate::{
    auth::{authenticate, authenticate_optional},
    database::{validate_username, CreateCoachRequest, CreateReviewRequest, UpdateCoachRequest},
    errors::AppError,
    models::{CoachProfile, Review},
    resources::ServerResources,
    search::{search_coaches, CoachSearchParams},
};

/// Default number of reviews returned
const DEFAULT_REVIEW_LIMIT: u32 = 20;
/// Largest accepted review `limit`
const MAX_REVIEW_LIMIT: u32 = 100;

/// Name stored on reviews from users without a profile
const ANONYMOUS: &str = "Anonymous";

/// Query parameters for the review listing
#[derive(Debug, Deserialize, Default)]
pub struct ListReviewsQuery {
    /// Maximum results to return
    pub limit: Option<String>,
}

/// Response for listing reviews
#[derive(Debug, Serialize, Deserialize)]
pub struct ListReviewsResponse {
    /// Newest first
    pub reviews: Vec<Review>,
}

/// Response for a submitted review
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewResponse {
    /// Always true on 200
    pub success: bool,
    /// New review id
    pub review_id: String,
    /// Human-readable outcome
    pub message: String,
}

/// Response for a username availability check
#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameAvailabilityResponse {
    /// Whether no coach holds the name
    pub available: bool,
    /// Name as requested
    pub username: String,
}

/// Coaches routes handler
pub struct CoachesRoutes;

impl CoachesRoutes {
    /// Create all coaches routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/search/coaches", get(Self::handle_search))
            .route("/api/coaches", post(Self::handle_create))
            .route(
                "/api/coaches/:id",
                get(Self::handle_get).put(Self::handle_update),
            )
            .route(
                "/api/coaches/:id/reviews",
                get(Self::handle_list_reviews).post(Self::handle_create_review),
            )
            .route(
                "/api/coaches/username/:username",
                get(Self::handle_get_by_username),
            )
            .route(
                "/api/coaches/username/:username/availability",
                get(Self::handle_username_availability),
            )
            .with_state(resources)
    }

    /// Handle GET /api/search/coaches
    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<CoachSearchParams>,
    ) -> Result<Response, AppError> {
        let page = search_coaches(
            &resources.database,
            &params,
            resources.config.search_candidate_cap,
        )
        .await?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle POST /api/coaches - onboard the caller as a coach
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(mut body): Json<CreateCoachRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        if body.email.is_none() {
            body.email.clone_from(&identity.email);
        }

        let coach = resources.database.coaches().create(&identity.uid, &body).await?;
        info!(coach_id = %coach.id, username = %coach.username, "Coach profile created");
        Ok((StatusCode::CREATED, Json(coach)).into_response())
    }

    /// Handle GET /api/coaches/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let coach = Self::require_coach(&resources, &id).await?;

        let viewer = authenticate_optional(&resources, &headers).await;
        let viewer_id = viewer.as_ref().map(|v| v.uid.as_str());
        if viewer_id != Some(coach.user_id.as_str()) {
            if let Err(e) = resources
                .database
                .coaches()
                .record_profile_view(&coach.id, viewer_id)
                .await
            {
                warn!(coach_id = %coach.id, error = %e, "Failed to record profile view");
            }
        }

        Ok((StatusCode::OK, Json(coach)).into_response())
    }

    /// Handle PUT /api/coaches/:id - owner edits the profile
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<UpdateCoachRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        let coach = Self::require_coach(&resources, &id).await?;
        identity.require_user(&coach.user_id)?;

        let updated = resources
            .database
            .coaches()
            .update_profile(&coach.id, &body)
            .await?
            .ok_or_else(|| AppError::not_found("Coach not found"))?;
        Ok((StatusCode::OK, Json(updated)).into_response())
    }

    /// Handle GET /api/coaches/username/:username
    async fn handle_get_by_username(
        State(resources): State<Arc<ServerResources>>,
        Path(username): Path<String>,
    ) -> Result<Response, AppError> {
        let coach = resources
            .database
            .coaches()
            .get_by_username(&username)
            .await?
            .ok_or_else(|| AppError::not_found("Coach not found"))?;
        Ok((StatusCode::OK, Json(coach)).into_response())
    }

    /// Handle GET /api/coaches/username/:username/availability
    async fn handle_username_availability(
        State(resources): State<Arc<ServerResources>>,
        Path(username): Path<String>,
    ) -> Result<Response, AppError> {
        validate_username(&username)?;
        let available = resources
            .database
            .coaches()
            .username_available(&username)
            .await?;
        let response = UsernameAvailabilityResponse {
            available,
            username,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/coaches/:id/reviews
    async fn handle_list_reviews(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Query(query): Query<ListReviewsQuery>,
    ) -> Result<Response, AppError> {
        let limit = parse_limit(query.limit.as_deref(), DEFAULT_REVIEW_LIMIT, MAX_REVIEW_LIMIT)?;
        let reviews = resources.database.reviews().list(&id, limit).await?;
        Ok((StatusCode::OK, Json(ListReviewsResponse { reviews })).into_response())
    }

    /// Handle POST /api/coaches/:id/reviews
    async fn handle_create_review(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<CreateReviewRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        body.validate()?;
        let coach = Self::require_coach(&resources, &id).await?;

        let student_name = resources
            .database
            .accounts()
            .get(&identity.uid)
            .await?
            .map(|p| p.display_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_owned());

        let review = resources
            .database
            .reviews()
            .create(&coach.id, &identity.uid, &student_name, &body)
            .await?;

        let response = CreateReviewResponse {
            success: true,
            review_id: review.id,
            message: "Review created successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn require_coach(
        resources: &ServerResources,
        coach_id: &str,
    ) -> Result<CoachProfile, AppError> {
        resources
            .database
            .coaches()
            .get(coach_id)
            .await?
            .ok_or_else(|| AppError::not_found("Coach not found"))
    }
}
