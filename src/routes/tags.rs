// ABOUTME: Route handlers for discovery tags and catalog seeding
// ABOUTME: Listing is public; creating, counting and seeding require the admin role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Json;
use crate::{
    auth::authenticate,
    errors::AppError,
    models::{Tag, TagCategory},
    resources::ServerResources,
};

const INVALID_CATEGORY: &str = "Category must be one of: sport, specialty, certification, skill";

/// Query parameters for `GET /api/tags`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsQuery {
    /// Restrict to one category
    pub category: Option<String>,
    /// `true` hides inactive tags
    pub active_only: Option<String>,
}

/// Body of `POST /api/tags`
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CreateTagRequest {
    /// Display name
    pub name: String,
    /// Category
    pub category: String,
}

/// Body of `PUT /api/tags`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IncrementTagRequest {
    /// Tag to bump
    pub tag_id: String,
    /// Amount, default 1
    pub increment: Option<i64>,
}

/// Tag listing
#[derive(Debug, Serialize, Deserialize)]
pub struct TagsResponse {
    /// Sorted by name
    pub tags: Vec<Tag>,
}

/// Response for a created tag
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagResponse {
    /// Always true on 200
    pub success: bool,
    /// New tag id
    pub tag_id: String,
    /// Human-readable outcome
    pub message: String,
}

/// Generic success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct TagUpdateResponse {
    /// Always true on 200
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

/// Seeding outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeTagsResponse {
    /// Always true on 200
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Tags inserted
    pub created: u32,
    /// Names already present
    pub skipped: u32,
}

/// Tags routes handler
pub struct TagsRoutes;

impl TagsRoutes {
    /// Create all tag routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/tags",
                get(Self::handle_list)
                    .post(Self::handle_create)
                    .put(Self::handle_increment),
            )
            .route("/api/tags/initialize", post(Self::handle_initialize))
            .with_state(resources)
    }

    /// Handle GET /api/tags
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListTagsQuery>,
    ) -> Result<Response, AppError> {
        let category = match query.category.as_deref().filter(|c| !c.is_empty()) {
            Some(c) => {
                Some(TagCategory::try_parse(c).ok_or_else(|| AppError::invalid_input(INVALID_CATEGORY))?)
            }
            None => None,
        };
        let active_only = query.active_only.as_deref() == Some("true");

        let tags = resources.database.tags().list(category, active_only).await?;
        Ok((StatusCode::OK, Json(TagsResponse { tags })).into_response())
    }

    /// Handle POST /api/tags
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateTagRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        identity.require_admin()?;

        let category = TagCategory::try_parse(&body.category)
            .ok_or_else(|| AppError::invalid_input(INVALID_CATEGORY))?;
        let tag = resources.database.tags().create(&body.name, category).await?;
        info!(tag_id = %tag.id, name = %tag.name, "Tag created");

        let response = CreateTagResponse {
            success: true,
            tag_id: tag.id,
            message: "Tag created successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/tags - bump a usage counter
    async fn handle_increment(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<IncrementTagRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        identity.require_admin()?;
        if body.tag_id.is_empty() {
            return Err(AppError::missing_field("Tag ID is required"));
        }

        let found = resources
            .database
            .tags()
            .increment(&body.tag_id, body.increment.unwrap_or(1))
            .await?;
        if !found {
            return Err(AppError::not_found("Tag not found"));
        }

        let response = TagUpdateResponse {
            success: true,
            message: "Tag updated successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/tags/initialize
    async fn handle_initialize(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        identity.require_admin()?;

        let outcome = resources.database.tags().initialize().await?;
        let response = InitializeTagsResponse {
            success: true,
            message: format!(
                "Tags initialization completed. Created: {}, Skipped: {}",
                outcome.created, outcome.skipped
            ),
            created: outcome.created,
            skipped: outcome.skipped,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
