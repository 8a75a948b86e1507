// ABOUTME: Route handlers for coach-sold services
// ABOUTME: Creating a service registers a product and price on the coach's connected account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::collections::BTreeMap;
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

use super::{parse_limit, Json};
use crate::{
    auth::{authenticate, WithIdToken},
    database::{CreateServiceRequest, ListServicesFilter},
    errors::AppError,
    models::{ConnectAccountStatus, Service},
    resources::ServerResources,
};

/// Default number of services returned
const DEFAULT_SERVICE_LIMIT: u32 = 20;
/// Largest accepted service `limit`
const MAX_SERVICE_LIMIT: u32 = 100;

/// Currency of every service price
const CURRENCY: &str = "usd";

/// Query parameters for `GET /api/services`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesQuery {
    /// Selling coach
    pub coach_id: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// `true` or `false`
    pub is_active: Option<String>,
    /// Maximum results
    pub limit: Option<String>,
}

/// Service listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ServicesResponse {
    /// Newest first
    pub services: Vec<Service>,
}

/// Services routes handler
pub struct ServicesRoutes;

impl ServicesRoutes {
    /// Create all service routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/services",
                get(Self::handle_list).post(Self::handle_create),
            )
            .with_state(resources)
    }

    /// Handle GET /api/services
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListServicesQuery>,
    ) -> Result<Response, AppError> {
        let filter = ListServicesFilter {
            coach_id: query.coach_id.filter(|c| !c.is_empty()),
            category: query.category.filter(|c| !c.is_empty()),
            is_active: query.is_active.as_deref().map(|v| v == "true"),
            limit: parse_limit(
                query.limit.as_deref(),
                DEFAULT_SERVICE_LIMIT,
                MAX_SERVICE_LIMIT,
            )?,
        };
        let services = resources.database.services().list(&filter).await?;
        Ok((StatusCode::OK, Json(ServicesResponse { services })).into_response())
    }

    /// Handle POST /api/services
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<CreateServiceRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;

        let coach = resources
            .database
            .coaches()
            .get_by_user_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;

        let account = resources
            .database
            .services()
            .get_stripe_account(&coach.user_id)
            .await?
            .ok_or_else(|| {
                AppError::invalid_input(
                    "Stripe account not found. Please connect your Stripe account first.",
                )
            })?;
        if account.account_status != ConnectAccountStatus::Active {
            return Err(AppError::invalid_input(
                "Stripe account is not active. Please complete your account setup.",
            ));
        }

        let terms = body.validate()?;

        let metadata = BTreeMap::from([
            ("coachId".to_owned(), coach.user_id.clone()),
            ("category".to_owned(), body.category.clone()),
            ("duration".to_owned(), terms.duration.to_string()),
        ]);
        let connected = Some(account.stripe_account_id.as_str());
        let product_id = resources
            .payments
            .create_product(&body.title, &body.description, connected, &metadata)
            .await?;
        let price_id = resources
            .payments
            .create_price(
                &product_id,
                terms.unit_amount_cents,
                CURRENCY,
                connected,
                terms.recurring_interval,
            )
            .await?;

        let service = resources
            .database
            .services()
            .create(&coach.user_id, &body, &terms, &product_id, &price_id)
            .await?;
        resources
            .database
            .coaches()
            .set_has_active_services(&coach.user_id, true)
            .await?;

        info!(service_id = %service.id, coach_id = %coach.user_id, "Service created");
        Ok((StatusCode::OK, Json(service)).into_response())
    }
}
