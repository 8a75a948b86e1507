// ABOUTME: Route handlers for the coach subscription checkout and connected payout accounts
// ABOUTME: Reading a connected account refreshes its onboarding state from the processor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{IdTokenQuery, Json};
use crate::{
    auth::{authenticate, WithIdToken},
    errors::AppError,
    models::{ConnectAccountStatus, StripeAccount, SubscriptionStatus},
    payments::{CheckoutRequest, CheckoutSessionState, ConnectedAccountState},
    resources::ServerResources,
};

/// Metadata `type` tag on subscription objects
const SUBSCRIPTION_TYPE: &str = "coach_pro_subscription";
/// Country used when the coach does not pick one
const DEFAULT_COUNTRY: &str = "US";

/// Body of `POST /api/subscription/create-checkout`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCheckoutRequest {
    /// Plan price id
    pub price_id: String,
    /// Subscribing coach; must be the caller
    pub user_id: String,
    /// Plan name echoed into metadata
    pub plan: Option<String>,
}

/// Body of `POST /api/subscription/confirm`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmSubscriptionRequest {
    /// Checkout session id from the success redirect
    pub session_id: String,
}

/// Body of `POST /api/stripe/connect`
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConnectRequest {
    /// Payout contact address, defaults to the token email
    pub email: Option<String>,
    /// ISO country code
    pub country: Option<String>,
}

/// Checkout session redirect
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted checkout page
    pub url: String,
}

/// Subscription state after confirmation
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubscriptionResponse {
    /// Always true on 200
    pub success: bool,
    /// Stored subscription state
    pub subscription_status: SubscriptionStatus,
}

/// Freshly created connected account
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    /// Processor account id
    pub account_id: String,
    /// Hosted onboarding page
    pub onboarding_url: String,
}

/// Map the processor's view of an account onto the stored status
#[must_use]
pub fn account_status(state: &ConnectedAccountState) -> ConnectAccountStatus {
    if state.charges_enabled {
        ConnectAccountStatus::Active
    } else if state.disabled_reason.is_some() {
        ConnectAccountStatus::Restricted
    } else {
        ConnectAccountStatus::Pending
    }
}

/// Whether a finished checkout session belongs to `user_id`
#[must_use]
pub fn session_confirms(session: &CheckoutSessionState, user_id: &str) -> bool {
    session.complete
        && session.metadata.get("type").map(String::as_str) == Some(SUBSCRIPTION_TYPE)
        && session.metadata.get("userId").map(String::as_str) == Some(user_id)
}

/// Billing routes handler
pub struct BillingRoutes;

impl BillingRoutes {
    /// Create all billing routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/subscription/create-checkout",
                post(Self::handle_create_checkout),
            )
            .route(
                "/api/subscription/confirm",
                post(Self::handle_confirm_subscription),
            )
            .route(
                "/api/stripe/connect",
                get(Self::handle_get_connect).post(Self::handle_create_connect),
            )
            .with_state(resources)
    }

    /// Handle POST /api/subscription/create-checkout
    async fn handle_create_checkout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<CreateCheckoutRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;
        identity.require_user(&body.user_id)?;
        if body.price_id.trim().is_empty() {
            return Err(AppError::missing_field("priceId is required"));
        }

        let coaches = resources.database.coaches();
        let coach = coaches
            .get_by_user_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;
        if coach.subscription_status.is_active() {
            return Err(AppError::already_exists("Already subscribed to Coach Pro"));
        }

        let mut metadata = BTreeMap::from([
            ("userId".to_owned(), identity.uid.clone()),
            ("type".to_owned(), SUBSCRIPTION_TYPE.to_owned()),
        ]);

        let customer_id = match coach.stripe_customer_id.clone() {
            Some(id) => id,
            None => {
                let email = identity.email.as_deref().or(coach.email.as_deref());
                let id = resources
                    .payments
                    .create_customer(email, &coach.display_name, &metadata)
                    .await?;
                coaches.set_stripe_customer_id(&identity.uid, &id).await?;
                id
            }
        };

        if let Some(plan) = body.plan {
            metadata.insert("plan".to_owned(), plan);
        }
        let base_url = &resources.config.base_url;
        let url = resources
            .payments
            .create_checkout_session(&CheckoutRequest {
                customer_id,
                price_id: body.price_id,
                success_url: format!(
                    "{base_url}/subscription/success?session_id={{CHECKOUT_SESSION_ID}}"
                ),
                cancel_url: format!("{base_url}/subscription"),
                metadata,
            })
            .await?;

        info!(user_id = %identity.uid, "Checkout session created");
        Ok((StatusCode::OK, Json(CheckoutResponse { url })).into_response())
    }

    /// Handle POST /api/subscription/confirm - activate Coach Pro after checkout
    async fn handle_confirm_subscription(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<ConfirmSubscriptionRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let session_id = request.body.session_id;
        if session_id.trim().is_empty() {
            return Err(AppError::missing_field("sessionId is required"));
        }

        let coaches = resources.database.coaches();
        let coach = coaches
            .get_by_user_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;
        if coach.subscription_status.is_active() {
            let response = ConfirmSubscriptionResponse {
                success: true,
                subscription_status: coach.subscription_status,
            };
            return Ok((StatusCode::OK, Json(response)).into_response());
        }

        let session = resources
            .payments
            .retrieve_checkout_session(&session_id)
            .await?;
        if !session_confirms(&session, &identity.uid) {
            return Err(AppError::invalid_input("Checkout session is not complete"));
        }

        coaches
            .set_subscription_status(&identity.uid, SubscriptionStatus::Active)
            .await?;
        if coach.stripe_customer_id.is_none() {
            if let Some(customer_id) = session.customer_id.as_deref() {
                coaches
                    .set_stripe_customer_id(&identity.uid, customer_id)
                    .await?;
            }
        }

        info!(user_id = %identity.uid, "Coach Pro subscription activated");
        let response = ConfirmSubscriptionResponse {
            success: true,
            subscription_status: SubscriptionStatus::Active,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/stripe/connect
    async fn handle_create_connect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<ConnectRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;

        let coach = resources
            .database
            .coaches()
            .get_by_user_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;

        let services = resources.database.services();
        if services.get_stripe_account(&coach.user_id).await?.is_some() {
            return Err(AppError::already_exists("Stripe account already exists"));
        }

        let email = body
            .email
            .filter(|e| !e.trim().is_empty())
            .or_else(|| identity.email.clone())
            .or_else(|| coach.email.clone())
            .ok_or_else(|| AppError::missing_field("email is required"))?;
        let country = body
            .country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_owned());

        let account_id = resources
            .payments
            .create_connect_account(&email, &country)
            .await?;
        services
            .create_stripe_account(&coach.user_id, &account_id, &email, &country)
            .await?;

        let base_url = &resources.config.base_url;
        let onboarding_url = resources
            .payments
            .create_account_link(
                &account_id,
                &format!("{base_url}/dashboard/coach/stripe/return"),
                &format!("{base_url}/dashboard/coach/stripe/refresh"),
            )
            .await?;

        info!(coach_id = %coach.user_id, %account_id, "Connected account created");
        let response = ConnectResponse {
            account_id,
            onboarding_url,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/stripe/connect
    async fn handle_get_connect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<IdTokenQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, query.id_token.as_deref()).await?;
        let services = resources.database.services();
        let account = services
            .get_stripe_account(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Stripe account not found"))?;

        let account = Self::refresh_status(&resources, account).await?;
        Ok((StatusCode::OK, Json(account)).into_response())
    }

    /// Pull the onboarding state from the processor; a failed lookup keeps the stored state
    async fn refresh_status(
        resources: &ServerResources,
        mut account: StripeAccount,
    ) -> Result<StripeAccount, AppError> {
        let state = match resources
            .payments
            .retrieve_account(&account.stripe_account_id)
            .await
        {
            Ok(state) => state,
            Err(e) => {
                warn!(coach_id = %account.coach_id, error = %e, "Connected account refresh failed");
                return Ok(account);
            }
        };

        let status = account_status(&state);
        if status != account.account_status {
            resources
                .database
                .services()
                .set_stripe_account_status(&account.coach_id, status)
                .await?;
            info!(
                coach_id = %account.coach_id,
                status = status.as_str(),
                "Connected account status changed"
            );
            account.account_status = status;
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_state_maps_to_status() {
        let mut state = ConnectedAccountState::default();
        assert_eq!(account_status(&state), ConnectAccountStatus::Pending);
        state.disabled_reason = Some("requirements.past_due".to_owned());
        assert_eq!(account_status(&state), ConnectAccountStatus::Restricted);
        state.charges_enabled = true;
        assert_eq!(account_status(&state), ConnectAccountStatus::Active);
    }

    #[test]
    fn only_complete_sessions_for_the_caller_confirm() {
        let mut session = CheckoutSessionState {
            complete: false,
            customer_id: Some("cus_1".to_owned()),
            metadata: BTreeMap::from([
                ("userId".to_owned(), "coach-1".to_owned()),
                ("type".to_owned(), SUBSCRIPTION_TYPE.to_owned()),
            ]),
        };
        assert!(!session_confirms(&session, "coach-1"));
        session.complete = true;
        assert!(session_confirms(&session, "coach-1"));
        assert!(!session_confirms(&session, "coach-2"));
        session.metadata.remove("type");
        assert!(!session_confirms(&session, "coach-1"));
    }
}
