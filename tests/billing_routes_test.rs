// ABOUTME: Integration tests for subscription checkout, connected accounts and services
// ABOUTME: Drives the billing and service routes against a recording payment provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{create_test_coach, create_test_context, TestContext, TEST_JWT_SECRET};
use helpers::axum_test::AxumTestRequest;
use reviewmycoach_server::{
    auth::{JwtIdentityVerifier, VerifiedIdentity},
    config::ServerConfig,
    database::Database,
    models::{
        ConnectAccountStatus, RecurringInterval, Service, StripeAccount, SubscriptionStatus,
        UserRole,
    },
    notifications::LogNotifier,
    payments::{CheckoutSessionState, UnconfiguredPayments},
    resources::ServerResources,
    routes::{
        billing::{CheckoutResponse, ConfirmSubscriptionResponse, ConnectResponse},
        services::ServicesResponse,
        BillingRoutes, ServicesRoutes,
    },
};
use serde_json::json;

fn billing(ctx: &TestContext) -> axum::Router {
    BillingRoutes::routes(ctx.resources.clone())
}

fn services(ctx: &TestContext) -> axum::Router {
    ServicesRoutes::routes(ctx.resources.clone())
}

async fn coach_context() -> TestContext {
    let ctx = create_test_context().await;
    create_test_coach(ctx.database(), "coach-1", "tenniscoach", &["Tennis"], Some(80.0)).await;
    ctx
}

fn lesson() -> serde_json::Value {
    json!({
        "title": "Private lesson",
        "description": "One hour on court",
        "price": 49.99,
        "duration": 60,
        "category": "lesson",
        "deliverables": ["Video breakdown"]
    })
}

#[tokio::test]
async fn test_checkout_creates_customer_once() {
    let ctx = coach_context().await;

    let response = AxumTestRequest::post("/api/subscription/create-checkout")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&json!({ "priceId": "price_pro", "userId": "coach-1", "plan": "monthly" }))
        .send(billing(&ctx))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let checkout: CheckoutResponse = response.json();
    assert_eq!(checkout.url, "https://checkout.example.com/c/pay/cs_test");

    let coach = ctx
        .database()
        .coaches()
        .get_by_user_id("coach-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coach.stripe_customer_id.as_deref(), Some("cus_test"));

    let request = ctx.payments.last_checkout.lock().unwrap().clone().unwrap();
    assert_eq!(request.customer_id, "cus_test");
    assert_eq!(request.price_id, "price_pro");
    assert_eq!(request.metadata.get("type").unwrap(), "coach_pro_subscription");
    assert_eq!(request.metadata.get("plan").unwrap(), "monthly");

    AxumTestRequest::post("/api/subscription/create-checkout")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&json!({ "priceId": "price_pro", "userId": "coach-1" }))
        .send(billing(&ctx))
        .await;
    let customers = ctx
        .payments
        .calls()
        .iter()
        .filter(|c| c.as_str() == "create_customer")
        .count();
    assert_eq!(customers, 1);
}

#[tokio::test]
async fn test_checkout_rejections() {
    let ctx = coach_context().await;
    let auth = ctx.bearer("coach-1", UserRole::Coach);

    let other_user = AxumTestRequest::post("/api/subscription/create-checkout")
        .header("authorization", &auth)
        .json(&json!({ "priceId": "price_pro", "userId": "coach-2" }))
        .send(billing(&ctx))
        .await;
    assert_eq!(other_user.status_code(), StatusCode::FORBIDDEN);

    let no_price = AxumTestRequest::post("/api/subscription/create-checkout")
        .header("authorization", &auth)
        .json(&json!({ "userId": "coach-1" }))
        .send(billing(&ctx))
        .await;
    assert_eq!(no_price.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(no_price.error_message(), "priceId is required");

    ctx.database()
        .coaches()
        .set_subscription_status("coach-1", SubscriptionStatus::Active)
        .await
        .unwrap();
    let subscribed = AxumTestRequest::post("/api/subscription/create-checkout")
        .header("authorization", &auth)
        .json(&json!({ "priceId": "price_pro", "userId": "coach-1" }))
        .send(billing(&ctx))
        .await;
    assert_eq!(subscribed.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(subscribed.error_message(), "Already subscribed to Coach Pro");
}

#[tokio::test]
async fn test_confirm_activates_subscription() {
    let ctx = coach_context().await;
    let auth = ctx.bearer("coach-1", UserRole::Coach);

    let pending = AxumTestRequest::post("/api/subscription/confirm")
        .header("authorization", &auth)
        .json(&json!({ "sessionId": "cs_test" }))
        .send(billing(&ctx))
        .await;
    assert_eq!(pending.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(pending.error_message(), "Checkout session is not complete");

    *ctx.payments.checkout_session.lock().unwrap() = CheckoutSessionState {
        complete: true,
        customer_id: Some("cus_from_session".to_owned()),
        metadata: BTreeMap::from([
            ("type".to_owned(), "coach_pro_subscription".to_owned()),
            ("userId".to_owned(), "coach-1".to_owned()),
        ]),
    };
    let confirmed = AxumTestRequest::post("/api/subscription/confirm")
        .header("authorization", &auth)
        .json(&json!({ "sessionId": "cs_test" }))
        .send(billing(&ctx))
        .await;
    assert_eq!(confirmed.status_code(), StatusCode::OK, "{}", confirmed.text());
    let body: ConfirmSubscriptionResponse = confirmed.json();
    assert_eq!(body.subscription_status, SubscriptionStatus::Active);

    let coach = ctx
        .database()
        .coaches()
        .get_by_user_id("coach-1")
        .await
        .unwrap()
        .unwrap();
    assert!(coach.subscription_status.is_active());
    assert_eq!(coach.stripe_customer_id.as_deref(), Some("cus_from_session"));

    let missing = AxumTestRequest::post("/api/subscription/confirm")
        .header("authorization", &auth)
        .json(&json!({}))
        .send(billing(&ctx))
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_connect_account_lifecycle() {
    let ctx = coach_context().await;
    let auth = ctx.bearer("coach-1", UserRole::Coach);

    let not_yet = AxumTestRequest::get("/api/stripe/connect")
        .header("authorization", &auth)
        .send(billing(&ctx))
        .await;
    assert_eq!(not_yet.status_code(), StatusCode::NOT_FOUND);

    let created = AxumTestRequest::post("/api/stripe/connect")
        .header("authorization", &auth)
        .json(&json!({}))
        .send(billing(&ctx))
        .await;
    assert_eq!(created.status_code(), StatusCode::OK, "{}", created.text());
    let connect: ConnectResponse = created.json();
    assert_eq!(connect.account_id, "acct_test");
    assert_eq!(connect.onboarding_url, "https://connect.example.com/setup/acct_test");

    let again = AxumTestRequest::post("/api/stripe/connect")
        .header("authorization", &auth)
        .json(&json!({}))
        .send(billing(&ctx))
        .await;
    assert_eq!(again.status_code(), StatusCode::BAD_REQUEST);

    let pending: StripeAccount = AxumTestRequest::get("/api/stripe/connect")
        .header("authorization", &auth)
        .send(billing(&ctx))
        .await
        .json();
    assert_eq!(pending.account_status, ConnectAccountStatus::Pending);
    assert_eq!(pending.email, "coach-1@example.com");

    ctx.payments.account_state.lock().unwrap().charges_enabled = true;
    let active: StripeAccount = AxumTestRequest::get(&format!(
        "/api/stripe/connect?idToken={}",
        ctx.token("coach-1", UserRole::Coach)
    ))
    .send(billing(&ctx))
    .await
    .json();
    assert_eq!(active.account_status, ConnectAccountStatus::Active);

    let stored = ctx
        .database()
        .services()
        .get_stripe_account("coach-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.account_status, ConnectAccountStatus::Active);
}

#[tokio::test]
async fn test_service_requires_active_account() {
    let ctx = coach_context().await;
    let auth = ctx.bearer("coach-1", UserRole::Coach);

    let no_account = AxumTestRequest::post("/api/services")
        .header("authorization", &auth)
        .json(&lesson())
        .send(services(&ctx))
        .await;
    assert_eq!(no_account.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        no_account.error_message(),
        "Stripe account not found. Please connect your Stripe account first."
    );

    ctx.database()
        .services()
        .create_stripe_account("coach-1", "acct_test", "coach-1@example.com", "US")
        .await
        .unwrap();
    let inactive = AxumTestRequest::post("/api/services")
        .header("authorization", &auth)
        .json(&lesson())
        .send(services(&ctx))
        .await;
    assert_eq!(inactive.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        inactive.error_message(),
        "Stripe account is not active. Please complete your account setup."
    );
}

#[tokio::test]
async fn test_create_and_list_services() {
    let ctx = coach_context().await;
    let auth = ctx.bearer("coach-1", UserRole::Coach);
    let accounts = ctx.database().services();
    accounts
        .create_stripe_account("coach-1", "acct_test", "coach-1@example.com", "US")
        .await
        .unwrap();
    accounts
        .set_stripe_account_status("coach-1", ConnectAccountStatus::Active)
        .await
        .unwrap();

    let response = AxumTestRequest::post("/api/services")
        .header("authorization", &auth)
        .json(&lesson())
        .send(services(&ctx))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let service: Service = response.json();
    assert_eq!(service.stripe_product_id, "prod_test");
    assert_eq!(service.stripe_price_id, "price_test");
    assert!(service.is_active);

    let prices = ctx.payments.prices.lock().unwrap().clone();
    assert_eq!(prices, vec![(4999, None, Some("acct_test".to_owned()))]);

    let mut monthly = lesson();
    monthly["title"] = json!("Monthly plan");
    monthly["isRecurring"] = json!(true);
    monthly["recurringInterval"] = json!("month");
    AxumTestRequest::post("/api/services")
        .header("authorization", &auth)
        .json(&monthly)
        .send(services(&ctx))
        .await;
    let last_price = ctx.payments.prices.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last_price.1, Some(RecurringInterval::Month));

    let coach = ctx
        .database()
        .coaches()
        .get_by_user_id("coach-1")
        .await
        .unwrap()
        .unwrap();
    assert!(coach.has_active_services);

    let listed: ServicesResponse = AxumTestRequest::get("/api/services?coachId=coach-1")
        .send(services(&ctx))
        .await
        .json();
    assert_eq!(listed.services.len(), 2);

    let bad_price = AxumTestRequest::post("/api/services")
        .header("authorization", &auth)
        .json(&{
            let mut body = lesson();
            body["price"] = json!(0);
            body
        })
        .send(services(&ctx))
        .await;
    assert_eq!(bad_price.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_processor_is_unavailable() {
    let config = ServerConfig::for_testing(TEST_JWT_SECRET);
    let database = Database::new(&config.database_url).await.unwrap();
    create_test_coach(&database, "coach-1", "tenniscoach", &["Tennis"], None).await;
    let resources = Arc::new(ServerResources::new(
        database,
        Arc::new(JwtIdentityVerifier::new(TEST_JWT_SECRET, None)),
        Arc::new(UnconfiguredPayments),
        Arc::new(LogNotifier),
        config,
    ));
    let identity = VerifiedIdentity {
        uid: "coach-1".to_owned(),
        email: Some("coach-1@example.com".to_owned()),
        role: UserRole::Coach,
    };
    let token = JwtIdentityVerifier::new(TEST_JWT_SECRET, None)
        .issue_token(&identity, Duration::from_secs(60))
        .unwrap();

    let response = AxumTestRequest::post("/api/subscription/create-checkout")
        .header("authorization", &format!("Bearer {token}"))
        .json(&json!({ "priceId": "price_pro", "userId": "coach-1" }))
        .send(BillingRoutes::routes(resources))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}
