// ABOUTME: Integration tests for account, report, analytics and health routes
// ABOUTME: Also drives the assembled router to check request-id propagation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{create_test_coach, create_test_context, TestContext};
use helpers::axum_test::AxumTestRequest;
use reviewmycoach_server::{
    database::{CreateBookingRequest, CreateReviewRequest},
    models::{BookingStatus, UserProfile, UserRole},
    routes::{
        account::{VisibilityResponse, VisibilityUpdateResponse},
        health::{HealthResponse, HealthStatus},
        reports::{CreateReportResponse, ReportsResponse},
        AccountRoutes, AnalyticsRoutes, HealthRoutes, ReportsRoutes,
    },
    server::build_router,
};
use serde_json::{json, Value};

fn account(ctx: &TestContext) -> axum::Router {
    AccountRoutes::routes(ctx.resources.clone())
}

fn reports(ctx: &TestContext) -> axum::Router {
    ReportsRoutes::routes(ctx.resources.clone())
}

fn analytics(ctx: &TestContext) -> axum::Router {
    AnalyticsRoutes::routes(ctx.resources.clone())
}

#[tokio::test]
async fn test_profile_upsert_and_read() {
    let ctx = create_test_context().await;
    let auth = ctx.bearer("user-1", UserRole::Student);

    let missing = AxumTestRequest::get("/api/account/profile")
        .header("authorization", &auth)
        .send(account(&ctx))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.error_message(), "Profile not found");

    let saved: UserProfile = AxumTestRequest::post("/api/account/profile")
        .header("authorization", &auth)
        .json(&json!({ "displayName": "Jordan", "role": "coach" }))
        .send(account(&ctx))
        .await
        .json();
    assert_eq!(saved.display_name, "Jordan");
    assert_eq!(saved.role, UserRole::Coach);
    assert_eq!(saved.email.as_deref(), Some("user-1@example.com"));

    let escalated: UserProfile = AxumTestRequest::post("/api/account/profile")
        .header("authorization", &auth)
        .json(&json!({ "role": "admin" }))
        .send(account(&ctx))
        .await
        .json();
    assert_eq!(escalated.role, UserRole::Coach);

    let fetched: UserProfile = AxumTestRequest::get("/api/account/profile")
        .header("authorization", &auth)
        .send(account(&ctx))
        .await
        .json();
    assert_eq!(fetched.id, "user-1");
    assert_eq!(fetched.display_name, "Jordan");
}

#[tokio::test]
async fn test_profile_visibility() {
    let ctx = create_test_context().await;
    let token = ctx.token("coach-1", UserRole::Coach);

    let no_coach = AxumTestRequest::get(&format!("/api/account/profile-visibility?idToken={token}"))
        .send(account(&ctx))
        .await;
    assert_eq!(no_coach.status_code(), StatusCode::NOT_FOUND);

    create_test_coach(ctx.database(), "coach-1", "runcoach", &["Running"], Some(40.0)).await;

    let updated: VisibilityUpdateResponse = AxumTestRequest::post("/api/account/profile-visibility")
        .json(&json!({ "isPublic": false, "idToken": token }))
        .send(account(&ctx))
        .await
        .json();
    assert!(!updated.is_public);
    assert_eq!(updated.message, "Profile is now private");

    let read: VisibilityResponse =
        AxumTestRequest::get(&format!("/api/account/profile-visibility?idToken={token}"))
            .send(account(&ctx))
            .await
            .json();
    assert!(!read.is_public);

    let no_flag = AxumTestRequest::post("/api/account/profile-visibility")
        .json(&json!({ "idToken": token }))
        .send(account(&ctx))
        .await;
    assert_eq!(no_flag.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(no_flag.error_message(), "Profile visibility status is required");
}

#[tokio::test]
async fn test_reports_flow() {
    let ctx = create_test_context().await;
    let reporter = ctx.bearer("student-1", UserRole::Student);

    let filed = AxumTestRequest::post("/api/reports")
        .header("authorization", &reporter)
        .json(&json!({
            "reportedItemType": "review",
            "reportedItemId": "review-9",
            "reason": "spam",
            "description": "Links to a betting site"
        }))
        .send(reports(&ctx))
        .await;
    assert_eq!(filed.status_code(), StatusCode::OK, "{}", filed.text());
    let created: CreateReportResponse = filed.json();
    assert!(created.success);

    let repeat = AxumTestRequest::post("/api/reports")
        .header("authorization", &reporter)
        .json(&json!({
            "reportedItemType": "review",
            "reportedItemId": "review-9",
            "reason": "spam"
        }))
        .send(reports(&ctx))
        .await;
    assert_eq!(repeat.status_code(), StatusCode::BAD_REQUEST);

    let incomplete = AxumTestRequest::post("/api/reports")
        .header("authorization", &reporter)
        .json(&json!({ "reportedItemType": "coach" }))
        .send(reports(&ctx))
        .await;
    assert_eq!(incomplete.status_code(), StatusCode::BAD_REQUEST);

    let not_admin = AxumTestRequest::get("/api/reports")
        .header("authorization", &reporter)
        .send(reports(&ctx))
        .await;
    assert_eq!(not_admin.status_code(), StatusCode::FORBIDDEN);

    let queue: ReportsResponse = AxumTestRequest::get("/api/reports")
        .header("authorization", &ctx.bearer("admin-1", UserRole::Admin))
        .send(reports(&ctx))
        .await
        .json();
    assert_eq!(queue.reports.len(), 1);
    assert_eq!(queue.reports[0].id, created.report_id);
    assert_eq!(queue.reports[0].reporter_id, "student-1");
}

#[tokio::test]
async fn test_analytics_access() {
    let ctx = create_test_context().await;
    let auth = ctx.bearer("coach-1", UserRole::Coach);

    let no_user = AxumTestRequest::get("/api/analytics")
        .header("authorization", &auth)
        .send(analytics(&ctx))
        .await;
    assert_eq!(no_user.status_code(), StatusCode::BAD_REQUEST);

    let someone_else = AxumTestRequest::get("/api/analytics?userId=coach-2")
        .header("authorization", &auth)
        .send(analytics(&ctx))
        .await;
    assert_eq!(someone_else.status_code(), StatusCode::FORBIDDEN);

    let no_coach = AxumTestRequest::get("/api/analytics?userId=coach-1")
        .header("authorization", &auth)
        .send(analytics(&ctx))
        .await;
    assert_eq!(no_coach.status_code(), StatusCode::NOT_FOUND);

    create_test_coach(ctx.database(), "coach-1", "liftcoach", &["Weightlifting"], None).await;
    let bad_range = AxumTestRequest::get("/api/analytics?userId=coach-1&timeRange=0")
        .header("authorization", &auth)
        .send(analytics(&ctx))
        .await;
    assert_eq!(bad_range.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_summarizes_activity() {
    let ctx = create_test_context().await;
    let db = ctx.database();
    create_test_coach(db, "coach-1", "liftcoach", &["Weightlifting"], None).await;

    db.reviews()
        .create(
            "coach-1",
            "student-1",
            "Sam",
            &CreateReviewRequest {
                rating: Some(4.0),
                review_text: "Clear cues and a sensible program".to_owned(),
                sport: Some("Weightlifting".to_owned()),
            },
        )
        .await
        .unwrap();
    db.coaches()
        .record_profile_view("coach-1", None)
        .await
        .unwrap();
    db.coaches()
        .record_profile_view("coach-1", Some("student-1"))
        .await
        .unwrap();
    for (status, amount) in [(BookingStatus::Completed, 120.0), (BookingStatus::Pending, 60.0)] {
        db.bookings()
            .create(&CreateBookingRequest {
                coach_id: "coach-1".to_owned(),
                student_id: "student-1".to_owned(),
                service_id: None,
                status,
                total_amount: amount,
                created_at: None,
            })
            .await
            .unwrap();
    }

    let response = AxumTestRequest::get(&format!(
        "/api/analytics?userId=coach-1&idToken={}",
        ctx.token("coach-1", UserRole::Coach)
    ))
    .send(analytics(&ctx))
    .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let body: Value = response.json();
    let stats = &body["analytics"];

    assert_eq!(stats["bookings"]["total"], 2);
    assert_eq!(stats["bookings"]["completed"], 1);
    assert_eq!(stats["bookings"]["pending"], 1);
    assert_eq!(stats["bookings"]["totalRevenue"], 120.0);
    assert_eq!(
        stats["bookings"]["monthlyRevenue"].as_array().unwrap().len(),
        13
    );
    assert_eq!(stats["reviews"]["total"], 1);
    assert_eq!(stats["reviews"]["averageRating"], 4.0);
    assert_eq!(stats["profileViews"]["total"], 2);
    assert_eq!(
        stats["profileViews"]["monthlyViews"].as_array().unwrap().len(),
        13
    );

    let quarter: Value = AxumTestRequest::get("/api/analytics?userId=coach-1&timeRange=3")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .send(analytics(&ctx))
        .await
        .json();
    assert_eq!(
        quarter["analytics"]["reviews"]["monthlyReviews"]
            .as_array()
            .unwrap()
            .len(),
        4
    );
}

#[tokio::test]
async fn test_health_reports_store() {
    let ctx = create_test_context().await;

    let response = AxumTestRequest::get("/health")
        .send(HealthRoutes::routes(ctx.resources.clone()))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let health: HealthResponse = response.json();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.database, "connected");
}

#[tokio::test]
async fn test_full_router_propagates_request_id() {
    let ctx = create_test_context().await;
    let router = build_router(&ctx.resources);

    let echoed = AxumTestRequest::get("/health")
        .header("x-request-id", "req-123")
        .send(router.clone())
        .await;
    assert_eq!(echoed.status_code(), StatusCode::OK);
    assert_eq!(echoed.header("x-request-id"), Some("req-123"));

    let generated = AxumTestRequest::get("/api/tags").send(router).await;
    assert_eq!(generated.status_code(), StatusCode::OK);
    assert!(generated.header("x-request-id").is_some());
}
