// ABOUTME: Integration tests for the job board and application route handlers
// ABOUTME: Covers posting, the subscription gate, duplicate applications and poster-only updates
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
use reviewmycoach_server::models::{ApplicationStatus, Job, SubscriptionStatus, UserRole};
use reviewmycoach_server::notifications::Notification;
use reviewmycoach_server::routes::jobs::{
    ApplicationsResponse, CreateApplicationResponse, JobsResponse, JobsRoutes,
};
use serde_json::{json, Value};

fn router(ctx: &TestContext) -> axum::Router {
    JobsRoutes::routes(ctx.resources.clone())
}

async fn post_job(ctx: &TestContext, poster: &str, title: &str, sport: &str) -> Job {
    let response = AxumTestRequest::post("/api/jobs")
        .header("authorization", &ctx.bearer(poster, UserRole::Student))
        .json(&json!({
            "title": title,
            "description": "Twice a week for the spring season",
            "sport": sport,
            "budget": 500.0
        }))
        .send(router(ctx))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn pro_coach(ctx: &TestContext, uid: &str, username: &str) {
    create_test_coach(ctx.database(), uid, username, &["Soccer"], Some(45.0)).await;
    ctx.database()
        .coaches()
        .set_subscription_status(uid, SubscriptionStatus::Active)
        .await
        .unwrap();
}

fn application(job_id: &str) -> Value {
    json!({
        "jobId": job_id,
        "coverLetter": "I coached U12 travel teams for six seasons.",
        "hourlyRate": 45.0,
        "estimatedHours": 20.0,
        "availability": "Weekday evenings"
    })
}

#[tokio::test]
async fn test_post_and_list_jobs() {
    let ctx = create_test_context().await;
    let job = post_job(&ctx, "parent-1", "Goalkeeper training", "Soccer").await;
    post_job(&ctx, "parent-2", "Serve practice", "Tennis").await;

    let fetched: Job = AxumTestRequest::get(&format!("/api/jobs/{}", job.id))
        .send(router(&ctx))
        .await
        .json();
    assert_eq!(fetched.title, "Goalkeeper training");
    assert_eq!(fetched.applicants, 0);

    let soccer: JobsResponse = AxumTestRequest::get("/api/jobs?sport=Soccer")
        .send(router(&ctx))
        .await
        .json();
    assert_eq!(soccer.jobs.len(), 1);
    assert_eq!(soccer.jobs[0].id, job.id);

    let missing = AxumTestRequest::get("/api/jobs/does-not-exist")
        .send(router(&ctx))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_job_requires_title() {
    let ctx = create_test_context().await;

    let response = AxumTestRequest::post("/api/jobs")
        .header("authorization", &ctx.bearer("parent-1", UserRole::Student))
        .json(&json!({ "description": "No title given" }))
        .send(router(&ctx))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_apply_requires_active_subscription() {
    let ctx = create_test_context().await;
    let job = post_job(&ctx, "parent-1", "Goalkeeper training", "Soccer").await;

    let no_profile = AxumTestRequest::post("/api/jobs/applications")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&application(&job.id))
        .send(router(&ctx))
        .await;
    assert_eq!(no_profile.status_code(), StatusCode::NOT_FOUND);

    create_test_coach(ctx.database(), "coach-1", "keepercoach", &["Soccer"], None).await;
    let inactive = AxumTestRequest::post("/api/jobs/applications")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&application(&job.id))
        .send(router(&ctx))
        .await;
    assert_eq!(inactive.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        inactive.error_message(),
        "Coach Pro subscription required to apply for jobs"
    );
}

#[tokio::test]
async fn test_apply_once_per_job() {
    let ctx = create_test_context().await;
    let job = post_job(&ctx, "parent-1", "Goalkeeper training", "Soccer").await;
    pro_coach(&ctx, "coach-1", "keepercoach").await;

    let first = AxumTestRequest::post("/api/jobs/applications")
        .json(&{
            let mut body = application(&job.id);
            body["idToken"] = json!(ctx.token("coach-1", UserRole::Coach));
            body
        })
        .send(router(&ctx))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK, "{}", first.text());
    let created: CreateApplicationResponse = first.json();
    assert!(created.success);

    let second = AxumTestRequest::post("/api/jobs/applications")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&application(&job.id))
        .send(router(&ctx))
        .await;
    assert_eq!(second.status_code(), StatusCode::BAD_REQUEST);

    let job = ctx.database().jobs().get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(job.applicants, 1);

    match ctx.notifier.sent().as_slice() {
        [Notification::ApplicationReceived {
            recipient_email,
            applicant_name,
            ..
        }] => {
            assert_eq!(recipient_email, "parent-1@example.com");
            assert_eq!(applicant_name, "Coach keepercoach");
        }
        other => panic!("unexpected notifications {other:?}"),
    }
}

#[tokio::test]
async fn test_incomplete_application_rejected() {
    let ctx = create_test_context().await;
    let job = post_job(&ctx, "parent-1", "Goalkeeper training", "Soccer").await;
    pro_coach(&ctx, "coach-1", "keepercoach").await;

    let mut body = application(&job.id);
    body["availability"] = json!("");
    let response = AxumTestRequest::post("/api/jobs/applications")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&body)
        .send(router(&ctx))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.error_message(), "All application fields are required");
}

#[tokio::test]
async fn test_poster_reviews_applications() {
    let ctx = create_test_context().await;
    let job = post_job(&ctx, "parent-1", "Goalkeeper training", "Soccer").await;
    pro_coach(&ctx, "coach-1", "keepercoach").await;
    let created: CreateApplicationResponse = AxumTestRequest::post("/api/jobs/applications")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&application(&job.id))
        .send(router(&ctx))
        .await
        .json();

    let outsider = AxumTestRequest::get(&format!("/api/jobs/applications?jobId={}", job.id))
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .send(router(&ctx))
        .await;
    assert_eq!(outsider.status_code(), StatusCode::FORBIDDEN);

    let listed: ApplicationsResponse =
        AxumTestRequest::get(&format!("/api/jobs/applications?jobId={}", job.id))
            .header("authorization", &ctx.bearer("parent-1", UserRole::Student))
            .send(router(&ctx))
            .await
            .json();
    assert_eq!(listed.applications.len(), 1);

    let hijack = AxumTestRequest::put("/api/jobs/applications")
        .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
        .json(&json!({ "applicationId": created.application_id, "status": "accepted" }))
        .send(router(&ctx))
        .await;
    assert_eq!(hijack.status_code(), StatusCode::FORBIDDEN);

    let accepted = AxumTestRequest::put("/api/jobs/applications")
        .header("authorization", &ctx.bearer("parent-1", UserRole::Student))
        .json(&json!({
            "applicationId": created.application_id,
            "status": "accepted",
            "feedback": "See you Monday"
        }))
        .send(router(&ctx))
        .await;
    assert_eq!(accepted.status_code(), StatusCode::OK);

    let mine: ApplicationsResponse =
        AxumTestRequest::get("/api/jobs/applications?userId=coach-1&status=accepted")
            .header("authorization", &ctx.bearer("coach-1", UserRole::Coach))
            .send(router(&ctx))
            .await
            .json();
    assert_eq!(mine.applications.len(), 1);
    assert_eq!(mine.applications[0].status, ApplicationStatus::Accepted);
    assert_eq!(mine.applications[0].feedback.as_deref(), Some("See you Monday"));

    let missing = AxumTestRequest::put("/api/jobs/applications")
        .header("authorization", &ctx.bearer("parent-1", UserRole::Student))
        .json(&json!({ "applicationId": "nope", "status": "rejected" }))
        .send(router(&ctx))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let bad_status = AxumTestRequest::put("/api/jobs/applications")
        .header("authorization", &ctx.bearer("parent-1", UserRole::Student))
        .json(&json!({ "applicationId": created.application_id, "status": "maybe" }))
        .send(router(&ctx))
        .await;
    assert_eq!(bad_status.status_code(), StatusCode::BAD_REQUEST);
}
