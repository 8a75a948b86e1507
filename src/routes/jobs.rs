// ABOUTME: Route handlers for job postings and coach applications to them
// ABOUTME: Only subscribed coaches may apply; only the poster may review applications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
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
    database::{CreateApplicationRequest, CreateJobRequest, ListJobsFilter},
    errors::AppError,
    models::{ApplicationStatus, Job, JobApplication, JobStatus},
    notifications::{notify_best_effort, Notification},
    resources::ServerResources,
};

/// Default number of postings returned
const DEFAULT_JOB_LIMIT: u32 = 20;
/// Largest accepted posting `limit`
const MAX_JOB_LIMIT: u32 = 100;

/// Query parameters for `GET /api/jobs`
#[derive(Debug, Deserialize, Default)]
pub struct ListJobsQuery {
    /// Exact sport
    pub sport: Option<String>,
    /// `open` or `closed`
    pub status: Option<String>,
    /// Maximum results
    pub limit: Option<String>,
}

/// Query parameters for `GET /api/jobs/applications`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListApplicationsQuery {
    /// Applying coach; must be the caller
    pub user_id: Option<String>,
    /// Posting; the caller must be its poster
    pub job_id: Option<String>,
    /// `pending`, `accepted` or `rejected`
    pub status: Option<String>,
    /// Token when no header is sent
    pub id_token: Option<String>,
}

/// Body of `PUT /api/jobs/applications`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateApplicationRequest {
    /// Application to update
    pub application_id: String,
    /// New status
    pub status: String,
    /// Note for the coach
    pub feedback: Option<String>,
}

/// Job postings
#[derive(Debug, Serialize, Deserialize)]
pub struct JobsResponse {
    /// Newest first
    pub jobs: Vec<Job>,
}

/// Applications listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationsResponse {
    /// Newest first
    pub applications: Vec<JobApplication>,
}

/// Response for a submitted application
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationResponse {
    /// Always true on 200
    pub success: bool,
    /// New application id
    pub application_id: String,
    /// Human-readable outcome
    pub message: String,
}

/// Response for a status update
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateApplicationResponse {
    /// Always true on 200
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

/// Jobs routes handler
pub struct JobsRoutes;

impl JobsRoutes {
    /// Create all job routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/jobs",
                get(Self::handle_list_jobs).post(Self::handle_create_job),
            )
            .route(
                "/api/jobs/applications",
                get(Self::handle_list_applications)
                    .post(Self::handle_apply)
                    .put(Self::handle_update_application),
            )
            .route("/api/jobs/:id", get(Self::handle_get_job))
            .with_state(resources)
    }

    /// Handle POST /api/jobs
    async fn handle_create_job(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateJobRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, None).await?;
        let job = resources
            .database
            .jobs()
            .create_job(&identity.uid, identity.email.as_deref(), &body)
            .await?;
        info!(job_id = %job.id, posted_by = %job.posted_by, "Job posted");
        Ok((StatusCode::CREATED, Json(job)).into_response())
    }

    /// Handle GET /api/jobs
    async fn handle_list_jobs(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListJobsQuery>,
    ) -> Result<Response, AppError> {
        let filter = ListJobsFilter {
            sport: query.sport.filter(|s| !s.is_empty()),
            status: query.status.as_deref().map(JobStatus::parse),
            limit: parse_limit(query.limit.as_deref(), DEFAULT_JOB_LIMIT, MAX_JOB_LIMIT)?,
        };
        let jobs = resources.database.jobs().list_jobs(&filter).await?;
        Ok((StatusCode::OK, Json(JobsResponse { jobs })).into_response())
    }

    /// Handle GET /api/jobs/:id
    async fn handle_get_job(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let job = resources
            .database
            .jobs()
            .get_job(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))?;
        Ok((StatusCode::OK, Json(job)).into_response())
    }

    /// Handle GET /api/jobs/applications
    async fn handle_list_applications(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListApplicationsQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, query.id_token.as_deref()).await?;
        let status = match query.status.as_deref() {
            Some(s) => Some(
                ApplicationStatus::try_parse(s)
                    .ok_or_else(|| AppError::invalid_input("Invalid application status"))?,
            ),
            None => None,
        };
        let jobs = resources.database.jobs();

        let applications = match (query.user_id.as_deref(), query.job_id.as_deref()) {
            (Some(user_id), _) => {
                identity.require_user(user_id)?;
                jobs.list_by_coach(user_id, status).await?
            }
            (None, Some(job_id)) => {
                let job = jobs
                    .get_job(job_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Job not found"))?;
                identity.require_user(&job.posted_by)?;
                jobs.list_by_job(job_id, status).await?
            }
            (None, None) => {
                return Err(AppError::invalid_input("Either userId or jobId is required"))
            }
        };

        Ok((StatusCode::OK, Json(ApplicationsResponse { applications })).into_response())
    }

    /// Handle POST /api/jobs/applications
    async fn handle_apply(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<CreateApplicationRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;

        let coach = resources
            .database
            .coaches()
            .get_by_user_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Coach profile not found"))?;
        if !coach.subscription_status.is_active() {
            return Err(AppError::permission_denied(
                "Coach Pro subscription required to apply for jobs",
            ));
        }

        let job = resources
            .database
            .jobs()
            .get_job(&body.job_id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))?;

        let application = resources
            .database
            .jobs()
            .create_application(&coach, &job, &body)
            .await?;

        if let Some(recipient_email) = job.poster_email.clone() {
            notify_best_effort(
                resources.notifier.as_ref(),
                Notification::ApplicationReceived {
                    recipient_email,
                    job_title: job.title.clone(),
                    applicant_name: coach.display_name.clone(),
                },
            )
            .await;
        }

        let response = CreateApplicationResponse {
            success: true,
            application_id: application.id,
            message: "Application submitted successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/jobs/applications - poster accepts or rejects
    async fn handle_update_application(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<UpdateApplicationRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;
        let status = ApplicationStatus::try_parse(&body.status)
            .ok_or_else(|| AppError::invalid_input("Invalid application status"))?;

        let jobs = resources.database.jobs();
        let application = jobs
            .get_application(&body.application_id)
            .await?
            .ok_or_else(|| AppError::not_found("Application not found"))?;
        if application.job_posted_by != identity.uid {
            return Err(AppError::permission_denied(
                "Unauthorized to update this application",
            ));
        }

        let updated = jobs
            .update_status(&application.id, status, body.feedback.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("Application not found"))?;
        info!(application_id = %updated.id, status = status.as_str(), "Application updated");

        let coach_email = resources
            .database
            .coaches()
            .get_by_user_id(&updated.coach_id)
            .await
            .ok()
            .flatten()
            .and_then(|c| c.email);
        if let Some(recipient_email) = coach_email {
            notify_best_effort(
                resources.notifier.as_ref(),
                Notification::ApplicationStatusChanged {
                    recipient_email,
                    job_title: updated.job_title.clone(),
                    status: status.as_str().to_owned(),
                },
            )
            .await;
        }

        let response = UpdateApplicationResponse {
            success: true,
            message: "Application updated successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
