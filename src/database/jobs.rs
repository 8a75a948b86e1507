// ABOUTME: Database operations for job postings and coach job applications
// ABOUTME: Application insert and applicant counter bump commit together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::info;

use super::{format_timestamp, is_unique_violation, new_id, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::{ApplicationStatus, CoachProfile, Job, JobApplication, JobStatus};

const JOB_COLUMNS: &str = "id, posted_by, poster_email, title, description, sport, location, \
     budget, applicants, status, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, job_id, coach_id, coach_name, coach_username, job_title, \
     job_posted_by, cover_letter, hourly_rate, estimated_hours, availability, status, feedback, \
     created_at, updated_at";

const DUPLICATE_APPLICATION: &str = "You have already applied for this job";

/// Job posting body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJobRequest {
    /// Short title
    pub title: String,
    /// Full description
    pub description: String,
    /// Sport
    pub sport: Option<String>,
    /// Location
    pub location: Option<String>,
    /// Budget in dollars
    pub budget: Option<f64>,
}

/// Filters for the public job board
#[derive(Debug, Clone, Default)]
pub struct ListJobsFilter {
    /// Exact sport
    pub sport: Option<String>,
    /// Posting state
    pub status: Option<JobStatus>,
    /// Maximum rows
    pub limit: u32,
}

/// Application body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateApplicationRequest {
    /// Job applied to
    pub job_id: String,
    /// Cover letter
    pub cover_letter: String,
    /// Proposed hourly rate
    pub hourly_rate: Option<f64>,
    /// Estimated hours
    pub estimated_hours: Option<f64>,
    /// Availability description
    pub availability: String,
}

impl CreateApplicationRequest {
    /// Every field must be present and non-empty, numbers positive
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` when any field is missing
    pub fn validate(&self) -> AppResult<(f64, f64)> {
        let positive = |v: Option<f64>| v.filter(|n| n.is_finite() && *n > 0.0);
        match (
            self.cover_letter.trim().is_empty(),
            self.availability.trim().is_empty(),
            positive(self.hourly_rate),
            positive(self.estimated_hours),
        ) {
            (false, false, Some(rate), Some(hours)) => Ok((rate, hours)),
            _ => Err(AppError::invalid_input("All application fields are required")),
        }
    }
}

/// Job and application database operations
pub struct JobsManager {
    pool: SqlitePool,
}

impl JobsManager {
    /// Create a new jobs manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Post a job
    ///
    /// # Errors
    ///
    /// Returns `missing_field` for an empty title or description, and
    /// `database` on store failure
    pub async fn create_job(
        &self,
        posted_by: &str,
        poster_email: Option<&str>,
        request: &CreateJobRequest,
    ) -> AppResult<Job> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::missing_field("title is required"));
        }
        let description = request.description.trim();
        if description.is_empty() {
            return Err(AppError::missing_field("description is required"));
        }
        if request.budget.is_some_and(|b| b < 0.0) {
            return Err(AppError::invalid_input("Budget cannot be negative"));
        }

        let now = Utc::now();
        let job = Job {
            id: new_id(),
            posted_by: posted_by.to_owned(),
            poster_email: poster_email.map(ToOwned::to_owned),
            title: title.to_owned(),
            description: description.to_owned(),
            sport: request.sport.clone(),
            location: request.location.clone(),
            budget: request.budget,
            applicants: 0,
            status: JobStatus::Open,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO jobs (id, posted_by, poster_email, title, description, sport, location,
                              budget, applicants, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10, $10)
            ",
        )
        .bind(&job.id)
        .bind(&job.posted_by)
        .bind(&job.poster_email)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.sport)
        .bind(&job.location)
        .bind(job.budget)
        .bind(job.status.as_str())
        .bind(format_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create job: {e}")))?;

        Ok(job)
    }

    /// Get a job by id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_job(&self, job_id: &str) -> AppResult<Option<Job>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get job: {e}")))?;

        row.map(|r| row_to_job(&r)).transpose()
    }

    /// Newest postings matching the filter
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_jobs(&self, filter: &ListJobsFilter) -> AppResult<Vec<Job>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE 1 = 1"));
        if let Some(sport) = &filter.sport {
            builder.push(" AND sport = ").push_bind(sport.clone());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(filter.limit));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list jobs: {e}")))?;

        rows.iter().map(row_to_job).collect()
    }

    /// File a coach's application and bump the job's applicant counter
    ///
    /// Name, username and job title are copied onto the application as they
    /// are at application time.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for missing fields, `already_exists` for a
    /// second application to the same job, and `database` on store failure
    pub async fn create_application(
        &self,
        coach: &CoachProfile,
        job: &Job,
        request: &CreateApplicationRequest,
    ) -> AppResult<JobApplication> {
        let (hourly_rate, estimated_hours) = request.validate()?;

        if self.has_applied(&job.id, &coach.user_id).await? {
            return Err(AppError::already_exists(DUPLICATE_APPLICATION));
        }

        let now = Utc::now();
        let now_str = format_timestamp(&now);
        let application = JobApplication {
            id: new_id(),
            job_id: job.id.clone(),
            coach_id: coach.user_id.clone(),
            coach_name: coach.display_name.clone(),
            coach_username: coach.username.clone(),
            job_title: job.title.clone(),
            job_posted_by: job.posted_by.clone(),
            cover_letter: request.cover_letter.trim().to_owned(),
            hourly_rate,
            estimated_hours,
            availability: request.availability.trim().to_owned(),
            status: ApplicationStatus::Pending,
            feedback: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO job_applications (
                id, job_id, coach_id, coach_name, coach_username, job_title, job_posted_by,
                cover_letter, hourly_rate, estimated_hours, availability, status, feedback,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NULL, $13, $13)
            ",
        )
        .bind(&application.id)
        .bind(&application.job_id)
        .bind(&application.coach_id)
        .bind(&application.coach_name)
        .bind(&application.coach_username)
        .bind(&application.job_title)
        .bind(&application.job_posted_by)
        .bind(&application.cover_letter)
        .bind(application.hourly_rate)
        .bind(application.estimated_hours)
        .bind(&application.availability)
        .bind(application.status.as_str())
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists(DUPLICATE_APPLICATION)
            } else {
                AppError::database(format!("Failed to create application: {e}"))
            }
        })?;

        sqlx::query("UPDATE jobs SET applicants = applicants + 1, updated_at = $1 WHERE id = $2")
            .bind(&now_str)
            .bind(&job.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update applicant count: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit application: {e}")))?;

        info!(
            job_id = %job.id,
            coach_id = %coach.user_id,
            application_id = %application.id,
            "Job application created"
        );
        Ok(application)
    }

    /// Whether the coach already applied to the job
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn has_applied(&self, job_id: &str, coach_id: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM job_applications WHERE job_id = $1 AND coach_id = $2",
        )
        .bind(job_id)
        .bind(coach_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check application: {e}")))?;
        Ok(count > 0)
    }

    /// Get an application by id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_application(&self, application_id: &str) -> AppResult<Option<JobApplication>> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = $1"
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get application: {e}")))?;

        row.map(|r| row_to_application(&r)).transpose()
    }

    /// A coach's applications, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_by_coach(
        &self,
        coach_id: &str,
        status: Option<ApplicationStatus>,
    ) -> AppResult<Vec<JobApplication>> {
        self.list_where("coach_id", coach_id, status).await
    }

    /// A job's applications, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_by_job(
        &self,
        job_id: &str,
        status: Option<ApplicationStatus>,
    ) -> AppResult<Vec<JobApplication>> {
        self.list_where("job_id", job_id, status).await
    }

    async fn list_where(
        &self,
        column: &'static str,
        value: &str,
        status: Option<ApplicationStatus>,
    ) -> AppResult<Vec<JobApplication>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE {column} = "
        ));
        builder.push_bind(value.to_owned());
        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC, id ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list applications: {e}")))?;

        rows.iter().map(row_to_application).collect()
    }

    /// Set status and feedback on an application
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        feedback: Option<&str>,
    ) -> AppResult<Option<JobApplication>> {
        let result = sqlx::query(
            "UPDATE job_applications SET status = $1, feedback = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(status.as_str())
        .bind(feedback.unwrap_or_default())
        .bind(format_timestamp(&Utc::now()))
        .bind(application_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update application: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_application(application_id).await
    }

    /// A coach's applications created within `[from, to)`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_by_coach_in_range(
        &self,
        coach_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<JobApplication>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {APPLICATION_COLUMNS} FROM job_applications
            WHERE coach_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "
        ))
        .bind(coach_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list applications in range: {e}")))?;

        rows.iter().map(row_to_application).collect()
    }
}

fn row_to_job(row: &SqliteRow) -> AppResult<Job> {
    let applicants: i64 = row.get("applicants");
    let status_str: String = row.get("status");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Job {
        id: row.get("id"),
        posted_by: row.get("posted_by"),
        poster_email: row.get("poster_email"),
        title: row.get("title"),
        description: row.get("description"),
        sport: row.get("sport"),
        location: row.get("location"),
        budget: row.get("budget"),
        applicants: applicants.max(0) as u32,
        status: JobStatus::parse(&status_str),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

fn row_to_application(row: &SqliteRow) -> AppResult<JobApplication> {
    let status_str: String = row.get("status");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(JobApplication {
        id: row.get("id"),
        job_id: row.get("job_id"),
        coach_id: row.get("coach_id"),
        coach_name: row.get("coach_name"),
        coach_username: row.get("coach_username"),
        job_title: row.get("job_title"),
        job_posted_by: row.get("job_posted_by"),
        cover_letter: row.get("cover_letter"),
        hourly_rate: row.get("hourly_rate"),
        estimated_hours: row.get("estimated_hours"),
        availability: row.get("availability"),
        status: ApplicationStatus::parse(&status_str),
        feedback: row.get("feedback"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::CreateApplicationRequest;

    #[test]
    fn every_application_field_is_required() {
        let full = CreateApplicationRequest {
            job_id: "job".to_owned(),
            cover_letter: "I have coached varsity teams".to_owned(),
            hourly_rate: Some(45.0),
            estimated_hours: Some(10.0),
            availability: "Weekends".to_owned(),
        };
        assert_eq!(full.validate().unwrap(), (45.0, 10.0));

        let mut missing = full.clone();
        missing.availability = "  ".to_owned();
        assert!(missing.validate().is_err());

        let mut zero = full;
        zero.hourly_rate = Some(0.0);
        assert!(zero.validate().is_err());
    }
}
