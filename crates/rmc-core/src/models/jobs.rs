// ABOUTME: Job posting and job application records
// ABOUTME: Applications are unique per job and coach; only the poster changes their status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a job posting accepts applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepting applications
    #[default]
    Open,
    /// Filled or withdrawn
    Closed,
}

impl JobStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "closed" => Self::Closed,
            _ => Self::Open,
        }
    }
}

/// Application review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Waiting for the poster
    #[default]
    Pending,
    /// Poster accepted the coach
    Accepted,
    /// Poster declined the coach
    Rejected,
}

impl ApplicationStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Strict parse used for user input
    #[must_use]
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Lenient parse used for stored rows
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or_default()
    }
}

/// A job posted by a student, parent or organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Record identifier
    pub id: String,
    /// Identity uid of the poster
    pub posted_by: String,
    /// Poster contact email, never serialized to clients
    #[serde(skip_serializing, default)]
    pub poster_email: Option<String>,
    /// Short title
    pub title: String,
    /// Full description
    pub description: String,
    /// Sport the job is for
    pub sport: Option<String>,
    /// Where the coaching happens
    pub location: Option<String>,
    /// Budget in dollars
    pub budget: Option<f64>,
    /// Number of applications received
    pub applicants: u32,
    /// Posting state
    pub status: JobStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A coach's application to a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    /// Record identifier
    pub id: String,
    /// Job applied to
    pub job_id: String,
    /// Applying coach (identity uid)
    pub coach_id: String,
    /// Coach display name at application time
    pub coach_name: String,
    /// Coach username at application time
    pub coach_username: String,
    /// Job title at application time
    pub job_title: String,
    /// Job poster (identity uid)
    pub job_posted_by: String,
    /// Cover letter
    pub cover_letter: String,
    /// Proposed hourly rate
    pub hourly_rate: f64,
    /// Estimated hours
    pub estimated_hours: f64,
    /// Availability description
    pub availability: String,
    /// Review state
    pub status: ApplicationStatus,
    /// Poster feedback
    pub feedback: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
