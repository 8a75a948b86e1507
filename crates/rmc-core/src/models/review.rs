// ABOUTME: Review record left by a student for a coach
// ABOUTME: Immutable once created; at most one per student and coach
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student's review of a coach
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Record identifier
    pub id: String,
    /// Reviewed coach
    pub coach_id: String,
    /// Reviewing student (identity uid)
    pub student_id: String,
    /// Student display name at the time of the review
    pub student_name: String,
    /// Rating, 1 to 5
    pub rating: u8,
    /// Review body
    pub review_text: String,
    /// Sport the review refers to
    pub sport: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
