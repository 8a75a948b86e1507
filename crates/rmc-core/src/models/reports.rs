// ABOUTME: Abuse report record filed against a coach, review or message
// ABOUTME: One report per reporter and item
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Awaiting moderation
    #[default]
    Pending,
    /// Moderator acted on it
    Resolved,
    /// Moderator dismissed it
    Dismissed,
}

impl ReportStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "resolved" => Self::Resolved,
            "dismissed" => Self::Dismissed,
            _ => Self::Pending,
        }
    }
}

/// A report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Record identifier
    pub id: String,
    /// Reporting user
    pub reporter_id: String,
    /// Kind of item (coach, review, message...)
    pub reported_item_type: String,
    /// Id of the reported item
    pub reported_item_id: String,
    /// Short reason
    pub reason: String,
    /// Optional detail
    pub description: String,
    /// Moderation state
    pub status: ReportStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
