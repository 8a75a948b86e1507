// ABOUTME: Database operations for abuse reports
// ABOUTME: A reporter may report a given item only once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{format_timestamp, is_unique_violation, new_id, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::{Report, ReportStatus};

const DUPLICATE_REPORT: &str = "You have already reported this item";

/// Report body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateReportRequest {
    /// Kind of item
    pub reported_item_type: String,
    /// Id of the item
    pub reported_item_id: String,
    /// Short reason
    pub reason: String,
    /// Optional detail
    pub description: Option<String>,
}

/// Report database operations
pub struct ReportsManager {
    pool: SqlitePool,
}

impl ReportsManager {
    /// Create a new reports manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// File a report
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` when a required field is empty,
    /// `already_exists` for a repeat report and `database` on store failure
    pub async fn create(&self, reporter_id: &str, request: &CreateReportRequest) -> AppResult<Report> {
        let item_type = request.reported_item_type.trim();
        let item_id = request.reported_item_id.trim();
        let reason = request.reason.trim();
        if item_type.is_empty() || item_id.is_empty() || reason.is_empty() {
            return Err(AppError::invalid_input(
                "Missing required fields: reportedItemType, reportedItemId, reason",
            ));
        }

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE reporter_id = $1 AND reported_item_id = $2",
        )
        .bind(reporter_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check existing report: {e}")))?;
        if existing > 0 {
            return Err(AppError::already_exists(DUPLICATE_REPORT));
        }

        let now = Utc::now();
        let report = Report {
            id: new_id(),
            reporter_id: reporter_id.to_owned(),
            reported_item_type: item_type.to_owned(),
            reported_item_id: item_id.to_owned(),
            reason: reason.to_owned(),
            description: request.description.clone().unwrap_or_default(),
            status: ReportStatus::Pending,
            created_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO reports (id, reporter_id, reported_item_type, reported_item_id, reason, description, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&report.id)
        .bind(&report.reporter_id)
        .bind(&report.reported_item_type)
        .bind(&report.reported_item_id)
        .bind(&report.reason)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(format_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists(DUPLICATE_REPORT)
            } else {
                AppError::database(format!("Failed to create report: {e}"))
            }
        })?;

        Ok(report)
    }

    /// Every report, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self) -> AppResult<Vec<Report>> {
        let rows = sqlx::query(
            r"
            SELECT id, reporter_id, reported_item_type, reported_item_id, reason, description, status, created_at
            FROM reports ORDER BY created_at DESC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list reports: {e}")))?;

        rows.iter().map(row_to_report).collect()
    }
}

fn row_to_report(row: &SqliteRow) -> AppResult<Report> {
    let status_str: String = row.get("status");
    let created_at_str: String = row.get("created_at");

    Ok(Report {
        id: row.get("id"),
        reporter_id: row.get("reporter_id"),
        reported_item_type: row.get("reported_item_type"),
        reported_item_id: row.get("reported_item_id"),
        reason: row.get("reason"),
        description: row.get("description"),
        status: ReportStatus::parse(&status_str),
        created_at: parse_timestamp(&created_at_str)?,
    })
}
