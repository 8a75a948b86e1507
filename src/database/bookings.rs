// ABOUTME: Database operations for service bookings
// ABOUTME: Range reads feed the coach analytics dashboard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{format_timestamp, new_id, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, BookingStatus};

/// New booking
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    /// Booked coach
    pub coach_id: String,
    /// Booking student
    pub student_id: String,
    /// Booked service
    pub service_id: Option<String>,
    /// Initial state
    pub status: BookingStatus,
    /// Amount in dollars
    pub total_amount: f64,
    /// Creation time, defaults to now
    pub created_at: Option<DateTime<Utc>>,
}

/// Booking database operations
pub struct BookingsManager {
    pool: SqlitePool,
}

impl BookingsManager {
    /// Create a new bookings manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a booking
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for a negative amount and `database` on store failure
    pub async fn create(&self, request: &CreateBookingRequest) -> AppResult<Booking> {
        if request.total_amount < 0.0 {
            return Err(AppError::invalid_input("Booking amount cannot be negative"));
        }
        let booking = Booking {
            id: new_id(),
            coach_id: request.coach_id.clone(),
            student_id: request.student_id.clone(),
            service_id: request.service_id.clone(),
            status: request.status,
            total_amount: request.total_amount,
            created_at: request.created_at.unwrap_or_else(Utc::now),
        };

        sqlx::query(
            r"
            INSERT INTO bookings (id, coach_id, student_id, service_id, status, total_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&booking.id)
        .bind(&booking.coach_id)
        .bind(&booking.student_id)
        .bind(&booking.service_id)
        .bind(booking.status.as_str())
        .bind(booking.total_amount)
        .bind(format_timestamp(&booking.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create booking: {e}")))?;

        Ok(booking)
    }

    /// A coach's bookings created within `[from, to)`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_in_range(
        &self,
        coach_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query(
            r"
            SELECT id, coach_id, student_id, service_id, status, total_amount, created_at
            FROM bookings
            WHERE coach_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            ",
        )
        .bind(coach_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list bookings: {e}")))?;

        rows.iter().map(row_to_booking).collect()
    }
}

fn row_to_booking(row: &SqliteRow) -> AppResult<Booking> {
    let status_str: String = row.get("status");
    let created_at_str: String = row.get("created_at");

    Ok(Booking {
        id: row.get("id"),
        coach_id: row.get("coach_id"),
        student_id: row.get("student_id"),
        service_id: row.get("service_id"),
        status: BookingStatus::parse(&status_str),
        total_amount: row.get("total_amount"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}
