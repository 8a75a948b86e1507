// ABOUTME: Database operations for reviews and the coach rating aggregate
// ABOUTME: Review insert and aggregate write-back share one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use tracing::info;

use super::{format_timestamp, is_unique_violation, new_id, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::Review;
use crate::rating::RatingAggregate;

/// Shortest accepted review text
pub const MIN_REVIEW_LENGTH: usize = 10;
/// Longest accepted review text
pub const MAX_REVIEW_LENGTH: usize = 1000;

const DUPLICATE_REVIEW: &str = "You have already reviewed this coach";

/// Review submission body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Star rating, integer 1-5
    pub rating: Option<f64>,
    /// Review body
    #[serde(default)]
    pub review_text: String,
    /// Sport the coaching was for
    pub sport: Option<String>,
}

impl CreateReviewRequest {
    /// Validated rating and trimmed text
    ///
    /// # Errors
    ///
    /// Returns `missing_field` or `invalid_input` describing the first problem
    pub fn validate(&self) -> AppResult<(u8, &str)> {
        let rating = self.rating.ok_or_else(|| AppError::missing_field("rating is required"))?;
        if rating.fract() != 0.0 || !(1.0..=5.0).contains(&rating) {
            return Err(AppError::invalid_input("Rating must be between 1 and 5"));
        }
        let text = self.review_text.trim();
        let len = text.chars().count();
        if !(MIN_REVIEW_LENGTH..=MAX_REVIEW_LENGTH).contains(&len) {
            return Err(AppError::invalid_input(format!(
                "Review text must be between {MIN_REVIEW_LENGTH} and {MAX_REVIEW_LENGTH} characters"
            )));
        }
        Ok((rating as u8, text))
    }
}

/// Review database operations
pub struct ReviewsManager {
    pool: SqlitePool,
}

impl ReviewsManager {
    /// Create a new reviews manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a review and refresh the coach's rating aggregate
    ///
    /// The insert, the re-read of every rating and the aggregate update run
    /// in one transaction. The insert goes first so the write lock covers the
    /// whole sequence and concurrent submissions cannot lose an update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, `already_exists` when the
    /// student already reviewed this coach, and `database` on store failure
    pub async fn create(
        &self,
        coach_id: &str,
        student_id: &str,
        student_name: &str,
        request: &CreateReviewRequest,
    ) -> AppResult<Review> {
        let (rating, text) = request.validate()?;

        if self.has_reviewed(coach_id, student_id).await? {
            return Err(AppError::already_exists(DUPLICATE_REVIEW));
        }

        let now = Utc::now();
        let review = Review {
            id: new_id(),
            coach_id: coach_id.to_owned(),
            student_id: student_id.to_owned(),
            student_name: student_name.to_owned(),
            rating,
            review_text: text.to_owned(),
            sport: request.sport.clone().filter(|s| !s.trim().is_empty()),
            created_at: now,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO reviews (id, coach_id, student_id, student_name, rating, review_text, sport, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&review.id)
        .bind(&review.coach_id)
        .bind(&review.student_id)
        .bind(&review.student_name)
        .bind(i64::from(review.rating))
        .bind(&review.review_text)
        .bind(&review.sport)
        .bind(format_timestamp(&now))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists(DUPLICATE_REVIEW)
            } else {
                AppError::database(format!("Failed to create review: {e}"))
            }
        })?;

        let aggregate = write_aggregate(&mut tx, coach_id).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit review: {e}")))?;

        info!(
            coach_id,
            review_id = %review.id,
            average_rating = aggregate.average_rating,
            total_reviews = aggregate.total_reviews,
            "Review created"
        );
        Ok(review)
    }

    /// Recompute the aggregate from scratch, for repairing drifted records
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn recompute(&self, coach_id: &str) -> AppResult<RatingAggregate> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        write_aggregate(&mut conn, coach_id).await
    }

    /// Whether this student already reviewed this coach
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn has_reviewed(&self, coach_id: &str, student_id: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE coach_id = $1 AND student_id = $2",
        )
        .bind(coach_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check existing review: {e}")))?;
        Ok(count > 0)
    }

    /// Newest reviews of a coach
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, coach_id: &str, limit: u32) -> AppResult<Vec<Review>> {
        let rows = sqlx::query(
            r"
            SELECT id, coach_id, student_id, student_name, rating, review_text, sport, created_at
            FROM reviews WHERE coach_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2
            ",
        )
        .bind(coach_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list reviews: {e}")))?;

        rows.iter().map(row_to_review).collect()
    }

    /// Reviews of a coach created within `[from, to)`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_in_range(
        &self,
        coach_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Review>> {
        let rows = sqlx::query(
            r"
            SELECT id, coach_id, student_id, student_name, rating, review_text, sport, created_at
            FROM reviews
            WHERE coach_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            ",
        )
        .bind(coach_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list reviews in range: {e}")))?;

        rows.iter().map(row_to_review).collect()
    }
}

/// Read every rating of the coach and store the reduced aggregate
async fn write_aggregate(
    conn: &mut SqliteConnection,
    coach_id: &str,
) -> AppResult<RatingAggregate> {
    let ratings: Vec<i64> = sqlx::query_scalar("SELECT rating FROM reviews WHERE coach_id = $1")
        .bind(coach_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to read ratings: {e}")))?;

    let ratings: Vec<u8> = ratings.into_iter().map(|r| r.clamp(0, 5) as u8).collect();
    let aggregate = RatingAggregate::from_ratings(&ratings);

    sqlx::query(
        "UPDATE coaches SET average_rating = $1, total_reviews = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(aggregate.average_rating)
    .bind(i64::from(aggregate.total_reviews))
    .bind(format_timestamp(&Utc::now()))
    .bind(coach_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to update rating aggregate: {e}")))?;

    Ok(aggregate)
}

fn row_to_review(row: &SqliteRow) -> AppResult<Review> {
    let rating: i64 = row.get("rating");
    let created_at_str: String = row.get("created_at");

    Ok(Review {
        id: row.get("id"),
        coach_id: row.get("coach_id"),
        student_id: row.get("student_id"),
        student_name: row.get("student_name"),
        rating: rating.clamp(0, 5) as u8,
        review_text: row.get("review_text"),
        sport: row.get("sport"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: Option<f64>, text: &str) -> CreateReviewRequest {
        CreateReviewRequest {
            rating,
            review_text: text.to_owned(),
            sport: None,
        }
    }

    #[test]
    fn validation_rules() {
        assert!(request(Some(5.0), "Great coach, highly recommend!").validate().is_ok());
        assert!(request(None, "Great coach, highly recommend!").validate().is_err());
        assert!(request(Some(0.0), "Great coach, highly recommend!").validate().is_err());
        assert!(request(Some(6.0), "Great coach, highly recommend!").validate().is_err());
        assert!(request(Some(4.5), "Great coach, highly recommend!").validate().is_err());
        assert!(request(Some(3.0), "   too short   ").validate().is_err());
        assert!(request(Some(3.0), &"x".repeat(1001)).validate().is_err());
    }
}
