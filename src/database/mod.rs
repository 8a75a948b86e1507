// ABOUTME: Store connection management, migrations and shared row-mapping helpers
// ABOUTME: Hands out one manager per record family over a shared SQLite pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

/// User profile storage
pub mod accounts;
/// Booking storage (read by analytics)
pub mod bookings;
/// Coach profile storage and push-down search queries
pub mod coaches;
/// Job postings and applications
pub mod jobs;
/// Conversations, messages and unread counters
pub mod messaging;
/// Abuse reports
pub mod reports;
/// Reviews and transactional rating maintenance
pub mod reviews;
/// Services and connected payment accounts
pub mod services;
/// Discovery tags
pub mod tags;

pub use accounts::{AccountsManager, UpsertProfileRequest};
pub use bookings::{BookingsManager, CreateBookingRequest};
pub use coaches::{validate_username, CoachesManager, CreateCoachRequest, UpdateCoachRequest};
pub use jobs::{CreateApplicationRequest, CreateJobRequest, JobsManager, ListJobsFilter};
pub use messaging::{MessagingManager, SendMessageRequest};
pub use reports::{CreateReportRequest, ReportsManager};
pub use reviews::{CreateReviewRequest, ReviewsManager};
pub use services::{CreateServiceRequest, ListServicesFilter, ServiceTerms, ServicesManager};
pub use tags::{SeedOutcome, TagsManager};

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Pool size for file-backed databases
const FILE_POOL_SIZE: u32 = 8;

/// Database handle shared by every request
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and run migrations
    ///
    /// In-memory URLs get a single, never-recycled connection; every
    /// connection to `sqlite::memory:` would otherwise see its own empty
    /// database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, the connection fails or a
    /// migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL {database_url}: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run all pending migrations embedded from `./migrations`
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails
    pub async fn migrate(&self) -> AppResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Cheap liveness query
    ///
    /// # Errors
    ///
    /// Returns an error if the store does not answer
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Health check failed: {e}")))?;
        Ok(())
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// User profile operations
    #[must_use]
    pub fn accounts(&self) -> AccountsManager {
        AccountsManager::new(self.pool.clone())
    }

    /// Booking operations
    #[must_use]
    pub fn bookings(&self) -> BookingsManager {
        BookingsManager::new(self.pool.clone())
    }

    /// Coach profile operations
    #[must_use]
    pub fn coaches(&self) -> CoachesManager {
        CoachesManager::new(self.pool.clone())
    }

    /// Job and application operations
    #[must_use]
    pub fn jobs(&self) -> JobsManager {
        JobsManager::new(self.pool.clone())
    }

    /// Messaging operations
    #[must_use]
    pub fn messaging(&self) -> MessagingManager {
        MessagingManager::new(self.pool.clone())
    }

    /// Report operations
    #[must_use]
    pub fn reports(&self) -> ReportsManager {
        ReportsManager::new(self.pool.clone())
    }

    /// Review operations
    #[must_use]
    pub fn reviews(&self) -> ReviewsManager {
        ReviewsManager::new(self.pool.clone())
    }

    /// Service and connected account operations
    #[must_use]
    pub fn services(&self) -> ServicesManager {
        ServicesManager::new(self.pool.clone())
    }

    /// Tag operations
    #[must_use]
    pub fn tags(&self) -> TagsManager {
        TagsManager::new(self.pool.clone())
    }
}

/// Fixed-width RFC3339 so stored timestamps sort lexically
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime '{s}': {e}")))
}

pub(crate) fn parse_string_list(json: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(json)
        .map_err(|e| AppError::internal(format!("Invalid JSON array in row: {e}")))
}

pub(crate) fn to_json_list(values: &[String]) -> AppResult<String> {
    serde_json::to_string(values)
        .map_err(|e| AppError::internal(format!("Failed to encode JSON array: {e}")))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Whether a sqlx error is a UNIQUE / PRIMARY KEY violation
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
