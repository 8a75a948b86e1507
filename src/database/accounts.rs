// ABOUTME: Database operations for user profiles keyed by identity uid
// ABOUTME: Profiles supply display names for messaging, reviews and applications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{format_timestamp, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::{UserProfile, UserRole};

/// Profile upsert body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    /// Name shown to other users
    pub display_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Requested role; `admin` is never self-assigned
    pub role: Option<String>,
}

/// User profile database operations
pub struct AccountsManager {
    pool: SqlitePool,
}

impl AccountsManager {
    /// Create a new accounts manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a profile by identity uid
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, role, created_at, updated_at FROM user_profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user profile: {e}")))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// Create or update the caller's profile
    ///
    /// Missing fields keep their stored value. A new profile without a
    /// display name falls back to the email's local part.
    ///
    /// # Errors
    ///
    /// Returns `missing_field` when a new profile has neither display name
    /// nor email, and `database` on store failure
    pub async fn upsert(
        &self,
        user_id: &str,
        token_email: Option<&str>,
        request: &UpsertProfileRequest,
    ) -> AppResult<UserProfile> {
        let existing = self.get(user_id).await?;
        let email = request
            .email
            .clone()
            .or_else(|| existing.as_ref().and_then(|p| p.email.clone()))
            .or_else(|| token_email.map(ToOwned::to_owned));

        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| existing.as_ref().map(|p| p.display_name.clone()))
            .or_else(|| {
                email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
            })
            .ok_or_else(|| AppError::missing_field("displayName is required"))?;

        let role = match request.role.as_deref().map(UserRole::parse) {
            Some(UserRole::Admin) | None => {
                existing.as_ref().map_or(UserRole::Student, |p| p.role)
            }
            Some(role) => role,
        };

        let now = Utc::now();
        let now_str = format_timestamp(&now);

        sqlx::query(
            r"
            INSERT INTO user_profiles (id, email, display_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                display_name = excluded.display_name,
                role = excluded.role,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id)
        .bind(&email)
        .bind(&display_name)
        .bind(role.as_str())
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert user profile: {e}")))?;

        Ok(UserProfile {
            id: user_id.to_owned(),
            email,
            display_name,
            role,
            created_at: existing.map_or(now, |p| p.created_at),
            updated_at: now,
        })
    }
}

fn row_to_profile(row: &SqliteRow) -> AppResult<UserProfile> {
    let role_str: String = row.get("role");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(UserProfile {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        role: UserRole::parse(&role_str),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}
