// ABOUTME: Database operations for coach profiles, usernames and profile views
// ABOUTME: Runs the push-down half of coach search through a dynamically built query
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use super::{
    format_timestamp, is_unique_violation, new_id, parse_string_list, parse_timestamp,
    to_json_list,
};
use crate::errors::{AppError, AppResult};
use crate::models::{CoachProfile, SubscriptionStatus};
use crate::search::PushDownFilter;

const COACH_COLUMNS: &str = "id, user_id, username, display_name, email, bio, location, gender, \
     organization, hourly_rate, experience, sports, specialties, certifications, languages, \
     average_rating, total_reviews, is_public, is_verified, subscription_status, \
     stripe_customer_id, has_active_services, created_at, updated_at";

fn username_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{3,20}$").ok())
        .as_ref()
}

/// Check a requested username against the allowed shape
///
/// # Errors
///
/// Returns `invalid_input` unless the name is 3-20 letters, digits, `_` or `-`
pub fn validate_username(username: &str) -> AppResult<()> {
    let valid = username_pattern().is_some_and(|re| re.is_match(username));
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input(
            "Username must be 3-20 characters and contain only letters, numbers, underscores or hyphens",
        ))
    }
}

/// Reject negative or non-finite hourly rates
///
/// # Errors
///
/// Returns `invalid_input` when the rate is below zero or not a number
pub fn validate_hourly_rate(rate: Option<f64>) -> AppResult<()> {
    match rate {
        Some(r) if !r.is_finite() || r < 0.0 => {
            Err(AppError::invalid_input("Hourly rate cannot be negative"))
        }
        _ => Ok(()),
    }
}

/// Keep an explicit `null` distinct from an absent field
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Onboarding payload for a new coach profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCoachRequest {
    /// Requested public handle
    pub username: String,
    /// Name shown on the profile
    pub display_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Biography
    pub bio: String,
    /// City / region
    pub location: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Hourly rate in dollars
    pub hourly_rate: Option<f64>,
    /// Years of experience
    pub experience: u32,
    /// Sports coached
    pub sports: Vec<String>,
    /// Specialties
    pub specialties: Vec<String>,
    /// Certifications
    pub certifications: Vec<String>,
    /// Languages
    pub languages: Vec<String>,
}

/// Partial profile edit; an absent field is left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCoachRequest {
    /// Name shown on the profile
    pub display_name: Option<String>,
    /// Biography
    pub bio: Option<String>,
    /// City / region, `null` clears it
    #[serde(deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    /// Gender, `null` clears it
    #[serde(deserialize_with = "nullable")]
    pub gender: Option<Option<String>>,
    /// Organization, `null` clears it
    #[serde(deserialize_with = "nullable")]
    pub organization: Option<Option<String>>,
    /// Hourly rate in dollars, `null` clears it
    #[serde(deserialize_with = "nullable")]
    pub hourly_rate: Option<Option<f64>>,
    /// Years of experience
    pub experience: Option<u32>,
    /// Sports coached
    pub sports: Option<Vec<String>>,
    /// Specialties
    pub specialties: Option<Vec<String>>,
    /// Certifications
    pub certifications: Option<Vec<String>>,
    /// Languages
    pub languages: Option<Vec<String>>,
    /// Search visibility
    pub is_public: Option<bool>,
}

/// Coach profile database operations
pub struct CoachesManager {
    pool: SqlitePool,
}

impl CoachesManager {
    /// Create a new coaches manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the coach profile owned by `user_id`
    ///
    /// The profile id is the owner's identity uid and the username is stored
    /// lowercase.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for a malformed username, `missing_field` for an
    /// empty display name and `already_exists` if the user already has a
    /// profile or the username is taken
    pub async fn create(
        &self,
        user_id: &str,
        request: &CreateCoachRequest,
    ) -> AppResult<CoachProfile> {
        validate_username(&request.username)?;
        let display_name = request.display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::missing_field("displayName is required"));
        }
        validate_hourly_rate(request.hourly_rate)?;
        if self.get_by_user_id(user_id).await?.is_some() {
            return Err(AppError::already_exists("Coach profile already exists"));
        }
        let username = request.username.to_lowercase();
        if !self.username_available(&username).await? {
            return Err(AppError::already_exists("Username is already taken"));
        }

        let now_str = format_timestamp(&Utc::now());

        sqlx::query(
            r"
            INSERT INTO coaches (
                id, user_id, username, display_name, email, bio, location, gender,
                organization, hourly_rate, experience, sports, specialties,
                certifications, languages, created_at, updated_at
            ) VALUES ($1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            ",
        )
        .bind(user_id)
        .bind(&username)
        .bind(display_name)
        .bind(&request.email)
        .bind(&request.bio)
        .bind(&request.location)
        .bind(&request.gender)
        .bind(&request.organization)
        .bind(request.hourly_rate)
        .bind(i64::from(request.experience))
        .bind(to_json_list(&request.sports)?)
        .bind(to_json_list(&request.specialties)?)
        .bind(to_json_list(&request.certifications)?)
        .bind(to_json_list(&request.languages)?)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("Username is already taken")
            } else {
                AppError::database(format!("Failed to create coach: {e}"))
            }
        })?;

        self.get(user_id)
            .await?
            .ok_or_else(|| AppError::internal("Coach profile missing after insert"))
    }

    /// Get a coach by record id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, coach_id: &str) -> AppResult<Option<CoachProfile>> {
        let row = sqlx::query(&format!("SELECT {COACH_COLUMNS} FROM coaches WHERE id = $1"))
            .bind(coach_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get coach: {e}")))?;

        row.map(|r| row_to_coach(&r)).transpose()
    }

    /// Get the coach profile owned by an identity uid
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<Option<CoachProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get coach by user: {e}")))?;

        row.map(|r| row_to_coach(&r)).transpose()
    }

    /// Case-insensitive username lookup
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<CoachProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches WHERE username = $1"
        ))
        .bind(username.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get coach by username: {e}")))?;

        row.map(|r| row_to_coach(&r)).transpose()
    }

    /// Whether no coach holds this username (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn username_available(&self, username: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coaches WHERE username = $1")
            .bind(username.to_lowercase())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check username: {e}")))?;
        Ok(count == 0)
    }

    /// Apply a partial profile edit
    ///
    /// Rating fields are not editable here.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for an empty display name or negative rate, and
    /// an error if database operation fails
    pub async fn update_profile(
        &self,
        coach_id: &str,
        request: &UpdateCoachRequest,
    ) -> AppResult<Option<CoachProfile>> {
        let Some(existing) = self.get(coach_id).await? else {
            return Ok(None);
        };

        let display_name = match &request.display_name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::invalid_input("Display name cannot be empty"));
            }
            Some(name) => name.trim().to_owned(),
            None => existing.display_name,
        };
        validate_hourly_rate(request.hourly_rate.flatten())?;

        let bio = request.bio.as_ref().unwrap_or(&existing.bio);
        let location = request.location.clone().unwrap_or(existing.location);
        let gender = request.gender.clone().unwrap_or(existing.gender);
        let organization = request.organization.clone().unwrap_or(existing.organization);
        let hourly_rate = request.hourly_rate.unwrap_or(existing.hourly_rate);
        let experience = request.experience.unwrap_or(existing.experience);
        let sports = request.sports.as_ref().unwrap_or(&existing.sports);
        let specialties = request.specialties.as_ref().unwrap_or(&existing.specialties);
        let certifications = request
            .certifications
            .as_ref()
            .unwrap_or(&existing.certifications);
        let languages = request.languages.as_ref().unwrap_or(&existing.languages);
        let is_public = request.is_public.unwrap_or(existing.is_public);

        sqlx::query(
            r"
            UPDATE coaches SET
                display_name = $1, bio = $2, location = $3, gender = $4, organization = $5,
                hourly_rate = $6, experience = $7, sports = $8, specialties = $9,
                certifications = $10, languages = $11, is_public = $12, updated_at = $13
            WHERE id = $14
            ",
        )
        .bind(&display_name)
        .bind(bio)
        .bind(&location)
        .bind(&gender)
        .bind(&organization)
        .bind(hourly_rate)
        .bind(i64::from(experience))
        .bind(to_json_list(sports)?)
        .bind(to_json_list(specialties)?)
        .bind(to_json_list(certifications)?)
        .bind(to_json_list(languages)?)
        .bind(is_public)
        .bind(format_timestamp(&Utc::now()))
        .bind(coach_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update coach: {e}")))?;

        self.get(coach_id).await
    }

    /// Set search visibility on the profile owned by `user_id`
    ///
    /// Returns `false` when the user has no coach profile.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn set_visibility(&self, user_id: &str, is_public: bool) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE coaches SET is_public = $1, updated_at = $2 WHERE user_id = $3")
                .bind(is_public)
                .bind(format_timestamp(&Utc::now()))
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to update visibility: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the Coach Pro subscription state
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn set_subscription_status(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE coaches SET subscription_status = $1, updated_at = $2 WHERE user_id = $3",
        )
        .bind(status.as_str())
        .bind(format_timestamp(&Utc::now()))
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update subscription: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Remember the payment processor customer for a coach
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn set_stripe_customer_id(&self, user_id: &str, customer_id: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE coaches SET stripe_customer_id = $1, updated_at = $2 WHERE user_id = $3",
        )
        .bind(customer_id)
        .bind(format_timestamp(&Utc::now()))
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store customer id: {e}")))?;
        Ok(())
    }

    /// Flag whether the coach sells at least one service
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn set_has_active_services(&self, user_id: &str, value: bool) -> AppResult<()> {
        sqlx::query(
            "UPDATE coaches SET has_active_services = $1, updated_at = $2 WHERE user_id = $3",
        )
        .bind(value)
        .bind(format_timestamp(&Utc::now()))
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update services flag: {e}")))?;
        Ok(())
    }

    /// Fetch search candidates matching the store-side predicates
    ///
    /// Results are ordered by the requested field with id as tie-breaker and
    /// capped at `filter.fetch_limit` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn query(&self, filter: &PushDownFilter) -> AppResult<Vec<CoachProfile>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {COACH_COLUMNS} FROM coaches WHERE 1 = 1"));

        if let Some(sport) = &filter.sport {
            builder
                .push(" AND EXISTS (SELECT 1 FROM json_each(coaches.sports) WHERE json_each.value = ")
                .push_bind(sport.clone())
                .push(")");
        }
        if let Some(location) = &filter.location {
            builder.push(" AND location = ").push_bind(location.clone());
        }
        if let Some(gender) = &filter.gender {
            builder.push(" AND gender = ").push_bind(gender.clone());
        }
        if let Some(organization) = &filter.organization {
            builder
                .push(" AND organization = ")
                .push_bind(organization.clone());
        }
        if let Some(min_rating) = filter.min_rating {
            builder.push(" AND average_rating >= ").push_bind(min_rating);
        }
        if let Some(is_verified) = filter.is_verified {
            builder.push(" AND is_verified = ").push_bind(is_verified);
        }

        // Column and direction come from closed enums, never from user text
        builder.push(format!(
            " ORDER BY {} {}, id ASC LIMIT ",
            filter.sort.field.column(),
            filter.sort.direction.sql()
        ));
        builder.push_bind(i64::from(filter.fetch_limit));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to search coaches: {e}")))?;

        rows.iter().map(row_to_coach).collect()
    }

    /// Append a profile view
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn record_profile_view(
        &self,
        coach_id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO profile_views (id, coach_id, viewer_id, viewed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(new_id())
        .bind(coach_id)
        .bind(viewer_id)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record profile view: {e}")))?;
        Ok(())
    }

    /// View timestamps for a coach within `[from, to)`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_profile_views(
        &self,
        coach_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let rows = sqlx::query(
            r"
            SELECT viewed_at FROM profile_views
            WHERE coach_id = $1 AND viewed_at >= $2 AND viewed_at < $3
            ORDER BY viewed_at ASC
            ",
        )
        .bind(coach_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list profile views: {e}")))?;

        rows.iter()
            .map(|row| parse_timestamp(&row.get::<String, _>("viewed_at")))
            .collect()
    }
}

pub(crate) fn row_to_coach(row: &SqliteRow) -> AppResult<CoachProfile> {
    let experience: i64 = row.get("experience");
    let total_reviews: i64 = row.get("total_reviews");
    let sports_json: String = row.get("sports");
    let specialties_json: String = row.get("specialties");
    let certifications_json: String = row.get("certifications");
    let languages_json: String = row.get("languages");
    let subscription_str: String = row.get("subscription_status");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(CoachProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        bio: row.get("bio"),
        location: row.get("location"),
        gender: row.get("gender"),
        organization: row.get("organization"),
        hourly_rate: row.get("hourly_rate"),
        experience: experience.max(0) as u32,
        sports: parse_string_list(&sports_json)?,
        specialties: parse_string_list(&specialties_json)?,
        certifications: parse_string_list(&certifications_json)?,
        languages: parse_string_list(&languages_json)?,
        average_rating: row.get("average_rating"),
        total_reviews: total_reviews.max(0) as u32,
        is_public: row.get("is_public"),
        is_verified: row.get("is_verified"),
        subscription_status: SubscriptionStatus::parse(&subscription_str),
        stripe_customer_id: row.get("stripe_customer_id"),
        has_active_services: row.get("has_active_services"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{validate_hourly_rate, validate_username, UpdateCoachRequest};

    #[test]
    fn username_shape() {
        for ok in ["abc", "Coach_Mike", "jane-doe-99", "a1234567890123456789"] {
            assert!(validate_username(ok).is_ok(), "{ok}");
        }
        for bad in ["ab", "has space", "émile", "a12345678901234567890", "semi;colon"] {
            assert!(validate_username(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn hourly_rate_bounds() {
        assert!(validate_hourly_rate(None).is_ok());
        assert!(validate_hourly_rate(Some(0.0)).is_ok());
        assert!(validate_hourly_rate(Some(-0.5)).is_err());
        assert!(validate_hourly_rate(Some(f64::NAN)).is_err());
        assert!(validate_hourly_rate(Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn explicit_null_differs_from_absent() {
        let absent: UpdateCoachRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.location, None);

        let cleared: UpdateCoachRequest =
            serde_json::from_str(r#"{"location": null, "hourlyRate": 12.5}"#).unwrap();
        assert_eq!(cleared.location, Some(None));
        assert_eq!(cleared.hourly_rate, Some(Some(12.5)));
    }
}
