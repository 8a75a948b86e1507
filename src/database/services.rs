// ABOUTME: Database operations for coach services and connected payment accounts
// ABOUTME: Services reference processor product and price ids created before the insert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use super::{
    format_timestamp, is_unique_violation, new_id, parse_string_list, parse_timestamp,
    to_json_list,
};
use crate::errors::{AppError, AppResult};
use crate::models::{ConnectAccountStatus, RecurringInterval, Service, StripeAccount};

const SERVICE_COLUMNS: &str = "id, coach_id, title, description, price, duration, category, \
     deliverables, max_bookings, is_recurring, recurring_interval, stripe_product_id, \
     stripe_price_id, is_active, total_bookings, created_at, updated_at";

/// Service creation body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateServiceRequest {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Price in dollars
    pub price: Option<f64>,
    /// Session length in minutes
    pub duration: Option<u32>,
    /// Category
    pub category: String,
    /// Deliverables
    pub deliverables: Vec<String>,
    /// Booking cap
    pub max_bookings: Option<u32>,
    /// Whether the price recurs
    pub is_recurring: bool,
    /// `week`, `month` or `year`
    pub recurring_interval: Option<String>,
}

/// Checked service fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceTerms {
    /// Price in dollars
    pub price: f64,
    /// Price in cents, as sent to the processor
    pub unit_amount_cents: i64,
    /// Minutes
    pub duration: u32,
    /// Interval when recurring
    pub recurring_interval: Option<RecurringInterval>,
}

impl CreateServiceRequest {
    /// Validate the body and derive the processor amount
    ///
    /// # Errors
    ///
    /// Returns `missing_field` or `invalid_input` describing the first problem
    pub fn validate(&self) -> AppResult<ServiceTerms> {
        if self.title.trim().is_empty() {
            return Err(AppError::missing_field("title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::missing_field("description is required"));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::missing_field("category is required"));
        }
        let price = self
            .price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| AppError::invalid_input("Price must be greater than zero"))?;
        let duration = self
            .duration
            .filter(|d| *d > 0)
            .ok_or_else(|| AppError::invalid_input("Duration must be greater than zero"))?;

        let recurring_interval = if self.is_recurring {
            let interval = self
                .recurring_interval
                .as_deref()
                .and_then(RecurringInterval::try_parse)
                .ok_or_else(|| {
                    AppError::invalid_input("Recurring interval must be one of: week, month, year")
                })?;
            Some(interval)
        } else {
            None
        };

        Ok(ServiceTerms {
            price,
            unit_amount_cents: (price * 100.0).round() as i64,
            duration,
            recurring_interval,
        })
    }
}

/// Filters for the public service listing
#[derive(Debug, Clone, Default)]
pub struct ListServicesFilter {
    /// Selling coach
    pub coach_id: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Active flag
    pub is_active: Option<bool>,
    /// Maximum rows
    pub limit: u32,
}

/// Service and connected account database operations
pub struct ServicesManager {
    pool: SqlitePool,
}

impl ServicesManager {
    /// Create a new services manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a service whose processor product and price already exist
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create(
        &self,
        coach_id: &str,
        request: &CreateServiceRequest,
        terms: &ServiceTerms,
        stripe_product_id: &str,
        stripe_price_id: &str,
    ) -> AppResult<Service> {
        let now = Utc::now();
        let service = Service {
            id: new_id(),
            coach_id: coach_id.to_owned(),
            title: request.title.trim().to_owned(),
            description: request.description.trim().to_owned(),
            price: terms.price,
            duration: terms.duration,
            category: request.category.trim().to_owned(),
            deliverables: request.deliverables.clone(),
            max_bookings: request.max_bookings,
            is_recurring: terms.recurring_interval.is_some(),
            recurring_interval: terms.recurring_interval,
            stripe_product_id: stripe_product_id.to_owned(),
            stripe_price_id: stripe_price_id.to_owned(),
            is_active: true,
            total_bookings: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(&format!(
            r"
            INSERT INTO services ({SERVICE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 1, 0, $14, $14)
            "
        ))
        .bind(&service.id)
        .bind(&service.coach_id)
        .bind(&service.title)
        .bind(&service.description)
        .bind(service.price)
        .bind(i64::from(service.duration))
        .bind(&service.category)
        .bind(to_json_list(&service.deliverables)?)
        .bind(service.max_bookings.map(i64::from))
        .bind(service.is_recurring)
        .bind(service.recurring_interval.map(|i| i.as_str()))
        .bind(&service.stripe_product_id)
        .bind(&service.stripe_price_id)
        .bind(format_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create service: {e}")))?;

        Ok(service)
    }

    /// Newest services matching the filter
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, filter: &ListServicesFilter) -> AppResult<Vec<Service>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SERVICE_COLUMNS} FROM services WHERE 1 = 1"));
        if let Some(coach_id) = &filter.coach_id {
            builder.push(" AND coach_id = ").push_bind(coach_id.clone());
        }
        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(is_active) = filter.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }
        builder
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(filter.limit));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list services: {e}")))?;

        rows.iter().map(row_to_service).collect()
    }

    /// Connected account of a coach
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_stripe_account(&self, coach_id: &str) -> AppResult<Option<StripeAccount>> {
        let row = sqlx::query(
            r"
            SELECT coach_id, stripe_account_id, account_status, email, country, created_at, updated_at
            FROM stripe_accounts WHERE coach_id = $1
            ",
        )
        .bind(coach_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get connected account: {e}")))?;

        row.map(|r| row_to_stripe_account(&r)).transpose()
    }

    /// Record a freshly created connected account in `pending` state
    ///
    /// # Errors
    ///
    /// Returns `already_exists` when the coach already has an account and
    /// `database` on store failure
    pub async fn create_stripe_account(
        &self,
        coach_id: &str,
        stripe_account_id: &str,
        email: &str,
        country: &str,
    ) -> AppResult<StripeAccount> {
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO stripe_accounts (coach_id, stripe_account_id, account_status, email, country, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(coach_id)
        .bind(stripe_account_id)
        .bind(ConnectAccountStatus::Pending.as_str())
        .bind(email)
        .bind(country)
        .bind(format_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("Stripe account already exists")
            } else {
                AppError::database(format!("Failed to store connected account: {e}"))
            }
        })?;

        Ok(StripeAccount {
            coach_id: coach_id.to_owned(),
            stripe_account_id: stripe_account_id.to_owned(),
            account_status: ConnectAccountStatus::Pending,
            email: email.to_owned(),
            country: country.to_owned(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Update the onboarding state of a connected account
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn set_stripe_account_status(
        &self,
        coach_id: &str,
        status: ConnectAccountStatus,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE stripe_accounts SET account_status = $1, updated_at = $2 WHERE coach_id = $3",
        )
        .bind(status.as_str())
        .bind(format_timestamp(&Utc::now()))
        .bind(coach_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update connected account: {e}")))?;
        Ok(())
    }
}

fn row_to_service(row: &SqliteRow) -> AppResult<Service> {
    let duration: i64 = row.get("duration");
    let deliverables_json: String = row.get("deliverables");
    let max_bookings: Option<i64> = row.get("max_bookings");
    let interval_str: Option<String> = row.get("recurring_interval");
    let total_bookings: i64 = row.get("total_bookings");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Service {
        id: row.get("id"),
        coach_id: row.get("coach_id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        duration: duration.max(0) as u32,
        category: row.get("category"),
        deliverables: parse_string_list(&deliverables_json)?,
        max_bookings: max_bookings.map(|m| m.max(0) as u32),
        is_recurring: row.get("is_recurring"),
        recurring_interval: interval_str.as_deref().and_then(RecurringInterval::try_parse),
        stripe_product_id: row.get("stripe_product_id"),
        stripe_price_id: row.get("stripe_price_id"),
        is_active: row.get("is_active"),
        total_bookings: total_bookings.max(0) as u32,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

fn row_to_stripe_account(row: &SqliteRow) -> AppResult<StripeAccount> {
    let status_str: String = row.get("account_status");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(StripeAccount {
        coach_id: row.get("coach_id"),
        stripe_account_id: row.get("stripe_account_id"),
        account_status: ConnectAccountStatus::parse(&status_str),
        email: row.get("email"),
        country: row.get("country"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> CreateServiceRequest {
        CreateServiceRequest {
            title: "Shooting clinic".to_owned(),
            description: "One hour of form work".to_owned(),
            price: Some(49.99),
            duration: Some(60),
            category: "training".to_owned(),
            ..CreateServiceRequest::default()
        }
    }

    #[test]
    fn price_converts_to_cents() {
        let terms = request().validate().unwrap();
        assert_eq!(terms.unit_amount_cents, 4999);
        assert_eq!(terms.recurring_interval, None);
    }

    #[test]
    fn recurring_needs_a_known_interval() {
        let mut req = request();
        req.is_recurring = true;
        assert!(req.validate().is_err());
        req.recurring_interval = Some("month".to_owned());
        assert_eq!(
            req.validate().unwrap().recurring_interval,
            Some(RecurringInterval::Month)
        );
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut req = request();
        req.price = Some(0.0);
        assert!(req.validate().is_err());
    }
}
