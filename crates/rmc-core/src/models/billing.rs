// ABOUTME: Billing records: sellable services, connected payment accounts and bookings
// ABOUTME: Amounts are dollars as f64 on the wire; payment processor calls use cents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Billing interval for recurring services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringInterval {
    /// Weekly
    Week,
    /// Monthly
    Month,
    /// Yearly
    Year,
}

impl RecurringInterval {
    /// Convert to database / payment processor representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Parse from stored representation
    #[must_use]
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// A service a coach sells
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Record identifier
    pub id: String,
    /// Selling coach (identity uid)
    pub coach_id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Price in dollars
    pub price: f64,
    /// Session length in minutes
    pub duration: u32,
    /// Free-form category
    pub category: String,
    /// What the student receives
    pub deliverables: Vec<String>,
    /// Booking cap
    pub max_bookings: Option<u32>,
    /// Whether the price recurs
    pub is_recurring: bool,
    /// Recurrence interval
    pub recurring_interval: Option<RecurringInterval>,
    /// Payment processor product id
    pub stripe_product_id: String,
    /// Payment processor price id
    pub stripe_price_id: String,
    /// Whether the service is offered
    pub is_active: bool,
    /// Number of bookings taken
    pub total_bookings: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Onboarding state of a connected payment account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectAccountStatus {
    /// Created, onboarding not finished
    #[default]
    Pending,
    /// Charges enabled
    Active,
    /// Processor restricted the account
    Restricted,
}

impl ConnectAccountStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Restricted => "restricted",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "restricted" => Self::Restricted,
            _ => Self::Pending,
        }
    }
}

/// A coach's connected payment account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeAccount {
    /// Owning coach (identity uid)
    pub coach_id: String,
    /// Processor account id
    #[serde(rename = "accountId")]
    pub stripe_account_id: String,
    /// Onboarding state
    #[serde(rename = "status")]
    pub account_status: ConnectAccountStatus,
    /// Account email
    pub email: String,
    /// Two-letter country code
    pub country: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Booking lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested
    #[default]
    Pending,
    /// Waiting on checkout
    PendingPayment,
    /// Paid, not yet delivered
    Confirmed,
    /// Delivered
    Completed,
    /// Cancelled by either side
    Cancelled,
}

impl BookingStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingPayment => "pending_payment",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "pending_payment" => Self::PendingPayment,
            "confirmed" => Self::Confirmed,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Pending or awaiting payment
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::PendingPayment)
    }
}

/// A booking of a coach's service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Record identifier
    pub id: String,
    /// Booked coach (identity uid)
    pub coach_id: String,
    /// Booking student (identity uid)
    pub student_id: String,
    /// Booked service
    pub service_id: Option<String>,
    /// Lifecycle state
    pub status: BookingStatus,
    /// Amount charged in dollars
    pub total_amount: f64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
