// ABOUTME: Coach profile record with denormalized rating aggregate
// ABOUTME: Profile attributes, visibility flags and subscription state for a coach
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coach Pro subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Never subscribed, or subscription ended
    #[default]
    Inactive,
    /// Paid and current
    Active,
    /// Payment failed, in grace period
    PastDue,
    /// Cancelled by the coach
    Canceled,
}

impl SubscriptionStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            _ => Self::Inactive,
        }
    }

    /// Whether the coach may use Pro features (job applications)
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A coach profile
///
/// `average_rating` and `total_reviews` mirror the coach's review set and
/// are only written by the rating aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachProfile {
    /// Record identifier
    pub id: String,
    /// Identity provider uid of the owning user
    pub user_id: String,
    /// Public handle, stored lowercase
    pub username: String,
    /// Name shown on the profile
    pub display_name: String,
    /// Contact email, never serialized to clients
    #[serde(skip_serializing, default)]
    pub email: Option<String>,
    /// Free-text biography
    pub bio: String,
    /// City / region
    pub location: Option<String>,
    /// Self-declared gender
    pub gender: Option<String>,
    /// School, club or organization
    pub organization: Option<String>,
    /// Hourly rate in dollars
    pub hourly_rate: Option<f64>,
    /// Years of coaching experience
    pub experience: u32,
    /// Sports coached
    pub sports: Vec<String>,
    /// Specialties
    pub specialties: Vec<String>,
    /// Certifications held
    pub certifications: Vec<String>,
    /// Spoken languages
    pub languages: Vec<String>,
    /// Mean review rating, one decimal place
    pub average_rating: f64,
    /// Number of reviews
    pub total_reviews: u32,
    /// Whether the profile appears in search
    pub is_public: bool,
    /// Whether the platform verified the coach
    pub is_verified: bool,
    /// Coach Pro subscription state
    pub subscription_status: SubscriptionStatus,
    /// Payment processor customer id, never serialized to clients
    #[serde(skip_serializing, default)]
    pub stripe_customer_id: Option<String>,
    /// Whether the coach sells at least one service
    pub has_active_services: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CoachProfile {
    /// Case-insensitive substring match over the free-text searchable fields
    #[must_use]
    pub fn matches_text(&self, needle_lower: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle_lower);
        let any = |v: &[String]| v.iter().any(|s| hit(s));

        hit(&self.display_name)
            || hit(&self.bio)
            || any(&self.specialties)
            || any(&self.sports)
            || any(&self.certifications)
            || self.location.as_deref().is_some_and(hit)
    }
}
