// ABOUTME: User profile record and role enumeration
// ABOUTME: Provides display names and emails for students, coaches and admins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform role carried in identity tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Default role
    #[default]
    Student,
    /// Coach with a profile
    Coach,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }

    /// Parse from string, unknown values become `Student`
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "coach" => Self::Coach,
            "admin" => Self::Admin,
            _ => Self::Student,
        }
    }

    /// Whether this role may use admin endpoints
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// A user's own profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity provider uid
    pub id: String,
    /// Contact email
    pub email: Option<String>,
    /// Name shown to others
    pub display_name: String,
    /// Platform role
    pub role: UserRole,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
