// ABOUTME: Discovery tag record and closed category set
// ABOUTME: Tags carry a usage counter and an active flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    /// A sport (Basketball, Tennis...)
    Sport,
    /// A coaching specialty
    Specialty,
    /// A certification
    Certification,
    /// A skill
    Skill,
}

impl TagCategory {
    /// All categories, in display order
    pub const ALL: [Self; 4] = [Self::Sport, Self::Specialty, Self::Certification, Self::Skill];

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sport => "sport",
            Self::Specialty => "specialty",
            Self::Certification => "certification",
            Self::Skill => "skill",
        }
    }

    /// Strict parse; the category set is closed
    #[must_use]
    pub fn try_parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// A tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Record identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: TagCategory,
    /// Usage counter
    pub count: i64,
    /// Whether the tag is offered in pickers
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
