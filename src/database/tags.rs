// ABOUTME: Database operations for discovery tags and the predefined tag catalog
// ABOUTME: Seeding skips names that already exist, compared case-insensitively
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::{format_timestamp, new_id, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::{Tag, TagCategory};

/// Sports seeded by `initialize`
pub const PREDEFINED_SPORTS: &[&str] = &[
    "Basketball",
    "Soccer",
    "Tennis",
    "Swimming",
    "Baseball",
    "Football",
    "Volleyball",
    "Golf",
    "Track & Field",
    "Gymnastics",
    "Wrestling",
    "Boxing",
    "Martial Arts",
    "Hockey",
    "Lacrosse",
    "Softball",
    "Cricket",
];

/// Specialties seeded by `initialize`
pub const PREDEFINED_SPECIALTIES: &[&str] = &[
    "Youth Development",
    "Elite Performance",
    "Injury Recovery",
    "Mental Coaching",
    "Strength Training",
    "Endurance Training",
    "Technical Skills",
    "Team Strategy",
    "Individual Training",
    "Competition Prep",
    "Fitness Training",
    "Beginner Friendly",
];

/// Certifications seeded by `initialize`
pub const PREDEFINED_CERTIFICATIONS: &[&str] = &[
    "NASM Certified",
    "ACSM Certified",
    "USA Coaching Certified",
    "Olympic Coaching License",
    "SafeSport Certified",
    "CPR Certified",
    "First Aid Certified",
    "Youth Sports Certified",
];

/// Outcome of seeding the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedOutcome {
    /// Tags inserted
    pub created: u32,
    /// Names already present
    pub skipped: u32,
}

/// Tag database operations
pub struct TagsManager {
    pool: SqlitePool,
}

impl TagsManager {
    /// Create a new tags manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Tags sorted by name, optionally restricted to a category and to active tags
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(
        &self,
        category: Option<TagCategory>,
        active_only: bool,
    ) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, category, count, is_active, created_at, updated_at
            FROM tags
            WHERE ($1 IS NULL OR category = $1) AND ($2 = 0 OR is_active = 1)
            ORDER BY name ASC
            ",
        )
        .bind(category.map(|c| c.as_str()))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list tags: {e}")))?;

        rows.iter().map(row_to_tag).collect()
    }

    /// Create an active tag with a zero counter
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for names shorter than two characters and
    /// `database` on store failure
    pub async fn create(&self, name: &str, category: TagCategory) -> AppResult<Tag> {
        let name = name.trim();
        if name.chars().count() < 2 {
            return Err(AppError::invalid_input(
                "Tag name must be at least 2 characters long",
            ));
        }
        self.insert(name, category).await
    }

    /// Add `by` to a tag's usage counter
    ///
    /// Returns `false` when the tag does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn increment(&self, tag_id: &str, by: i64) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE tags SET count = count + $1, updated_at = $2 WHERE id = $3")
                .bind(by)
                .bind(format_timestamp(&Utc::now()))
                .bind(tag_id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to update tag: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Seed the predefined sports, specialties and certifications
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn initialize(&self) -> AppResult<SeedOutcome> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM tags")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read tag names: {e}")))?;
        let mut existing: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();

        let catalog = [
            (TagCategory::Sport, PREDEFINED_SPORTS),
            (TagCategory::Specialty, PREDEFINED_SPECIALTIES),
            (TagCategory::Certification, PREDEFINED_CERTIFICATIONS),
        ];

        let mut outcome = SeedOutcome::default();
        for (category, names) in catalog {
            for name in names {
                if existing.insert(name.to_lowercase()) {
                    self.insert(name, category).await?;
                    outcome.created += 1;
                } else {
                    outcome.skipped += 1;
                }
            }
        }

        info!(
            created = outcome.created,
            skipped = outcome.skipped,
            "Tag catalog initialized"
        );
        Ok(outcome)
    }

    async fn insert(&self, name: &str, category: TagCategory) -> AppResult<Tag> {
        let now = Utc::now();
        let tag = Tag {
            id: new_id(),
            name: name.to_owned(),
            category,
            count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO tags (id, name, category, count, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, 0, 1, $4, $4)
            ",
        )
        .bind(&tag.id)
        .bind(&tag.name)
        .bind(category.as_str())
        .bind(format_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create tag: {e}")))?;

        Ok(tag)
    }
}

fn row_to_tag(row: &SqliteRow) -> AppResult<Tag> {
    let category_str: String = row.get("category");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    let category = TagCategory::try_parse(&category_str)
        .ok_or_else(|| AppError::internal(format!("Unknown tag category '{category_str}'")))?;

    Ok(Tag {
        id: row.get("id"),
        name: row.get("name"),
        category,
        count: row.get("count"),
        is_active: row.get("is_active"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}
