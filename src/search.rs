// ABOUTME: Coach search pipeline: parameter validation, push-down plan, post-filters, pagination
// ABOUTME: Store-expressible predicates go to SQL, the rest run in memory over the candidate set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Coach search
//!
//! A search request is turned into a [`SearchPlan`] with two halves:
//!
//! - [`PushDownFilter`]: equality and range predicates plus one sort clause,
//!   executed by the store with a bounded fetch limit.
//! - [`PostFilter`]: free-text search, the hourly-rate ceiling and the
//!   public-profile check, applied in memory to the fetched candidates.
//!
//! The whole candidate set (up to the configured cap) is fetched before
//! paginating, so `total` and `hasMore` describe the filtered set exactly as
//! long as the cap is not reached.

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::CoachProfile;

/// Page size when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 50;

/// Raw query parameters, echoed back as `filters`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachSearchParams {
    /// Free-text search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Sport the coach must list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    /// Exact location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Exact gender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Exact organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Minimum average rating (0-5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<String>,
    /// Maximum hourly rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rate: Option<String>,
    /// `true` / `false`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<String>,
    /// Sort field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// `asc` / `desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    /// 1-based page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

/// Allow-listed sort fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Mean rating
    #[default]
    AverageRating,
    /// Review count
    TotalReviews,
    /// Hourly rate
    HourlyRate,
    /// Years of experience
    Experience,
    /// Display name
    DisplayName,
    /// Profile creation time
    CreatedAt,
}

impl SortField {
    /// Parse the wire name, `None` for anything off the allow-list
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "averageRating" => Some(Self::AverageRating),
            "totalReviews" => Some(Self::TotalReviews),
            "hourlyRate" => Some(Self::HourlyRate),
            "experience" => Some(Self::Experience),
            "displayName" => Some(Self::DisplayName),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Store column
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::AverageRating => "average_rating",
            Self::TotalReviews => "total_reviews",
            Self::HourlyRate => "hourly_rate",
            Self::Experience => "experience",
            Self::DisplayName => "display_name",
            Self::CreatedAt => "created_at",
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AverageRating => "averageRating",
            Self::TotalReviews => "totalReviews",
            Self::HourlyRate => "hourlyRate",
            Self::Experience => "experience",
            Self::DisplayName => "displayName",
            Self::CreatedAt => "createdAt",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first
    Asc,
    /// Largest first
    #[default]
    Desc,
}

impl SortDirection {
    /// `asc` selects ascending, anything else descending
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s == "asc" {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// SQL keyword
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Single sort clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    /// Field
    pub field: SortField,
    /// Direction
    pub direction: SortDirection,
}

impl SortSpec {
    /// Off-list fields fall back to `averageRating desc`
    #[must_use]
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let direction = sort_order.map_or(SortDirection::Desc, SortDirection::parse);
        match sort_by {
            None => Self {
                field: SortField::AverageRating,
                direction,
            },
            Some(name) => SortField::parse(name).map_or_else(Self::default, |field| Self {
                field,
                direction,
            }),
        }
    }
}

/// Predicates the store evaluates
#[derive(Debug, Clone, Default)]
pub struct PushDownFilter {
    /// `sports` array contains this value
    pub sport: Option<String>,
    /// `location` equals
    pub location: Option<String>,
    /// `gender` equals
    pub gender: Option<String>,
    /// `organization` equals
    pub organization: Option<String>,
    /// `average_rating >=`
    pub min_rating: Option<f64>,
    /// `is_verified` equals
    pub is_verified: Option<bool>,
    /// Sort clause
    pub sort: SortSpec,
    /// Maximum rows fetched
    pub fetch_limit: u32,
}

/// Predicates applied in memory after the fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    /// Lowercased, trimmed search term
    pub text: Option<String>,
    /// Hourly-rate ceiling
    pub max_rate: Option<f64>,
}

impl PostFilter {
    /// Whether a candidate survives the in-memory filters
    #[must_use]
    pub fn keep(&self, coach: &CoachProfile) -> bool {
        if !coach.is_public {
            return false;
        }
        if let Some(text) = &self.text {
            if !coach.matches_text(text) {
                return false;
            }
        }
        if let Some(max) = self.max_rate {
            // Coaches without a rate (or a zero rate) cannot satisfy a ceiling
            match coach.hourly_rate {
                Some(rate) if rate > 0.0 && rate <= max => {}
                _ => return false,
            }
        }
        true
    }
}

/// Validated, executable search
#[derive(Debug, Clone)]
pub struct SearchPlan {
    /// 1-based page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Store half
    pub push_down: PushDownFilter,
    /// Memory half
    pub post_filter: PostFilter,
    /// Parameters with defaults filled in
    pub echo: CoachSearchParams,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn parse_pagination(value: Option<&str>, default: u32) -> AppResult<i64> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(i64::from(default)),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AppError::invalid_input("Invalid pagination parameters")),
    }
}

impl SearchPlan {
    /// Validate parameters and split them into store and memory predicates
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` when `page < 1`, `limit < 1`, `limit > 50`, or
    /// either is not an integer
    pub fn from_params(params: &CoachSearchParams, candidate_cap: u32) -> AppResult<Self> {
        let page = parse_pagination(params.page.as_deref(), 1)?;
        let limit = parse_pagination(params.limit.as_deref(), DEFAULT_PAGE_SIZE)?;
        if page < 1 || limit < 1 || limit > i64::from(MAX_PAGE_SIZE) {
            return Err(AppError::invalid_input("Invalid pagination parameters"));
        }
        let page = u32::try_from(page)
            .map_err(|_| AppError::invalid_input("Invalid pagination parameters"))?;
        let limit = limit as u32;

        let min_rating = params
            .min_rating
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|r| (0.0..=5.0).contains(r));

        let is_verified = match params.is_verified.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };

        let max_rate = params
            .max_rate
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|r| r.is_finite() && *r > 0.0);

        let sort = SortSpec::parse(params.sort_by.as_deref(), params.sort_order.as_deref());

        let push_down = PushDownFilter {
            sport: non_empty(params.sport.as_ref()),
            location: non_empty(params.location.as_ref()),
            gender: non_empty(params.gender.as_ref()),
            organization: non_empty(params.organization.as_ref()),
            min_rating,
            is_verified,
            sort,
            fetch_limit: candidate_cap.max(limit),
        };

        let post_filter = PostFilter {
            text: non_empty(params.search.as_ref()).map(|s| s.to_lowercase()),
            max_rate,
        };

        let mut echo = params.clone();
        echo.sort_by = Some(
            params
                .sort_by
                .clone()
                .unwrap_or_else(|| SortField::AverageRating.as_str().to_owned()),
        );
        echo.sort_order = Some(sort.direction.as_str().to_owned());
        echo.page = Some(page.to_string());
        echo.limit = Some(limit.to_string());

        Ok(Self {
            page,
            limit,
            push_down,
            post_filter,
            echo,
        })
    }

    /// Apply the post-filters to fetched candidates and cut out the requested page
    #[must_use]
    pub fn paginate(&self, candidates: Vec<CoachProfile>) -> SearchPage {
        let filtered: Vec<CoachProfile> = candidates
            .into_iter()
            .filter(|c| self.post_filter.keep(c))
            .collect();

        let total = filtered.len();
        let limit = self.limit as usize;
        let total_pages = total.div_ceil(limit);
        let start = (self.page as usize - 1).saturating_mul(limit);

        let coaches = filtered.into_iter().skip(start).take(limit).collect();

        SearchPage {
            coaches,
            total,
            page: self.page,
            total_pages,
            has_more: (self.page as usize) < total_pages,
            limit: self.limit,
            filters: self.echo.clone(),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Coaches on this page
    pub coaches: Vec<CoachProfile>,
    /// Matches across all pages
    pub total: usize,
    /// This page
    pub page: u32,
    /// `ceil(total / limit)`
    pub total_pages: usize,
    /// Whether a later page exists
    pub has_more: bool,
    /// Page size
    pub limit: u32,
    /// Parameters as interpreted
    pub filters: CoachSearchParams,
}

/// Run a search end to end
///
/// # Errors
///
/// Returns `invalid_input` for bad pagination and `database` for store failures
pub async fn search_coaches(
    database: &Database,
    params: &CoachSearchParams,
    candidate_cap: u32,
) -> AppResult<SearchPage> {
    let plan = SearchPlan::from_params(params, candidate_cap)?;
    let candidates = database.coaches().query(&plan.push_down).await?;
    Ok(plan.paginate(candidates))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::SubscriptionStatus;

    fn coach(name: &str, rate: Option<f64>, public: bool) -> CoachProfile {
        let now = Utc::now();
        CoachProfile {
            id: name.to_lowercase(),
            user_id: format!("uid-{name}"),
            username: name.to_lowercase(),
            display_name: name.to_owned(),
            email: None,
            bio: "Helps athletes improve".to_owned(),
            location: Some("Austin, TX".to_owned()),
            gender: None,
            organization: None,
            hourly_rate: rate,
            experience: 3,
            sports: vec!["Basketball".to_owned()],
            specialties: vec!["Youth Development".to_owned()],
            certifications: vec![],
            languages: vec![],
            average_rating: 0.0,
            total_reviews: 0,
            is_public: public,
            is_verified: false,
            subscription_status: SubscriptionStatus::Inactive,
            stripe_customer_id: None,
            has_active_services: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> CoachSearchParams {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        serde_json::from_value(
            serde_json::to_value(
                encoded
                    .split('&')
                    .filter(|kv| !kv.is_empty())
                    .filter_map(|kv| kv.split_once('='))
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect::<std::collections::HashMap<_, _>>(),
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn pagination_bounds_are_enforced() {
        for bad in [
            &[("page", "0")][..],
            &[("limit", "0")][..],
            &[("limit", "51")][..],
            &[("page", "abc")][..],
            &[("page", "-3")][..],
        ] {
            let err = SearchPlan::from_params(&params(bad), 1000).unwrap_err();
            assert_eq!(err.http_status(), 400, "{bad:?}");
        }
        let plan = SearchPlan::from_params(&params(&[("page", "2"), ("limit", "50")]), 1000)
            .unwrap();
        assert_eq!((plan.page, plan.limit), (2, 50));
    }

    #[test]
    fn defaults_are_filled_in() {
        let plan = SearchPlan::from_params(&CoachSearchParams::default(), 1000).unwrap();
        assert_eq!(plan.page, 1);
        assert_eq!(plan.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(plan.push_down.sort, SortSpec::default());
        assert_eq!(plan.echo.sort_by.as_deref(), Some("averageRating"));
        assert_eq!(plan.echo.sort_order.as_deref(), Some("desc"));
    }

    #[test]
    fn unknown_sort_field_falls_back() {
        let spec = SortSpec::parse(Some("password"), Some("asc"));
        assert_eq!(spec.field, SortField::AverageRating);
        assert_eq!(spec.direction, SortDirection::Desc);

        let spec = SortSpec::parse(Some("hourlyRate"), Some("asc"));
        assert_eq!(spec.field, SortField::HourlyRate);
        assert_eq!(spec.direction, SortDirection::Asc);
    }

    #[test]
    fn out_of_range_numeric_filters_are_ignored() {
        let plan = SearchPlan::from_params(
            &params(&[("minRating", "7"), ("maxRate", "-5"), ("isVerified", "yes")]),
            1000,
        )
        .unwrap();
        assert_eq!(plan.push_down.min_rating, None);
        assert_eq!(plan.post_filter.max_rate, None);
        assert_eq!(plan.push_down.is_verified, None);
    }

    #[test]
    fn post_filter_excludes_private_and_expensive_coaches() {
        let filter = PostFilter {
            text: None,
            max_rate: Some(50.0),
        };
        assert!(filter.keep(&coach("Cheap", Some(40.0), true)));
        assert!(!filter.keep(&coach("Pricey", Some(80.0), true)));
        assert!(!filter.keep(&coach("NoRate", None, true)));
        assert!(!filter.keep(&coach("Hidden", Some(40.0), false)));
    }

    #[test]
    fn text_search_is_case_insensitive_across_fields() {
        let filter = PostFilter {
            text: Some("youth".to_owned()),
            max_rate: None,
        };
        assert!(filter.keep(&coach("Jordan", None, true)));

        let filter = PostFilter {
            text: Some("austin".to_owned()),
            max_rate: None,
        };
        assert!(filter.keep(&coach("Jordan", None, true)));

        let filter = PostFilter {
            text: Some("swimming".to_owned()),
            max_rate: None,
        };
        assert!(!filter.keep(&coach("Jordan", None, true)));
    }

    #[test]
    fn pages_are_sliced_from_the_filtered_set() {
        let plan =
            SearchPlan::from_params(&params(&[("page", "2"), ("limit", "2")]), 1000).unwrap();
        let candidates = vec![
            coach("A", Some(10.0), true),
            coach("B", Some(10.0), false),
            coach("C", Some(10.0), true),
            coach("D", Some(10.0), true),
            coach("E", Some(10.0), true),
        ];
        let page = plan.paginate(candidates);
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_more);
        let names: Vec<_> = page.coaches.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, ["D", "E"]);
    }
}
