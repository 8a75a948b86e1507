// ABOUTME: Coach dashboard analytics over bookings, applications, messages, reviews and views
// ABOUTME: Monthly series use UTC calendar months keyed YYYY-MM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Analytics aggregation
//!
//! A window of `timeRange` months ending now is split into calendar-month
//! buckets. Bucket `k` covers `[month_start_k, month_start_{k+1})` in UTC and
//! the series runs from the month containing the window start through the
//! month containing the window end, so every month appears exactly once even
//! when the window is not month-aligned.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use serde::Serialize;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ApplicationStatus, Booking, BookingStatus, JobApplication, Review};
use crate::rating::round_to;

/// Months covered when `timeRange` is absent
pub const DEFAULT_TIME_RANGE_MONTHS: u32 = 12;
/// Longest accepted `timeRange`
pub const MAX_TIME_RANGE_MONTHS: u32 = 36;

/// Parse `timeRange`
///
/// # Errors
///
/// Returns `invalid_input` unless the value is an integer in `1..=36`
pub fn parse_time_range(raw: Option<&str>) -> AppResult<u32> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_TIME_RANGE_MONTHS);
    };
    raw.parse::<u32>()
        .ok()
        .filter(|m| (1..=MAX_TIME_RANGE_MONTHS).contains(m))
        .ok_or_else(|| {
            AppError::invalid_input(format!(
                "timeRange must be between 1 and {MAX_TIME_RANGE_MONTHS}"
            ))
        })
}

/// One calendar month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub key: String,
    /// First instant of the month
    pub start: DateTime<Utc>,
    /// First instant of the next month
    pub end: DateTime<Utc>,
}

impl MonthBucket {
    fn containing(instant: DateTime<Utc>) -> Option<Self> {
        let start = Utc
            .with_ymd_and_hms(instant.year(), instant.month(), 1, 0, 0, 0)
            .single()?;
        Self::starting_at(start)
    }

    fn starting_at(start: DateTime<Utc>) -> Option<Self> {
        let end = start.checked_add_months(Months::new(1))?;
        Some(Self {
            key: format!("{:04}-{:02}", start.year(), start.month()),
            start,
            end,
        })
    }

    /// Whether the instant falls in this month
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Analytics window
#[derive(Debug, Clone)]
pub struct AnalyticsWindow {
    /// Window start
    pub start: DateTime<Utc>,
    /// Window end
    pub end: DateTime<Utc>,
    buckets: Vec<MonthBucket>,
}

impl AnalyticsWindow {
    /// Window of `months` calendar months ending at `end`
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` if the window falls outside the calendar range
    pub fn ending_at(end: DateTime<Utc>, months: u32) -> AppResult<Self> {
        let out_of_range = || AppError::invalid_input("timeRange is out of range");
        let start = end
            .checked_sub_months(Months::new(months))
            .ok_or_else(out_of_range)?;

        let mut buckets = Vec::with_capacity(months as usize + 1);
        let mut bucket = MonthBucket::containing(start).ok_or_else(out_of_range)?;
        loop {
            let next_start = bucket.end;
            let done = bucket.contains(end);
            buckets.push(bucket);
            if done {
                break;
            }
            bucket = MonthBucket::starting_at(next_start).ok_or_else(out_of_range)?;
        }

        Ok(Self {
            start,
            end,
            buckets,
        })
    }

    /// Month buckets, oldest first
    #[must_use]
    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    /// Exclusive upper bound for store reads; the end of the last bucket
    #[must_use]
    pub fn fetch_until(&self) -> DateTime<Utc> {
        self.buckets.last().map_or(self.end, |b| b.end)
    }

    /// Reduce the items falling in each month
    pub fn monthly<T, R>(
        &self,
        items: &[T],
        timestamp: impl Fn(&T) -> DateTime<Utc>,
        reduce: impl Fn(&MonthBucket, &[&T]) -> R,
    ) -> Vec<R> {
        self.buckets
            .iter()
            .map(|bucket| {
                let in_month: Vec<&T> = items
                    .iter()
                    .filter(|item| bucket.contains(timestamp(*item)))
                    .collect();
                reduce(bucket, &in_month)
            })
            .collect()
    }
}

/// Revenue for one month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    /// Completed revenue
    pub revenue: f64,
    /// Completed bookings
    pub bookings: u32,
}

/// Booking summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    /// All bookings in the window
    pub total: u32,
    /// Pending or awaiting payment
    pub pending: u32,
    /// Completed
    pub completed: u32,
    /// Cancelled
    pub cancelled: u32,
    /// Revenue from completed bookings
    pub total_revenue: f64,
    /// Per month
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

impl BookingStats {
    /// Summarize bookings
    #[must_use]
    pub fn from_bookings(window: &AnalyticsWindow, bookings: &[Booking]) -> Self {
        let (total_revenue, completed) = completed_revenue(bookings.iter());
        let monthly_revenue = window.monthly(
            bookings,
            |b| b.created_at,
            |bucket, items| {
                let (revenue, bookings) = completed_revenue(items.iter().copied());
                MonthlyRevenue {
                    month: bucket.key.clone(),
                    revenue: round_to(revenue, 2),
                    bookings,
                }
            },
        );

        Self {
            total: bookings.len() as u32,
            pending: bookings.iter().filter(|b| b.status.is_pending()).count() as u32,
            completed,
            cancelled: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Cancelled)
                .count() as u32,
            total_revenue: round_to(total_revenue, 2),
            monthly_revenue,
        }
    }
}

fn completed_revenue<'a>(bookings: impl Iterator<Item = &'a Booking>) -> (f64, u32) {
    bookings
        .filter(|b| b.status == BookingStatus::Completed)
        .fold((0.0, 0), |(sum, n), b| (sum + b.total_amount, n + 1))
}

/// Applications in one month
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyApplications {
    /// `YYYY-MM`
    pub month: String,
    /// Applications filed
    pub applications: u32,
}

/// Job application summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStats {
    /// All applications in the window
    pub total: u32,
    /// Pending
    pub pending: u32,
    /// Accepted
    pub accepted: u32,
    /// Rejected
    pub rejected: u32,
    /// Per month
    pub monthly_applications: Vec<MonthlyApplications>,
}

impl ApplicationStats {
    /// Summarize applications
    #[must_use]
    pub fn from_applications(window: &AnalyticsWindow, applications: &[JobApplication]) -> Self {
        let count = |status: ApplicationStatus| {
            applications.iter().filter(|a| a.status == status).count() as u32
        };
        Self {
            total: applications.len() as u32,
            pending: count(ApplicationStatus::Pending),
            accepted: count(ApplicationStatus::Accepted),
            rejected: count(ApplicationStatus::Rejected),
            monthly_applications: window.monthly(
                applications,
                |a| a.created_at,
                |bucket, items| MonthlyApplications {
                    month: bucket.key.clone(),
                    applications: items.len() as u32,
                },
            ),
        }
    }
}

/// Messaging summary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    /// Conversations the coach takes part in
    pub total_conversations: u64,
    /// Messages the coach sent in the window
    pub total_messages: u64,
    /// Unread messages addressed to the coach
    pub unread_messages: u64,
    /// `round(sent / conversations * 100)`
    pub response_rate: u64,
}

impl MessageStats {
    /// Combine the three counters
    #[must_use]
    pub fn new(total_conversations: u64, total_messages: u64, unread_messages: u64) -> Self {
        let response_rate = if total_conversations == 0 {
            0
        } else {
            (total_messages as f64 / total_conversations as f64 * 100.0).round() as u64
        };
        Self {
            total_conversations,
            total_messages,
            unread_messages,
            response_rate,
        }
    }
}

/// Reviews in one month
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReviews {
    /// `YYYY-MM`
    pub month: String,
    /// Reviews received
    pub reviews: u32,
    /// Mean rating that month, two decimals
    pub average_rating: f64,
}

/// Review summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Reviews in the window
    pub total: u32,
    /// Mean rating, two decimals
    pub average_rating: f64,
    /// Count per star value, keyed `"1"`..`"5"`
    pub rating_distribution: BTreeMap<String, u32>,
    /// Per month
    pub monthly_reviews: Vec<MonthlyReviews>,
}

fn mean_rating<'a>(ratings: impl Iterator<Item = &'a Review>) -> (u32, f64) {
    let (n, sum) = ratings.fold((0u32, 0u64), |(n, sum), r| (n + 1, sum + u64::from(r.rating)));
    if n == 0 {
        (0, 0.0)
    } else {
        (n, round_to(sum as f64 / f64::from(n), 2))
    }
}

impl ReviewStats {
    /// Summarize reviews
    #[must_use]
    pub fn from_reviews(window: &AnalyticsWindow, reviews: &[Review]) -> Self {
        let (total, average_rating) = mean_rating(reviews.iter());
        let mut rating_distribution = BTreeMap::new();
        for review in reviews {
            *rating_distribution
                .entry(review.rating.to_string())
                .or_insert(0) += 1;
        }
        Self {
            total,
            average_rating,
            rating_distribution,
            monthly_reviews: window.monthly(
                reviews,
                |r| r.created_at,
                |bucket, items| {
                    let (count, average_rating) = mean_rating(items.iter().copied());
                    MonthlyReviews {
                        month: bucket.key.clone(),
                        reviews: count,
                        average_rating,
                    }
                },
            ),
        }
    }
}

/// Views in one month
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyViews {
    /// `YYYY-MM`
    pub month: String,
    /// Profile views
    pub views: u32,
}

/// Profile view summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewStats {
    /// Views in the window
    pub total: u32,
    /// Per month
    pub monthly_views: Vec<MonthlyViews>,
}

impl ProfileViewStats {
    /// Summarize view timestamps
    #[must_use]
    pub fn from_views(window: &AnalyticsWindow, views: &[DateTime<Utc>]) -> Self {
        Self {
            total: views.len() as u32,
            monthly_views: window.monthly(
                views,
                |v| *v,
                |bucket, items| MonthlyViews {
                    month: bucket.key.clone(),
                    views: items.len() as u32,
                },
            ),
        }
    }
}

/// Full dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachAnalytics {
    /// Bookings
    pub bookings: BookingStats,
    /// Job applications
    pub applications: ApplicationStats,
    /// Messaging
    pub messages: MessageStats,
    /// Reviews
    pub reviews: ReviewStats,
    /// Profile views
    pub profile_views: ProfileViewStats,
}

/// Gather every section for a coach; the reads run concurrently
///
/// `coach_id` is the coach profile id, which is also the owner's uid.
///
/// # Errors
///
/// Returns `database` if any read fails
pub async fn coach_analytics(
    database: &Database,
    coach_id: &str,
    window: &AnalyticsWindow,
) -> AppResult<CoachAnalytics> {
    let (from, until) = (window.start, window.fetch_until());
    let bookings = database.bookings();
    let jobs = database.jobs();
    let messaging = database.messaging();
    let reviews = database.reviews();
    let coaches = database.coaches();

    let (
        booking_rows,
        application_rows,
        conversations,
        sent,
        unread,
        review_rows,
        view_rows,
    ) = tokio::try_join!(
        bookings.list_in_range(coach_id, from, until),
        jobs.list_by_coach_in_range(coach_id, from, until),
        messaging.count_conversations(coach_id),
        messaging.count_sent_in_range(coach_id, from, until),
        messaging.count_unread(coach_id),
        reviews.list_in_range(coach_id, from, until),
        coaches.list_profile_views(coach_id, from, until),
    )?;

    Ok(CoachAnalytics {
        bookings: BookingStats::from_bookings(window, &booking_rows),
        applications: ApplicationStats::from_applications(window, &application_rows),
        messages: MessageStats::new(conversations, sent, unread),
        reviews: ReviewStats::from_reviews(window, &review_rows),
        profile_views: ProfileViewStats::from_views(window, &view_rows),
    })
}
