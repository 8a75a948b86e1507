// ABOUTME: Pure reduction from a coach's review ratings to the stored rating aggregate
// ABOUTME: Mean rounded to one decimal place plus review count
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

/// Denormalized rating fields stored on a coach profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    /// Mean rating, one decimal place, 0 when there are no reviews
    pub average_rating: f64,
    /// Number of reviews
    pub total_reviews: u32,
}

impl RatingAggregate {
    /// Reduce a full set of ratings
    #[must_use]
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self {
                average_rating: 0.0,
                total_reviews: 0,
            };
        }
        let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
        let mean = sum as f64 / ratings.len() as f64;
        Self {
            average_rating: round_to(mean, 1),
            total_reviews: ratings.len() as u32,
        }
    }
}

/// Round half away from zero to `places` decimals
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_zero() {
        let agg = RatingAggregate::from_ratings(&[]);
        assert!(agg.average_rating.abs() < f64::EPSILON);
        assert_eq!(agg.total_reviews, 0);
    }

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        let agg = RatingAggregate::from_ratings(&[5, 4, 4]);
        assert!((agg.average_rating - 4.3).abs() < 1e-9);
        assert_eq!(agg.total_reviews, 3);

        let agg = RatingAggregate::from_ratings(&[5, 4]);
        assert!((agg.average_rating - 4.5).abs() < 1e-9);

        let agg = RatingAggregate::from_ratings(&[5, 5, 4]);
        assert!((agg.average_rating - 4.7).abs() < 1e-9);
    }

    #[test]
    fn two_decimal_rounding() {
        assert!((round_to(4.666_666, 2) - 4.67).abs() < 1e-9);
        assert!((round_to(3.0, 2) - 3.0).abs() < 1e-9);
    }
}
