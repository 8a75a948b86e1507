// ABOUTME: Record model module organization and re-exports
// ABOUTME: Groups coach, review, job, messaging, tag, billing and account records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

/// User profiles and roles
pub mod account;
/// Services, connected payment accounts, bookings
pub mod billing;
/// Coach profile records
pub mod coach;
/// Job postings and applications
pub mod jobs;
/// Conversations and messages
pub mod messaging;
/// Abuse reports
pub mod reports;
/// Reviews left by students
pub mod review;
/// Discovery tags
pub mod tags;

pub use account::{UserProfile, UserRole};
pub use billing::{
    Booking, BookingStatus, ConnectAccountStatus, RecurringInterval, Service, StripeAccount,
};
pub use coach::{CoachProfile, SubscriptionStatus};
pub use jobs::{ApplicationStatus, Job, JobApplication, JobStatus};
pub use messaging::{Conversation, Message};
pub use reports::{Report, ReportStatus};
pub use review::Review;
pub use tags::{Tag, TagCategory};
