// ABOUTME: Main library entry point for the ReviewMyCoach marketplace API
// ABOUTME: Coach discovery, reviews, messaging, job board, tags, services and billing over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

#![deny(unsafe_code)]

//! # ReviewMyCoach Server
//!
//! JSON HTTP backend for a marketplace where students find sports coaches,
//! read and write reviews, message coaches, post jobs coaches can apply to,
//! and buy coach services.
//!
//! ## Architecture
//!
//! - **Routes**: thin axum handlers grouped by domain, one `*Routes` type each
//! - **Database**: `SQLite` store with one manager per record family
//! - **Search**: structured filters plus keyword, tag and rating post-filters
//! - **Rating**: transactional review insert with aggregate recomputation
//! - **Analytics**: monthly dashboards for coaches
//! - **Payments**: pluggable processor, Stripe over HTTPS in production
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use reviewmycoach_server::config::ServerConfig;
//! use reviewmycoach_server::errors::AppResult;
//! use reviewmycoach_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = Arc::new(ServerResources::from_config(config).await?);
//!     reviewmycoach_server::server::serve(resources).await
//! }
//! ```

/// Coach dashboard aggregation
pub mod analytics;

/// Identity token verification and caller checks
pub mod auth;

/// Environment configuration
pub mod config;

/// `SQLite` store and per-record managers
pub mod database;

/// Tracing subscriber setup
pub mod logging;

/// Outbound user notifications
pub mod notifications;

/// Payment processor abstraction
pub mod payments;

/// Review submission and rating aggregation
pub mod rating;

/// Shared server state
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Coach search
pub mod search;

/// Router assembly and serving
pub mod server;

pub use rmc_core::errors;
pub use rmc_core::models;
