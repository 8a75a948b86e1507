// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Covers bind address, store URL, token verification, payment processor and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Environment configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `HTTP_PORT` | `8081` |
//! | `HOST` | `0.0.0.0` |
//! | `DATABASE_URL` | `sqlite:./data/reviewmycoach.db` |
//! | `RMC_JWT_SECRET` | required |
//! | `RMC_JWT_ISSUER` | unset |
//! | `BASE_URL` | `http://localhost:3000` |
//! | `STRIPE_SECRET_KEY` | unset (payments answer 503) |
//! | `STRIPE_API_BASE` | `https://api.stripe.com/v1` |
//! | `RMC_SEARCH_CANDIDATE_CAP` | `1000` |
//! | `RMC_REQUEST_TIMEOUT_SECS` | `30` |
//! | `RMC_LOG_FORMAT` | `text` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/reviewmycoach.db";
/// Default public site URL used in redirect links
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
/// Default payment processor endpoint
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
/// Default number of rows coach search reads before in-memory filtering
pub const DEFAULT_SEARCH_CANDIDATE_CAP: u32 = 1000;
/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse from string
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Payment processor credentials
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    /// Secret key; `None` disables payment endpoints
    pub secret_key: Option<String>,
    /// REST API base URL
    pub api_base: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub http_port: u16,
    /// `SQLite` connection URL
    pub database_url: String,
    /// HS256 secret for identity tokens
    pub jwt_secret: String,
    /// Expected token issuer
    pub jwt_issuer: Option<String>,
    /// Public site URL for checkout and onboarding redirects
    pub base_url: String,
    /// Payment processor settings
    pub payments: PaymentsConfig,
    /// Rows fetched by coach search before in-memory filters
    pub search_candidate_cap: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Log output format
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns a `config` error if `RMC_JWT_SECRET` is missing or a numeric
    /// variable does not parse
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("RMC_JWT_SECRET")
            .ok_or_else(|| AppError::config("RMC_JWT_SECRET must be set"))?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            http_port: parse_var("HTTP_PORT", get("HTTP_PORT"), DEFAULT_HTTP_PORT)?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            jwt_secret,
            jwt_issuer: get("RMC_JWT_ISSUER"),
            base_url: get("BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            payments: PaymentsConfig {
                secret_key: get("STRIPE_SECRET_KEY"),
                api_base: get("STRIPE_API_BASE")
                    .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_owned()),
            },
            search_candidate_cap: parse_var(
                "RMC_SEARCH_CANDIDATE_CAP",
                get("RMC_SEARCH_CANDIDATE_CAP"),
                DEFAULT_SEARCH_CANDIDATE_CAP,
            )?,
            request_timeout: Duration::from_secs(parse_var(
                "RMC_REQUEST_TIMEOUT_SECS",
                get("RMC_REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            log_format: get("RMC_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
        })
    }

    /// Configuration for tests and embedded use: in-memory store, no payments
    #[must_use]
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            http_port: 0,
            database_url: "sqlite::memory:".to_owned(),
            jwt_secret: jwt_secret.to_owned(),
            jwt_issuer: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            payments: PaymentsConfig {
                secret_key: None,
                api_base: DEFAULT_STRIPE_API_BASE.to_owned(),
            },
            search_candidate_cap: DEFAULT_SEARCH_CANDIDATE_CAP,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_format: LogFormat::Text,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>, default: T) -> AppResult<T> {
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse()
            .map_err(|_| AppError::config(format!("{key} has an invalid value: {v}")))
    })
}
