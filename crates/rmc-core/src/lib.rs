// ABOUTME: Core crate for the ReviewMyCoach server: record models and error types
// ABOUTME: Shared by the server library, its binaries and integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! # rmc-core
//!
//! Plain data types for every record the marketplace stores (coaches,
//! reviews, jobs, conversations, tags, services, billing accounts) plus the
//! unified [`errors::AppError`] type.

/// Unified error type with HTTP status mapping
pub mod errors;

/// Record models
pub mod models;

pub use errors::{AppError, AppResult, ErrorCode, ErrorResponse};
