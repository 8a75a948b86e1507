// ABOUTME: Test helper modules shared by the integration tests
// ABOUTME: Re-exports the axum request builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

pub mod axum_test;
