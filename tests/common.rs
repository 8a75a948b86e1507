// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory resources, token minting, coach fixtures and payment/notification doubles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `reviewmycoach_server`

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reviewmycoach_server::{
    auth::{JwtIdentityVerifier, VerifiedIdentity},
    config::ServerConfig,
    database::{CreateCoachRequest, Database},
    errors::AppResult,
    models::{CoachProfile, RecurringInterval, UserRole},
    notifications::{Notification, Notifier},
    payments::{CheckoutRequest, CheckoutSessionState, ConnectedAccountState, PaymentProvider},
    resources::ServerResources,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Payment provider double that records every call
#[derive(Default)]
pub struct MockPayments {
    pub calls: Mutex<Vec<String>>,
    pub account_state: Mutex<ConnectedAccountState>,
    pub checkout_session: Mutex<CheckoutSessionState>,
    pub last_checkout: Mutex<Option<CheckoutRequest>>,
    pub prices: Mutex<Vec<(i64, Option<RecurringInterval>, Option<String>)>>,
}

impl MockPayments {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_owned());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPayments {
    async fn create_customer(
        &self,
        _email: Option<&str>,
        _name: &str,
        _metadata: &BTreeMap<String, String>,
    ) -> AppResult<String> {
        self.record("create_customer");
        Ok("cus_test".to_owned())
    }

    async fn create_product(
        &self,
        _name: &str,
        _description: &str,
        _connected_account: Option<&str>,
        _metadata: &BTreeMap<String, String>,
    ) -> AppResult<String> {
        self.record("create_product");
        Ok("prod_test".to_owned())
    }

    async fn create_price(
        &self,
        _product_id: &str,
        unit_amount_cents: i64,
        _currency: &str,
        connected_account: Option<&str>,
        interval: Option<RecurringInterval>,
    ) -> AppResult<String> {
        self.record("create_price");
        self.prices.lock().unwrap().push((
            unit_amount_cents,
            interval,
            connected_account.map(ToOwned::to_owned),
        ));
        Ok("price_test".to_owned())
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<String> {
        self.record("create_checkout_session");
        *self.last_checkout.lock().unwrap() = Some(request.clone());
        Ok("https://checkout.example.com/c/pay/cs_test".to_owned())
    }

    async fn retrieve_checkout_session(
        &self,
        _session_id: &str,
    ) -> AppResult<CheckoutSessionState> {
        self.record("retrieve_checkout_session");
        Ok(self.checkout_session.lock().unwrap().clone())
    }

    async fn create_connect_account(&self, _email: &str, _country: &str) -> AppResult<String> {
        self.record("create_connect_account");
        Ok("acct_test".to_owned())
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        _return_url: &str,
        _refresh_url: &str,
    ) -> AppResult<String> {
        self.record("create_account_link");
        Ok(format!("https://connect.example.com/setup/{account_id}"))
    }

    async fn retrieve_account(&self, _account_id: &str) -> AppResult<ConnectedAccountState> {
        self.record("retrieve_account");
        Ok(self.account_state.lock().unwrap().clone())
    }
}

/// Notifier double that keeps every notification
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> AppResult<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Resources plus handles on the test doubles behind them
pub struct TestContext {
    pub resources: Arc<ServerResources>,
    pub payments: Arc<MockPayments>,
    pub notifier: Arc<RecordingNotifier>,
    verifier: JwtIdentityVerifier,
}

impl TestContext {
    /// Bearer header value for a user with the given role
    pub fn bearer(&self, uid: &str, role: UserRole) -> String {
        format!("Bearer {}", self.token(uid, role))
    }

    /// Raw token for a user; email is `<uid>@example.com`
    pub fn token(&self, uid: &str, role: UserRole) -> String {
        let identity = VerifiedIdentity {
            uid: uid.to_owned(),
            email: Some(format!("{uid}@example.com")),
            role,
        };
        self.verifier
            .issue_token(&identity, Duration::from_secs(3600))
            .unwrap()
    }

    pub fn database(&self) -> &Database {
        &self.resources.database
    }
}

/// In-memory store, mock payments and recording notifier
pub async fn create_test_context() -> TestContext {
    let config = ServerConfig::for_testing(TEST_JWT_SECRET);
    let database = Database::new(&config.database_url).await.unwrap();
    let payments = Arc::new(MockPayments::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let resources = ServerResources::new(
        database,
        Arc::new(JwtIdentityVerifier::new(TEST_JWT_SECRET, None)),
        payments.clone(),
        notifier.clone(),
        config,
    );

    TestContext {
        resources: Arc::new(resources),
        payments,
        notifier,
        verifier: JwtIdentityVerifier::new(TEST_JWT_SECRET, None),
    }
}

/// Coach profile request with the fields tests usually care about
pub fn coach_request(username: &str, sports: &[&str], hourly_rate: Option<f64>) -> CreateCoachRequest {
    CreateCoachRequest {
        username: username.to_owned(),
        display_name: format!("Coach {username}"),
        email: Some(format!("{username}@example.com")),
        bio: "Former college athlete coaching all levels".to_owned(),
        location: Some("Austin, TX".to_owned()),
        hourly_rate,
        experience: 5,
        sports: sports.iter().map(|s| (*s).to_owned()).collect(),
        ..CreateCoachRequest::default()
    }
}

/// Create a coach owned by `uid`
pub async fn create_test_coach(
    database: &Database,
    uid: &str,
    username: &str,
    sports: &[&str],
    hourly_rate: Option<f64>,
) -> CoachProfile {
    database
        .coaches()
        .create(uid, &coach_request(username, sports, hourly_rate))
        .await
        .unwrap()
}
