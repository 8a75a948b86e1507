// ABOUTME: Payment processor abstraction used by subscriptions, services and payouts
// ABOUTME: Provides the Stripe-backed provider and a placeholder for unconfigured deployments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Payment processing
//!
//! Handlers talk to [`PaymentProvider`] only. [`stripe::StripeClient`] is the
//! production implementation; [`UnconfiguredPayments`] stands in when no
//! secret key is set so the rest of the API keeps working.

/// Stripe REST client
pub mod stripe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::RecurringInterval;

pub use stripe::StripeClient;

/// Checkout session parameters for the coach subscription
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Processor customer id
    pub customer_id: String,
    /// Processor price id of the subscription plan
    pub price_id: String,
    /// Redirect after payment
    pub success_url: String,
    /// Redirect on abandonment
    pub cancel_url: String,
    /// Key/value pairs echoed back by processor webhooks
    pub metadata: BTreeMap<String, String>,
}

/// Onboarding state reported by the processor for a connected account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectedAccountState {
    /// Whether the account may accept charges
    pub charges_enabled: bool,
    /// Reason the processor disabled the account, if any
    pub disabled_reason: Option<String>,
}

/// Outcome of a checkout session as reported by the processor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSessionState {
    /// Payment finished and the subscription exists
    pub complete: bool,
    /// Customer the session was opened for
    pub customer_id: Option<String>,
    /// Metadata attached when the session was created
    pub metadata: BTreeMap<String, String>,
}

/// Operations the marketplace needs from a payment processor
///
/// Every method returns the processor's identifier (or URL) for the created
/// object. `connected_account` scopes a call to a coach's own account.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer record
    async fn create_customer(
        &self,
        email: Option<&str>,
        name: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<String>;

    /// Create a product
    async fn create_product(
        &self,
        name: &str,
        description: &str,
        connected_account: Option<&str>,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<String>;

    /// Create a price for a product, in cents
    async fn create_price(
        &self,
        product_id: &str,
        unit_amount_cents: i64,
        currency: &str,
        connected_account: Option<&str>,
        interval: Option<RecurringInterval>,
    ) -> AppResult<String>;

    /// Create a subscription checkout session and return its URL
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<String>;

    /// Fetch the outcome of a checkout session
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> AppResult<CheckoutSessionState>;

    /// Create an express connected account
    async fn create_connect_account(&self, email: &str, country: &str) -> AppResult<String>;

    /// Create an onboarding link for a connected account and return its URL
    async fn create_account_link(
        &self,
        account_id: &str,
        return_url: &str,
        refresh_url: &str,
    ) -> AppResult<String>;

    /// Fetch the onboarding state of a connected account
    async fn retrieve_account(&self, account_id: &str) -> AppResult<ConnectedAccountState>;
}

/// Provider used when no processor key is configured; every call is a 503
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPayments;

impl UnconfiguredPayments {
    fn unavailable<T>(operation: &str) -> AppResult<T> {
        warn!(operation, "Payment processor is not configured");
        Err(AppError::service_unavailable(format!(
            "Payment processor not configured ({operation})"
        )))
    }
}

#[async_trait]
impl PaymentProvider for UnconfiguredPayments {
    async fn create_customer(
        &self,
        _email: Option<&str>,
        _name: &str,
        _metadata: &BTreeMap<String, String>,
    ) -> AppResult<String> {
        Self::unavailable("create_customer")
    }

    async fn create_product(
        &self,
        _name: &str,
        _description: &str,
        _connected_account: Option<&str>,
        _metadata: &BTreeMap<String, String>,
    ) -> AppResult<String> {
        Self::unavailable("create_product")
    }

    async fn create_price(
        &self,
        _product_id: &str,
        _unit_amount_cents: i64,
        _currency: &str,
        _connected_account: Option<&str>,
        _interval: Option<RecurringInterval>,
    ) -> AppResult<String> {
        Self::unavailable("create_price")
    }

    async fn create_checkout_session(&self, _request: &CheckoutRequest) -> AppResult<String> {
        Self::unavailable("create_checkout_session")
    }

    async fn retrieve_checkout_session(
        &self,
        _session_id: &str,
    ) -> AppResult<CheckoutSessionState> {
        Self::unavailable("retrieve_checkout_session")
    }

    async fn create_connect_account(&self, _email: &str, _country: &str) -> AppResult<String> {
        Self::unavailable("create_connect_account")
    }

    async fn create_account_link(
        &self,
        _account_id: &str,
        _return_url: &str,
        _refresh_url: &str,
    ) -> AppResult<String> {
        Self::unavailable("create_account_link")
    }

    async fn retrieve_account(&self, _account_id: &str) -> AppResult<ConnectedAccountState> {
        Self::unavailable("retrieve_account")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_provider_reports_unavailable() {
        let err = UnconfiguredPayments
            .create_connect_account("coach@example.com", "US")
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 503);
        assert_eq!(
            err.public_message(),
            "Service temporarily unavailable. Please try again later."
        );
    }
}
