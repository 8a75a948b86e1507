// ABOUTME: Stripe REST client implementing the payment provider trait
// ABOUTME: Sends form-encoded requests with the secret key and optional connected-account header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{CheckoutRequest, CheckoutSessionState, ConnectedAccountState, PaymentProvider};
use crate::errors::{AppError, AppResult};
use crate::models::RecurringInterval;

const SERVICE: &str = "Stripe API";

/// Header scoping a request to a connected account
const STRIPE_ACCOUNT_HEADER: &str = "Stripe-Account";

/// Stripe client configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key
    pub secret_key: String,
    /// Base URL (default: <https://api.stripe.com/v1>)
    pub api_base: String,
}

/// Object creation response; Stripe always returns the id, sessions and links a url
#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    charges_enabled: bool,
    requirements: Option<AccountRequirements>,
}

#[derive(Debug, Deserialize)]
struct AccountRequirements {
    disabled_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    status: Option<String>,
    customer: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

type Form = Vec<(String, String)>;

fn push_metadata(form: &mut Form, prefix: &str, metadata: &BTreeMap<String, String>) {
    for (key, value) in metadata {
        form.push((format!("{prefix}[{key}]"), value.clone()));
    }
}

/// Stripe REST API client
pub struct StripeClient {
    config: StripeConfig,
    http_client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    #[must_use]
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &Form,
        connected_account: Option<&str>,
    ) -> AppResult<T> {
        let url = format!("{}/{path}", self.config.api_base.trim_end_matches('/'));
        let mut request = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(form);
        if let Some(account) = connected_account {
            request = request.header(STRIPE_ACCOUNT_HEADER, account);
        }
        debug!(path, "Stripe request");
        Self::read(request.send().await, path).await
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> AppResult<T> {
        let url = format!("{}/{path}", self.config.api_base.trim_end_matches('/'));
        let request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.secret_key);
        debug!(path, "Stripe request");
        Self::read(request.send().await, path).await
    }

    async fn read<T: for<'de> Deserialize<'de>>(
        sent: Result<reqwest::Response, reqwest::Error>,
        path: &str,
    ) -> AppResult<T> {
        let response = sent.map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_default();
            error!(path, %status, %detail, "Stripe request failed");
            return Err(AppError::external_service(
                SERVICE,
                format!("{path} failed with HTTP {status}: {detail}"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("JSON parse error: {e}")))
    }

    fn require(value: Option<String>, what: &str) -> AppResult<String> {
        value.ok_or_else(|| AppError::external_service(SERVICE, format!("response missing {what}")))
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_customer(
        &self,
        email: Option<&str>,
        name: &str,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<String> {
        let mut form: Form = vec![("name".into(), name.to_owned())];
        if let Some(email) = email {
            form.push(("email".into(), email.to_owned()));
        }
        push_metadata(&mut form, "metadata", metadata);
        let created: CreatedObject = self.post("customers", &form, None).await?;
        Self::require(created.id, "customer id")
    }

    async fn create_product(
        &self,
        name: &str,
        description: &str,
        connected_account: Option<&str>,
        metadata: &BTreeMap<String, String>,
    ) -> AppResult<String> {
        let mut form: Form = vec![
            ("name".into(), name.to_owned()),
            ("description".into(), description.to_owned()),
        ];
        push_metadata(&mut form, "metadata", metadata);
        let created: CreatedObject = self.post("products", &form, connected_account).await?;
        Self::require(created.id, "product id")
    }

    async fn create_price(
        &self,
        product_id: &str,
        unit_amount_cents: i64,
        currency: &str,
        connected_account: Option<&str>,
        interval: Option<RecurringInterval>,
    ) -> AppResult<String> {
        let mut form: Form = vec![
            ("product".into(), product_id.to_owned()),
            ("unit_amount".into(), unit_amount_cents.to_string()),
            ("currency".into(), currency.to_owned()),
        ];
        if let Some(interval) = interval {
            form.push(("recurring[interval]".into(), interval.as_str().to_owned()));
        }
        let created: CreatedObject = self.post("prices", &form, connected_account).await?;
        Self::require(created.id, "price id")
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<String> {
        let mut form: Form = vec![
            ("customer".into(), request.customer_id.clone()),
            ("mode".into(), "subscription".into()),
            ("payment_method_types[0]".into(), "card".into()),
            ("line_items[0][price]".into(), request.price_id.clone()),
            ("line_items[0][quantity]".into(), "1".into()),
            ("success_url".into(), request.success_url.clone()),
            ("cancel_url".into(), request.cancel_url.clone()),
        ];
        push_metadata(&mut form, "metadata", &request.metadata);
        push_metadata(&mut form, "subscription_data[metadata]", &request.metadata);
        let created: CreatedObject = self.post("checkout/sessions", &form, None).await?;
        Self::require(created.url, "checkout url")
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> AppResult<CheckoutSessionState> {
        let session: CheckoutSessionResponse =
            self.get(&format!("checkout/sessions/{session_id}")).await?;
        Ok(CheckoutSessionState {
            complete: session.status.as_deref() == Some("complete"),
            customer_id: session.customer,
            metadata: session.metadata,
        })
    }

    async fn create_connect_account(&self, email: &str, country: &str) -> AppResult<String> {
        let form: Form = vec![
            ("type".into(), "express".into()),
            ("email".into(), email.to_owned()),
            ("country".into(), country.to_owned()),
            ("capabilities[card_payments][requested]".into(), "true".into()),
            ("capabilities[transfers][requested]".into(), "true".into()),
        ];
        let created: CreatedObject = self.post("accounts", &form, None).await?;
        Self::require(created.id, "account id")
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        return_url: &str,
        refresh_url: &str,
    ) -> AppResult<String> {
        let form: Form = vec![
            ("account".into(), account_id.to_owned()),
            ("return_url".into(), return_url.to_owned()),
            ("refresh_url".into(), refresh_url.to_owned()),
            ("type".into(), "account_onboarding".into()),
        ];
        let created: CreatedObject = self.post("account_links", &form, None).await?;
        Self::require(created.url, "account link url")
    }

    async fn retrieve_account(&self, account_id: &str) -> AppResult<ConnectedAccountState> {
        let account: AccountResponse = self.get(&format!("accounts/{account_id}")).await?;
        Ok(ConnectedAccountState {
            charges_enabled: account.charges_enabled,
            disabled_reason: account.requirements.and_then(|r| r.disabled_reason),
        })
    }
}
