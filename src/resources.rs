// ABOUTME: Process-wide dependencies shared by every route handler
// ABOUTME: Built once at startup and handed to each router as axum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{IdentityVerifier, JwtIdentityVerifier};
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::notifications::{LogNotifier, Notifier};
use crate::payments::{stripe::StripeConfig, PaymentProvider, StripeClient, UnconfiguredPayments};

/// Store handle, external service clients and configuration
pub struct ServerResources {
    /// Store
    pub database: Database,
    /// Identity token verification
    pub identity: Arc<dyn IdentityVerifier>,
    /// Payment processor
    pub payments: Arc<dyn PaymentProvider>,
    /// Outbound notifications
    pub notifier: Arc<dyn Notifier>,
    /// Configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Assemble resources from explicit parts
    #[must_use]
    pub fn new(
        database: Database,
        identity: Arc<dyn IdentityVerifier>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            identity,
            payments,
            notifier,
            config,
        }
    }

    /// Connect the store and build the production clients described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or migrated
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url).await?;

        let identity: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
        ));

        let payments: Arc<dyn PaymentProvider> = match &config.payments.secret_key {
            Some(secret_key) => {
                info!("Payment processor configured");
                Arc::new(StripeClient::new(StripeConfig {
                    secret_key: secret_key.clone(),
                    api_base: config.payments.api_base.clone(),
                }))
            }
            None => {
                warn!("STRIPE_SECRET_KEY not set; payment endpoints will answer 503");
                Arc::new(UnconfiguredPayments)
            }
        };

        Ok(Self::new(
            database,
            identity,
            payments,
            Arc::new(LogNotifier),
            config,
        ))
    }
}
