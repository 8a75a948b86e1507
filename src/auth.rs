// ABOUTME: Identity verification for API requests: token extraction, JWT validation and role checks
// ABOUTME: Tokens come from the Authorization header, the __session cookie or an idToken field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! Request authentication
//!
//! Handlers call [`authenticate`] once per request. The token is looked up
//! in this order:
//!
//! 1. `Authorization: Bearer <token>`
//! 2. the `__session` cookie
//! 3. an `idToken` field supplied by the handler from the JSON body or the
//!    query string
//!
//! Verification is delegated to an [`IdentityVerifier`]; the production
//! implementation validates HS256 JWTs signed with a shared secret.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::UserRole;
use crate::resources::ServerResources;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "__session";

/// Caller identity established from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Identity provider uid
    pub uid: String,
    /// Email claim
    pub email: Option<String>,
    /// Role claim, `student` when absent
    pub role: UserRole,
}

impl VerifiedIdentity {
    /// Fail unless the caller is an admin
    ///
    /// # Errors
    ///
    /// Returns `permission_denied` for non-admin callers
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::permission_denied("Admin access required"))
        }
    }

    /// Fail unless the caller is `user_id`
    ///
    /// # Errors
    ///
    /// Returns `permission_denied` when the ids differ
    pub fn require_user(&self, user_id: &str) -> AppResult<()> {
        if self.uid == user_id {
            Ok(())
        } else {
            Err(AppError::permission_denied("Unauthorized"))
        }
    }
}

/// Verifies identity tokens
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validate a token and return the identity it asserts
    ///
    /// # Errors
    ///
    /// Returns `auth_invalid` for expired, malformed or wrongly signed tokens
    async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity>;
}

/// JWT claims understood by [`JwtIdentityVerifier`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user's uid
    pub sub: String,
    /// Email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// HS256 JWT verifier over a shared secret
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtIdentityVerifier {
    /// Build a verifier; when `issuer` is set the `iss` claim must match it
    #[must_use]
    pub fn new(secret: &str, issuer: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
        }
    }

    /// Sign a token for an identity, valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns `internal` if signing fails
    pub fn issue_token(&self, identity: &VerifiedIdentity, ttl: Duration) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            role: Some(identity.role.as_str().to_owned()),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            warn!(error = %e, "Rejected identity token");
            AppError::auth_invalid("Invalid authentication token")
        })?;
        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(AppError::auth_invalid("Invalid authentication token"));
        }
        Ok(VerifiedIdentity {
            uid: claims.sub,
            email: claims.email,
            role: claims
                .role
                .as_deref()
                .map_or(UserRole::Student, UserRole::parse),
        })
    }
}

/// Extract cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name.trim() == cookie_name).then(|| value.trim().to_owned())
        })
}

/// Token from the Authorization header or the session cookie
#[must_use]
pub fn header_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned);

    bearer.or_else(|| get_cookie_value(headers, SESSION_COOKIE).filter(|t| !t.is_empty()))
}

/// Authenticate a request
///
/// `fallback` is the `idToken` taken from the body or query, consulted only
/// when neither the header nor the cookie carries a token.
///
/// # Errors
///
/// Returns `auth_required` when no token is present and `auth_invalid` when
/// verification fails
pub async fn authenticate(
    resources: &ServerResources,
    headers: &HeaderMap,
    fallback: Option<&str>,
) -> AppResult<VerifiedIdentity> {
    let token = header_token(headers)
        .or_else(|| fallback.filter(|t| !t.is_empty()).map(ToOwned::to_owned))
        .ok_or_else(|| AppError::auth_required("Authentication required"))?;
    resources.identity.verify(&token).await
}

/// Authenticate when a token is present; absent or invalid tokens yield `None`
pub async fn authenticate_optional(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> Option<VerifiedIdentity> {
    let token = header_token(headers)?;
    resources.identity.verify(&token).await.ok()
}

/// JSON body carrying an optional `idToken` beside the payload fields
#[derive(Debug, Clone, Deserialize)]
pub struct WithIdToken<T> {
    /// Token supplied in the body
    #[serde(rename = "idToken", default)]
    pub id_token: Option<String>,
    /// Payload
    #[serde(flatten)]
    pub body: T,
}
