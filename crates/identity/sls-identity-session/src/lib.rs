//! Session credential issuance and verification.
//!
//! Credentials are signed JWTs whose expiry is selected from three
//! independently configured tiers keyed by platform class (web/H5, native
//! mobile, mini-app). Expiry is never caller-supplied.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sls_auth_core::{AuthError, AuthFuture, AuthProvider, AuthenticatedUser};
use sls_identity_core::{Platform, PlatformClass, UserAccount};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed, mis-signed, or otherwise untrustworthy credential.
    #[error("Invalid credential")]
    InvalidCredential,

    /// The credential's expiry has elapsed.
    #[error("Credential expired")]
    CredentialExpired,

    /// The credential verified but its subject is not an account id.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Claims embedded in a session credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id, in decimal string form.
    pub sub: String,
    pub platform: Platform,
    pub email: Option<String>,
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub web_ttl: Duration,
    pub mobile_ttl: Duration,
    pub miniapp_ttl: Duration,
    pub algorithm: Algorithm,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            web_ttl: Duration::hours(24),
            mobile_ttl: Duration::days(30),
            miniapp_ttl: Duration::days(7),
            algorithm: Algorithm::HS512,
        }
    }
}

impl SessionConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Self::default()
        }
    }

    pub fn with_web_ttl(mut self, ttl: Duration) -> Self {
        self.web_ttl = ttl;
        self
    }

    pub fn with_mobile_ttl(mut self, ttl: Duration) -> Self {
        self.mobile_ttl = ttl;
        self
    }

    pub fn with_miniapp_ttl(mut self, ttl: Duration) -> Self {
        self.miniapp_ttl = ttl;
        self
    }
}

/// Mints and verifies session credentials.
pub struct SessionService {
    config: SessionConfig,
}

impl SessionService {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Issue a credential for `account`, expiring per `platform`'s tier.
    pub fn issue(&self, account: &UserAccount, platform: Platform) -> SessionResult<String> {
        let now = Utc::now();
        let expiry = now + self.ttl_for(platform.class());

        let claims = SessionClaims {
            sub: account.id.to_string(),
            platform,
            email: account.email.clone(),
            name: account.name.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|_| SessionError::InvalidCredential)
    }

    /// Verify a credential and return its claims. Fails closed: malformed,
    /// expired, and mis-signed tokens are all rejected.
    pub fn verify(&self, token: &str) -> SessionResult<SessionClaims> {
        let token_data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(self.config.algorithm),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::CredentialExpired,
            _ => SessionError::InvalidCredential,
        })?;

        Ok(token_data.claims)
    }

    /// Verify a credential and return the account id it was issued to.
    pub fn decode_subject(&self, token: &str) -> SessionResult<i64> {
        let claims = self.verify(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| SessionError::InvalidSubject(claims.sub))
    }

    fn ttl_for(&self, class: PlatformClass) -> Duration {
        match class {
            PlatformClass::Web => self.config.web_ttl,
            PlatformClass::Mobile => self.config.mobile_ttl,
            PlatformClass::MiniApp => self.config.miniapp_ttl,
        }
    }
}

/// Adapts [`SessionService`] to the [`AuthProvider`] contract for services
/// that authenticate inbound requests.
#[derive(Clone)]
pub struct JwtAuthProvider {
    session_service: Arc<SessionService>,
}

impl JwtAuthProvider {
    pub fn new(session_service: Arc<SessionService>) -> Self {
        Self { session_service }
    }
}

impl AuthProvider for JwtAuthProvider {
    fn authenticate(&self, token: String) -> AuthFuture<'_> {
        Box::pin(async move {
            let claims = self.session_service.verify(&token).map_err(|e| match e {
                SessionError::CredentialExpired => AuthError::CredentialExpired,
                _ => AuthError::InvalidCredential,
            })?;

            let mut metadata = serde_json::Map::new();
            if let Some(email) = &claims.email {
                metadata.insert("email".to_string(), serde_json::Value::String(email.clone()));
            }
            if let Some(name) = &claims.name {
                metadata.insert("name".to_string(), serde_json::Value::String(name.clone()));
            }

            Ok(AuthenticatedUser {
                account_id: claims.sub,
                platform: claims.platform.as_str().to_string(),
                permissions: HashSet::new(),
                metadata: if metadata.is_empty() {
                    None
                } else {
                    Some(serde_json::Value::Object(metadata))
                },
            })
        })
    }
}
