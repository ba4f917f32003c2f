//! Authentication traits and types for services that accept session credentials.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while validating a session credential.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum AuthError {
    /// The credential is malformed, mis-signed, or otherwise not trustworthy.
    #[error("Invalid credential")]
    InvalidCredential,

    /// The credential's expiry has elapsed.
    #[error("Credential expired")]
    CredentialExpired,

    /// The caller does not hold the required permissions.
    #[error("Insufficient permissions: required {required:?}, has {has:?}")]
    InsufficientPermissions {
        required: Vec<String>,
        has: Vec<String>,
    },

    /// A credential is required but none was provided.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// An internal error occurred during authentication.
    #[error("Authentication error: {0}")]
    Internal(String),
}

/// An authenticated local user, as resolved from a session credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Local account id, in decimal string form (the credential's subject).
    pub account_id: String,

    /// Client platform the credential was issued for, in wire form.
    pub platform: String,

    /// Set of permissions granted to this user.
    pub permissions: HashSet<String>,

    /// Optional additional metadata about the user.
    pub metadata: Option<serde_json::Value>,
}

/// Result type for authentication operations.
pub type AuthResult<T = AuthenticatedUser> = Result<T, AuthError>;

/// Boxed future for async authentication operations.
pub type AuthFuture<'a, T = AuthenticatedUser> =
    Pin<Box<dyn Future<Output = AuthResult<T>> + Send + 'a>>;

/// Trait for validating session credentials on inbound requests.
///
/// Implemented by the session layer; consumed by any service that needs to
/// turn a bearer token into an [`AuthenticatedUser`] without depending on
/// how credentials are minted.
pub trait AuthProvider: Send + Sync + 'static {
    /// Validates a credential and returns the authenticated user.
    ///
    /// Fails closed: any malformed, expired, or mis-signed credential is
    /// rejected with an [`AuthError`], never partially trusted.
    fn authenticate(&self, token: String) -> AuthFuture<'_>;

    /// Checks that the authenticated user holds all required permissions.
    fn check_permissions(
        &self,
        user: &AuthenticatedUser,
        required_permissions: &[String],
    ) -> AuthResult<()> {
        let missing: Vec<String> = required_permissions
            .iter()
            .filter(|perm| !user.permissions.contains(*perm))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions {
                required: required_permissions.to_vec(),
                has: user.permissions.iter().cloned().collect(),
            })
        }
    }
}
