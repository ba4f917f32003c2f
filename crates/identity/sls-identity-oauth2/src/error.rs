//! OAuth2 error types.

use sls_identity_core::Provider;
use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    /// No client is registered for the requested provider. Terminal: this is
    /// a configuration gap, not a transient fault.
    #[error("OAuth2 provider not supported: {0}")]
    UnsupportedProvider(Provider),

    /// The authorization state is missing, already consumed, or expired.
    #[error("State not found or expired")]
    StateNotFound,

    /// The provider's token endpoint rejected the exchange, or the exchange
    /// could not be transported. Never retried: authorization codes are
    /// single-use.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The provider identity could not be resolved from the token set.
    #[error("Identity fetch failed: {0}")]
    IdentityFetchFailed(String),

    /// The supplied code verifier does not match the stored code challenge.
    #[error("PKCE verification failed")]
    PkceVerificationFailed,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl OAuth2Error {
    /// Short stable code, safe to expose in redirect query parameters.
    pub fn code(&self) -> &'static str {
        match self {
            OAuth2Error::UnsupportedProvider(_) => "unsupported_provider",
            OAuth2Error::StateNotFound => "invalid_state",
            OAuth2Error::TokenExchangeFailed(_) => "token_exchange_failed",
            OAuth2Error::IdentityFetchFailed(_) => "identity_fetch_failed",
            OAuth2Error::PkceVerificationFailed => "pkce_verification_failed",
            OAuth2Error::ConfigError(_) => "configuration_error",
            OAuth2Error::HttpError(_) => "upstream_unreachable",
            OAuth2Error::UrlError(_) => "configuration_error",
            OAuth2Error::SerializationError(_) => "malformed_response",
        }
    }
}
