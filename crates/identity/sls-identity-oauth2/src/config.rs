//! Provider configuration types.
//!
//! Credentials, endpoint URIs, and scopes arrive here as already-validated
//! plain values, injected at construction. Nothing in this crate reads
//! ambient global state.

use sls_identity_core::Provider;
use std::collections::HashMap;

/// Configuration for a single OAuth2 provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub client_id: String,
    /// Client secret in the form the provider's token endpoint expects.
    /// For Apple this is the pre-signed JWT secret produced by deployment
    /// tooling, not the raw signing key.
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    /// User-info endpoint for providers that expose identity via a
    /// follow-up call (Google, Facebook). Apple leaves this unset.
    pub userinfo_endpoint: Option<String>,
    /// JWKS endpoint for providers that deliver identity as a signed
    /// assertion (Apple).
    pub jwks_endpoint: Option<String>,
    /// Expected `iss` claim of the identity assertion (Apple).
    pub issuer: Option<String>,
    pub scopes: Vec<String>,
    /// Run this provider without network access, returning synthesized but
    /// well-formed responses. Only ever set explicitly; an empty or
    /// placeholder-looking `client_id` never triggers it.
    pub simulated: bool,
}

impl ProviderConfig {
    pub fn new(
        provider: Provider,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: String::new(),
            token_endpoint: String::new(),
            userinfo_endpoint: None,
            jwks_endpoint: None,
            issuer: None,
            scopes: Vec::new(),
            simulated: false,
        }
    }

    pub fn with_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = endpoint.into();
        self
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_userinfo_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.userinfo_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_jwks_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.jwks_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }
}

/// Configuration for the provider layer as a whole.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub providers: HashMap<Provider, ProviderConfig>,
    /// Per-call bound on every provider network operation.
    pub http_timeout_seconds: u64,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            http_timeout_seconds: 30,
        }
    }
}

impl OAuth2Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(mut self, config: ProviderConfig) -> Self {
        self.providers.insert(config.provider, config);
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}
