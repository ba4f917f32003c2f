//! Apple Sign In client.
//!
//! Apple's flow structurally differs from Google/Facebook: the identity is
//! delivered once, as a signed `id_token` assertion alongside the token
//! exchange, and there is no user-info endpoint to call afterwards. The
//! difference stays internal to this client; the orchestrator sees the same
//! three capabilities as every other provider.

use crate::config::ProviderConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::providers::{ProviderClient, base_authorization_url, simulated_identity,
    simulated_token_set};
use crate::types::{CodeChallenge, ProviderTokenSet, TokenEndpointResponse};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use sls_identity_core::{NormalizedIdentity, Provider};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

/// Claims read out of a verified identity assertion.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JwksKeySet {
    keys: Vec<Jwk>,
}

impl JwksKeySet {
    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// Apple: form-encoded exchange with a pre-signed JWT client secret,
/// identity decoded from the exchange's `id_token` assertion after RS256
/// signature verification against the provider's JWKS.
pub struct AppleClient {
    config: ProviderConfig,
    http: Client,
    jwks_cache: RwLock<Option<JwksKeySet>>,
}

impl AppleClient {
    pub fn new(config: ProviderConfig, http: Client) -> Self {
        Self {
            config,
            http,
            jwks_cache: RwLock::new(None),
        }
    }

    async fn fetch_jwks(&self) -> OAuth2Result<JwksKeySet> {
        let jwks_endpoint = self.config.jwks_endpoint.as_ref().ok_or_else(|| {
            OAuth2Error::ConfigError("Apple JWKS endpoint not configured".to_string())
        })?;

        let jwks: JwksKeySet = self
            .http
            .get(jwks_endpoint)
            .send()
            .await
            .map_err(|e| OAuth2Error::IdentityFetchFailed(format!("failed to fetch JWKS: {e}")))?
            .json()
            .await
            .map_err(|e| OAuth2Error::IdentityFetchFailed(format!("failed to parse JWKS: {e}")))?;

        Ok(jwks)
    }

    /// Look up the signing key for `kid`, refreshing the cached key set once
    /// on a miss to absorb provider key rotation.
    async fn signing_key(&self, kid: &str) -> OAuth2Result<Jwk> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(jwks) = cache.as_ref() {
                if let Some(key) = jwks.find(kid) {
                    return Ok(key.clone());
                }
            }
        }

        warn!("Apple signing key {} not cached, refreshing JWKS", kid);
        let jwks = self.fetch_jwks().await?;
        let key = jwks.find(kid).cloned();

        let mut cache = self.jwks_cache.write().await;
        *cache = Some(jwks);

        key.ok_or_else(|| {
            OAuth2Error::IdentityFetchFailed(format!("unknown signing key: {kid}"))
        })
    }

    async fn verify_assertion(&self, id_token: &str) -> OAuth2Result<IdTokenClaims> {
        let header = decode_header(id_token).map_err(|e| {
            OAuth2Error::IdentityFetchFailed(format!("malformed identity assertion: {e}"))
        })?;

        let kid = header.kid.ok_or_else(|| {
            OAuth2Error::IdentityFetchFailed("identity assertion without key id".to_string())
        })?;

        let jwk = self.signing_key(&kid).await?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| OAuth2Error::IdentityFetchFailed(format!("invalid signing key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.client_id]);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<IdTokenClaims>(id_token, &decoding_key, &validation)
            .map_err(|e| {
                OAuth2Error::IdentityFetchFailed(format!("assertion verification failed: {e}"))
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl ProviderClient for AppleClient {
    fn provider(&self) -> Provider {
        Provider::Apple
    }

    fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        code_challenge: Option<&CodeChallenge>,
    ) -> OAuth2Result<Url> {
        let mut url = base_authorization_url(&self.config, redirect_uri, state)?;

        {
            let mut params = url.query_pairs_mut();
            // Apple posts the callback instead of redirecting with a query
            params.append_pair("response_mode", "form_post");

            if let Some(challenge) = code_challenge {
                params.append_pair("code_challenge", &challenge.challenge);
                params.append_pair("code_challenge_method", &challenge.method);
            }
        }

        debug!("Generated Apple authorization URL");
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> OAuth2Result<ProviderTokenSet> {
        if self.config.simulated {
            info!("Apple client in simulated mode, synthesizing token set");
            return Ok(simulated_token_set());
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Apple token exchange failed: {}", error_text);
            return Err(OAuth2Error::TokenExchangeFailed(error_text));
        }

        let raw: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed(format!("invalid token response: {e}")))?;

        info!("Exchanged authorization code with Apple");
        Ok(raw.into())
    }

    async fn fetch_identity(&self, tokens: &ProviderTokenSet) -> OAuth2Result<NormalizedIdentity> {
        if self.config.simulated {
            return Ok(simulated_identity(Provider::Apple));
        }

        let id_token = tokens.id_token.as_ref().ok_or_else(|| {
            OAuth2Error::IdentityFetchFailed(
                "token exchange returned no identity assertion".to_string(),
            )
        })?;

        let claims = self.verify_assertion(id_token).await?;

        if claims.sub.is_empty() {
            return Err(OAuth2Error::IdentityFetchFailed(
                "empty subject id".to_string(),
            ));
        }

        debug!("Resolved Apple identity for subject {}", claims.sub);
        Ok(NormalizedIdentity {
            provider: Provider::Apple,
            subject: claims.sub,
            email: claims.email,
            // Apple puts no name or picture in the assertion
            display_name: None,
            avatar_url: None,
        })
    }
}
