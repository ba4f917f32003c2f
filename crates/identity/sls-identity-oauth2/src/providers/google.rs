//! Google OAuth2 client.

use crate::config::ProviderConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::providers::{ProviderClient, base_authorization_url, simulated_identity,
    simulated_token_set};
use crate::types::{CodeChallenge, ProviderTokenSet, TokenEndpointResponse, UserInfoResponse};
use async_trait::async_trait;
use reqwest::Client;
use sls_identity_core::{NormalizedIdentity, Provider};
use tracing::{debug, error, info};
use url::Url;

/// Google: form-encoded token exchange, bearer-authenticated user-info
/// lookup, OpenID Connect `sub` as the subject field.
#[derive(Clone)]
pub struct GoogleClient {
    config: ProviderConfig,
    http: Client,
}

impl GoogleClient {
    pub fn new(config: ProviderConfig, http: Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl ProviderClient for GoogleClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        code_challenge: Option<&CodeChallenge>,
    ) -> OAuth2Result<Url> {
        let mut url = base_authorization_url(&self.config, redirect_uri, state)?;

        if let Some(challenge) = code_challenge {
            url.query_pairs_mut()
                .append_pair("code_challenge", &challenge.challenge)
                .append_pair("code_challenge_method", &challenge.method);
        }

        debug!("Generated Google authorization URL");
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> OAuth2Result<ProviderTokenSet> {
        if self.config.simulated {
            info!("Google client in simulated mode, synthesizing token set");
            return Ok(simulated_token_set());
        }

        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
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
            error!("Google token exchange failed: {}", error_text);
            return Err(OAuth2Error::TokenExchangeFailed(error_text));
        }

        let raw: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed(format!("invalid token response: {e}")))?;

        info!("Exchanged authorization code with Google");
        Ok(raw.into())
    }

    async fn fetch_identity(&self, tokens: &ProviderTokenSet) -> OAuth2Result<NormalizedIdentity> {
        if self.config.simulated {
            return Ok(simulated_identity(Provider::Google));
        }

        let userinfo_endpoint = self.config.userinfo_endpoint.as_ref().ok_or_else(|| {
            OAuth2Error::ConfigError("Google user-info endpoint not configured".to_string())
        })?;

        let response = self
            .http
            .get(userinfo_endpoint)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| OAuth2Error::IdentityFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Google user-info request failed: {}", error_text);
            return Err(OAuth2Error::IdentityFetchFailed(error_text));
        }

        let user_info: UserInfoResponse = response.json().await.map_err(|e| {
            OAuth2Error::IdentityFetchFailed(format!("invalid user-info response: {e}"))
        })?;

        if user_info.sub.is_empty() {
            return Err(OAuth2Error::IdentityFetchFailed(
                "empty subject id".to_string(),
            ));
        }

        debug!("Resolved Google identity for subject {}", user_info.sub);
        Ok(NormalizedIdentity {
            provider: Provider::Google,
            subject: user_info.sub,
            email: user_info.email,
            display_name: user_info.name,
            avatar_url: user_info.picture,
        })
    }
}
