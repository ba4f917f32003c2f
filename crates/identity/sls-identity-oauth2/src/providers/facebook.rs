//! Facebook OAuth2 client.

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

/// Facebook: query-based token exchange on the Graph API, user info fetched
/// with the access token as a query parameter, `id` as the subject field.
/// Does not support PKCE; a supplied challenge is not forwarded.
#[derive(Clone)]
pub struct FacebookClient {
    config: ProviderConfig,
    http: Client,
}

impl FacebookClient {
    pub fn new(config: ProviderConfig, http: Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl ProviderClient for FacebookClient {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        _code_challenge: Option<&CodeChallenge>,
    ) -> OAuth2Result<Url> {
        let url = base_authorization_url(&self.config, redirect_uri, state)?;
        debug!("Generated Facebook authorization URL");
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> OAuth2Result<ProviderTokenSet> {
        if self.config.simulated {
            info!("Facebook client in simulated mode, synthesizing token set");
            return Ok(simulated_token_set());
        }

        let mut url = Url::parse(&self.config.token_endpoint)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("client_secret", &self.config.client_secret)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("code", code);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Facebook token exchange failed: {}", error_text);
            return Err(OAuth2Error::TokenExchangeFailed(error_text));
        }

        let raw: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed(format!("invalid token response: {e}")))?;

        info!("Exchanged authorization code with Facebook");
        Ok(raw.into())
    }

    async fn fetch_identity(&self, tokens: &ProviderTokenSet) -> OAuth2Result<NormalizedIdentity> {
        if self.config.simulated {
            return Ok(simulated_identity(Provider::Facebook));
        }

        let userinfo_endpoint = self.config.userinfo_endpoint.as_ref().ok_or_else(|| {
            OAuth2Error::ConfigError("Facebook user-info endpoint not configured".to_string())
        })?;

        // Graph API authenticates via query parameter, not a bearer header.
        let mut url = Url::parse(userinfo_endpoint)?;
        url.query_pairs_mut()
            .append_pair("access_token", &tokens.access_token);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OAuth2Error::IdentityFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Facebook user-info request failed: {}", error_text);
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

        debug!("Resolved Facebook identity for subject {}", user_info.sub);
        Ok(NormalizedIdentity {
            provider: Provider::Facebook,
            subject: user_info.sub,
            email: user_info.email,
            display_name: user_info.name,
            // Graph responses carry no usable avatar without an extra call
            avatar_url: None,
        })
    }
}
