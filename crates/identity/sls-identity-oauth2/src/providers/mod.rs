//! Provider clients behind one capability interface.
//!
//! Each provider implements the same three capabilities; provider quirks
//! (query-based exchange, identity embedded in a signed assertion) stay
//! internal to the client and are never visible to the orchestrator.

mod apple;
mod facebook;
mod google;

pub use apple::AppleClient;
pub use facebook::FacebookClient;
pub use google::GoogleClient;

use crate::config::ProviderConfig;
use crate::error::OAuth2Result;
use crate::types::{CodeChallenge, ProviderTokenSet};
use async_trait::async_trait;
use sls_identity_core::{NormalizedIdentity, Provider};
use url::Url;
use uuid::Uuid;

/// Capability set every identity provider implements.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Deterministically build the provider's authorization endpoint URL.
    ///
    /// The caller's state token is echoed verbatim. A supplied code
    /// challenge is passed through with its method; providers without PKCE
    /// support ignore it.
    fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        code_challenge: Option<&CodeChallenge>,
    ) -> OAuth2Result<Url>;

    /// Exchange an authorization code at the provider's token endpoint.
    ///
    /// Fails with `TokenExchangeFailed` on any transport or
    /// provider-reported error; never retried (codes are single-use).
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> OAuth2Result<ProviderTokenSet>;

    /// Resolve a normalized identity from the exchanged token set.
    async fn fetch_identity(&self, tokens: &ProviderTokenSet) -> OAuth2Result<NormalizedIdentity>;
}

/// Authorization URL parameters common to every provider.
pub(crate) fn base_authorization_url(
    config: &ProviderConfig,
    redirect_uri: &str,
    state: &str,
) -> OAuth2Result<Url> {
    let mut url = Url::parse(&config.authorization_endpoint)?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("client_id", &config.client_id);
        params.append_pair("redirect_uri", redirect_uri);
        params.append_pair("response_type", "code");
        if !config.scopes.is_empty() {
            params.append_pair("scope", &config.scopes.join(" "));
        }
        params.append_pair("state", state);
    }

    Ok(url)
}

/// Synthesized token set for a client running in simulated mode.
pub(crate) fn simulated_token_set() -> ProviderTokenSet {
    ProviderTokenSet {
        access_token: format!("sim-access-{}", Uuid::new_v4()),
        refresh_token: Some(format!("sim-refresh-{}", Uuid::new_v4())),
        expires_in: Some(3600),
        id_token: None,
    }
}

/// Synthesized identity for a client running in simulated mode. Well-formed:
/// the subject is never empty, so the rest of the pipeline is exercised
/// identically to a live provider.
pub(crate) fn simulated_identity(provider: Provider) -> NormalizedIdentity {
    NormalizedIdentity {
        provider,
        subject: format!("sim-{}-{}", provider, Uuid::new_v4()),
        email: Some(format!("{provider}-user@simulated.example")),
        display_name: Some(format!("Simulated {provider} user")),
        avatar_url: None,
    }
}
