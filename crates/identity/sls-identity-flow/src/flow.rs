//! The login flow state machine.

use crate::error::FlowResult;
use crate::types::{AuthorizeGrant, AuthorizeRequest, CallbackOutcome, FlowStage, TokenGrant,
    TokenRequest};
use chrono::Duration;
use sls_identity_accounts::IdentityResolver;
use sls_identity_oauth2::{
    AuthorizationState, AuthorizationStateStore, CodeChallenge, OAuth2Error, ProviderRegistry,
    code_challenge_s256,
};
use sls_identity_session::SessionService;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Flow-level configuration: state TTL and the fixed redirect destinations.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Lifetime of an authorization-state record.
    pub state_ttl: Duration,
    /// Fixed destination for successful callbacks; receives `token` and
    /// `platform` query parameters.
    pub success_redirect: String,
    /// Fixed destination when no state record exists for a callback, i.e.
    /// there is nowhere trustworthy to send the client back to.
    pub failure_redirect: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            state_ttl: Duration::minutes(5),
            success_redirect: "http://localhost:3000/oauth2/success".to_string(),
            failure_redirect: "http://localhost:3000/login".to_string(),
        }
    }
}

impl FlowConfig {
    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    pub fn with_success_redirect(mut self, url: impl Into<String>) -> Self {
        self.success_redirect = url.into();
        self
    }

    pub fn with_failure_redirect(mut self, url: impl Into<String>) -> Self {
        self.failure_redirect = url.into();
        self
    }
}

/// Orchestrates the authorize and callback steps across the provider
/// registry, the authorization-state store, identity resolution, and
/// session issuance.
pub struct LoginFlow {
    registry: ProviderRegistry,
    states: Arc<dyn AuthorizationStateStore>,
    resolver: Arc<IdentityResolver>,
    sessions: Arc<SessionService>,
    config: FlowConfig,
}

impl LoginFlow {
    pub fn new(
        registry: ProviderRegistry,
        states: Arc<dyn AuthorizationStateStore>,
        resolver: Arc<IdentityResolver>,
        sessions: Arc<SessionService>,
        config: FlowConfig,
    ) -> Self {
        Self {
            registry,
            states,
            resolver,
            sessions,
            config,
        }
    }

    /// Authorize step: validate the provider, build its authorization URL,
    /// and pin the request down under the caller's state token.
    ///
    /// A registry miss leaves no side effects behind.
    pub async fn authorize(&self, request: AuthorizeRequest) -> FlowResult<AuthorizeGrant> {
        let client = self.registry.resolve(request.provider, request.platform)?;

        let code_challenge = request.code_challenge.map(|challenge| CodeChallenge {
            challenge,
            method: request
                .code_challenge_method
                .unwrap_or_else(|| "S256".to_string()),
        });

        let url = client.authorization_url(
            &request.redirect_uri,
            &request.state,
            code_challenge.as_ref(),
        )?;

        let state = AuthorizationState {
            provider: request.provider,
            platform: request.platform,
            redirect_uri: request.redirect_uri,
            code_challenge,
        };
        self.states
            .put(&request.state, state, self.config.state_ttl)
            .await?;

        info!(
            "Started OAuth2 flow for provider {} on {}",
            request.provider, request.platform
        );

        Ok(AuthorizeGrant {
            authorization_url: url.to_string(),
            state: request.state,
        })
    }

    /// Callback step: consume the state record, then walk the pipeline.
    ///
    /// The record is taken before anything else happens, so it is gone on
    /// every exit path; a replayed or half-processed callback observes
    /// invalid state rather than reusing the flow.
    pub async fn callback(&self, code: &str, state_token: &str) -> CallbackOutcome {
        let state = match self.states.take_once(state_token).await {
            Ok(state) => state,
            Err(e) => {
                warn!("Callback with unusable state token: {}", e);
                let error_code = e.code();
                return CallbackOutcome::Failed {
                    redirect: append_query(
                        &self.config.failure_redirect,
                        &[("error", error_code)],
                    ),
                    error_code,
                };
            }
        };

        match self.run_pipeline(code, None, &state).await {
            Ok(grant) => {
                debug!("Flow advanced to {:?}", FlowStage::Completed);
                info!(
                    "Completed OAuth2 flow for provider {} on {}",
                    state.provider, state.platform
                );
                let redirect = append_query(
                    &self.config.success_redirect,
                    &[
                        ("token", grant.token.as_str()),
                        ("platform", state.platform.as_str()),
                    ],
                );
                CallbackOutcome::Success {
                    redirect,
                    token: grant.token,
                }
            }
            Err(e) => {
                error!("OAuth2 callback failed: {}", e);
                let error_code = e.code();
                // Errors after state validation go back to the redirect URI
                // pinned at authorize time, never a caller-supplied one.
                CallbackOutcome::Failed {
                    redirect: append_query(&state.redirect_uri, &[("error", error_code)]),
                    error_code,
                }
            }
        }
    }

    /// Token step: the same pipeline, API-shaped, for clients that receive
    /// the provider redirect themselves and finish the flow over JSON.
    pub async fn exchange_token(&self, request: TokenRequest) -> FlowResult<TokenGrant> {
        let state = self.states.take_once(&request.state).await?;

        if state.provider != request.provider {
            warn!(
                "Token request names {} but state was issued for {}; stored provider wins",
                request.provider, state.provider
            );
        }

        self.run_pipeline(&request.code, request.code_verifier.as_deref(), &state)
            .await
    }

    /// Exchange → identity → account → credential, using only values pinned
    /// at authorize time.
    async fn run_pipeline(
        &self,
        code: &str,
        code_verifier: Option<&str>,
        state: &AuthorizationState,
    ) -> FlowResult<TokenGrant> {
        let mut stage = FlowStage::Start;
        debug!("Flow entered {:?}", stage);

        if let (Some(verifier), Some(challenge)) = (code_verifier, &state.code_challenge) {
            if !verifier_matches(verifier, challenge) {
                return Err(OAuth2Error::PkceVerificationFailed.into());
            }
        }

        let client = self.registry.resolve(state.provider, state.platform)?;
        stage = FlowStage::AwaitingExchange;
        debug!("Flow advanced to {:?}", stage);

        let tokens = client.exchange_code(code, &state.redirect_uri).await?;
        stage = FlowStage::Exchanged;
        debug!("Flow advanced to {:?}", stage);

        let identity = client.fetch_identity(&tokens).await?;
        stage = FlowStage::IdentityFetched;
        debug!("Flow advanced to {:?}", stage);

        let account = self
            .resolver
            .resolve_or_create(&identity, state.platform)
            .await?;
        stage = FlowStage::Resolved;
        debug!("Flow advanced to {:?}", stage);

        let token = self.sessions.issue(&account, state.platform)?;
        stage = FlowStage::Issued;
        debug!("Flow advanced to {:?}", stage);

        Ok(TokenGrant { token, account })
    }

    /// Evict expired state records. The store already hides expired records
    /// from `take_once`; this reclaims their memory.
    pub async fn sweep_expired_states(&self) -> FlowResult<usize> {
        Ok(self.states.cleanup_expired().await?)
    }

    /// The session service credentials are issued with, for composing a
    /// request-auth layer on top of the flow.
    pub fn sessions(&self) -> &Arc<SessionService> {
        &self.sessions
    }
}

fn verifier_matches(verifier: &str, challenge: &CodeChallenge) -> bool {
    if challenge.method.eq_ignore_ascii_case("s256") {
        code_challenge_s256(verifier) == challenge.challenge
    } else {
        // "plain" method: the verifier is the challenge
        verifier == challenge.challenge
    }
}

fn append_query(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    pairs.append_pair(key, value);
                }
            }
            url.to_string()
        }
        // Stored redirect URIs are validated upstream; still never leave the
        // destination unset if one slips through malformed.
        Err(_) => {
            let query: Vec<String> = params
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            format!("{base}?{}", query.join("&"))
        }
    }
}
