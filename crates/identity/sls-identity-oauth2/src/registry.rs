//! Provider registry: resolves a (provider, platform) pair to a client.

use crate::config::OAuth2Config;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::providers::{AppleClient, FacebookClient, GoogleClient, ProviderClient};
use sls_identity_core::{Platform, Provider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Registry of constructed provider clients.
pub struct ProviderRegistry {
    clients: HashMap<Provider, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    /// Build one client per configured provider, sharing a single HTTP
    /// client bounded by the configured per-call timeout.
    pub fn from_config(config: &OAuth2Config) -> OAuth2Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        let mut clients: HashMap<Provider, Arc<dyn ProviderClient>> = HashMap::new();
        for (provider, provider_config) in &config.providers {
            let client: Arc<dyn ProviderClient> = match provider {
                Provider::Google => {
                    Arc::new(GoogleClient::new(provider_config.clone(), http.clone()))
                }
                Provider::Facebook => {
                    Arc::new(FacebookClient::new(provider_config.clone(), http.clone()))
                }
                Provider::Apple => {
                    Arc::new(AppleClient::new(provider_config.clone(), http.clone()))
                }
            };
            clients.insert(*provider, client);
        }

        Ok(Self { clients })
    }

    /// Replace or add a client, e.g. a test double.
    pub fn register(&mut self, client: Arc<dyn ProviderClient>) {
        self.clients.insert(client.provider(), client);
    }

    /// Resolve the client for a provider.
    ///
    /// Lookup is keyed by the provider alone; `platform` is accepted for
    /// future per-platform client variants. An unregistered provider is a
    /// configuration gap and fails terminally.
    pub fn resolve(
        &self,
        provider: Provider,
        _platform: Platform,
    ) -> OAuth2Result<Arc<dyn ProviderClient>> {
        self.clients
            .get(&provider)
            .cloned()
            .ok_or(OAuth2Error::UnsupportedProvider(provider))
    }
}
