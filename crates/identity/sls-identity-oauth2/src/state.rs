//! Authorization-state management for CSRF protection.
//!
//! One record per opaque client-supplied state token, alive for at most the
//! configured TTL, consumed exactly once. The store owns the record
//! lifecycle end to end: expiry is enforced here, not by callers checking
//! timestamps.

use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::CodeChallenge;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sls_identity_core::{Platform, Provider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What an authorize request pinned down for its later callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationState {
    pub provider: Provider,
    pub platform: Platform,
    pub redirect_uri: String,
    pub code_challenge: Option<CodeChallenge>,
}

/// Trait for authorization-state storage.
///
/// `take_once` must be atomic with respect to concurrent callers presenting
/// the same token: exactly one observes the record, all others get
/// [`OAuth2Error::StateNotFound`], even within the TTL window.
#[async_trait]
pub trait AuthorizationStateStore: Send + Sync {
    /// Store a record under `token`, replacing any live record for the same
    /// token, to expire after `ttl`.
    async fn put(
        &self,
        token: &str,
        state: AuthorizationState,
        ttl: Duration,
    ) -> OAuth2Result<()>;

    /// Atomically retrieve and delete the record for `token`.
    async fn take_once(&self, token: &str) -> OAuth2Result<AuthorizationState>;

    /// Evict expired records, returning how many were removed.
    async fn cleanup_expired(&self) -> OAuth2Result<usize>;
}

#[derive(Debug, Clone)]
struct StoredState {
    state: AuthorizationState,
    expires_at: DateTime<Utc>,
}

/// In-memory implementation of [`AuthorizationStateStore`].
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<String, StoredState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationStateStore for InMemoryStateStore {
    async fn put(
        &self,
        token: &str,
        state: AuthorizationState,
        ttl: Duration,
    ) -> OAuth2Result<()> {
        let mut states = self.states.write().await;
        states.insert(
            token.to_string(),
            StoredState {
                state,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn take_once(&self, token: &str) -> OAuth2Result<AuthorizationState> {
        let mut states = self.states.write().await;

        // Removing under the write lock makes the winner unique; an expired
        // record is evicted by the same removal.
        let stored = states.remove(token).ok_or(OAuth2Error::StateNotFound)?;

        if Utc::now() > stored.expires_at {
            return Err(OAuth2Error::StateNotFound);
        }

        Ok(stored.state)
    }

    async fn cleanup_expired(&self) -> OAuth2Result<usize> {
        let mut states = self.states.write().await;
        let now = Utc::now();

        let expired_keys: Vec<String> = states
            .iter()
            .filter(|(_, stored)| now > stored.expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            states.remove(&key);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> AuthorizationState {
        AuthorizationState {
            provider: Provider::Google,
            platform: Platform::Web,
            redirect_uri: "http://localhost:3000/callback".to_string(),
            code_challenge: None,
        }
    }

    #[tokio::test]
    async fn take_once_consumes_exactly_once() {
        let store = InMemoryStateStore::new();

        store
            .put("abc123", sample_state(), Duration::minutes(5))
            .await
            .unwrap();

        let taken = store.take_once("abc123").await.unwrap();
        assert_eq!(taken.provider, Provider::Google);
        assert_eq!(taken.platform, Platform::Web);

        // Second consumption attempt must fail, immediately after the first
        let result = store.take_once("abc123").await;
        assert!(matches!(result, Err(OAuth2Error::StateNotFound)));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let store = InMemoryStateStore::new();
        let result = store.take_once("never-stored").await;
        assert!(matches!(result, Err(OAuth2Error::StateNotFound)));
    }

    #[tokio::test]
    async fn expired_state_is_unobservable() {
        let store = InMemoryStateStore::new();

        store
            .put("stale", sample_state(), Duration::minutes(-1))
            .await
            .unwrap();

        let result = store.take_once("stale").await;
        assert!(matches!(result, Err(OAuth2Error::StateNotFound)));
    }

    #[tokio::test]
    async fn put_replaces_live_record() {
        let store = InMemoryStateStore::new();

        store
            .put("abc123", sample_state(), Duration::minutes(5))
            .await
            .unwrap();

        let mut replacement = sample_state();
        replacement.platform = Platform::Ios;
        store
            .put("abc123", replacement, Duration::minutes(5))
            .await
            .unwrap();

        // At most one live record per token: only the replacement survives
        let taken = store.take_once("abc123").await.unwrap();
        assert_eq!(taken.platform, Platform::Ios);
        assert!(store.take_once("abc123").await.is_err());
    }

    #[tokio::test]
    async fn concurrent_consumers_have_one_winner() {
        let store = Arc::new(InMemoryStateStore::new());

        store
            .put("contended", sample_state(), Duration::minutes(5))
            .await
            .unwrap();

        let mut handles = vec![];
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(
                async move { store.take_once("contended").await },
            ));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired() {
        let store = InMemoryStateStore::new();

        store
            .put("stale", sample_state(), Duration::minutes(-1))
            .await
            .unwrap();
        store
            .put("fresh", sample_state(), Duration::minutes(5))
            .await
            .unwrap();

        let cleaned = store.cleanup_expired().await.unwrap();
        assert_eq!(cleaned, 1);

        assert!(store.take_once("stale").await.is_err());
        assert!(store.take_once("fresh").await.is_ok());
    }
}
