//! Find-or-create resolution of provider identities onto local accounts.

use chrono::Utc;
use sls_identity_core::{
    IdentityError, IdentityResult, NewUserAccount, NewUserIdentity, NormalizedIdentity, Platform,
    UserAccount, UserStore,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Resolves a [`NormalizedIdentity`] to its local [`UserAccount`], creating
/// the account and/or identity link on first sight.
///
/// Resolution order:
/// 1. An existing identity for `(provider, subject)` wins outright; only its
///    last-login timestamp and platform are touched.
/// 2. Otherwise, with `link_by_email` enabled and an email present, an
///    existing account with that email adopts the new identity.
/// 3. Otherwise a fresh account is created together with the identity link,
///    atomically.
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
    link_by_email: bool,
    // Serializes the miss path so an in-process race over the same new
    // subject lands on the winning row instead of a conflict.
    create_lock: Mutex<()>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            link_by_email: true,
            create_lock: Mutex::new(()),
        }
    }

    /// Controls whether step 2 may attach a new provider identity to an
    /// existing account that shares its email. Deployments that consider
    /// cross-provider email collisions unsafe turn this off, forcing a
    /// fresh account per new `(provider, subject)`.
    pub fn with_link_by_email(mut self, enabled: bool) -> Self {
        self.link_by_email = enabled;
        self
    }

    pub async fn resolve_or_create(
        &self,
        identity: &NormalizedIdentity,
        platform: Platform,
    ) -> IdentityResult<UserAccount> {
        if identity.subject.is_empty() {
            return Err(IdentityError::EmptySubject(identity.provider));
        }

        if let Some(account) = self.returning_account(identity, platform).await? {
            return Ok(account);
        }

        let _guard = self.create_lock.lock().await;

        // Re-check under the lock: a concurrent resolution may have created
        // the identity while this call was waiting.
        if let Some(account) = self.returning_account(identity, platform).await? {
            return Ok(account);
        }

        let new_identity = NewUserIdentity {
            provider: identity.provider,
            platform,
            subject: identity.subject.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
        };

        if self.link_by_email {
            if let Some(email) = identity.email.as_deref() {
                if let Some(account) = self.store.find_account_by_email(email).await? {
                    debug!(
                        "Linking {} subject to existing account {} by email",
                        identity.provider, account.id
                    );
                    self.store
                        .insert_identity(account.id, new_identity)
                        .await?;
                    return Ok(account);
                }
            }
        }

        let new_account = NewUserAccount {
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            phone: None,
            avatar_url: identity.avatar_url.clone(),
            primary_provider: identity.provider,
        };

        let (account, _) = self
            .store
            .create_account_with_identity(new_account, new_identity)
            .await?;

        info!(
            "Created account {} for first {} sign-in",
            account.id, identity.provider
        );
        Ok(account)
    }

    /// Step 1: returning user. Touches last-login and platform, leaves the
    /// account itself unmodified.
    async fn returning_account(
        &self,
        identity: &NormalizedIdentity,
        platform: Platform,
    ) -> IdentityResult<Option<UserAccount>> {
        let Some(existing) = self
            .store
            .find_identity(identity.provider, &identity.subject)
            .await?
        else {
            return Ok(None);
        };

        self.store
            .record_login(existing.id, platform, Utc::now())
            .await?;

        let account = self
            .store
            .find_account(existing.account_id)
            .await?
            .ok_or(IdentityError::AccountNotFound(existing.account_id))?;

        Ok(Some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;
    use sls_identity_core::Provider;

    fn google_identity(subject: &str, email: Option<&str>) -> NormalizedIdentity {
        NormalizedIdentity {
            provider: Provider::Google,
            subject: subject.to_string(),
            email: email.map(String::from),
            display_name: Some("Test User".to_string()),
            avatar_url: Some("https://example.com/photo.jpg".to_string()),
        }
    }

    fn resolver() -> (Arc<InMemoryUserStore>, IdentityResolver) {
        let store = Arc::new(InMemoryUserStore::new());
        let resolver = IdentityResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn resolving_twice_yields_same_account_and_one_identity() {
        let (store, resolver) = resolver();
        let identity = google_identity("sub-1", Some("user@example.com"));

        let first = resolver
            .resolve_or_create(&identity, Platform::Web)
            .await
            .unwrap();
        let second = resolver
            .resolve_or_create(&identity, Platform::Ios)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);

        // Second resolution must not have created another identity row, and
        // must have recorded the new platform
        let row = store
            .find_identity(Provider::Google, "sub-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.platform, Platform::Ios);
    }

    #[tokio::test]
    async fn returning_user_does_not_mutate_account() {
        let (store, resolver) = resolver();
        let identity = google_identity("sub-1", Some("user@example.com"));

        let account = resolver
            .resolve_or_create(&identity, Platform::Web)
            .await
            .unwrap();

        let mut changed = identity.clone();
        changed.display_name = Some("Renamed User".to_string());
        let again = resolver
            .resolve_or_create(&changed, Platform::Web)
            .await
            .unwrap();

        assert_eq!(again.name, account.name);
        assert_eq!(
            store.find_account(account.id).await.unwrap().unwrap().name,
            account.name
        );
    }

    #[tokio::test]
    async fn email_links_second_provider_to_same_account() {
        let (store, resolver) = resolver();

        let google = google_identity("g-sub", Some("user@example.com"));
        let account = resolver
            .resolve_or_create(&google, Platform::Web)
            .await
            .unwrap();

        let facebook = NormalizedIdentity {
            provider: Provider::Facebook,
            subject: "fb-sub".to_string(),
            email: Some("user@example.com".to_string()),
            display_name: Some("Test User".to_string()),
            avatar_url: None,
        };
        let linked = resolver
            .resolve_or_create(&facebook, Platform::Android)
            .await
            .unwrap();

        assert_eq!(linked.id, account.id);
        assert!(
            store
                .find_identity(Provider::Facebook, "fb-sub")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn email_linking_can_be_disabled() {
        let store = Arc::new(InMemoryUserStore::new());
        let resolver = IdentityResolver::new(store.clone()).with_link_by_email(false);

        let google = google_identity("g-sub", Some("user@example.com"));
        let first = resolver
            .resolve_or_create(&google, Platform::Web)
            .await
            .unwrap();

        let facebook = NormalizedIdentity {
            provider: Provider::Facebook,
            subject: "fb-sub".to_string(),
            email: Some("user@example.com".to_string()),
            display_name: None,
            avatar_url: None,
        };
        let second = resolver
            .resolve_or_create(&facebook, Platform::Web)
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn missing_email_always_creates_a_fresh_account() {
        let (_, resolver) = resolver();

        let first = resolver
            .resolve_or_create(&google_identity("sub-1", None), Platform::Web)
            .await
            .unwrap();
        let second = resolver
            .resolve_or_create(&google_identity("sub-2", None), Platform::Web)
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn empty_subject_is_rejected() {
        let (_, resolver) = resolver();
        let err = resolver
            .resolve_or_create(&google_identity("", None), Platform::Web)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmptySubject(Provider::Google)));
    }

    #[tokio::test]
    async fn concurrent_first_sign_ins_serialize_onto_one_row() {
        let (store, resolver) = resolver();
        let resolver = Arc::new(resolver);

        let mut handles = vec![];
        for _ in 0..16 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver
                    .resolve_or_create(
                        &google_identity("contended-sub", Some("user@example.com")),
                        Platform::Web,
                    )
                    .await
            }));
        }

        let mut account_ids = vec![];
        for handle in handles {
            account_ids.push(handle.await.unwrap().unwrap().id);
        }

        // Every resolution landed on the winning row
        account_ids.dedup();
        assert_eq!(account_ids.len(), 1);

        // And only one identity row exists for the subject
        assert!(
            store
                .find_identity(Provider::Google, "contended-sub")
                .await
                .unwrap()
                .is_some()
        );
    }
}
