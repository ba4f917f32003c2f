//! In-memory reference implementation of the user-store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sls_identity_core::{
    IdentityError, IdentityResult, NewUserAccount, NewUserIdentity, Platform, Provider,
    UserAccount, UserIdentity, UserStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreInner {
    accounts: HashMap<i64, UserAccount>,
    identities: HashMap<i64, UserIdentity>,
    next_account_id: i64,
    next_identity_id: i64,
}

impl StoreInner {
    fn identity_by_subject(&self, provider: Provider, subject: &str) -> Option<&UserIdentity> {
        self.identities
            .values()
            .find(|identity| identity.provider == provider && identity.subject == subject)
    }

    fn alloc_account(&mut self, account: NewUserAccount, now: DateTime<Utc>) -> UserAccount {
        self.next_account_id += 1;
        let account = UserAccount {
            id: self.next_account_id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            avatar_url: account.avatar_url,
            primary_provider: account.primary_provider,
            created_at: now,
        };
        self.accounts.insert(account.id, account.clone());
        account
    }

    fn alloc_identity(
        &mut self,
        account_id: i64,
        identity: NewUserIdentity,
        now: DateTime<Utc>,
    ) -> IdentityResult<UserIdentity> {
        if let Some(existing) = self.identity_by_subject(identity.provider, &identity.subject) {
            return Err(IdentityError::DuplicateIdentity {
                provider: existing.provider,
                subject: existing.subject.clone(),
            });
        }

        self.next_identity_id += 1;
        let identity = UserIdentity {
            id: self.next_identity_id,
            account_id,
            provider: identity.provider,
            platform: identity.platform,
            subject: identity.subject,
            email: identity.email,
            display_name: identity.display_name,
            avatar_url: identity.avatar_url,
            created_at: now,
            last_login_at: now,
        };
        self.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }
}

/// In-memory [`UserStore`]. All mutation runs under one write lock per call,
/// so the combined create path is atomic and the `(provider, subject)`
/// uniqueness check cannot race an insert.
pub struct InMemoryUserStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_identity(
        &self,
        provider: Provider,
        subject: &str,
    ) -> IdentityResult<Option<UserIdentity>> {
        let inner = self.inner.read().await;
        Ok(inner.identity_by_subject(provider, subject).cloned())
    }

    async fn find_account(&self, account_id: i64) -> IdentityResult<Option<UserAccount>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(&account_id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> IdentityResult<Option<UserAccount>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert_account(&self, account: NewUserAccount) -> IdentityResult<UserAccount> {
        let mut inner = self.inner.write().await;
        Ok(inner.alloc_account(account, Utc::now()))
    }

    async fn insert_identity(
        &self,
        account_id: i64,
        identity: NewUserIdentity,
    ) -> IdentityResult<UserIdentity> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&account_id) {
            return Err(IdentityError::AccountNotFound(account_id));
        }
        inner.alloc_identity(account_id, identity, Utc::now())
    }

    async fn create_account_with_identity(
        &self,
        account: NewUserAccount,
        identity: NewUserIdentity,
    ) -> IdentityResult<(UserAccount, UserIdentity)> {
        let mut inner = self.inner.write().await;

        // Uniqueness first, so a conflict leaves no orphaned account behind
        if let Some(existing) = inner.identity_by_subject(identity.provider, &identity.subject) {
            return Err(IdentityError::DuplicateIdentity {
                provider: existing.provider,
                subject: existing.subject.clone(),
            });
        }

        let now = Utc::now();
        let account = inner.alloc_account(account, now);
        let identity = inner.alloc_identity(account.id, identity, now)?;
        Ok((account, identity))
    }

    async fn record_login(
        &self,
        identity_id: i64,
        platform: Platform,
        at: DateTime<Utc>,
    ) -> IdentityResult<()> {
        let mut inner = self.inner.write().await;
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or_else(|| IdentityError::Store(format!("identity not found: {identity_id}")))?;
        identity.last_login_at = at;
        identity.platform = platform;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_identity(subject: &str) -> NewUserIdentity {
        NewUserIdentity {
            provider: Provider::Google,
            platform: Platform::Web,
            subject: subject.to_string(),
            email: Some("user@example.com".to_string()),
            display_name: Some("Test User".to_string()),
            avatar_url: None,
        }
    }

    fn new_account() -> NewUserAccount {
        NewUserAccount {
            name: Some("Test User".to_string()),
            email: Some("user@example.com".to_string()),
            phone: None,
            avatar_url: None,
            primary_provider: Provider::Google,
        }
    }

    #[tokio::test]
    async fn duplicate_identity_is_a_hard_constraint() {
        let store = InMemoryUserStore::new();
        let (account, _) = store
            .create_account_with_identity(new_account(), new_identity("sub-1"))
            .await
            .unwrap();

        let err = store
            .insert_identity(account.id, new_identity("sub-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateIdentity { .. }));
    }

    #[tokio::test]
    async fn conflicting_create_leaves_no_orphan_account() {
        let store = InMemoryUserStore::new();
        store
            .create_account_with_identity(new_account(), new_identity("sub-1"))
            .await
            .unwrap();

        let mut second = new_account();
        second.email = Some("other@example.com".to_string());
        let err = store
            .create_account_with_identity(second, new_identity("sub-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateIdentity { .. }));

        // The losing call must not have created a second account
        assert!(
            store
                .find_account_by_email("other@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn record_login_touches_timestamp_and_platform() {
        let store = InMemoryUserStore::new();
        let (_, identity) = store
            .create_account_with_identity(new_account(), new_identity("sub-1"))
            .await
            .unwrap();

        let later = Utc::now() + chrono::Duration::minutes(10);
        store
            .record_login(identity.id, Platform::Ios, later)
            .await
            .unwrap();

        let refreshed = store
            .find_identity(Provider::Google, "sub-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.last_login_at, later);
        assert_eq!(refreshed.platform, Platform::Ios);
        assert_eq!(refreshed.created_at, identity.created_at);
    }

    #[tokio::test]
    async fn separate_inserts_link_up() {
        let store = InMemoryUserStore::new();

        let account = store.insert_account(new_account()).await.unwrap();
        let identity = store
            .insert_identity(account.id, new_identity("sub-1"))
            .await
            .unwrap();

        assert_eq!(identity.account_id, account.id);
        assert_eq!(
            store
                .find_account_by_email("user@example.com")
                .await
                .unwrap()
                .unwrap()
                .id,
            account.id
        );
    }

    #[tokio::test]
    async fn insert_identity_requires_existing_account() {
        let store = InMemoryUserStore::new();
        let err = store
            .insert_identity(9999, new_identity("sub-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::AccountNotFound(9999)));
    }
}
