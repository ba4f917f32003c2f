//! Persisted record shapes and the user-store contract.

use crate::{IdentityResult, Platform, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local user account. Owned by the external store; one account may link
/// identities from several providers over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub primary_provider: Provider,
    pub created_at: DateTime<Utc>,
}

/// Link between one provider-scoped subject and a local account.
///
/// `(provider, subject)` is globally unique across all identity records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub account_id: i64,
    pub provider: Provider,
    /// Platform that last authenticated through this identity.
    pub platform: Platform,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Insert shape for a new account.
#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub primary_provider: Provider,
}

/// Insert shape for a new identity link.
#[derive(Debug, Clone)]
pub struct NewUserIdentity {
    pub provider: Provider,
    pub platform: Platform,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Lookup/insert contract over the external user store.
///
/// Implementations must enforce the `(provider, subject)` uniqueness
/// invariant on `insert_identity` as a hard constraint, reporting
/// [`IdentityError::DuplicateIdentity`](crate::IdentityError::DuplicateIdentity)
/// on conflict, and must not expose partially created account/identity
/// pairs to concurrent readers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_identity(
        &self,
        provider: Provider,
        subject: &str,
    ) -> IdentityResult<Option<UserIdentity>>;

    async fn find_account(&self, account_id: i64) -> IdentityResult<Option<UserAccount>>;

    async fn find_account_by_email(&self, email: &str) -> IdentityResult<Option<UserAccount>>;

    async fn insert_account(&self, account: NewUserAccount) -> IdentityResult<UserAccount>;

    async fn insert_identity(
        &self,
        account_id: i64,
        identity: NewUserIdentity,
    ) -> IdentityResult<UserIdentity>;

    /// Creates an account and its first identity link in one atomic step.
    ///
    /// The transactional boundary for first-time sign-ins: either both
    /// records exist afterwards or neither does.
    async fn create_account_with_identity(
        &self,
        account: NewUserAccount,
        identity: NewUserIdentity,
    ) -> IdentityResult<(UserAccount, UserIdentity)>;

    /// Updates an identity's last-login timestamp and platform.
    async fn record_login(
        &self,
        identity_id: i64,
        platform: Platform,
        at: DateTime<Utc>,
    ) -> IdentityResult<()>;
}
