//! Core identity types and the user-store contract.

mod store;
mod types;

pub use store::{NewUserAccount, NewUserIdentity, UserAccount, UserIdentity, UserStore};
pub use types::{NormalizedIdentity, Platform, PlatformClass, Provider};

use thiserror::Error;

/// Errors surfaced by identity resolution and the user store.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Another identity record already links `(provider, subject)` to an
    /// account. Surfaced on conflicting inserts, never auto-resolved.
    #[error("Identity already linked for {provider} subject {subject}")]
    DuplicateIdentity { provider: Provider, subject: String },

    /// The referenced account does not exist in the store.
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// A provider produced an identity with an empty subject id.
    #[error("Provider {0} returned an empty subject id")]
    EmptySubject(Provider),

    /// The underlying store failed.
    #[error("Store error: {0}")]
    Store(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;
