//! Identity resolution: mapping normalized provider identities onto local
//! user accounts, creating accounts and identity links as needed.

mod resolver;
mod store;

pub use resolver::IdentityResolver;
pub use store::InMemoryUserStore;

// Re-export common types for convenience
pub use sls_identity_core::{
    IdentityError, IdentityResult, NormalizedIdentity, UserAccount, UserIdentity, UserStore,
};
