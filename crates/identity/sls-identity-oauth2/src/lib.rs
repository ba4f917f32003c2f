//! OAuth2 provider clients with PKCE support and authorization-state management.
//!
//! This crate provides the provider-facing half of the authorization-code
//! flow: per-provider clients (Google, Facebook, Apple) behind one
//! [`ProviderClient`] capability trait, a registry to dispatch on the
//! provider named by a request, and the short-lived, single-use
//! authorization-state store that correlates an authorize request with its
//! later callback.

mod config;
mod error;
mod pkce;
mod providers;
mod registry;
mod state;
mod types;


pub use config::{OAuth2Config, ProviderConfig};
pub use error::{OAuth2Error, OAuth2Result};
pub use pkce::{PkceChallenge, code_challenge_s256};
pub use providers::{AppleClient, FacebookClient, GoogleClient, ProviderClient};
pub use registry::ProviderRegistry;
pub use state::{AuthorizationState, AuthorizationStateStore, InMemoryStateStore};
pub use types::{CodeChallenge, ProviderTokenSet, UserInfoResponse};

// Re-export common types for convenience
pub use sls_identity_core::{NormalizedIdentity, Platform, Provider};
