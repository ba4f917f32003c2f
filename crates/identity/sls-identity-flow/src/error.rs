//! Flow error taxonomy.

use sls_identity_core::IdentityError;
use sls_identity_oauth2::OAuth2Error;
use sls_identity_session::SessionError;
use thiserror::Error;

pub type FlowResult<T> = Result<T, FlowError>;

/// A failed flow, from whichever stage it failed in.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    OAuth2(#[from] OAuth2Error),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl FlowError {
    /// Short stable code, safe to expose to clients in redirect query
    /// parameters and error bodies. Raw upstream messages stay in the logs.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::OAuth2(e) => e.code(),
            FlowError::Identity(IdentityError::DuplicateIdentity { .. }) => "duplicate_identity",
            FlowError::Identity(_) => "identity_resolution_failed",
            FlowError::Session(_) => "session_issuance_failed",
        }
    }

    /// Whether restarting the flow from a fresh authorize request can help.
    pub fn client_retryable(&self) -> bool {
        matches!(self, FlowError::OAuth2(OAuth2Error::StateNotFound))
    }
}
