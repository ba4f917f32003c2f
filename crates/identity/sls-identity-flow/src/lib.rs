//! Login orchestration over the provider, account, and session layers.
//!
//! [`LoginFlow`] drives the authorization-code flow end to end: the
//! authorize step pins down what a callback is allowed to do, the callback
//! step consumes that record exactly once and walks
//! exchange → identity → account → credential, and the token step exposes
//! the same pipeline API-shaped for clients that finish the flow themselves.

mod error;
mod flow;
mod types;


pub use error::{FlowError, FlowResult};
pub use flow::{FlowConfig, LoginFlow};
pub use types::{AuthorizeGrant, AuthorizeRequest, CallbackOutcome, FlowStage, TokenGrant,
    TokenRequest};

// Re-export common types for convenience
pub use sls_identity_core::{Platform, Provider, UserAccount};
