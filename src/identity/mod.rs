//! Identity types and the credential-provider integration.
//!
//! The provider owns token issuance and session validation; this module only
//! resolves a session token into an [`Actor`] and mints store-scoped tokens
//! on demand.

use serde::{Deserialize, Serialize};

mod provider;

pub use provider::{CredentialProvider, HttpProvider, IdentityError};

/// The authenticated end user for the current request or session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// External identity id issued by the provider, e.g. `user_2xyz`
    pub id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub primary_email: Option<String>,
}

/// Load state of the identity layer as seen by an interactive client.
///
/// `Loading` means the provider has not yet reported whether a session
/// exists; consumers must not touch the store until the state settles.
#[derive(Debug, Clone)]
pub enum IdentityState {
    Loading,
    SignedOut,
    SignedIn(Actor),
}

/// A resolved, active session: the actor plus the provider-side session id
/// used for minting store tokens.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub actor: Actor,
    pub session_id: String,
}
