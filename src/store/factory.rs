//! Server-variant client factory.

use thiserror::Error;
use tracing::debug;

use crate::config::{HttpConfig, StoreConfig};
use crate::identity::{AuthSession, CredentialProvider, IdentityError};
use crate::store::client::StoreClient;
use crate::store::error::StoreError;

/// Errors from the server-variant client factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build a store client for a resolved session.
///
/// Unauthenticated requests never reach this point; the auth middleware has
/// already settled the session. Mints a store-scoped token and attaches it
/// as the bearer credential so row-level policy applies to the actor. When
/// the provider has no token template configured, the public key is used,
/// leaving the request on the store's anonymous role.
pub async fn session_client(
    store: &StoreConfig,
    http: &HttpConfig,
    provider: &dyn CredentialProvider,
    session: &AuthSession,
) -> Result<StoreClient, FactoryError> {
    match provider.store_token(&session.session_id).await? {
        Some(token) => {
            debug!(session_id = %session.session_id, "building store client with session token");
            Ok(StoreClient::with_token(store, http, token)?)
        }
        None => {
            debug!(session_id = %session.session_id, "no token template; building store client with public key");
            Ok(StoreClient::new(store, http)?)
        }
    }
}
