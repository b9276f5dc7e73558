//! Interactive-variant client factory.

use tokio::sync::watch;
use tracing::debug;

use crate::config::{HttpConfig, StoreConfig};
use crate::identity::IdentityState;
use crate::store::client::StoreClient;
use crate::store::error::Result;

/// A store client scoped to the current identity epoch.
///
/// Watches the identity layer and re-derives the client whenever the
/// identity state changes. While the state is still [`IdentityState::Loading`]
/// there is no client and no request leaves the process. A superseded client
/// is dropped on rebuild; anything still in flight against it is abandoned
/// without a cancellation signal.
pub struct ReactiveClient {
    store: StoreConfig,
    http: HttpConfig,
    identity: watch::Receiver<IdentityState>,
    current: Option<StoreClient>,
    epoch: u64,
}

impl ReactiveClient {
    pub fn new(store: StoreConfig, http: HttpConfig, identity: watch::Receiver<IdentityState>) -> Self {
        Self {
            store,
            http,
            identity,
            current: None,
            epoch: 0,
        }
    }

    /// The client for the current identity epoch, or `None` while the
    /// identity layer has not settled yet.
    ///
    /// The interactive variant never carries a session token; it stays on
    /// the public key and relies on rebuild-per-epoch for freshness.
    pub fn client(&mut self) -> Result<Option<&StoreClient>> {
        // A closed sender means the identity stream ended; keep serving the
        // last settled state.
        let changed = self.identity.has_changed().unwrap_or(false);

        if changed || self.current.is_none() {
            let state = self.identity.borrow_and_update().clone();
            self.current = match state {
                IdentityState::Loading => None,
                IdentityState::SignedOut | IdentityState::SignedIn(_) => {
                    self.epoch += 1;
                    debug!(epoch = self.epoch, "identity state settled, deriving store client");
                    Some(StoreClient::new(&self.store, &self.http)?)
                }
            };
        }

        Ok(self.current.as_ref())
    }

    /// How many times a client has been derived. Increments once per
    /// identity-state change that yields a client.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
