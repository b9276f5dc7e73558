//! Hosted-store REST client and the two client-factory variants.

mod client;
mod error;
mod factory;
mod reactive;

pub use client::StoreClient;
pub use error::{Result, StoreError};
pub use factory::{session_client, FactoryError};
pub use reactive::ReactiveClient;
