//! The `users` table: row model and the reconciliation flow that keeps
//! exactly one row per external identity.

mod model;
mod reconcile;

pub use model::UserRecord;
pub use reconcile::{derive_display_name, fetch_or_create, update_name, Reconciled, USERS_TABLE};
