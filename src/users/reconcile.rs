//! Fetch-or-create reconciliation for the `users` table.
//!
//! The flow runs lookup -> {found | create} -> settled. The store's no-rows
//! signal drives the create branch; every other failure halts the flow with
//! no row. The unique constraint on `clerk_id` is the backstop for racing
//! first visits: a conflicting insert re-reads and settles on the winner.

use serde_json::json;
use tracing::{debug, info};

use crate::identity::Actor;
use crate::store::{Result, StoreClient, StoreError};
use crate::users::model::UserRecord;

pub const USERS_TABLE: &str = "users";

const FALLBACK_NAME: &str = "Anonymous";

/// Outcome of a settled reconciliation: the row, and whether this call
/// created it.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub user: UserRecord,
    pub created: bool,
}

/// First non-empty candidate among full name, first and last name joined,
/// the local part of the primary email address, and a fixed placeholder.
pub fn derive_display_name(actor: &Actor) -> String {
    if let Some(full) = non_empty(actor.full_name.as_deref()) {
        return full.to_string();
    }

    let joined = [actor.first_name.as_deref(), actor.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        return joined;
    }

    if let Some(email) = non_empty(actor.primary_email.as_deref()) {
        if let Some(local) = non_empty(email.split('@').next()) {
            return local.to_string();
        }
    }

    FALLBACK_NAME.to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Look up the actor's row by external id, creating it on the first visit.
pub async fn fetch_or_create(store: &StoreClient, actor: &Actor) -> Result<Reconciled> {
    debug!(clerk_id = %actor.id, "looking up user row");
    match lookup(store, &actor.id).await {
        Ok(user) => {
            debug!(clerk_id = %actor.id, "existing row found");
            Ok(Reconciled { user, created: false })
        }
        Err(StoreError::NotFound) => create(store, actor).await,
        Err(e) => Err(e),
    }
}

async fn lookup(store: &StoreClient, clerk_id: &str) -> Result<UserRecord> {
    store.select_one(USERS_TABLE, "clerk_id", clerk_id).await
}

async fn create(store: &StoreClient, actor: &Actor) -> Result<Reconciled> {
    let name = derive_display_name(actor);
    info!(clerk_id = %actor.id, name = %name, "creating user row");

    let row = json!({
        "clerk_id": actor.id,
        "name": name,
    });

    match store.insert_one(USERS_TABLE, &row).await {
        Ok(user) => Ok(Reconciled { user, created: true }),
        Err(e) if e.is_unique_violation() => {
            // Lost the first-visit race; take the winner's row.
            debug!(clerk_id = %actor.id, "insert conflicted, re-reading winner row");
            let user = lookup(store, &actor.id).await?;
            Ok(Reconciled { user, created: false })
        }
        Err(e) => Err(e),
    }
}

/// Update the display name of the actor's row, returning the updated row.
///
/// A name that is empty after trimming is a silent no-op: `None` comes back
/// and no store call is made.
pub async fn update_name(store: &StoreClient, clerk_id: &str, new_name: &str) -> Result<Option<UserRecord>> {
    let trimmed = new_name.trim();
    if trimmed.is_empty() {
        debug!(clerk_id = %clerk_id, "ignoring empty name update");
        return Ok(None);
    }

    let patch = json!({ "name": trimmed });
    let user = store
        .update_one(USERS_TABLE, "clerk_id", clerk_id, &patch)
        .await?;
    info!(clerk_id = %clerk_id, name = %trimmed, "user name updated");
    Ok(Some(user))
}
