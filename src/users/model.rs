use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `users` table, as stored and returned by the store.
///
/// `id` and `created_at` are assigned by the store at insertion; `clerk_id`
/// is set once and never changes; only `name` is mutable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub clerk_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
