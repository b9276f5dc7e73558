use axum::{extract::State, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::require_session;
use crate::middleware::AuthState;
use crate::{store, users, AppState};

/// GET /api/profile - the actor's user row, created on first visit
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
) -> Result<Json<Value>, ApiError> {
    let session = require_session(auth)?;
    let client = store::session_client(
        &state.config.store,
        &state.config.http,
        state.provider.as_ref(),
        &session,
    )
    .await?;

    let reconciled = users::fetch_or_create(&client, &session.actor).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "user": reconciled.user,
            "created": reconciled.created,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    pub name: String,
}

/// PUT /api/profile/name - rename the actor's user row
///
/// A name that is empty after trimming is acknowledged but changes nothing;
/// `data` comes back null and the store is never called.
pub async fn profile_name_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
    Json(payload): Json<UpdateNameRequest>,
) -> Result<Json<Value>, ApiError> {
    let session = require_session(auth)?;
    let client = store::session_client(
        &state.config.store,
        &state.config.http,
        state.provider.as_ref(),
        &session,
    )
    .await?;

    let updated = users::update_name(&client, &session.actor.id, &payload.name).await?;

    Ok(Json(json!({
        "success": true,
        "data": updated,
    })))
}
