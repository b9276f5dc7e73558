use axum::{response::Json, Extension};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::require_session;
use crate::middleware::AuthState;

/// GET /api/auth/whoami - the actor behind the current session
pub async fn whoami(Extension(auth): Extension<AuthState>) -> Result<Json<Value>, ApiError> {
    let session = require_session(auth)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "id": session.actor.id,
            "full_name": session.actor.full_name,
            "first_name": session.actor.first_name,
            "last_name": session.actor.last_name,
            "primary_email": session.actor.primary_email,
        }
    })))
}
