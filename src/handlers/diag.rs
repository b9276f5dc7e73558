use axum::{extract::State, response::Json, Extension};
use serde_json::{json, Value};
use tracing::debug;

use crate::identity::AuthSession;
use crate::middleware::AuthState;
use crate::store::{self, StoreClient};
use crate::users::{self, USERS_TABLE};
use crate::AppState;

/// GET /api/diag - end-to-end diagnostic report
///
/// Runs the connectivity probe and, for a signed-in actor, the user
/// reconciliation flow. Always answers 200: every failure is embedded in
/// its section of the report, scoped to this request, and retried only by
/// asking again.
pub async fn diag_get(State(state): State<AppState>, Extension(auth): Extension<AuthState>) -> Json<Value> {
    // The probe and the reconciliation flow run concurrently; neither
    // failure blocks the other's section.
    let (connection, identity, reconciliation) = match auth {
        AuthState::SignedIn(session) => {
            let (connection, reconciliation) =
                futures::join!(probe_section(&state), reconcile_section(&state, &session));
            (
                connection,
                json!({ "authenticated": true, "actor": session.actor }),
                reconciliation,
            )
        }
        AuthState::Anonymous => (
            probe_section(&state).await,
            json!({ "authenticated": false }),
            json!({ "status": "skipped", "reason": "sign-in required" }),
        ),
        AuthState::Failed(message) => (
            probe_section(&state).await,
            json!({ "authenticated": false, "error": message }),
            json!({ "status": "skipped", "reason": "identity unavailable" }),
        ),
    };

    Json(json!({
        "success": true,
        "data": {
            "connection": connection,
            "identity": identity,
            "reconciliation": reconciliation,
        }
    }))
}

async fn probe_section(state: &AppState) -> Value {
    let result = match StoreClient::new(&state.config.store, &state.config.http) {
        Ok(client) => client.probe(USERS_TABLE).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => json!({ "status": "ok" }),
        Err(e) => {
            debug!("connectivity probe failed: {}", e);
            json!({ "status": "error", "error": e.to_string() })
        }
    }
}

async fn reconcile_section(state: &AppState, session: &AuthSession) -> Value {
    let client = match store::session_client(
        &state.config.store,
        &state.config.http,
        state.provider.as_ref(),
        session,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => return json!({ "status": "error", "error": e.to_string() }),
    };

    match users::fetch_or_create(&client, &session.actor).await {
        Ok(reconciled) => json!({
            "status": "ok",
            "created": reconciled.created,
            "user": reconciled.user,
        }),
        Err(e) => json!({ "status": "error", "error": e.to_string() }),
    }
}
