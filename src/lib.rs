pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod store;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::identity::CredentialProvider;
use crate::store::StoreClient;
use crate::users::USERS_TABLE;

/// Shared application state: configuration plus the credential-provider seam.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn CredentialProvider>,
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/auth/whoami", get(handlers::whoami::whoami))
        .route("/api/profile", get(handlers::profile::profile_get))
        .route("/api/profile/name", put(handlers::profile::profile_name_put))
        .route("/api/diag", get(handlers::diag::diag_get))
        // Session resolution runs once per request, before any handler
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(api)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "authbridge",
            "version": version,
            "description": "Bridges identity-provider sessions into a hosted-store client",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public - store connectivity)",
                "whoami": "/api/auth/whoami (session)",
                "profile": "/api/profile (session), /api/profile/name (session)",
                "diag": "/api/diag (public - richer when signed in)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let result = match StoreClient::new(&state.config.store, &state.config.http) {
        Ok(client) => client.probe(USERS_TABLE).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
