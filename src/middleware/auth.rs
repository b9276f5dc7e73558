use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::identity::AuthSession;
use crate::AppState;

/// Authentication state of the current request, resolved once per request
/// and injected as an extension.
///
/// An anonymous request is a state, not an error; each handler decides
/// whether it can serve it. `Failed` means the provider could not be asked,
/// which is distinct from "no session".
#[derive(Clone, Debug)]
pub enum AuthState {
    Anonymous,
    SignedIn(AuthSession),
    Failed(String),
}

/// Resolves the bearer session token (if any) against the credential
/// provider and attaches the outcome to the request.
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = bearer_token(request.headers());

    let auth = match token {
        None => AuthState::Anonymous,
        Some(token) => match state.provider.resolve_session(&token).await {
            Ok(Some(session)) => AuthState::SignedIn(session),
            Ok(None) => AuthState::Anonymous,
            Err(e) => {
                warn!("session resolution failed: {}", e);
                AuthState::Failed("Identity provider unavailable".to_string())
            }
        },
    };

    request.extensions_mut().insert(auth);
    next.run(request).await
}

/// Extract the bearer session token from the Authorization header.
///
/// A missing, malformed or empty header reads as "no session" rather than
/// an error; session validity is the provider's call, not ours.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
