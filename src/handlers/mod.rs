pub mod diag;
pub mod profile;
pub mod whoami;

use crate::error::ApiError;
use crate::identity::AuthSession;
use crate::middleware::AuthState;

/// The session behind the request, or the error the endpoint owes the
/// caller when there is none.
pub(crate) fn require_session(auth: AuthState) -> Result<AuthSession, ApiError> {
    match auth {
        AuthState::SignedIn(session) => Ok(session),
        AuthState::Anonymous => Err(ApiError::unauthorized("No active session")),
        AuthState::Failed(msg) => Err(ApiError::bad_gateway(msg)),
    }
}
