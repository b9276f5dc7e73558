use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{HttpConfig, ProviderConfig};
use crate::identity::{Actor, AuthSession};

/// Errors from the credential-provider API.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider is offline or unreachable
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    /// Provider returned an error response
    #[error("Provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse provider response
    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

/// Seam to the external credential provider.
///
/// Only the two operations this service needs: resolving the actor behind a
/// session token, and minting a store-scoped bearer token for a session.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve a session token into an active session. `None` means the
    /// token does not belong to an active session (signed out, expired or
    /// revoked) - that is a state, not an error.
    async fn resolve_session(&self, session_token: &str) -> Result<Option<AuthSession>, IdentityError>;

    /// Mint a store-scoped bearer token for the session. `None` means the
    /// provider has no token template configured for the store.
    async fn store_token(&self, session_id: &str) -> Result<Option<String>, IdentityError>;
}

/// HTTP implementation of [`CredentialProvider`] against the provider's
/// backend API, authenticated with the instance secret key.
pub struct HttpProvider {
    http: Client,
    api_url: String,
    secret_key: String,
    token_template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    user_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct EmailAddressBody {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddressBody>,
    primary_email_address_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    jwt: String,
}

impl UserBody {
    /// The address matching `primary_email_address_id`, else the first listed.
    fn primary_email(&self) -> Option<String> {
        let by_id = self.primary_email_address_id.as_ref().and_then(|primary| {
            self.email_addresses
                .iter()
                .find(|address| &address.id == primary)
        });
        by_id
            .or_else(|| self.email_addresses.first())
            .map(|address| address.email_address.clone())
    }
}

impl HttpProvider {
    pub fn from_config(config: &ProviderConfig, http: &HttpConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.request_timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .user_agent(format!("authbridge/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http: client,
            api_url: config.api_url.clone(),
            secret_key: config.secret_key.clone(),
            token_template: config.token_template.clone(),
        })
    }

    async fn verify_session(&self, session_token: &str) -> Result<Option<SessionBody>, IdentityError> {
        let url = format!("{}/v1/sessions/verify", self.api_url);
        debug!(url = %url, "verifying session token");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({ "token": session_token }))
            .send()
            .await
            .map_err(connect_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            debug!(status = %status, "session token not active");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let session: SessionBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("session body: {}", e)))?;

        if session.status != "active" {
            debug!(session_id = %session.id, status = %session.status, "session is not active");
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserBody, IdentityError> {
        let url = format!("{}/v1/users/{}", self.api_url, user_id);
        debug!(url = %url, "fetching provider user");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(connect_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("user body: {}", e)))
    }
}

#[async_trait]
impl CredentialProvider for HttpProvider {
    async fn resolve_session(&self, session_token: &str) -> Result<Option<AuthSession>, IdentityError> {
        let session = match self.verify_session(session_token).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        let user = self.fetch_user(&session.user_id).await?;
        let actor = Actor {
            id: user.id.clone(),
            full_name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            primary_email: user.primary_email(),
        };

        debug!(actor_id = %actor.id, session_id = %session.id, "session resolved");
        Ok(Some(AuthSession {
            actor,
            session_id: session.id,
        }))
    }

    async fn store_token(&self, session_id: &str) -> Result<Option<String>, IdentityError> {
        let template = match &self.token_template {
            Some(template) => template,
            None => return Ok(None),
        };

        let url = format!("{}/v1/sessions/{}/tokens/{}", self.api_url, session_id, template);
        debug!(url = %url, "minting store token");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(connect_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(template = %template, "token template not known to the provider");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let token: TokenBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("token body: {}", e)))?;
        Ok(Some(token.jwt))
    }
}

fn connect_error(e: reqwest::Error) -> IdentityError {
    if e.is_connect() {
        IdentityError::Unreachable(e.to_string())
    } else {
        IdentityError::Request(e)
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> IdentityError {
    let message = response.text().await.unwrap_or_default();
    IdentityError::Api {
        status: status.as_u16(),
        message,
    }
}
