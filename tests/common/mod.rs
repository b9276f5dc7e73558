// Shared fixtures for the integration tests. Not every test binary uses
// every helper.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use authbridge::config::{AppConfig, Environment, HttpConfig, ProviderConfig, StoreConfig};
use authbridge::identity::HttpProvider;
use authbridge::{app, AppState};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_TOKEN: &str = "sess_token_abc";
pub const SESSION_ID: &str = "sess_1";
pub const ACTOR_ID: &str = "u_123";

/// Everything an API test needs: the two mocked collaborators and the
/// in-process app listening on a local port.
pub struct TestApp {
    pub store: MockServer,
    pub provider: MockServer,
    pub base_url: String,
}

pub fn test_config(store_url: &str, provider_url: &str, token_template: Option<&str>) -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        store: StoreConfig {
            url: store_url.to_string(),
            anon_key: "anon-key".to_string(),
        },
        provider: ProviderConfig {
            api_url: provider_url.to_string(),
            secret_key: "sk_test_secret".to_string(),
            token_template: token_template.map(String::from),
        },
        http: HttpConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
        },
    }
}

/// Serve the router for an explicit config on an OS-assigned port; the
/// caller owns whatever mocks the config points at.
pub async fn serve(config: AppConfig) -> Result<String> {
    let provider_client = HttpProvider::from_config(&config.provider, &config.http)?;
    let state = AppState {
        config: Arc::new(config),
        provider: Arc::new(provider_client),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.expect("test server");
    });

    Ok(format!("http://{}", addr))
}

/// Serve the router backed by freshly started mock collaborators.
pub async fn spawn_app(token_template: Option<&str>) -> Result<TestApp> {
    let store = MockServer::start().await;
    let provider = MockServer::start().await;
    let base_url = serve(test_config(&store.uri(), &provider.uri(), token_template)).await?;

    Ok(TestApp {
        store,
        provider,
        base_url,
    })
}

/// Mount an active session and its user object on the provider mock.
pub async fn mount_signed_in(provider: &MockServer, user: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": SESSION_ID,
            "user_id": ACTOR_ID,
            "status": "active",
        })))
        .mount(provider)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{}", ACTOR_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
        .mount(provider)
        .await;
}

/// A provider user object with a single (primary) email address.
pub fn provider_user(
    name: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
) -> Value {
    let email_addresses = match email {
        Some(address) => json!([{ "id": "em_1", "email_address": address }]),
        None => json!([]),
    };

    json!({
        "id": ACTOR_ID,
        "name": name,
        "first_name": first_name,
        "last_name": last_name,
        "email_addresses": email_addresses,
        "primary_email_address_id": email.map(|_| "em_1"),
    })
}

/// A `users` row as the store returns it.
pub fn user_row(clerk_id: &str, name: &str) -> Value {
    json!({
        "id": "7f9c0a7e-2c4b-4b6e-9a8e-5d2f0e1b3c4d",
        "clerk_id": clerk_id,
        "name": name,
        "created_at": "2026-08-01T09:30:00Z",
    })
}

/// The store's response when a single-object request matches no rows.
pub fn no_rows_response() -> ResponseTemplate {
    ResponseTemplate::new(406).set_body_json(json!({
        "code": "PGRST116",
        "message": "JSON object requested, multiple (or no) rows returned",
        "details": "Results contain 0 rows",
        "hint": null,
    }))
}
