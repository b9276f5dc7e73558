use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

/// Errors raised while loading configuration from the environment.
///
/// A missing or invalid required value is a fatal misconfiguration; the
/// process refuses to start rather than running without credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub provider: ProviderConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosted store REST endpoint. Both values are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `https://xyz.example.co`
    pub url: String,
    /// Public (anonymous) API key sent with every request
    pub anon_key: String,
}

/// Credential provider session API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_url: String,
    pub secret_key: String,
    /// Token template used to mint store-scoped bearer tokens.
    /// Unset means no token is minted and the public key is used as-is.
    pub token_template: Option<String>,
}

/// Outbound HTTP client settings shared by the store and provider clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

const DEFAULT_PROVIDER_API_URL: &str = "https://api.clerk.com";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let store = StoreConfig {
            url: normalize_url("STORE_URL", require("STORE_URL")?)?,
            anon_key: require("STORE_ANON_KEY")?,
        };

        let provider = ProviderConfig {
            api_url: normalize_url(
                "PROVIDER_API_URL",
                env::var("PROVIDER_API_URL").unwrap_or_else(|_| DEFAULT_PROVIDER_API_URL.to_string()),
            )?,
            secret_key: require("PROVIDER_SECRET_KEY")?,
            token_template: env::var("PROVIDER_TOKEN_TEMPLATE").ok().filter(|v| !v.trim().is_empty()),
        };

        // Set defaults based on environment, then override with specific env vars
        let http = match environment {
            Environment::Development => HttpConfig {
                request_timeout_secs: 30,
                connect_timeout_secs: 10,
            },
            Environment::Staging | Environment::Production => HttpConfig {
                request_timeout_secs: 10,
                connect_timeout_secs: 5,
            },
        };

        Ok(Self {
            environment,
            store,
            provider,
            http,
        }
        .with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("HTTP_REQUEST_TIMEOUT_SECS") {
            self.http.request_timeout_secs = v.parse().unwrap_or(self.http.request_timeout_secs);
        }
        if let Ok(v) = env::var("HTTP_CONNECT_TIMEOUT_SECS") {
            self.http.connect_timeout_secs = v.parse().unwrap_or(self.http.connect_timeout_secs);
        }
        self
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Endpoints must be absolute http(s) URLs; a trailing slash is dropped.
fn normalize_url(name: &'static str, raw: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&raw).map_err(|e| ConfigError::Invalid(name, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(ConfigError::Invalid(name, format!("unsupported scheme: {}", other))),
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::from_env().unwrap_or_else(|e| panic!("fatal configuration error: {}", e))
});

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
