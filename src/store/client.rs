//! REST client for the hosted store.

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::{HttpConfig, StoreConfig};
use crate::store::error::{decode_error_body, Result, StoreError};

/// Media type asking the store for exactly one JSON object instead of an
/// array. Zero matching rows then come back as the no-rows error code.
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// A configured client for the store's REST endpoint.
///
/// Every request carries the public `apikey` header; the bearer credential
/// is either the public key itself (anonymous role) or a session-scoped
/// token minted by the credential provider, which the store's row-level
/// policy evaluates.
#[derive(Clone)]
pub struct StoreClient {
    http: Client,
    base_url: String,
    anon_key: String,
    bearer: String,
}

impl StoreClient {
    /// Client authenticated with the public API key only.
    pub fn new(config: &StoreConfig, http: &HttpConfig) -> Result<Self> {
        let bearer = config.anon_key.clone();
        Self::build(config, http, bearer)
    }

    /// Client carrying a session-scoped bearer token.
    pub fn with_token(config: &StoreConfig, http: &HttpConfig, token: impl Into<String>) -> Result<Self> {
        Self::build(config, http, token.into())
    }

    fn build(config: &StoreConfig, http: &HttpConfig, bearer: String) -> Result<Self> {
        if config.url.is_empty() {
            return Err(StoreError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = config.url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(http.request_timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .user_agent(format!("authbridge/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http: client,
            base_url,
            anon_key: config.anon_key.clone(),
            bearer,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.bearer)
    }

    /// Select exactly one row where `column = value`.
    ///
    /// Zero matching rows surface as the distinguished [`StoreError::NotFound`].
    pub async fn select_one<T: DeserializeOwned>(&self, table: &str, column: &str, value: &str) -> Result<T> {
        debug!(table = %table, column = %column, "selecting single row");
        let filter = format!("eq.{}", value);
        let response = self
            .request(Method::GET, table)
            .query(&[(column, filter.as_str()), ("select", "*")])
            .header(header::ACCEPT, OBJECT_MEDIA_TYPE)
            .send()
            .await
            .map_err(connect_error)?;
        Self::decode(response).await
    }

    /// Insert one row and read the stored row back.
    pub async fn insert_one<T: DeserializeOwned>(&self, table: &str, row: &Value) -> Result<T> {
        debug!(table = %table, "inserting row");
        let response = self
            .request(Method::POST, table)
            .header(header::ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(connect_error)?;
        Self::decode(response).await
    }

    /// Update the rows where `column = value`, returning the updated row.
    pub async fn update_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: &Value,
    ) -> Result<T> {
        debug!(table = %table, column = %column, "updating row");
        let filter = format!("eq.{}", value);
        let response = self
            .request(Method::PATCH, table)
            .query(&[(column, filter.as_str())])
            .header(header::ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(connect_error)?;
        Self::decode(response).await
    }

    /// Connectivity probe: an aggregate count on `table`. Any success means
    /// the endpoint is reachable and the credential may read the table.
    pub async fn probe(&self, table: &str) -> Result<()> {
        debug!(table = %table, "probing store connectivity");
        let response = self
            .request(Method::GET, table)
            .query(&[("select", "count")])
            .send()
            .await
            .map_err(connect_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn error_from(status: StatusCode, response: Response) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        decode_error_body(status.as_u16(), &body)
    }
}

fn connect_error(e: reqwest::Error) -> StoreError {
    if e.is_connect() {
        StoreError::Unreachable(e.to_string())
    } else {
        StoreError::Request(e)
    }
}
