//! Dropbox API client with request/response handling.

use std::time::Duration;

use reqwest::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Result, TransferError};
use crate::http::HttpClient;

/// Base URL for RPC endpoints
const RPC_URL: &str = "https://api.dropboxapi.com/2";

/// Base URL for content upload/download endpoints
const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// RPC calls carry small bodies; content calls are not time-limited.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Dropbox API client.
#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
    rpc_url: String,
    content_url: String,
}

impl ApiClient {
    /// Create a new API client authenticated with `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(token),
            rpc_url: RPC_URL.to_string(),
            content_url: CONTENT_URL.to_string(),
        }
    }

    /// Create a new API client with a proxy.
    ///
    /// # Arguments
    /// * `token` - OAuth2 access token
    /// * `proxy` - Proxy URL (e.g., "http://proxy:8080" or "socks5://proxy:1080")
    pub fn with_proxy(token: impl Into<String>, proxy: &str) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_proxy(token, proxy)?,
            rpc_url: RPC_URL.to_string(),
            content_url: CONTENT_URL.to_string(),
        })
    }

    /// Point the client at different hosts (e.g. a local mock server).
    pub fn with_base_urls(mut self, rpc_url: &str, content_url: &str) -> Self {
        self.rpc_url = rpc_url.trim_end_matches('/').to_string();
        self.content_url = content_url.trim_end_matches('/').to_string();
        self
    }

    fn rpc_endpoint(&self, endpoint: &str) -> String {
        format!("{}/{}", self.rpc_url, endpoint)
    }

    fn content_endpoint(&self, endpoint: &str) -> String {
        format!("{}/{}", self.content_url, endpoint)
    }

    /// Call an RPC endpoint with a JSON argument.
    ///
    /// # Arguments
    /// * `endpoint` - Endpoint name relative to the API root, e.g. "files/get_metadata"
    /// * `arg` - Request body
    pub async fn request<A, R>(&self, endpoint: &str, arg: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_string(arg)?;
        debug!(endpoint, body = %body, "api request");

        let response_text = timeout(RPC_TIMEOUT, self.http.rpc(&self.rpc_endpoint(endpoint), &body))
            .await
            .map_err(|_| TransferError::Custom("HTTP request timed out".to_string()))??;

        debug!(endpoint, bytes = response_text.len(), "api response");
        Ok(serde_json::from_str(&response_text)?)
    }

    /// Send bytes to a content-upload endpoint.
    pub async fn upload<A, R>(&self, endpoint: &str, arg: &A, data: Vec<u8>) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let arg = serde_json::to_string(arg)?;
        debug!(endpoint, arg = %arg, bytes = data.len(), "api upload");

        let response_text = self
            .http
            .upload(&self.content_endpoint(endpoint), &arg, data)
            .await?;

        // Append calls answer with an empty body ("null").
        if response_text.trim().is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&response_text)?)
    }

    /// Open a content-download endpoint; the caller streams the body.
    pub async fn download<A>(&self, endpoint: &str, arg: &A) -> Result<Response>
    where
        A: Serialize + ?Sized,
    {
        let arg = serde_json::to_string(arg)?;
        debug!(endpoint, arg = %arg, "api download");

        self.http.download(&self.content_endpoint(endpoint), &arg).await
    }
}
