//! HTTP client wrapper for Dropbox API requests.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};

use crate::api::ApiErrorKind;
use crate::api::error::ErrorBody;
use crate::error::{Result, TransferError};

/// Header carrying endpoint arguments on content requests.
const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// HTTP client for making authenticated requests to Dropbox servers.
pub struct HttpClient {
    client: Client,
    token: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client using the given bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
        }
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(token: impl Into<String>, proxy: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| TransferError::Config(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| TransferError::Config(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// POST a JSON body to an RPC endpoint.
    ///
    /// # Returns
    /// Response body as string
    pub async fn rpc(&self, url: &str, body: &str) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    /// POST raw bytes to a content-upload endpoint.
    ///
    /// # Arguments
    /// * `url` - Endpoint URL
    /// * `arg` - JSON endpoint arguments, sent in the `Dropbox-API-Arg` header
    /// * `data` - Request body
    pub async fn upload(&self, url: &str, arg: &str, data: Vec<u8>) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(API_ARG_HEADER, header_safe_json(arg))
            .body(data)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    /// POST to a content-download endpoint and return the streaming response.
    pub async fn download(&self, url: &str, arg: &str) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .header(API_ARG_HEADER, header_safe_json(arg))
            .send()
            .await?;

        check_status(response).await
    }
}

/// Map non-success responses to errors, classifying endpoint errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::CONFLICT {
        let text = response.text().await?;
        let body: ErrorBody = serde_json::from_str(&text)?;
        return Err(TransferError::Api {
            kind: ApiErrorKind::from(body.error_summary.as_str()),
            summary: body.error_summary,
        });
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(TransferError::Api {
            kind: ApiErrorKind::InvalidToken,
            summary: "invalid_access_token/".to_string(),
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TransferError::Api {
            kind: ApiErrorKind::RateLimited,
            summary: "too_many_requests/".to_string(),
        });
    }

    Err(TransferError::HttpError(status.as_u16()))
}

/// Escape a JSON document so it is valid as an HTTP header value.
///
/// Non-ASCII characters are written as `\uXXXX` escapes (surrogate pairs
/// outside the BMP), which JSON decoders read back unchanged.
pub(crate) fn header_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new("token");
        assert_eq!(client.bearer(), "Bearer token");
    }

    #[test]
    fn test_proxy_creation() {
        let client = HttpClient::with_proxy("token", "http://127.0.0.1:8080");
        assert!(client.is_ok());
    }

    #[test]
    fn test_proxy_invalid() {
        let res = HttpClient::with_proxy("token", ":::::::");
        assert!(matches!(res, Err(TransferError::Config(_))));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = HttpClient::new("secret-token");
        assert!(!format!("{:?}", client).contains("secret-token"));
    }

    #[test]
    fn test_header_safe_json() {
        assert_eq!(header_safe_json(r#"{"path":"/a"}"#), r#"{"path":"/a"}"#);
        assert_eq!(
            header_safe_json(r#"{"path":"/é"}"#),
            r#"{"path":"/\u00e9"}"#
        );
        // Outside the BMP: surrogate pair
        assert_eq!(header_safe_json("😀"), "\\ud83d\\ude00");

        let escaped = header_safe_json(r#"{"path":"/Résumé 😀"}"#);
        assert!(escaped.is_ascii());
        let value: serde_json::Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(value["path"], "/Résumé 😀");
    }
}
