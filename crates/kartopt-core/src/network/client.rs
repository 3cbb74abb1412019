//! Conditional GET client.
//!
//! Provides a thin wrapper around reqwest with:
//! - A mandatory `Accept` header and optional `If-Modified-Since`
//! - 304 Not Modified treated as a bodyless success
//! - Every other non-200 status turned into [`KartError::UnexpectedStatus`]
//!   carrying the full response for diagnostics

use crate::config::NetworkConfig;
use crate::network::http_date::{format_http_date, parse_http_date};
use crate::{KartError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, EXPIRES, IF_MODIFIED_SINCE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Maximum number of body bytes quoted in an error detail.
const ERROR_BODY_PREVIEW: usize = 512;

/// A successful (200 or 304) HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Empty for 304 responses.
    pub body: Bytes,
}

impl HttpResponse {
    /// New content was delivered.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    /// The server confirmed the cached copy is current.
    pub fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NOT_MODIFIED.as_u16()
    }

    /// Parsed `Expires` header, if present and well-formed.
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.headers
            .get(EXPIRES)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date)
    }
}

/// A source of conditional GET responses.
///
/// The orchestrators depend on this trait rather than on reqwest directly so
/// tests can count or script requests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a GET against `url`.
    ///
    /// Returns `Ok` only for 200 and 304; transport failures and all other
    /// statuses are errors.
    async fn get(
        &self,
        url: &Url,
        accept: &str,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> Result<HttpResponse>;
}

/// reqwest-backed [`Fetcher`].
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| KartError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(
        &self,
        url: &Url,
        accept: &str,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> Result<HttpResponse> {
        let mut request = self.client.get(url.clone()).header(ACCEPT, accept);
        if let Some(since) = if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, format_http_date(since));
        }

        debug!("GET {} (accept: {}, since: {:?})", url, accept, if_modified_since);

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        check_status(url, status, headers, body)
    }
}

fn check_status(url: &Url, status: StatusCode, headers: HeaderMap, body: Bytes) -> Result<HttpResponse> {
    if status == StatusCode::OK || status == StatusCode::NOT_MODIFIED {
        let body = if status == StatusCode::NOT_MODIFIED {
            Bytes::new()
        } else {
            body
        };
        return Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        });
    }

    let preview_len = body.len().min(ERROR_BODY_PREVIEW);
    let detail = format!(
        "{} {}\nheaders: {:?}\nbody ({} bytes): {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        headers,
        body.len(),
        String::from_utf8_lossy(&body[..preview_len])
    );

    Err(KartError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
        detail,
    })
}
