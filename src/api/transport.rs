//! HTTP transport
//!
//! The executor only needs "GET this URL with this bearer token"; keeping
//! that behind [`HttpTransport`] lets tests answer with canned responses.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Response reduced to what the executor looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase, e.g. `Unauthorized`
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Authorized GET requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, bearer_token: &str) -> Result<HttpResponse, TransportError>;
}

/// Errors below the HTTP status level
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Host unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Unavailable(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// [`HttpTransport`] over a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sfquery/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, bearer_token: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let mut response = HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: String::new(),
        };
        assert!(response.is_success());

        response.status = 204;
        assert!(response.is_success());

        response.status = 401;
        assert!(!response.is_success());

        response.status = 302;
        assert!(!response.is_success());
    }

    #[test]
    fn test_transport_builds() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
    }
}
