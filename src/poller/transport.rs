//! HTTP transport used by the status fetcher

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;
use url::Url;
use crate::error::Result;

/// Raw HTTP answer: status code and the fully read body
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET request.
///
/// Implementations report unreachable endpoints as
/// [`SdkError::Connection`](crate::SdkError::Connection) and must not retry
/// or sleep; retry policy belongs to the polling engine.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse>;
}

/// `reqwest`-backed transport. Owns one connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: HttpClient,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh connection pool
    pub fn new() -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http_client })
    }

    /// Wraps an existing `reqwest` client
    pub fn with_client(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl StatusTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
