//! Single status check against the status endpoint

use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;
use crate::error::{Result, SdkError};
use crate::model::{JobStatus, StatusResponse};
use super::transport::StatusTransport;

/// Field of the JSON body that carries the job status
pub const RESULT_FIELD: &str = "result";

/// Fetches the job status once per call, without retrying
#[derive(Clone)]
pub struct StatusFetcher {
    status_url: Url,
    transport: Arc<dyn StatusTransport>,
}

impl StatusFetcher {
    pub fn new(status_url: Url, transport: Arc<dyn StatusTransport>) -> Self {
        Self {
            status_url,
            transport,
        }
    }

    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    /// Issues one `GET <base>/status` and parses the reply
    pub async fn fetch(&self) -> Result<StatusResponse> {
        let start = Instant::now();

        let response = self.transport.get(&self.status_url).await.map_err(|e| {
            log::error!("Request to {} failed: {}", self.status_url, e);
            e
        })?;

        if !response.is_success() {
            log::error!("HTTP error {} at {}", response.status, self.status_url);
            return Err(SdkError::HttpStatus {
                status: response.status,
                url: self.status_url.to_string(),
            });
        }

        let (status, raw_response) = parse_status_body(&response.body).map_err(|e| {
            log::warn!("Unexpected status body from {}: {}", self.status_url, e);
            e
        })?;
        let elapsed_time = start.elapsed();

        log::debug!(
            "Fetched status {} from {} in {:?}",
            status,
            self.status_url,
            elapsed_time
        );

        Ok(StatusResponse::new(status, raw_response, elapsed_time))
    }
}

/// Decodes a status body, keeping the whole payload for diagnostics
pub fn parse_status_body(body: &[u8]) -> Result<(JobStatus, Value)> {
    let data: Value = serde_json::from_slice(body)?;

    let status = data
        .get(RESULT_FIELD)
        .ok_or_else(|| SdkError::Protocol(format!("missing '{}' field", RESULT_FIELD)))?
        .as_str()
        .ok_or_else(|| SdkError::Protocol(format!("'{}' is not a string", RESULT_FIELD)))?
        .parse::<JobStatus>()?;

    Ok((status, data))
}
