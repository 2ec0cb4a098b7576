//! Error types for the video translation Rust SDK

use std::time::Duration;
use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// Main error type for the SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// The status endpoint could not be reached at all
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success HTTP status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body could not be read or had an unexpected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The `result` field held a value outside the known job statuses
    #[error("Unknown job status '{0}'")]
    UnknownStatus(String),

    /// The polling budget ran out while the job was still pending
    #[error("Job did not complete within {:.1} seconds", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    /// The status-change observer reported a failure
    #[error("Status observer failed: {0}")]
    Callback(#[source] Box<SdkError>),

    /// Invalid configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Mock server I/O errors
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    /// Generic errors
    #[error("Error: {0}")]
    Generic(String),
}

impl From<String> for SdkError {
    fn from(s: String) -> Self {
        SdkError::Generic(s)
    }
}

impl From<&str> for SdkError {
    fn from(s: &str) -> Self {
        SdkError::Generic(s.to_string())
    }
}

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Endpoint is unreachable; polling stops immediately.
    FatalConnection,
    /// Transient or malformed response; polling backs off and retries.
    RetryableProtocol,
    /// Polling budget (deadline or attempt cap) exhausted.
    Timeout,
    /// The caller's observer failed.
    Callback,
    /// Bad configuration, URL or local I/O. Never retried.
    Other,
}

impl SdkError {
    /// Classifies this error for the polling loop.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Connection(_) => ErrorKind::FatalConnection,
            SdkError::HttpStatus { .. }
            | SdkError::Protocol(_)
            | SdkError::Json(_)
            | SdkError::UnknownStatus(_) => ErrorKind::RetryableProtocol,
            SdkError::Timeout { .. } => ErrorKind::Timeout,
            SdkError::Callback(_) => ErrorKind::Callback,
            SdkError::InvalidConfig(_)
            | SdkError::UrlParse(_)
            | SdkError::Server(_)
            | SdkError::Generic(_) => ErrorKind::Other,
        }
    }

    /// Returns true when the polling loop should back off and try again.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RetryableProtocol
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return SdkError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if e.is_body() || e.is_decode() {
            return SdkError::Protocol(e.to_string());
        }
        // Connect failures, timeouts and dropped connections all mean the
        // endpoint is not answering.
        SdkError::Connection(e.to_string())
    }
}
