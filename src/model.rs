//! Job status values exchanged with the status endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use crate::error::SdkError;

/// Job status constants
pub const JOB_STATUS_PENDING: &str = "pending";
pub const JOB_STATUS_COMPLETED: &str = "completed";
pub const JOB_STATUS_ERROR: &str = "error";

/// Lifecycle state of a remote job
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Error,
}

impl JobStatus {
    /// Returns the wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => JOB_STATUS_PENDING,
            JobStatus::Completed => JOB_STATUS_COMPLETED,
            JobStatus::Error => JOB_STATUS_ERROR,
        }
    }

    /// `completed` and `error` are terminal: no further transition occurs
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            JOB_STATUS_PENDING => Ok(JobStatus::Pending),
            JOB_STATUS_COMPLETED => Ok(JobStatus::Completed),
            JOB_STATUS_ERROR => Ok(JobStatus::Error),
            other => Err(SdkError::UnknownStatus(other.to_string())),
        }
    }
}

/// Outcome of one successful status fetch
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    status: JobStatus,
    raw_response: Value,
    elapsed_time: Duration,
}

impl StatusResponse {
    pub fn new(status: JobStatus, raw_response: Value, elapsed_time: Duration) -> Self {
        Self {
            status,
            raw_response,
            elapsed_time,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// The full decoded payload, including fields the SDK does not interpret
    pub fn raw_response(&self) -> &Value {
        &self.raw_response
    }

    /// Time from request dispatch until the body was fully read
    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }
}

impl fmt::Display for StatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job {} (fetched in {:.6}s)",
            self.status,
            self.elapsed_time.as_secs_f64()
        )
    }
}
