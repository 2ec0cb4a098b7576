//! Polling configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{Result, SdkError};

/// Polling configuration
///
/// All durations are serialized as fractional seconds, so a config can be
/// loaded from JSON such as `{"initial_delay": 0.5, "timeout": 10.0}`.
/// Missing fields take their default values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay before the first retry
    #[serde(with = "secs")]
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay, before jitter
    #[serde(with = "secs")]
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Maximum number of fetch attempts
    pub max_attempts: u32,
    /// Wall-clock budget for one poll
    #[serde(with = "secs")]
    pub timeout: Duration,
    /// Add up to 20% random jitter to each delay
    pub jitter: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            backoff_factor: 2.0,
            max_attempts: 10,
            timeout: Duration::from_secs(300),
            jitter: true,
        }
    }
}

impl PollingConfig {
    pub fn initial_delay(self, initial_delay: Duration) -> Self {
        Self { initial_delay, ..self }
    }

    pub fn max_delay(self, max_delay: Duration) -> Self {
        Self { max_delay, ..self }
    }

    pub fn backoff_factor(self, backoff_factor: f64) -> Self {
        Self { backoff_factor, ..self }
    }

    pub fn max_attempts(self, max_attempts: u32) -> Self {
        Self { max_attempts, ..self }
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn jitter(self, jitter: bool) -> Self {
        Self { jitter, ..self }
    }

    /// Checks the invariants between fields
    pub fn validate(&self) -> Result<()> {
        if self.max_delay < self.initial_delay {
            return Err(SdkError::InvalidConfig(format!(
                "max_delay ({:?}) must not be less than initial_delay ({:?})",
                self.max_delay, self.initial_delay
            )));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(SdkError::InvalidConfig(format!(
                "backoff_factor must be a finite number >= 1, got {}",
                self.backoff_factor
            )));
        }
        if self.max_attempts == 0 {
            return Err(SdkError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SdkError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod secs {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}
