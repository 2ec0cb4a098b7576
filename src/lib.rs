//! # Video Translation Rust SDK
//!
//! This crate tracks long-running video translation jobs by polling their
//! HTTP status endpoint until the job completes or fails.
//!
//! ## Features
//!
//! - **Polling Client**: Poll `GET <base>/status` until a terminal status
//! - **Backoff**: Exponential backoff with optional jitter, capped delays
//! - **Budgets**: Hard wall-clock timeout and attempt cap
//! - **Notifications**: Observer invoked on every status transition
//! - **Mock Server**: Simulated translation server (`server` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use video_translation_sdk::poller::{Client, PollingConfig};
//! use video_translation_sdk::{JobStatus, Result, StatusResponse};
//! use std::time::Duration;
//!
//! async fn status_changed(response: StatusResponse) -> Result<()> {
//!     println!("Status changed to: {}", response.status());
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = PollingConfig::default()
//!         .initial_delay(Duration::from_millis(500))
//!         .max_delay(Duration::from_secs(2))
//!         .timeout(Duration::from_secs(10));
//!
//!     let client = Client::with_config("http://localhost:8000", config)?
//!         .on_status_change(status_changed);
//!
//!     let result = client.poll_until_complete().await?;
//!     if result.status() == JobStatus::Error {
//!         println!("Translation failed: {}", result.raw_response());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod model;
pub mod poller;
#[cfg(feature = "server")]
pub mod server;

pub use error::{ErrorKind, Result, SdkError};
pub use model::{JobStatus, StatusResponse};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ErrorKind, Result, SdkError};
    pub use crate::model::{JobStatus, StatusResponse};
    pub use crate::poller::{Client, PollingConfig, StatusObserver};
    #[cfg(feature = "server")]
    pub use crate::server::{ServerHandle, TranslationServer};
}
