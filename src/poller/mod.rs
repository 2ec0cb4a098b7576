//! Status polling for long-running translation jobs

mod backoff;
mod client;
mod config;
mod engine;
mod fetcher;
mod observer;
mod transport;

pub use backoff::{calculate_delay, delay_with_jitter, MAX_JITTER_FACTOR};
pub use client::Client;
pub use config::PollingConfig;
pub use engine::{PollState, PollingEngine};
pub use fetcher::{parse_status_body, StatusFetcher, RESULT_FIELD};
pub use observer::{NoopObserver, StatusObserver};
pub use transport::{ReqwestTransport, StatusTransport, TransportResponse};
