//! Status polling client

use std::sync::Arc;
use url::Url;
use crate::error::Result;
use crate::model::StatusResponse;
use super::config::PollingConfig;
use super::engine::PollingEngine;
use super::fetcher::StatusFetcher;
use super::observer::{NoopObserver, StatusObserver};
use super::transport::{ReqwestTransport, StatusTransport};

/// Client that polls a translation job's status endpoint
#[derive(Clone)]
pub struct Client {
    status_url: Url,
    config: PollingConfig,
    observer: Arc<dyn StatusObserver>,
    transport: Option<Arc<dyn StatusTransport>>,
}

impl Client {
    /// Creates a new client with the default polling configuration
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the translation server; a trailing `/`
    ///   is ignored
    ///
    /// # Example
    ///
    /// ```rust
    /// use video_translation_sdk::poller::Client;
    ///
    /// let client = Client::new("http://localhost:8000/").unwrap();
    /// assert_eq!(client.status_url().as_str(), "http://localhost:8000/status");
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, PollingConfig::default())
    }

    /// Creates a new client with an explicit polling configuration
    ///
    /// Fails with `InvalidConfig` if the configuration breaks its invariants,
    /// or `UrlParse` if `base_url` is not a valid URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use video_translation_sdk::poller::{Client, PollingConfig};
    /// use std::time::Duration;
    ///
    /// let config = PollingConfig::default()
    ///     .initial_delay(Duration::from_secs(1))
    ///     .max_delay(Duration::from_secs(8))
    ///     .backoff_factor(3.0)
    ///     .timeout(Duration::from_secs(60));
    /// let client = Client::with_config("http://localhost:8000", config).unwrap();
    /// ```
    pub fn with_config(base_url: &str, config: PollingConfig) -> Result<Self> {
        config.validate()?;
        let base_url = base_url.trim_end_matches('/');
        let status_url = Url::parse(&format!("{}/status", base_url))?;

        Ok(Self {
            status_url,
            config,
            observer: Arc::new(NoopObserver),
            transport: None,
        })
    }

    /// Sets the observer awaited on every status transition
    ///
    /// # Example
    ///
    /// ```rust
    /// use video_translation_sdk::poller::Client;
    /// use video_translation_sdk::{Result, StatusResponse};
    ///
    /// async fn status_changed(response: StatusResponse) -> Result<()> {
    ///     println!("Status changed to: {}", response.status());
    ///     Ok(())
    /// }
    ///
    /// let client = Client::new("http://localhost:8000")
    ///     .unwrap()
    ///     .on_status_change(status_changed);
    /// ```
    pub fn on_status_change(self, observer: impl StatusObserver + 'static) -> Self {
        Self {
            observer: Arc::new(observer),
            ..self
        }
    }

    /// Uses `transport` for every poll instead of opening a fresh
    /// `reqwest` session per call
    pub fn with_transport(self, transport: impl StatusTransport + 'static) -> Self {
        Self {
            transport: Some(Arc::new(transport)),
            ..self
        }
    }

    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Fetches the job status once, without retrying or notifying
    pub async fn get_status(&self) -> Result<StatusResponse> {
        self.fetcher()?.fetch().await
    }

    /// Polls the status endpoint until the job completes or errors
    ///
    /// Uses exponential backoff between attempts. Both `completed` and
    /// `error` are returned as `Ok`; failures are an unreachable endpoint,
    /// an exhausted polling budget, or a failing observer.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use video_translation_sdk::poller::Client;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::new("http://localhost:8000")?;
    /// let result = client.poll_until_complete().await?;
    /// println!("Final status: {}", result.status());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn poll_until_complete(&self) -> Result<StatusResponse> {
        // The session lives exactly as long as this engine.
        let mut engine = PollingEngine::new(
            self.config.clone(),
            self.fetcher()?,
            self.observer.clone(),
        );
        engine.run().await
    }

    fn fetcher(&self) -> Result<StatusFetcher> {
        let transport: Arc<dyn StatusTransport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new()?),
        };
        Ok(StatusFetcher::new(self.status_url.clone(), transport))
    }
}
