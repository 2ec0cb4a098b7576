//! Poll-until-complete state machine

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, timeout_at, Instant};
use crate::error::{Result, SdkError};
use crate::model::{JobStatus, StatusResponse};
use super::backoff::calculate_delay;
use super::config::PollingConfig;
use super::fetcher::StatusFetcher;
use super::observer::StatusObserver;

/// Used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Where a poll currently stands. `Polling` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Completed,
    Errored,
    TimedOut,
    Aborted,
}

/// Drives one poll-until-complete run.
///
/// Attempt counter, last observed status and deadline are reset at the start
/// of every [`run`](PollingEngine::run), so nothing carries over between runs.
pub struct PollingEngine {
    config: PollingConfig,
    fetcher: StatusFetcher,
    observer: Arc<dyn StatusObserver>,
    state: PollState,
    attempt: u32,
    last_status: Option<JobStatus>,
}

impl PollingEngine {
    pub fn new(
        config: PollingConfig,
        fetcher: StatusFetcher,
        observer: Arc<dyn StatusObserver>,
    ) -> Self {
        Self {
            config,
            fetcher,
            observer,
            state: PollState::Polling,
            attempt: 0,
            last_status: None,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Attempts consumed by the last run
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn last_status(&self) -> Option<JobStatus> {
        self.last_status
    }

    /// Polls until the job reaches a terminal status or the budget runs out.
    ///
    /// A remote `error` status is returned as `Ok`, like `completed`. Fails
    /// with [`SdkError::Connection`] as soon as the endpoint is unreachable,
    /// [`SdkError::Timeout`] when the deadline or attempt cap is hit, and
    /// [`SdkError::Callback`] when the observer fails.
    pub async fn run(&mut self) -> Result<StatusResponse> {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.config.timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.state = PollState::Polling;
        self.attempt = 0;
        self.last_status = None;

        log::debug!(
            "Polling {} (timeout {:?}, max {} attempts)",
            self.fetcher.status_url(),
            self.config.timeout,
            self.config.max_attempts
        );

        while Instant::now() < deadline && self.attempt < self.config.max_attempts {
            let fetched = match timeout_at(deadline, self.fetcher.fetch()).await {
                Ok(fetched) => fetched,
                Err(_) => {
                    log::warn!("Deadline passed while a status request was in flight");
                    break;
                }
            };

            match fetched {
                Ok(response) => {
                    self.notify(&response).await?;

                    match response.status() {
                        JobStatus::Completed => {
                            self.state = PollState::Completed;
                            log::info!("Job completed after {} attempts", self.attempt + 1);
                            return Ok(response);
                        }
                        JobStatus::Error => {
                            self.state = PollState::Errored;
                            log::info!("Job reported error after {} attempts", self.attempt + 1);
                            return Ok(response);
                        }
                        JobStatus::Pending => {
                            self.attempt += 1;
                            self.wait_before_retry(self.attempt, deadline).await;
                        }
                    }
                }
                Err(e) if e.is_retryable() => {
                    log::error!("Error polling status: {}", e);
                    self.wait_before_retry(self.attempt, deadline).await;
                    self.attempt += 1;
                }
                Err(e) => {
                    log::error!("Aborting poll of {}: {}", self.fetcher.status_url(), e);
                    self.state = PollState::Aborted;
                    return Err(e);
                }
            }
        }

        self.state = PollState::TimedOut;
        log::warn!(
            "Giving up on {} after {} attempts",
            self.fetcher.status_url(),
            self.attempt
        );
        Err(SdkError::Timeout {
            timeout: self.config.timeout,
        })
    }

    async fn notify(&mut self, response: &StatusResponse) -> Result<()> {
        if self.last_status == Some(response.status()) {
            return Ok(());
        }

        log::debug!("Job status changed to {}", response.status());
        if let Err(e) = self.observer.on_status_changed(response).await {
            log::error!("Status observer failed: {}", e);
            self.state = PollState::Aborted;
            return Err(match e {
                SdkError::Callback(_) => e,
                other => SdkError::Callback(Box::new(other)),
            });
        }
        self.last_status = Some(response.status());
        Ok(())
    }

    async fn wait_before_retry(&self, attempt: u32, deadline: Instant) {
        let delay = calculate_delay(&self.config, attempt);
        log::debug!(
            "Job still pending, waiting {:.2}s before next attempt",
            delay.as_secs_f64()
        );
        let wake = Instant::now()
            .checked_add(delay)
            .map_or(deadline, |at| at.min(deadline));
        sleep_until(wake).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::observer::NoopObserver;
    use crate::poller::transport::{StatusTransport, TransportResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};
    use url::Url;

    #[derive(Clone, Copy)]
    enum Reply {
        Status(&'static str),
        Http(u16),
        Garbage,
        Down,
    }

    /// Plays back scripted replies, then repeats the last one
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        last: Reply,
        latency: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Self::with_latency(replies, Duration::ZERO)
        }

        fn with_latency(replies: Vec<Reply>, latency: Duration) -> Arc<Self> {
            let last = *replies.last().expect("script must not be empty");
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                last,
                latency,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusTransport for ScriptedTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.last);

            match reply {
                Reply::Status(s) => Ok(TransportResponse {
                    status: 200,
                    body: format!(r#"{{"result": "{s}"}}"#).into_bytes(),
                }),
                Reply::Http(code) => Ok(TransportResponse {
                    status: code,
                    body: Vec::new(),
                }),
                Reply::Garbage => Ok(TransportResponse {
                    status: 200,
                    body: b"<html>".to_vec(),
                }),
                Reply::Down => Err(SdkError::Connection("connection refused".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<JobStatus>>,
    }

    #[async_trait]
    impl StatusObserver for Recorder {
        async fn on_status_changed(&self, response: &StatusResponse) -> Result<()> {
            self.seen.lock().unwrap().push(response.status());
            Ok(())
        }
    }

    fn config() -> PollingConfig {
        PollingConfig::default()
            .initial_delay(Duration::from_millis(500))
            .max_delay(Duration::from_secs(2))
            .backoff_factor(2.0)
            .timeout(Duration::from_secs(10))
            .max_attempts(5)
            .jitter(false)
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "expected ~{expected:?}, got {elapsed:?}"
        );
    }

    fn engine(
        config: PollingConfig,
        transport: Arc<ScriptedTransport>,
        observer: Arc<dyn StatusObserver>,
    ) -> PollingEngine {
        let url = Url::parse("http://localhost:8080/status").unwrap();
        PollingEngine::new(config, StatusFetcher::new(url, transport), observer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_completed() {
        let transport = ScriptedTransport::new(vec![
            Reply::Status("pending"),
            Reply::Status("pending"),
            Reply::Status("pending"),
            Reply::Status("completed"),
        ]);
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine(config(), transport.clone(), recorder.clone());

        let response = assert_ok!(engine.run().await);

        assert_eq!(response.status(), JobStatus::Completed);
        assert_eq!(transport.calls(), 4);
        assert_eq!(engine.state(), PollState::Completed);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![JobStatus::Pending, JobStatus::Completed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_follow_backoff() {
        let transport = ScriptedTransport::new(vec![
            Reply::Status("pending"),
            Reply::Status("pending"),
            Reply::Status("pending"),
            Reply::Status("completed"),
        ]);
        let mut engine = engine(config(), transport, Arc::new(NoopObserver));

        let start = Instant::now();
        assert_ok!(engine.run().await);
        // Waits after attempts 1, 2, 3: 1s + 2s + 2s (capped).
        assert_elapsed(start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_error_is_a_normal_return() {
        let transport = ScriptedTransport::new(vec![Reply::Status("error")]);
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine(config(), transport.clone(), recorder.clone());

        let response = assert_ok!(engine.run().await);

        assert_eq!(response.status(), JobStatus::Error);
        assert_eq!(transport.calls(), 1);
        assert_eq!(engine.state(), PollState::Errored);
        assert_eq!(*recorder.seen.lock().unwrap(), vec![JobStatus::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_over_attempt_cap() {
        let transport = ScriptedTransport::new(vec![Reply::Status("pending")]);
        let config = config().timeout(Duration::from_secs(2)).max_attempts(1000);
        let mut engine = engine(config, transport, Arc::new(NoopObserver));

        let start = Instant::now();
        let err = assert_err!(engine.run().await);

        assert!(matches!(err, SdkError::Timeout { timeout } if timeout == Duration::from_secs(2)));
        assert_eq!(engine.state(), PollState::TimedOut);
        // Backoff sleeps are cut short at the deadline.
        assert_elapsed(start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_cap_times_out() {
        let transport = ScriptedTransport::new(vec![Reply::Status("pending")]);
        let config = config().timeout(Duration::from_secs(3600)).max_attempts(3);
        let mut engine = engine(config, transport.clone(), Arc::new(NoopObserver));

        let err = assert_err!(engine.run().await);

        assert!(matches!(err, SdkError::Timeout { .. }));
        assert_eq!(transport.calls(), 3);
        assert_eq!(engine.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_aborts_without_waiting() {
        let transport = ScriptedTransport::new(vec![Reply::Down]);
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine(config(), transport.clone(), recorder.clone());

        let start = Instant::now();
        let err = assert_err!(engine.run().await);

        assert!(matches!(err, SdkError::Connection(_)));
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(engine.state(), PollState::Aborted);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_protocol_errors_are_retried_silently() {
        let transport = ScriptedTransport::new(vec![
            Reply::Status("pending"),
            Reply::Http(503),
            Reply::Garbage,
            Reply::Status("running"),
            Reply::Status("pending"),
            Reply::Status("completed"),
        ]);
        let recorder = Arc::new(Recorder::default());
        let config = config().max_attempts(10);
        let mut engine = engine(config, transport.clone(), recorder.clone());

        let response = assert_ok!(engine.run().await);

        assert_eq!(response.status(), JobStatus::Completed);
        assert_eq!(transport.calls(), 6);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![JobStatus::Pending, JobStatus::Completed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_protocol_errors_consume_attempts() {
        let transport = ScriptedTransport::new(vec![Reply::Http(500)]);
        let config = config().max_attempts(4);
        let mut engine = engine(config, transport.clone(), Arc::new(NoopObserver));

        let err = assert_err!(engine.run().await);

        assert!(matches!(err, SdkError::Timeout { .. }));
        assert_eq!(transport.calls(), 4);
        assert_eq!(engine.last_status(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_failure_aborts() {
        let transport = ScriptedTransport::new(vec![Reply::Status("pending")]);
        let observer = |_: StatusResponse| async {
            Err::<(), _>(SdkError::from("observer exploded"))
        };
        let mut engine = engine(config(), transport.clone(), Arc::new(observer));

        let err = assert_err!(engine.run().await);

        // The observer's own error is kept as the source.
        match err {
            SdkError::Callback(inner) => {
                assert!(matches!(*inner, SdkError::Generic(ref msg) if msg == "observer exploded"));
            }
            other => panic!("expected callback error, got {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
        assert_eq!(engine.state(), PollState::Aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_observer_is_awaited_before_next_poll() {
        let transport = ScriptedTransport::new(vec![
            Reply::Status("pending"),
            Reply::Status("completed"),
        ]);
        let observer = |_: StatusResponse| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok::<_, SdkError>(())
        };
        let mut engine = engine(config(), transport.clone(), Arc::new(observer));

        let start = Instant::now();
        assert_ok!(engine.run().await);

        // Two notifications of 3s each plus one backoff wait of 1s.
        assert_elapsed(start, Duration::from_secs(7));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_is_cut_at_deadline() {
        let transport = ScriptedTransport::with_latency(
            vec![Reply::Status("pending")],
            Duration::from_secs(60),
        );
        let config = config().timeout(Duration::from_secs(5));
        let mut engine = engine(config, transport, Arc::new(NoopObserver));

        let start = Instant::now();
        let err = assert_err!(engine.run().await);

        assert!(matches!(err, SdkError::Timeout { .. }));
        assert_elapsed(start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_resets_between_runs() {
        let transport = ScriptedTransport::new(vec![
            Reply::Status("pending"),
            Reply::Status("completed"),
        ]);
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine(config(), transport, recorder.clone());

        assert_ok!(engine.run().await);
        // Second run sees only "completed", but it is still its first observation.
        assert_ok!(engine.run().await);

        assert_eq!(engine.attempts(), 0);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![JobStatus::Pending, JobStatus::Completed, JobStatus::Completed]
        );
    }
}
