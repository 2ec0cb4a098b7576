//! Mock translation server
//!
//! Simulates a long-running translation job behind `GET /status`. The job
//! reports `pending` until `completion_time` has passed since the first
//! request, then `completed`. Independently of time, any request answers
//! `error` with probability `error_rate`.

use axum::{extract::State, routing::get, Json, Router};
use rand::Rng;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use crate::error::Result;
use crate::model::JobStatus;
use crate::poller::RESULT_FIELD;

#[derive(Debug)]
struct JobClock {
    start_time: Option<Instant>,
    completion_time: Duration,
    error_rate: f64,
}

impl JobClock {
    /// `roll` is a uniform sample from `[0, 1)`
    fn status_at(&mut self, now: Instant, roll: f64) -> JobStatus {
        let start = *self.start_time.get_or_insert(now);

        if roll < self.error_rate {
            log::info!("Returning error status");
            return JobStatus::Error;
        }

        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.completion_time {
            log::info!("Returning completed status");
            JobStatus::Completed
        } else {
            log::info!(
                "Returning pending status (elapsed: {:.1}s)",
                elapsed.as_secs_f64()
            );
            JobStatus::Pending
        }
    }
}

/// Stateful status endpoint. Clones share the same job.
#[derive(Clone)]
pub struct TranslationServer {
    clock: Arc<Mutex<JobClock>>,
}

impl Default for TranslationServer {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 0.1)
    }
}

impl TranslationServer {
    /// `error_rate` is clamped to `[0, 1]`
    pub fn new(completion_time: Duration, error_rate: f64) -> Self {
        Self {
            clock: Arc::new(Mutex::new(JobClock {
                start_time: None,
                completion_time,
                error_rate: clamp_rate(error_rate),
            })),
        }
    }

    pub fn set_completion_time(&self, completion_time: Duration) {
        self.lock().completion_time = completion_time;
    }

    pub fn set_error_rate(&self, error_rate: f64) {
        self.lock().error_rate = clamp_rate(error_rate);
    }

    /// Forgets the job's start time; the next request starts a new job
    pub fn reset(&self) {
        self.lock().start_time = None;
    }

    /// Builds the router serving `GET /status`
    pub fn router(&self) -> Router {
        Router::new()
            .route("/status", get(handle_status))
            .with_state(self.clock.clone())
    }

    /// Binds `addr` and serves in a background task
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use video_translation_sdk::server::TranslationServer;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let server = TranslationServer::new(Duration::from_secs(20), 0.1);
    /// let handle = server.start("127.0.0.1:0").await?;
    /// println!("Server started on {}", handle.base_url());
    /// handle.shutdown().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&self, addr: impl ToSocketAddrs) -> Result<ServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                log::error!("Translation server failed: {}", e);
            }
        });

        log::info!("Server started on {}", local_addr);
        Ok(ServerHandle {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    fn lock(&self) -> MutexGuard<'_, JobClock> {
        // A poisoned lock only means a handler panicked mid-update; the
        // plain-data state is still usable.
        self.clock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

async fn handle_status(State(clock): State<Arc<Mutex<JobClock>>>) -> Json<Value> {
    let roll = rand::thread_rng().gen::<f64>();
    let status = clock
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .status_at(Instant::now(), roll);
    Json(json!({ RESULT_FIELD: status.as_str() }))
}

/// Running server. Dropping the handle stops the server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://<addr>`, suitable for [`Client::new`](crate::poller::Client::new)
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stops accepting requests and waits for the server task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        log::info!("Server on {} stopped", self.local_addr);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
