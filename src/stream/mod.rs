//! Live event stream client.
//!
//! Subscribes to the backend's server-sent-events feed and keeps the
//! subscription alive: every failure (bad URL, refused connection, non-2xx
//! status, server closing the body) is reported and followed by a reconnect
//! after an exponentially growing delay, indefinitely. A subscription owns at
//! most one HTTP response at a time; the response is dropped before the next
//! attempt starts.
//!
//! Consumers read [`ConnectionEvent`]s from a [`Subscription`] and usually
//! fold them into a [`StreamMonitor`].

mod error;
mod events;
mod history;
mod monitor;
mod parser;
mod state;

pub use error::StreamError;
pub use events::ConnectionEvent;
pub use history::{EventLog, EventLogEntry};
pub use monitor::StreamMonitor;
pub use parser::{SseFrame, SseParser};
pub use state::{Backoff, ConnectionInfo, ConnectionInfoUpdate, ConnectionState, RetryState};

use crate::config::StreamConfig;
use chrono::Utc;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Opens subscriptions to event stream endpoints.
#[derive(Debug, Clone)]
pub struct EventStreamClient {
    client: reqwest::Client,
    config: StreamConfig,
}

impl EventStreamClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: StreamConfig) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .cookie_store(config.with_credentials)
            .build()
            .map_err(|e| StreamError::Initialization(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a client with a custom HTTP client (for testing).
    pub fn with_client(config: StreamConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.config.base_delay_ms, self.config.max_delay_ms)
    }

    /// Start a subscription.
    ///
    /// A blank URL is a no-op: nothing is spawned and `None` is returned.
    pub fn subscribe(&self, stream_url: &str) -> Option<Subscription> {
        let stream_url = stream_url.trim();
        if stream_url.is_empty() {
            tracing::debug!("No stream URL configured, not subscribing");
            return None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let reconnect = Arc::new(Notify::new());

        let driver = Driver {
            client: self.client.clone(),
            url: stream_url.to_string(),
            with_credentials: self.config.with_credentials,
            backoff: self.backoff(),
            tx,
            cancel: cancel.clone(),
            reconnect: Arc::clone(&reconnect),
        };

        tracing::info!(url = %stream_url, "Subscribing to event stream");
        let handle = tokio::spawn(driver.run());

        Some(Subscription {
            url: stream_url.to_string(),
            events: rx,
            cancel,
            reconnect,
            handle: Some(handle),
        })
    }

    /// Tear `previous` down completely, then subscribe to `stream_url`.
    pub async fn resubscribe(
        &self,
        previous: Subscription,
        stream_url: &str,
    ) -> Option<Subscription> {
        previous.shutdown().await;
        self.subscribe(stream_url)
    }
}

/// Handle to one live subscription.
///
/// Closing (explicitly or by dropping) cancels the connection and any pending
/// reconnect timer. No event is handed out after the handle is closed.
#[derive(Debug)]
pub struct Subscription {
    url: String,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    cancel: CancellationToken,
    reconnect: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next event, or `None` once the subscription is closed.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Next event, already applied to `monitor`.
    pub async fn next_into(&mut self, monitor: &mut StreamMonitor) -> Option<ConnectionEvent> {
        let event = self.next_event().await?;
        monitor.apply(&event);
        Some(event)
    }

    /// Reconnect now: drop the live connection or pending timer and start a
    /// fresh attempt with the attempt counter reset.
    pub fn reconnect(&self) {
        if !self.cancel.is_cancelled() {
            self.reconnect.notify_one();
        }
    }

    /// Stop the subscription. Safe to call more than once.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(url = %self.url, "Closing event stream subscription");
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Close and wait until the connection and timer are gone.
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(url = %self.url, error = %e, "Stream driver ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum Attempt {
    Failed,
    Reconnect,
    Cancelled,
}

/// Background task owning the connection and the retry timer.
struct Driver {
    client: reqwest::Client,
    url: String,
    with_credentials: bool,
    backoff: Backoff,
    tx: mpsc::UnboundedSender<ConnectionEvent>,
    cancel: CancellationToken,
    reconnect: Arc<Notify>,
}

impl Driver {
    async fn run(self) {
        let mut attempt: u32 = 0;

        loop {
            match self.connect_once(&mut attempt).await {
                Attempt::Cancelled => break,
                Attempt::Reconnect => {
                    attempt = 0;
                    continue;
                }
                Attempt::Failed => {}
            }

            attempt = attempt.saturating_add(1);
            let delay = self.backoff.delay(attempt);
            tracing::info!(
                url = %self.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling event stream reconnect"
            );
            self.emit(ConnectionEvent::Retrying { attempt, delay });

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.reconnect.notified() => {
                    tracing::info!(url = %self.url, "Manual reconnect requested");
                    attempt = 0;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::debug!(url = %self.url, "Event stream driver stopped");
    }

    async fn connect_once(&self, attempt: &mut u32) -> Attempt {
        self.emit(ConnectionEvent::Connecting { attempt: *attempt });

        let url = match Url::parse(&self.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Failed to initialize event stream");
                self.emit(ConnectionEvent::Error(StreamError::Initialization(
                    e.to_string(),
                )));
                self.emit(ConnectionEvent::InfoUpdate(
                    ConnectionInfoUpdate::initialization_failed(),
                ));
                return Attempt::Failed;
            }
        };

        self.emit(ConnectionEvent::InfoUpdate(ConnectionInfoUpdate::endpoint(
            &self.url,
            Some(&url),
            self.with_credentials,
        )));

        let request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Attempt::Cancelled,
            _ = self.reconnect.notified() => return Attempt::Reconnect,
            sent = request.send() => sent,
        };

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                self.fail(StreamError::from_request(e));
                return Attempt::Failed;
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.fail(StreamError::HttpStatus(status.as_u16()));
            return Attempt::Failed;
        }

        tracing::info!(url = %self.url, "Event stream open");
        *attempt = 0;
        self.emit(ConnectionEvent::Open);
        self.emit(ConnectionEvent::InfoUpdate(ConnectionInfoUpdate::opened(
            Utc::now(),
        )));

        let mut body = response.bytes_stream();
        let mut parser = SseParser::new();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Attempt::Cancelled,
                _ = self.reconnect.notified() => {
                    tracing::info!(
                        url = %self.url,
                        "Manual reconnect requested, dropping connection"
                    );
                    self.emit(ConnectionEvent::InfoUpdate(ConnectionInfoUpdate::disconnected(
                        Utc::now(),
                    )));
                    return Attempt::Reconnect;
                }
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for frame in parser.feed(&bytes) {
                        self.deliver(frame);
                    }
                }
                Some(Err(e)) => {
                    self.fail(StreamError::Body(e.to_string()));
                    return Attempt::Failed;
                }
                None => {
                    self.fail(StreamError::Closed);
                    return Attempt::Failed;
                }
            }
        }
    }

    /// Hand a frame's JSON payload to the consumer; anything else is dropped.
    fn deliver(&self, frame: SseFrame) {
        if frame.event != "message" {
            tracing::debug!(event = %frame.event, "Ignoring named stream event");
            return;
        }
        if frame.data.trim().is_empty() {
            return;
        }

        match frame.json() {
            Ok(payload) => {
                self.emit(ConnectionEvent::Message(payload));
            }
            Err(e) => {
                tracing::warn!(
                    url = %self.url,
                    error = %e,
                    "Dropping stream message with invalid JSON"
                );
            }
        }
    }

    fn fail(&self, error: StreamError) {
        tracing::warn!(url = %self.url, error = %error, "Event stream error");
        self.emit(ConnectionEvent::Error(error));
        self.emit(ConnectionEvent::InfoUpdate(ConnectionInfoUpdate::disconnected(
            Utc::now(),
        )));
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.tx.send(event).is_err() {
            self.cancel.cancel();
        }
    }
}
