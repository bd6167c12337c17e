//! Shared test utilities for floorwatch integration tests.
//!
//! Provides stream/identity client builders with fast timings and a raw TCP
//! event-stream server that keeps connections open, which wiremock cannot do.

#![allow(dead_code)]

use floorwatch::config::{IdentityConfig, StreamConfig};
use floorwatch::identity::{IdentityCache, StaticToken};
use floorwatch::stream::{ConnectionEvent, EventStreamClient, Subscription};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// =============================================================================
// Well-Known Test Constants
// =============================================================================

/// Bearer token used by identity tests.
pub const TEST_TOKEN: &str = "test-token-123";

/// How long a test waits for any single stream event.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Client Builders
// =============================================================================

/// Stream client with millisecond backoff so retry tests run quickly.
pub fn fast_stream_client(base_delay_ms: u64, max_delay_ms: u64) -> EventStreamClient {
    let config = StreamConfig {
        base_delay_ms,
        max_delay_ms,
        ..Default::default()
    };
    EventStreamClient::new(config).unwrap()
}

/// Identity cache pointed at `{base}/api/auth/me` with a fixed token.
pub fn identity_cache(base: &str, ttl_ms: u64) -> IdentityCache {
    identity_cache_with_token(base, ttl_ms, StaticToken::new(TEST_TOKEN))
}

pub fn identity_cache_with_token(base: &str, ttl_ms: u64, token: StaticToken) -> IdentityCache {
    let config = IdentityConfig {
        cache_ttl_ms: ttl_ms,
        ..Default::default()
    };
    IdentityCache::new(&config, format!("{}/api/auth/me", base), Arc::new(token)).unwrap()
}

// =============================================================================
// Event Helpers
// =============================================================================

/// Wait for the next event, failing the test on timeout or close.
pub async fn next_event(sub: &mut Subscription) -> ConnectionEvent {
    tokio::time::timeout(EVENT_TIMEOUT, sub.next_event())
        .await
        .expect("timed out waiting for stream event")
        .expect("subscription closed unexpectedly")
}

/// Skip events until one matches `pred`; returns it.
pub async fn wait_for<F>(sub: &mut Subscription, mut pred: F) -> ConnectionEvent
where
    F: FnMut(&ConnectionEvent) -> bool,
{
    loop {
        let event = next_event(sub).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Render a sequence of JSON payloads as SSE `data:` frames.
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect()
}

// =============================================================================
// Held-Open Event Stream Server
// =============================================================================

/// Event-stream server that writes a fixed preamble on every connection and
/// then holds the connection open until the client hangs up.
pub struct HeldStreamServer {
    pub url: String,
    connections: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
}

impl HeldStreamServer {
    pub async fn start(preamble: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let preamble = preamble.to_string();

        let conns = Arc::clone(&connections);
        let live = Arc::clone(&active);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                conns.fetch_add(1, Ordering::SeqCst);
                live.fetch_add(1, Ordering::SeqCst);
                let live = Arc::clone(&live);
                let preamble = preamble.clone();

                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let mut head = Vec::new();
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => {
                                live.fetch_sub(1, Ordering::SeqCst);
                                return;
                            }
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }

                    let response = format!(
                        concat!(
                            "HTTP/1.1 200 OK\r\n",
                            "Content-Type: text/event-stream\r\n",
                            "Cache-Control: no-cache\r\n",
                            "Connection: close\r\n\r\n{}",
                        ),
                        preamble
                    );
                    if socket.write_all(response.as_bytes()).await.is_ok() {
                        let _ = socket.flush().await;
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => {}
                            }
                        }
                    }
                    live.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            url: format!("http://{}/api/events", addr),
            connections,
            active,
        }
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Connections the client still holds open.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}
