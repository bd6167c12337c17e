//! Cached "who am I" lookup.
//!
//! Many independent views want the current user. [`IdentityCache`] makes
//! sure they share one answer: a fresh cached value is returned without
//! touching the network, concurrent callers join the single request already
//! in flight, and only one request is ever outstanding per cache.
//!
//! Each cache is an explicit value with its own slot; clones share it.

mod cache;
mod error;
mod token;

pub use cache::CacheEntry;
pub use error::IdentityError;
pub use token::{StaticToken, TokenSource, TokenStore};

use crate::config::IdentityConfig;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// What a lookup found out about the current user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum IdentityOutcome {
    /// No token is stored; nobody is logged in
    Anonymous,
    /// The backend rejected the token (HTTP 401)
    Unauthenticated,
    /// The user record returned by the backend
    User(Value),
}

impl IdentityOutcome {
    pub fn user(&self) -> Option<&Value> {
        match self {
            IdentityOutcome::User(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<Value> {
        match self {
            IdentityOutcome::User(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, IdentityOutcome::User(_))
    }
}

/// Per-call options for [`IdentityCache::fetch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Skip the cached value (an in-flight request is still joined)
    pub force: bool,
    /// Abort the request after this long; falls back to the configured timeout
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

type FetchResult = Result<IdentityOutcome, IdentityError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry>,
    in_flight: Option<(u64, SharedFetch)>,
    next_request_id: u64,
}

struct Inner {
    client: reqwest::Client,
    url: String,
    tokens: Arc<dyn TokenSource>,
    ttl: Duration,
    timeout: Option<Duration>,
    slot: Mutex<Slot>,
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deduplicating, TTL-cached identity fetcher.
#[derive(Clone)]
pub struct IdentityCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("url", &self.inner.url)
            .field("ttl", &self.inner.ttl)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl IdentityCache {
    /// Create a cache with its own HTTP client.
    pub fn new(
        config: &IdentityConfig,
        identity_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        Ok(Self::with_client(config, identity_url, tokens, client))
    }

    /// Create a cache with a custom HTTP client (for testing).
    pub fn with_client(
        config: &IdentityConfig,
        identity_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                url: identity_url.into(),
                tokens,
                ttl: config.ttl(),
                timeout: config.timeout(),
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Look up the current identity.
    ///
    /// Resolves to `Anonymous` without a request when no token is stored,
    /// and to the cached user while it is fresh (unless `force` is set).
    /// Otherwise joins the request in flight or starts one.
    pub async fn fetch(&self, options: FetchOptions) -> FetchResult {
        let Some(token) = self.inner.tokens.token() else {
            tracing::trace!("No identity token stored");
            return Ok(IdentityOutcome::Anonymous);
        };

        let pending = {
            let mut slot = self.inner.slot();

            if !options.force {
                let fresh = slot.entry.as_ref().filter(|e| e.is_fresh(self.inner.ttl));
                if let Some(entry) = fresh {
                    tracing::trace!(
                        age_ms = entry.age().as_millis() as u64,
                        "Identity cache hit"
                    );
                    return Ok(IdentityOutcome::User(entry.data.clone()));
                }
            }

            match &slot.in_flight {
                Some((id, pending)) => {
                    tracing::debug!(request_id = id, "Joining identity request in flight");
                    pending.clone()
                }
                None => {
                    slot.next_request_id += 1;
                    let id = slot.next_request_id;
                    let timeout = options.timeout.or(self.inner.timeout);
                    let pending = spawn_request(Arc::clone(&self.inner), token, timeout, id);
                    slot.in_flight = Some((id, pending.clone()));
                    pending
                }
            }
        };

        pending.await
    }

    /// Shorthand for `fetch(FetchOptions::default())`.
    pub async fn current(&self) -> FetchResult {
        self.fetch(FetchOptions::default()).await
    }

    /// Fresh cached user, without any request.
    pub fn cached(&self) -> Option<Value> {
        self.inner
            .slot()
            .entry
            .as_ref()
            .filter(|e| e.is_fresh(self.inner.ttl))
            .map(|e| e.data.clone())
    }

    /// Drop the cached entry. A request in flight is left running.
    pub fn invalidate(&self) {
        tracing::debug!("Identity cache invalidated");
        self.inner.slot().entry = None;
    }

    /// Store a user record as if it had just been fetched.
    pub fn seed(&self, data: Value) {
        tracing::debug!("Identity cache seeded");
        self.inner.slot().entry = Some(CacheEntry::new(data));
    }

    /// Whether a request is currently outstanding.
    pub fn is_fetching(&self) -> bool {
        self.inner.slot().in_flight.is_some()
    }

    /// Forget the cached entry and the in-flight marker. A request still
    /// running settles for its waiters but no longer touches the cache.
    pub fn dispose(&self) {
        let mut slot = self.inner.slot();
        slot.entry = None;
        slot.in_flight = None;
    }
}

/// Start a request on its own task so it settles even when every caller
/// stops waiting. Callers share the task's outcome.
fn spawn_request(
    inner: Arc<Inner>,
    token: String,
    timeout: Option<Duration>,
    id: u64,
) -> SharedFetch {
    let handle = tokio::spawn(request(Arc::clone(&inner), token, timeout, id));

    async move {
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(request_id = id, error = %e, "Identity request task failed");
                let mut slot = inner.slot();
                if matches!(slot.in_flight, Some((current, _)) if current == id) {
                    slot.in_flight = None;
                }
                Err(IdentityError::Network(format!("identity request task failed: {}", e)))
            }
        }
    }
    .boxed()
    .shared()
}

/// Run one identity request and settle the cache slot.
async fn request(
    inner: Arc<Inner>,
    token: String,
    timeout: Option<Duration>,
    id: u64,
) -> FetchResult {
    tracing::debug!(url = %inner.url, request_id = id, "Fetching identity");

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, send(&inner, &token)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(IdentityError::Timeout(limit.as_millis() as u64)),
        },
        None => send(&inner, &token).await,
    };

    let mut slot = inner.slot();
    if !matches!(slot.in_flight, Some((current, _)) if current == id) {
        tracing::debug!(request_id = id, "Identity cache disposed, dropping late result");
        return outcome;
    }

    match &outcome {
        Ok(IdentityOutcome::User(data)) => {
            slot.entry = Some(CacheEntry::new(data.clone()));
        }
        Ok(IdentityOutcome::Unauthenticated) => {
            tracing::info!(url = %inner.url, "Identity token rejected, clearing cache");
            slot.entry = None;
        }
        Ok(IdentityOutcome::Anonymous) => {}
        Err(e) => {
            tracing::warn!(url = %inner.url, error = %e, "Identity request failed");
        }
    }
    slot.in_flight = None;

    outcome
}

async fn send(inner: &Inner, token: &str) -> FetchResult {
    let response = inner
        .client
        .get(&inner.url)
        .bearer_auth(token)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| IdentityError::Network(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Ok(IdentityOutcome::Unauthenticated);
    }
    if !status.is_success() {
        return Err(IdentityError::Http(status.as_u16()));
    }

    let data: Value = response
        .json()
        .await
        .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

    Ok(IdentityOutcome::User(data))
}
