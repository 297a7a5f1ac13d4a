//! Lazy, single-flight resolution of the identity config.
//!
//! DESIGN
//! ======
//! Each cached value sits in a slot that moves `Idle -> InFlight -> Ready`.
//! While a probe is in flight its future is stored as a `Shared` clone, so
//! every concurrent caller awaits that one probe instead of starting another.
//! A failed probe returns the slot to `Idle`; a later call probes again. A
//! ready value is never replaced.
//!
//! Two slots exist: the identity config, and the remote config document that
//! both the identity tier and `api_base_url` read. Stored futures own only
//! the [`Probe`] half (sources, retry, clock, document slot), never the
//! identity slot that stores them, so abandoning a probe mid-flight leaks
//! nothing once the bootstrapper is dropped.
//!
//! TRADE-OFFS
//! ==========
//! Globals are polled with backoff because the host page may publish them
//! just after this code starts. Polling is bounded so a genuinely missing
//! config fails within a second instead of spinning.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::OnceCell;

use super::retry::RetryPolicy;
use super::sources::{ENV_API_URL, EnvSource, GlobalsSource, RemoteConfigFetcher, identity_from_env};
use super::{IdentityConfig, RemoteConfig, non_blank};
use crate::clock::Clock;
use crate::error::ErrorCode;

/// The three config tiers, in probe order.
#[derive(Clone)]
pub struct ConfigSources {
    pub globals: Arc<dyn GlobalsSource>,
    pub env: Arc<dyn EnvSource>,
    pub remote: Option<Arc<dyn RemoteConfigFetcher>>,
}

/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct ConfigBootstrapper {
    inner: Arc<Inner>,
}

struct Inner {
    probe: Arc<Probe>,
    identity: SingleFlight<Arc<IdentityConfig>>,
    api_base_url: OnceCell<String>,
}

/// Everything a probe needs. Owned by in-flight futures.
struct Probe {
    sources: ConfigSources,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    document: SingleFlight<Arc<RemoteConfig>>,
}

impl ConfigBootstrapper {
    #[must_use]
    pub fn new(sources: ConfigSources, retry: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                probe: Arc::new(Probe { sources, retry, clock, document: SingleFlight::new() }),
                identity: SingleFlight::new(),
                api_base_url: OnceCell::new(),
            }),
        }
    }

    /// Best-effort resolution from globals and environment only. No I/O, no waiting.
    #[must_use]
    pub fn resolve_sync(&self) -> Option<Arc<IdentityConfig>> {
        if let Some(cfg) = self.inner.identity.ready() {
            return Some(cfg);
        }
        let cfg = self.inner.probe.probe_local()?;
        tracing::debug!(pool_id = %cfg.pool_id, "identity config resolved synchronously");
        Some(self.inner.identity.fill(Arc::new(cfg)))
    }

    /// Full resolution: globals with retry, then environment, then the remote document.
    ///
    /// Returns `None` when every tier comes up empty.
    pub async fn resolve_async(&self) -> Option<Arc<IdentityConfig>> {
        let probe = Arc::clone(&self.inner.probe);
        self.inner
            .identity
            .run(move || async move { probe.probe_all().await.map(Arc::new) }.boxed())
            .await
    }

    /// The already-resolved config, if any. Never probes.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<IdentityConfig>> {
        self.inner.identity.ready()
    }

    /// Base URL for the content API: globals, then environment, then the
    /// remote document's `baseUrl`. Empty means same-origin.
    pub async fn api_base_url(&self) -> String {
        self.inner
            .api_base_url
            .get_or_init(|| self.inner.probe.probe_api_base_url())
            .await
            .clone()
    }

    /// Raw redirect target injected by the host page. Unvalidated.
    #[must_use]
    pub fn redirect_target(&self) -> Option<String> {
        self.inner.probe.sources.globals.snapshot().redirect_target
    }
}

// =============================================================================
// PROBES
// =============================================================================

impl Probe {
    fn probe_local(&self) -> Option<IdentityConfig> {
        self.sources
            .globals
            .snapshot()
            .identity_config()
            .or_else(|| identity_from_env(self.sources.env.as_ref()))
    }

    async fn probe_all(&self) -> Option<IdentityConfig> {
        if let Some(cfg) = self.poll_globals().await {
            return Some(cfg);
        }
        if let Some(cfg) = identity_from_env(self.sources.env.as_ref()) {
            tracing::debug!(source = "env", "identity config resolved");
            return Some(cfg);
        }
        let cfg = self
            .remote_document()
            .await
            .and_then(|remote| remote.identity_config());
        match &cfg {
            Some(_) => tracing::debug!(source = "remote", "identity config resolved"),
            None => tracing::warn!("identity config unavailable from globals, env, and remote"),
        }
        cfg
    }

    async fn poll_globals(&self) -> Option<IdentityConfig> {
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            if let Some(cfg) = self.sources.globals.snapshot().identity_config() {
                tracing::debug!(source = "globals", attempt, "identity config resolved");
                return Some(cfg);
            }
            if attempt + 1 < attempts {
                self.clock
                    .sleep(self.retry.delay_for_attempt(attempt))
                    .await;
            }
        }
        None
    }

    /// The remote document, fetched at most once at a time. A successful
    /// fetch is kept; a failed one is retried by the next caller.
    async fn remote_document(&self) -> Option<Arc<RemoteConfig>> {
        let fetcher = Arc::clone(self.sources.remote.as_ref()?);
        self.document
            .run(move || {
                async move {
                    match fetcher.fetch().await {
                        Ok(remote) => Some(Arc::new(remote)),
                        Err(e) => {
                            tracing::debug!(code = e.error_code(), error = %e, "remote config fetch failed");
                            None
                        }
                    }
                }
                .boxed()
            })
            .await
    }

    async fn probe_api_base_url(&self) -> String {
        let local = non_blank(self.sources.globals.snapshot().api_base_url.as_deref())
            .or_else(|| non_blank(self.sources.env.var(ENV_API_URL).as_deref()));
        let url = match local {
            Some(url) => url,
            None => self
                .remote_document()
                .await
                .and_then(|remote| non_blank(remote.base_url.as_deref()))
                .unwrap_or_default(),
        };
        url.trim_end_matches('/').to_owned()
    }
}

// =============================================================================
// SINGLE FLIGHT
// =============================================================================

type Pending<T> = Shared<BoxFuture<'static, Option<T>>>;

enum Slot<T> {
    Idle,
    InFlight(Pending<T>),
    Ready(T),
}

struct SingleFlight<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    fn new() -> Self {
        Self { slot: Mutex::new(Slot::Idle) }
    }

    fn ready(&self) -> Option<T> {
        match &*self.lock() {
            Slot::Ready(value) => Some(value.clone()),
            Slot::Idle | Slot::InFlight(_) => None,
        }
    }

    /// Store `value` unless one is already ready. Returns whichever is stored.
    fn fill(&self, value: T) -> T {
        let mut slot = self.lock();
        if let Slot::Ready(existing) = &*slot {
            return existing.clone();
        }
        *slot = Slot::Ready(value.clone());
        value
    }

    /// Join the in-flight probe, or start one with `start`.
    async fn run<F>(&self, start: F) -> Option<T>
    where
        F: FnOnce() -> BoxFuture<'static, Option<T>>,
    {
        let pending = {
            let mut slot = self.lock();
            let existing = match &*slot {
                Slot::Ready(value) => return Some(value.clone()),
                Slot::InFlight(pending) => Some(pending.clone()),
                Slot::Idle => None,
            };
            match existing {
                Some(pending) => pending,
                None => {
                    let pending = start().shared();
                    *slot = Slot::InFlight(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;
        self.settle(&pending, outcome)
    }

    fn settle(&self, pending: &Pending<T>, outcome: Option<T>) -> Option<T> {
        let mut slot = self.lock();
        if let Slot::Ready(value) = &*slot {
            return Some(value.clone());
        }
        match outcome {
            Some(value) => {
                *slot = Slot::Ready(value.clone());
                Some(value)
            }
            None => {
                // Only the probe that failed may reopen the slot.
                let ours = matches!(&*slot, Slot::InFlight(current) if current.ptr_eq(pending));
                if ours {
                    *slot = Slot::Idle;
                }
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
