//! Config tiers: injected page globals, environment values, remote document.
//!
//! Client-side: the remote tier is a real `reqwest` call.
//! Tests swap any tier for an in-memory stand-in.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use super::{IdentityConfig, PageGlobals, RemoteConfig};
use crate::error::ConfigError;

pub const ENV_USER_POOL_ID: &str = "PUBLIC_USER_POOL_ID";
pub const ENV_USER_POOL_CLIENT_ID: &str = "PUBLIC_USER_POOL_CLIENT_ID";
pub const ENV_REGION: &str = "PUBLIC_AWS_REGION";
pub const ENV_IDENTITY_POOL_ID: &str = "PUBLIC_IDENTITY_POOL_ID";
pub const ENV_API_URL: &str = "PUBLIC_API_URL";

pub const CONFIG_PATH: &str = "/api/config.json";
const REQUEST_TIMEOUT_SECS: u64 = 5;
const CONNECT_TIMEOUT_SECS: u64 = 2;

// =============================================================================
// PAGE GLOBALS
// =============================================================================

/// Tier 1: values injected into the page at server-render time.
pub trait GlobalsSource: Send + Sync {
    /// Current view of the globals. May change between calls while the host
    /// page is still loading.
    fn snapshot(&self) -> PageGlobals;
}

/// Globals cell the host publishes into, possibly after startup.
#[derive(Debug, Clone, Default)]
pub struct SharedGlobals {
    inner: Arc<RwLock<PageGlobals>>,
}

impl SharedGlobals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(globals: PageGlobals) -> Self {
        Self { inner: Arc::new(RwLock::new(globals)) }
    }

    /// Replace the published globals.
    pub fn publish(&self, globals: PageGlobals) {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = globals;
    }
}

impl GlobalsSource for SharedGlobals {
    fn snapshot(&self) -> PageGlobals {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Tier 2: build-time / process environment values.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed key/value environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { vars }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[must_use]
pub fn identity_from_env(env: &dyn EnvSource) -> Option<IdentityConfig> {
    IdentityConfig::from_parts(
        env.var(ENV_USER_POOL_ID).as_deref(),
        env.var(ENV_USER_POOL_CLIENT_ID).as_deref(),
        env.var(ENV_REGION).as_deref(),
        env.var(ENV_IDENTITY_POOL_ID).as_deref(),
    )
}

// =============================================================================
// REMOTE DOCUMENT
// =============================================================================

/// Tier 3: the remote config document.
#[async_trait::async_trait]
pub trait RemoteConfigFetcher: Send + Sync {
    /// Fetch and parse the remote config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on transport failure, non-success status, or
    /// an unparseable body.
    async fn fetch(&self) -> Result<RemoteConfig, ConfigError>;
}

/// `GET {origin}/api/config.json` over `reqwest`.
pub struct HttpConfigFetcher {
    http: reqwest::Client,
    url: String,
}

impl HttpConfigFetcher {
    /// Build a fetcher for the given site origin (e.g. `https://example.org`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        let url = format!("{}{CONFIG_PATH}", origin.trim_end_matches('/'));
        Ok(Self { http, url })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl RemoteConfigFetcher for HttpConfigFetcher {
    async fn fetch(&self) -> Result<RemoteConfig, ConfigError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ConfigError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(ConfigError::Status(status));
        }
        let text = response
            .text()
            .await
            .map_err(|e| ConfigError::Request(e.to_string()))?;

        parse_remote_config(&text)
    }
}

/// Pure parsing of the config document, split out for testability.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the body is not a JSON object of the
/// expected shape.
pub fn parse_remote_config(text: &str) -> Result<RemoteConfig, ConfigError> {
    serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
