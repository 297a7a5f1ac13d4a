//! Identity-provider configuration: types and the sources they come from.
//!
//! SYSTEM CONTEXT
//! ==============
//! The admin panel learns its user pool ids and region at runtime. The host
//! page may inject them as globals during server rendering, the build may
//! bake them into the environment, and `/api/config.json` serves them as a
//! last resort. [`bootstrap::ConfigBootstrapper`] walks those tiers in order.

pub mod bootstrap;
pub mod retry;
pub mod sources;

use serde::Deserialize;

pub use bootstrap::{ConfigBootstrapper, ConfigSources};
pub use retry::RetryPolicy;
pub use sources::{
    EnvSource, GlobalsSource, HttpConfigFetcher, MapEnv, ProcessEnv, RemoteConfigFetcher, SharedGlobals,
};

// =============================================================================
// IDENTITY CONFIG
// =============================================================================

/// Resolved identity-provider settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub pool_id: String,
    pub client_id: String,
    pub region: String,
    pub identity_pool_id: Option<String>,
}

impl IdentityConfig {
    /// Assemble a config from optional parts.
    ///
    /// Returns `None` when any required part is missing or blank: a partial
    /// config is treated the same as no config at all.
    #[must_use]
    pub fn from_parts(
        pool_id: Option<&str>,
        client_id: Option<&str>,
        region: Option<&str>,
        identity_pool_id: Option<&str>,
    ) -> Option<Self> {
        Some(Self {
            pool_id: non_blank(pool_id)?,
            client_id: non_blank(client_id)?,
            region: non_blank(region)?,
            identity_pool_id: non_blank(identity_pool_id),
        })
    }
}

pub(crate) fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

// =============================================================================
// PAGE GLOBALS
// =============================================================================

/// Values the host page injects before (or shortly after) this code starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGlobals {
    pub user_pool_id: Option<String>,
    pub user_pool_client_id: Option<String>,
    pub region: Option<String>,
    pub identity_pool_id: Option<String>,
    pub api_base_url: Option<String>,
    /// Page the visitor originally asked for. Advisory; validated before use.
    pub redirect_target: Option<String>,
}

impl PageGlobals {
    #[must_use]
    pub fn identity_config(&self) -> Option<IdentityConfig> {
        IdentityConfig::from_parts(
            self.user_pool_id.as_deref(),
            self.user_pool_client_id.as_deref(),
            self.region.as_deref(),
            self.identity_pool_id.as_deref(),
        )
    }
}

// =============================================================================
// REMOTE CONFIG
// =============================================================================

/// Body of `GET /api/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub user_pool_id: Option<String>,
    pub user_pool_client_id: Option<String>,
    pub region: Option<String>,
    pub identity_pool_id: Option<String>,
}

impl RemoteConfig {
    #[must_use]
    pub fn identity_config(&self) -> Option<IdentityConfig> {
        IdentityConfig::from_parts(
            self.user_pool_id.as_deref(),
            self.user_pool_client_id.as_deref(),
            self.region.as_deref(),
            self.identity_pool_id.as_deref(),
        )
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
