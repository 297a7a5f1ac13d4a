//! Session store adapter over the external identity SDK.
//!
//! SYSTEM CONTEXT
//! ==============
//! Token issuance, storage, and refresh belong to the SDK behind
//! [`IdentitySdk`]. This module only enforces "configure before use" and
//! narrows the SDK's surface to the yes/no/unknown questions the verifier and
//! login flow ask.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigBootstrapper, IdentityConfig};
use crate::error::{AuthError, ErrorCode};

/// The signed-in admin as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
}

// =============================================================================
// SDK SEAM
// =============================================================================

/// Provider-neutral identity SDK. Enables mocking in tests.
#[async_trait::async_trait]
pub trait IdentitySdk: Send + Sync {
    /// Point the SDK at a user pool. Must tolerate repeated calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK rejects the config.
    fn configure(&self, config: &IdentityConfig) -> Result<(), AuthError>;

    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] when the pool rejects the password,
    /// [`AuthError::Network`] on transport failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    /// # Errors
    ///
    /// Returns an error if remote revocation fails. Local tokens are cleared
    /// regardless.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Local token presence only. May be stale.
    fn has_local_tokens(&self) -> bool;

    /// Validate (refreshing if needed) the stored session remotely.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] when the provider cannot be reached.
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError>;
}

// =============================================================================
// ADAPTER
// =============================================================================

pub struct SessionAdapter {
    sdk: Arc<dyn IdentitySdk>,
    configured: OnceLock<Arc<IdentityConfig>>,
}

impl SessionAdapter {
    #[must_use]
    pub fn new(sdk: Arc<dyn IdentitySdk>) -> Self {
        Self { sdk, configured: OnceLock::new() }
    }

    /// Configure the SDK once. Later calls keep the first config.
    ///
    /// # Errors
    ///
    /// Propagates the SDK's rejection of the config.
    pub fn configure(&self, config: &Arc<IdentityConfig>) -> Result<(), AuthError> {
        if self.configured.get().is_some() {
            return Ok(());
        }
        self.sdk.configure(config)?;
        if self.configured.set(Arc::clone(config)).is_ok() {
            tracing::debug!(pool_id = %config.pool_id, region = %config.region, "session store configured");
        }
        Ok(())
    }

    /// Resolve config (sync first, then async) and configure with it.
    ///
    /// # Errors
    ///
    /// [`AuthError::ConfigUnavailable`] when no tier yields a config, or the
    /// SDK's own rejection.
    pub async fn configure_from(&self, bootstrap: &ConfigBootstrapper) -> Result<Arc<IdentityConfig>, AuthError> {
        if let Some(cfg) = self.configured.get() {
            return Ok(Arc::clone(cfg));
        }
        let cfg = match bootstrap.resolve_sync() {
            Some(cfg) => cfg,
            None => bootstrap
                .resolve_async()
                .await
                .ok_or(AuthError::ConfigUnavailable)?,
        };
        self.configure(&cfg)?;
        Ok(cfg)
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured.get().is_some()
    }

    /// # Errors
    ///
    /// [`AuthError::NotConfigured`] before `configure`, otherwise the SDK's error.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        self.require_configured()?;
        self.sdk.sign_in(email, password).await
    }

    /// Best-effort sign-out. Failures are logged, never returned.
    pub async fn logout(&self) {
        if !self.is_configured() {
            tracing::debug!("logout before configure; nothing to clear");
            return;
        }
        if let Err(e) = self.sdk.sign_out().await {
            tracing::warn!(code = e.error_code(), error = %e, "sign-out failed; local session cleared");
        }
    }

    /// Local token presence. `false` until configured.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_configured() && self.sdk.has_local_tokens()
    }

    /// # Errors
    ///
    /// [`AuthError::NotConfigured`] before `configure`, otherwise the SDK's error.
    pub async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        self.require_configured()?;
        self.sdk.current_user().await
    }

    fn require_configured(&self) -> Result<(), AuthError> {
        if self.is_configured() { Ok(()) } else { Err(AuthError::NotConfigured) }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
