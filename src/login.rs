//! Login page flow: existing-session short-circuit, credential submission,
//! post-login confirmation, and the redirect back into the admin area.
//!
//! SYSTEM CONTEXT
//! ==============
//! The login page is reachable without any session, so unlike protected
//! pages nothing upstream has vouched for the visitor. Every failure here
//! keeps the form on screen; nothing is trusted.
//!
//! ERROR HANDLING
//! ==============
//! `submit` returns every failure to the caller for inline display. The one
//! rule that is not negotiable: never navigate unless `current_user` has
//! confirmed the new session, otherwise the protected page bounces straight
//! back here.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::clock::Clock;
use crate::config::ConfigBootstrapper;
use crate::error::{AuthError, ErrorCode};
use crate::loop_guard::LoopGuard;
use crate::session::{SessionAdapter, SessionUser};

pub const DEFAULT_DESTINATION: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";

const APP_ORIGIN: &str = "https://app.invalid";

/// Performs client-side navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        self(path);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// A live session was found; navigation to this path was issued.
    Redirected(String),
    ShowForm,
}

// =============================================================================
// INPUT HELPERS
// =============================================================================

/// Trim the email and require both fields. The password is passed through untouched.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] when either field is empty.
pub fn validate_credentials(email: &str, password: &str) -> Result<(String, String), AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput("Enter both email and password."));
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// Reduce an advisory redirect target to a same-origin path.
///
/// Anything that is not a plain absolute path on this site (scheme-relative
/// `//host`, full URLs, backslashes, control characters) or that points back
/// at the login page falls back to [`DEFAULT_DESTINATION`].
#[must_use]
pub fn sanitize_destination(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .and_then(in_app_path)
        .unwrap_or_else(|| DEFAULT_DESTINATION.to_owned())
}

fn in_app_path(raw: &str) -> Option<String> {
    if !raw.starts_with('/') || raw.starts_with("//") || raw.contains('\\') || raw.chars().any(char::is_control) {
        return None;
    }
    let Ok(base) = Url::parse(APP_ORIGIN) else {
        return None;
    };
    let Ok(joined) = base.join(raw) else {
        return None;
    };
    if joined.origin() != base.origin() || joined.path().trim_end_matches('/') == LOGIN_PATH {
        return None;
    }
    let mut path = joined.path().to_owned();
    if let Some(query) = joined.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = joined.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    Some(path)
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct LoginController {
    config: ConfigBootstrapper,
    session: Arc<SessionAdapter>,
    loop_guard: LoopGuard,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
    settle: Duration,
    login_settle: Duration,
}

impl LoginController {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ConfigBootstrapper,
        session: Arc<SessionAdapter>,
        loop_guard: LoopGuard,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        timeout: Duration,
        settle: Duration,
        login_settle: Duration,
    ) -> Self {
        Self { config, session, loop_guard, clock, navigator, timeout, settle, login_settle }
    }

    /// Where a successful sign-in lands.
    #[must_use]
    pub fn destination(&self) -> String {
        sanitize_destination(self.config.redirect_target().as_deref())
    }

    /// On mount: skip the form when a valid session already exists.
    pub async fn check_existing_session(&self) -> MountOutcome {
        let user = tokio::select! {
            user = self.existing_user() => user,
            () = self.clock.sleep(self.timeout) => {
                tracing::debug!("existing-session check timed out; showing login form");
                None
            }
        };
        let Some(user) = user else {
            return MountOutcome::ShowForm;
        };
        let destination = self.destination();
        tracing::info!(email = %user.email, %destination, "already signed in; leaving login page");
        self.navigator.navigate(&destination);
        MountOutcome::Redirected(destination)
    }

    async fn existing_user(&self) -> Option<SessionUser> {
        self.clock.sleep(self.settle).await;
        if let Err(e) = self.session.configure_from(&self.config).await {
            tracing::debug!(code = e.error_code(), error = %e, "login page: no usable config");
            return None;
        }
        if !self.session.is_authenticated() {
            return None;
        }
        match self.session.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(code = e.error_code(), error = %e, "login page: session check failed");
                None
            }
        }
    }

    /// Sign in and, once the session is confirmed, navigate to the destination.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] for empty fields
    /// - [`AuthError::ConfigUnavailable`] before any login attempt when no
    ///   config resolves
    /// - the provider's own error, verbatim, when sign-in fails
    /// - [`AuthError::SessionNotEstablished`] when sign-in succeeded but the
    ///   session could not be confirmed; no navigation happens
    pub async fn submit(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let (email, password) = validate_credentials(email, password)?;
        self.session.configure_from(&self.config).await?;

        let signed_in = self
            .session
            .login(&email, &password)
            .await
            .inspect_err(|e| tracing::warn!(code = e.error_code(), error = %e, "sign-in failed"))?;
        tracing::debug!(email = %signed_in.email, "sign-in accepted; confirming session");

        self.clock.sleep(self.login_settle).await;
        let confirmed = match self.session.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(email = %email, "sign-in accepted but no session visible");
                return Err(AuthError::SessionNotEstablished);
            }
            Err(e) => {
                tracing::warn!(code = e.error_code(), error = %e, "session confirmation failed");
                return Err(AuthError::SessionNotEstablished);
            }
        };

        self.loop_guard.reset();
        let destination = self.destination();
        tracing::info!(email = %confirmed.email, %destination, "signed in");
        self.navigator.navigate(&destination);
        Ok(confirmed)
    }

    /// Sign out and return to the login page.
    pub async fn sign_out(&self) {
        self.session.logout().await;
        self.navigator.navigate(LOGIN_PATH);
    }
}

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;
