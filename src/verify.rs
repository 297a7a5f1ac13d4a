//! Protected-page auth verification.
//!
//! SYSTEM CONTEXT
//! ==============
//! A protected admin page only reaches the browser after the server gate has
//! admitted the request. The verifier therefore never denies: it decides how
//! long to show the "checking" indicator and whether the session was
//! independently confirmed. Every failure path resolves to
//! [`Verdict::TrustedUnverified`].
//!
//! DESIGN
//! ======
//! `Idle -> Checking -> Resolved(verdict)`, held in a `watch` channel so UI
//! code can subscribe. The session check races a wall-clock budget under
//! `tokio::select!`; the loser is dropped, so a stalled SDK call is cancelled
//! rather than left to finish in the background. The resolved cell is
//! written once; later writes are ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::clock::Clock;
use crate::config::ConfigBootstrapper;
use crate::error::{AuthError, ErrorCode};
use crate::loop_guard::LoopGuard;
use crate::session::{SessionAdapter, SessionUser};

// =============================================================================
// RESULTS
// =============================================================================

/// Outcome of one client-side session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCheck {
    Authenticated(SessionUser),
    Unauthenticated,
    Indeterminate(IndeterminateReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndeterminateReason {
    ConfigUnavailable,
    Network,
    Timeout,
}

/// Why protected content was rendered without confirming the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustReason {
    LoopDetected,
    ConfigUnavailable,
    NoSession,
    Network,
    Timeout,
}

/// Terminal verification state. Both variants render protected content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Authenticated(SessionUser),
    TrustedUnverified(TrustReason),
}

impl Verdict {
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::TrustedUnverified(_) => None,
        }
    }
}

impl From<AuthCheck> for Verdict {
    fn from(check: AuthCheck) -> Self {
        match check {
            AuthCheck::Authenticated(user) => Self::Authenticated(user),
            AuthCheck::Unauthenticated => Self::TrustedUnverified(TrustReason::NoSession),
            AuthCheck::Indeterminate(IndeterminateReason::ConfigUnavailable) => {
                Self::TrustedUnverified(TrustReason::ConfigUnavailable)
            }
            AuthCheck::Indeterminate(IndeterminateReason::Network) => Self::TrustedUnverified(TrustReason::Network),
            AuthCheck::Indeterminate(IndeterminateReason::Timeout) => Self::TrustedUnverified(TrustReason::Timeout),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyPhase {
    Idle,
    Checking,
    Resolved(Verdict),
}

impl VerifyPhase {
    #[must_use]
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::Resolved(verdict) => Some(verdict),
            Self::Idle | Self::Checking => None,
        }
    }
}

// =============================================================================
// VERIFIER
// =============================================================================

pub struct AuthVerifier {
    config: ConfigBootstrapper,
    session: Arc<SessionAdapter>,
    loop_guard: LoopGuard,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    settle: Duration,
    phase: watch::Sender<VerifyPhase>,
}

impl AuthVerifier {
    #[must_use]
    pub fn new(
        config: ConfigBootstrapper,
        session: Arc<SessionAdapter>,
        loop_guard: LoopGuard,
        clock: Arc<dyn Clock>,
        timeout: Duration,
        settle: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(VerifyPhase::Idle);
        Self { config, session, loop_guard, clock, timeout, settle, phase }
    }

    #[must_use]
    pub fn phase(&self) -> VerifyPhase {
        self.phase.borrow().clone()
    }

    /// Watch phase changes, e.g. to toggle a "checking" indicator.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VerifyPhase> {
        self.phase.subscribe()
    }

    /// Run verification once and return the verdict.
    ///
    /// A second call returns the stored verdict; a concurrent call waits for
    /// the first (bounded by the same budget).
    pub async fn run(&self) -> Verdict {
        let started = self.phase.send_if_modified(|phase| {
            if *phase == VerifyPhase::Idle {
                *phase = VerifyPhase::Checking;
                true
            } else {
                false
            }
        });
        if !started {
            return self.await_verdict().await;
        }

        if self.loop_guard.was_loop_detected() {
            tracing::info!("redirect loop flagged earlier in this tab; trusting server gate");
            return self.resolve(Verdict::TrustedUnverified(TrustReason::LoopDetected));
        }

        let started_at = self.clock.now();
        let verdict = tokio::select! {
            check = self.check_session() => Verdict::from(check),
            () = self.clock.sleep(self.timeout) => {
                tracing::warn!(timeout_ms = millis(self.timeout), "auth verification timed out; trusting server gate");
                Verdict::from(AuthCheck::Indeterminate(IndeterminateReason::Timeout))
            }
        };
        let elapsed_ms = millis(self.clock.now().duration_since(started_at));
        match &verdict {
            Verdict::Authenticated(user) => tracing::info!(email = %user.email, elapsed_ms, "session verified"),
            Verdict::TrustedUnverified(reason) => tracing::info!(?reason, elapsed_ms, "rendering on server trust"),
        }
        self.resolve(verdict)
    }

    async fn check_session(&self) -> AuthCheck {
        self.clock.sleep(self.settle).await;
        if let Err(e) = self.session.configure_from(&self.config).await {
            tracing::debug!(code = e.error_code(), error = %e, "verification skipped: no usable config");
            return AuthCheck::Indeterminate(IndeterminateReason::ConfigUnavailable);
        }
        match self.session.current_user().await {
            Ok(Some(user)) => AuthCheck::Authenticated(user),
            Ok(None) => AuthCheck::Unauthenticated,
            Err(e) => {
                tracing::debug!(code = e.error_code(), error = %e, "session check failed");
                AuthCheck::Indeterminate(indeterminate_reason(&e))
            }
        }
    }

    async fn await_verdict(&self) -> Verdict {
        let mut rx = self.phase.subscribe();
        let waited = tokio::select! {
            phase = rx.wait_for(|phase| phase.verdict().is_some()) => {
                phase.ok().and_then(|phase| phase.verdict().cloned())
            }
            () = self.clock.sleep(self.timeout) => None,
        };
        match waited {
            Some(verdict) => verdict,
            None => self.resolve(Verdict::TrustedUnverified(TrustReason::Timeout)),
        }
    }

    /// First write wins. Returns whichever verdict ends up stored.
    fn resolve(&self, verdict: Verdict) -> Verdict {
        let mut stored = verdict;
        self.phase.send_if_modified(|phase| {
            if let VerifyPhase::Resolved(existing) = phase {
                stored = existing.clone();
                return false;
            }
            *phase = VerifyPhase::Resolved(stored.clone());
            true
        });
        stored
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn indeterminate_reason(err: &AuthError) -> IndeterminateReason {
    match err {
        AuthError::ConfigUnavailable | AuthError::NotConfigured => IndeterminateReason::ConfigUnavailable,
        _ => IndeterminateReason::Network,
    }
}

#[cfg(test)]
#[path = "verify_test.rs"]
mod tests;
