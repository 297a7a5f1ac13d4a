//! Per-page-load auth context.
//!
//! DESIGN
//! ======
//! One `AuthContext` per page load owns the config cache, the configured
//! session adapter, and the loop guard. Verifiers and login controllers
//! borrow clones of those handles, so a page never resolves config twice and
//! tests get fresh state by building a fresh context.

use std::sync::Arc;

use crate::clock::{Clock, TokioClock};
use crate::config::{ConfigBootstrapper, ConfigSources};
use crate::login::{LoginController, Navigator};
use crate::loop_guard::{LoopGuard, PageStorage};
use crate::session::{IdentitySdk, SessionAdapter};
use crate::settings::Settings;
use crate::verify::AuthVerifier;

pub struct AuthContext {
    config: ConfigBootstrapper,
    session: Arc<SessionAdapter>,
    loop_guard: LoopGuard,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl AuthContext {
    #[must_use]
    pub fn new(
        sources: ConfigSources,
        sdk: Arc<dyn IdentitySdk>,
        storage: Arc<dyn PageStorage>,
        settings: Settings,
    ) -> Self {
        Self::with_clock(sources, sdk, storage, settings, Arc::new(TokioClock))
    }

    #[must_use]
    pub fn with_clock(
        sources: ConfigSources,
        sdk: Arc<dyn IdentitySdk>,
        storage: Arc<dyn PageStorage>,
        settings: Settings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: ConfigBootstrapper::new(sources, settings.globals_retry, Arc::clone(&clock)),
            session: Arc::new(SessionAdapter::new(sdk)),
            loop_guard: LoopGuard::new(storage),
            clock,
            settings,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConfigBootstrapper {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionAdapter> {
        &self.session
    }

    #[must_use]
    pub fn loop_guard(&self) -> &LoopGuard {
        &self.loop_guard
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Verifier for a protected page entry point.
    #[must_use]
    pub fn verifier(&self) -> AuthVerifier {
        AuthVerifier::new(
            self.config.clone(),
            Arc::clone(&self.session),
            self.loop_guard.clone(),
            Arc::clone(&self.clock),
            self.settings.verify_timeout,
            self.settings.settle,
        )
    }

    #[must_use]
    pub fn login_controller(&self, navigator: Arc<dyn Navigator>) -> LoginController {
        LoginController::new(
            self.config.clone(),
            Arc::clone(&self.session),
            self.loop_guard.clone(),
            Arc::clone(&self.clock),
            navigator,
            self.settings.verify_timeout,
            self.settings.settle,
            self.settings.login_settle,
        )
    }
}
