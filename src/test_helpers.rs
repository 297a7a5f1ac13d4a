//! Shared fakes for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{Clock, TokioClock};
use crate::config::{
    ConfigBootstrapper, ConfigSources, IdentityConfig, MapEnv, PageGlobals, RemoteConfig, RemoteConfigFetcher,
    RetryPolicy, SharedGlobals,
};
use crate::context::AuthContext;
use crate::error::{AuthError, ConfigError};
use crate::login::Navigator;
use crate::loop_guard::MemoryPageStorage;
use crate::session::{IdentitySdk, SessionUser};
use crate::settings::Settings;

// =========================================================================
// FakeSdk
// =========================================================================

/// Scriptable identity SDK.
pub struct FakeSdk {
    pub configure_calls: AtomicUsize,
    pub sign_in_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub current_user_calls: AtomicUsize,
    /// `current_user` calls that ran to completion (not cancelled).
    pub current_user_completed: AtomicUsize,
    tokens: AtomicBool,
    session: Mutex<Option<SessionUser>>,
    establish_on_sign_in: AtomicBool,
    reject_configure: AtomicBool,
    sign_in_error: Mutex<Option<AuthError>>,
    current_user_error: Mutex<Option<AuthError>>,
    current_user_delay: Mutex<Duration>,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self {
            configure_calls: AtomicUsize::new(0),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            current_user_calls: AtomicUsize::new(0),
            current_user_completed: AtomicUsize::new(0),
            tokens: AtomicBool::new(false),
            session: Mutex::new(None),
            establish_on_sign_in: AtomicBool::new(true),
            reject_configure: AtomicBool::new(false),
            sign_in_error: Mutex::new(None),
            current_user_error: Mutex::new(None),
            current_user_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Start with a valid stored session for `email`.
    pub fn signed_in(email: &str) -> Self {
        let sdk = Self::new();
        sdk.tokens.store(true, Ordering::SeqCst);
        *sdk.session.lock().unwrap() = Some(SessionUser { email: email.to_owned() });
        sdk
    }

    pub fn with_current_user_delay(self, delay: Duration) -> Self {
        *self.current_user_delay.lock().unwrap() = delay;
        self
    }

    pub fn with_current_user_error(self, err: AuthError) -> Self {
        *self.current_user_error.lock().unwrap() = Some(err);
        self
    }

    pub fn with_sign_in_error(self, err: AuthError) -> Self {
        *self.sign_in_error.lock().unwrap() = Some(err);
        self
    }

    /// Sign-in succeeds but the session never becomes visible to `current_user`.
    pub fn without_session_on_sign_in(self) -> Self {
        self.establish_on_sign_in.store(false, Ordering::SeqCst);
        self
    }

    pub fn rejecting_configure(self) -> Self {
        self.reject_configure.store(true, Ordering::SeqCst);
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IdentitySdk for FakeSdk {
    fn configure(&self, _config: &IdentityConfig) -> Result<(), AuthError> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_configure.load(Ordering::SeqCst) {
            return Err(AuthError::ConfigUnavailable);
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<SessionUser, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.sign_in_error.lock().unwrap().clone() {
            return Err(err);
        }
        let user = SessionUser { email: email.to_owned() };
        self.tokens.store(true, Ordering::SeqCst);
        if self.establish_on_sign_in.load(Ordering::SeqCst) {
            *self.session.lock().unwrap() = Some(user.clone());
        }
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.store(false, Ordering::SeqCst);
        *self.session.lock().unwrap() = None;
        Ok(())
    }

    fn has_local_tokens(&self) -> bool {
        self.tokens.load(Ordering::SeqCst)
    }

    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        self.current_user_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.current_user_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.current_user_completed.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.current_user_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.session.lock().unwrap().clone())
    }
}

// =========================================================================
// CountingFetcher
// =========================================================================

/// Remote config fetcher that counts probes.
pub struct CountingFetcher {
    pub calls: AtomicUsize,
    delay: Duration,
    document: Option<RemoteConfig>,
}

impl CountingFetcher {
    /// `None` makes every fetch fail with a 404.
    pub fn new(document: Option<RemoteConfig>, delay: Duration) -> Self {
        Self { calls: AtomicUsize::new(0), delay, document }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteConfigFetcher for CountingFetcher {
    async fn fetch(&self) -> Result<RemoteConfig, ConfigError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.document.clone().ok_or(ConfigError::Status(404))
    }
}

// =========================================================================
// Clocks
// =========================================================================

/// Records every requested sleep and returns immediately.
#[derive(Default)]
pub struct RecordingClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> tokio::time::Instant {
        tokio::time::Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

// =========================================================================
// Builders
// =========================================================================

pub fn globals_with_identity() -> PageGlobals {
    PageGlobals {
        user_pool_id: Some("eu-west-1_abbey".into()),
        user_pool_client_id: Some("admin-client".into()),
        region: Some("eu-west-1".into()),
        ..PageGlobals::default()
    }
}

pub fn remote_with_identity() -> RemoteConfig {
    RemoteConfig {
        base_url: Some("https://api.abbey.example.org".into()),
        user_pool_id: Some("eu-west-1_remote".into()),
        user_pool_client_id: Some("remote-client".into()),
        region: Some("eu-west-1".into()),
        identity_pool_id: None,
    }
}

pub fn sources(
    globals: SharedGlobals,
    env: MapEnv,
    remote: Option<Arc<dyn RemoteConfigFetcher>>,
) -> ConfigSources {
    ConfigSources { globals: Arc::new(globals), env: Arc::new(env), remote }
}

pub fn bootstrapper(sources: ConfigSources) -> ConfigBootstrapper {
    ConfigBootstrapper::new(sources, RetryPolicy::default(), Arc::new(TokioClock))
}

/// Navigator that records every path it is asked to open.
pub fn recording_navigator() -> (Arc<dyn Navigator>, Arc<Mutex<Vec<String>>>) {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&visited);
    let navigator: Arc<dyn Navigator> = Arc::new(move |path: &str| sink.lock().unwrap().push(path.to_owned()));
    (navigator, visited)
}

/// Fresh page-load context over the given fakes with default settings.
pub fn context(sdk: Arc<FakeSdk>, sources: ConfigSources, storage: MemoryPageStorage) -> AuthContext {
    AuthContext::new(sources, sdk, Arc::new(storage), Settings::default())
}
