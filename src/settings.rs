//! Timing and retry knobs parsed from environment variables.
//!
//! All optional; each falls back to its default when absent or unparseable:
//! - `AUTH_VERIFY_TIMEOUT_MS`: budget for protected-page verification (3000)
//! - `AUTH_SETTLE_MS`: wait before the first session check on a page (100)
//! - `AUTH_LOGIN_SETTLE_MS`: wait between sign-in and confirmation (500)
//! - `AUTH_GLOBALS_RETRY_ATTEMPTS`: probes of the page globals (5)
//! - `AUTH_GLOBALS_RETRY_DELAY_MS`: first backoff delay (50)
//! - `AUTH_GLOBALS_RETRY_MAX_DELAY_MS`: backoff cap (400)

use std::time::Duration;

use crate::config::EnvSource;
use crate::config::retry::{DEFAULT_ATTEMPTS, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS, RetryPolicy};

pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_SETTLE_MS: u64 = 100;
pub const DEFAULT_LOGIN_SETTLE_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub verify_timeout: Duration,
    pub settle: Duration,
    pub login_settle: Duration,
    pub globals_retry: RetryPolicy,
}

impl Settings {
    #[must_use]
    pub fn from_env(env: &dyn EnvSource) -> Self {
        Self {
            verify_timeout: Duration::from_millis(env_parse(env, "AUTH_VERIFY_TIMEOUT_MS", DEFAULT_VERIFY_TIMEOUT_MS)),
            settle: Duration::from_millis(env_parse(env, "AUTH_SETTLE_MS", DEFAULT_SETTLE_MS)),
            login_settle: Duration::from_millis(env_parse(env, "AUTH_LOGIN_SETTLE_MS", DEFAULT_LOGIN_SETTLE_MS)),
            globals_retry: RetryPolicy::new(
                env_parse(env, "AUTH_GLOBALS_RETRY_ATTEMPTS", DEFAULT_ATTEMPTS),
                Duration::from_millis(env_parse(env, "AUTH_GLOBALS_RETRY_DELAY_MS", DEFAULT_INITIAL_DELAY_MS)),
                Duration::from_millis(env_parse(env, "AUTH_GLOBALS_RETRY_MAX_DELAY_MS", DEFAULT_MAX_DELAY_MS)),
            ),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            login_settle: Duration::from_millis(DEFAULT_LOGIN_SETTLE_MS),
            globals_retry: RetryPolicy::default(),
        }
    }
}

fn env_parse<T>(env: &dyn EnvSource, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env.var(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
