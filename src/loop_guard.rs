//! Redirect-loop guard backed by tab-lifetime storage.
//!
//! ARCHITECTURE
//! ============
//! A page about to bounce the visitor to the login screen calls
//! [`LoopGuard::note_auth_redirect`]. The second such bounce in one tab marks
//! a loop. The next protected page consumes the mark and skips client-side
//! verification entirely, trusting the server gate that already admitted it.
//!
//! The mark is single-use: reading it deletes it along with the redirect
//! count that produced it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub const LOOP_FLAG_KEY: &str = "auth_redirect_loop";
pub const REDIRECT_COUNT_KEY: &str = "auth_redirect_count";

/// Session-storage style key/value store scoped to one browser tab.
pub trait PageStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    /// Remove and return the value in one step.
    fn take(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPageStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPageStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageStorage for MemoryPageStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn take(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

#[derive(Clone)]
pub struct LoopGuard {
    storage: Arc<dyn PageStorage>,
}

impl LoopGuard {
    #[must_use]
    pub fn new(storage: Arc<dyn PageStorage>) -> Self {
        Self { storage }
    }

    /// Read and clear the loop mark. Consuming a mark also clears the
    /// redirect counter, so the next bounce starts a fresh count.
    #[must_use]
    pub fn was_loop_detected(&self) -> bool {
        let detected = self
            .storage
            .take(LOOP_FLAG_KEY)
            .is_some_and(|v| v == "1");
        if detected {
            self.reset();
        }
        detected
    }

    pub fn mark_loop_detected(&self) {
        tracing::warn!("auth redirect loop detected; next protected page will trust the server gate");
        self.storage.set(LOOP_FLAG_KEY, "1");
    }

    /// Record an imminent redirect to login. Returns `true` when this is a
    /// repeat within the tab and a loop was marked.
    pub fn note_auth_redirect(&self) -> bool {
        let count = self
            .storage
            .get(REDIRECT_COUNT_KEY)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
            .saturating_add(1);
        self.storage.set(REDIRECT_COUNT_KEY, &count.to_string());
        if count < 2 {
            return false;
        }
        self.mark_loop_detected();
        true
    }

    /// Forget earlier redirects after a confirmed sign-in.
    pub fn reset(&self) {
        if self.storage.take(REDIRECT_COUNT_KEY).is_some() {
            tracing::debug!("auth redirect counter cleared");
        }
    }
}

#[cfg(test)]
#[path = "loop_guard_test.rs"]
mod tests;
