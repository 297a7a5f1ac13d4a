//! Injectable time source.
//!
//! Every delay in the crate (settle waits, retry backoff, the verification
//! budget) goes through [`Clock`] so tests can drive time under
//! `tokio::time::pause` or record the requested sleeps.

use std::time::Duration;

use tokio::time::Instant;

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Tokio timer backed clock. Honors paused test time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
