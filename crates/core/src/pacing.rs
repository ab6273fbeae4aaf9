//! Delay between consecutive records.
//!
//! The generation API is rate limited and the batch does not retry, so the
//! runner pauses between records. The pause is behind [`Pacer`] so tests can
//! record it instead of sleeping.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspends the batch for `delay`.
    async fn pause(&self, delay: Duration);
}

/// Wall-clock pacing with `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tracing::trace!(delay_ms = delay.as_millis() as u64, "pausing before next record");
        tokio::time::sleep(delay).await;
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self, _delay: Duration) {}
}
