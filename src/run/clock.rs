use std::time::Duration;

/// Source of the wait between polls.
#[async_trait::async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

/// Real time, via the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
