//! Periodic event sources for status reporting.
//!
//! The dispatcher only ever awaits `tick()`, so the wall-clock timer can be
//! swapped for a manually driven one in tests.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A source of periodic, advisory ticks
#[async_trait]
pub trait Ticker: Send + Sync {
    /// Resolve at the next tick. Must be cancel-safe: the dispatcher drops
    /// the future whenever another event wins the race.
    async fn tick(&mut self);
}

/// Wall-clock ticker backed by `tokio::time::interval`
pub struct IntervalTicker {
    inner: Interval,
}

impl IntervalTicker {
    /// First tick fires one full period after creation
    pub fn new(period: Duration) -> Self {
        let mut inner = interval_at(Instant::now() + period, period);
        inner.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { inner }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.inner.tick().await;
    }
}

/// Ticker that never fires
pub struct NeverTicker;

#[async_trait]
impl Ticker for NeverTicker {
    async fn tick(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Ticker driven through a channel; each `()` sent is one tick
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ManualTicker {
    pub fn new() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            // Trigger dropped: behave like a ticker that never fires again.
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn manual_ticker_fires_per_trigger() {
        let (trigger, mut ticker) = ManualTicker::new();
        trigger.send(()).unwrap();
        trigger.send(()).unwrap();

        ticker.tick().await;
        ticker.tick().await;
        assert!(timeout(Duration::from_millis(20), ticker.tick()).await.is_err());
    }

    #[tokio::test]
    async fn never_ticker_stays_pending() {
        let mut ticker = NeverTicker;
        assert!(timeout(Duration::from_millis(20), ticker.tick()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_waits_a_full_period() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_secs(2));
        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
