//! Run metrics collection
//!
//! Counters are updated by the control loop and can be read from any thread
//! while a run is in progress.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Simulation execution metrics
#[derive(Debug)]
pub struct SimulationMetrics {
    /// Turns whose every cell has been resolved
    pub turns_completed: AtomicU64,
    /// Results written into the live buffer across all turns
    pub cells_resolved: AtomicU64,
    /// Images confirmed by the I/O collaborator
    pub images_written: AtomicU64,
    /// Saves requested through control tokens, including the save on quit
    pub saves: AtomicU64,
    /// Periodic status reports emitted
    pub status_reports: AtomicU64,
    /// Times the run entered the paused state
    pub pauses: AtomicU64,
    /// Wall time spent inside turns
    pub total_turn_time_ms: AtomicU64,
    /// Results returned by each worker slot
    per_worker: Vec<AtomicU64>,
}

impl SimulationMetrics {
    /// Create metrics for a pool of `workers` slots
    pub fn new(workers: usize) -> Self {
        Self {
            turns_completed: AtomicU64::new(0),
            cells_resolved: AtomicU64::new(0),
            images_written: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            status_reports: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
            total_turn_time_ms: AtomicU64::new(0),
            per_worker: (0..workers).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Record one result returned by `worker`
    pub fn record_result(&self, worker: usize) {
        self.cells_resolved.fetch_add(1, Ordering::Relaxed);
        if let Some(count) = self.per_worker.get(worker) {
            count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a fully resolved turn
    pub fn record_turn(&self, elapsed: Duration) {
        self.turns_completed.fetch_add(1, Ordering::Relaxed);
        self.total_turn_time_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_image(&self) {
        self.images_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_report(&self) {
        self.status_reports.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pause(&self) {
        self.pauses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            turns_completed: self.turns_completed.load(Ordering::Relaxed),
            cells_resolved: self.cells_resolved.load(Ordering::Relaxed),
            images_written: self.images_written.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            status_reports: self.status_reports.load(Ordering::Relaxed),
            pauses: self.pauses.load(Ordering::Relaxed),
            total_turn_time_ms: self.total_turn_time_ms.load(Ordering::Relaxed),
            per_worker: self
                .per_worker
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub turns_completed: u64,
    pub cells_resolved: u64,
    pub images_written: u64,
    pub saves: u64,
    pub status_reports: u64,
    pub pauses: u64,
    pub total_turn_time_ms: u64,
    pub per_worker: Vec<u64>,
}

impl MetricsSnapshot {
    /// Average turn duration
    pub fn avg_turn_time(&self) -> Duration {
        if self.turns_completed == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(self.total_turn_time_ms / self.turns_completed)
        }
    }

    /// Cells resolved per second of turn time
    pub fn cells_per_second(&self) -> f64 {
        if self.total_turn_time_ms == 0 {
            0.0
        } else {
            self.cells_resolved as f64 / (self.total_turn_time_ms as f64 / 1000.0)
        }
    }
}

/// Timer for measuring turn duration
pub struct TurnTimer {
    start: Instant,
}

impl TurnTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = SimulationMetrics::new(2);

        metrics.record_result(0);
        metrics.record_result(1);
        metrics.record_result(1);
        metrics.record_result(7);
        metrics.record_turn(Duration::from_millis(40));
        metrics.record_turn(Duration::from_millis(20));
        metrics.record_image();
        metrics.record_save();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cells_resolved, 4);
        assert_eq!(snapshot.per_worker, vec![1, 2]);
        assert_eq!(snapshot.turns_completed, 2);
        assert_eq!(snapshot.images_written, 1);
        assert_eq!(snapshot.saves, 1);
        assert_eq!(snapshot.avg_turn_time(), Duration::from_millis(30));
    }

    #[test]
    fn test_empty_rates() {
        let snapshot = SimulationMetrics::new(1).snapshot();
        assert_eq!(snapshot.avg_turn_time(), Duration::ZERO);
        assert_eq!(snapshot.cells_per_second(), 0.0);
    }
}
