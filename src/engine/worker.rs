//! Long-lived workers computing one cell transition per request.
//!
//! Each worker owns a single-slot assignment channel. Idle announcements and
//! results travel over two channels shared by the whole pool, so the
//! dispatcher only ever waits on a fixed set of receivers no matter how many
//! workers are running.

use crate::core::errors::{LifeError, Result};
use crate::grid::{next_state, Cell, Snapshot};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Stable worker slot, `0..threads`
pub type WorkerId = usize;

/// A computed cell state, tagged with the worker that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellResult {
    pub worker: WorkerId,
    pub cell: Cell,
    pub state: u8,
}

struct Worker {
    id: WorkerId,
    snapshot: watch::Receiver<Arc<Snapshot>>,
    assignments: mpsc::Receiver<Cell>,
    idle_tx: mpsc::Sender<WorkerId>,
    result_tx: mpsc::Sender<CellResult>,
}

impl Worker {
    async fn run(mut self) {
        debug!(worker = self.id, "Worker started");
        loop {
            if self.idle_tx.send(self.id).await.is_err() {
                break;
            }
            let Some(cell) = self.assignments.recv().await else {
                break;
            };

            // The assignment is sent only after the turn's snapshot has been
            // published, so this always reads the current turn's board.
            let snapshot = self.snapshot.borrow().clone();
            let state = next_state(cell.x, cell.y, &snapshot);
            trace!(worker = self.id, %cell, state, "Cell computed");

            let result = CellResult {
                worker: self.id,
                cell,
                state,
            };
            if self.result_tx.send(result).await.is_err() {
                break;
            }
        }
        debug!(worker = self.id, "Worker stopped");
    }
}

/// Handle on a running pool of workers
pub struct WorkerPool {
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    assign_txs: Vec<mpsc::Sender<Cell>>,
    pub(crate) idle_rx: mpsc::Receiver<WorkerId>,
    pub(crate) result_rx: mpsc::Receiver<CellResult>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers reading from `initial` until the first publish.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(count: usize, capacity: usize, initial: Arc<Snapshot>) -> Self {
        let capacity = capacity.max(1);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (idle_tx, idle_rx) = mpsc::channel(capacity);
        let (result_tx, result_rx) = mpsc::channel(capacity);

        let mut assign_txs = Vec::with_capacity(count);
        let mut handles = Vec::with_capacity(count);
        for id in 0..count {
            let (assign_tx, assignments) = mpsc::channel(1);
            let worker = Worker {
                id,
                snapshot: snapshot_rx.clone(),
                assignments,
                idle_tx: idle_tx.clone(),
                result_tx: result_tx.clone(),
            };
            assign_txs.push(assign_tx);
            handles.push(tokio::spawn(worker.run()));
        }
        debug!(workers = count, capacity, "Worker pool spawned");

        Self {
            snapshot_tx,
            assign_txs,
            idle_rx,
            result_rx,
            handles,
        }
    }

    pub fn len(&self) -> usize {
        self.assign_txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assign_txs.is_empty()
    }

    /// Make `snapshot` the board every subsequent assignment is computed on
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Hand `cell` to a worker that has announced itself idle
    pub async fn assign(&self, worker: WorkerId, cell: Cell) -> Result<()> {
        let tx = self.assign_txs.get(worker).ok_or_else(|| {
            LifeError::channel("assignments", format!("unknown worker {}", worker))
        })?;
        tx.send(cell).await.map_err(|_| {
            LifeError::channel("assignments", format!("worker {} has exited", worker))
        })
    }

    /// Wait for the next result, failing if every worker is gone
    pub async fn next_result(&mut self) -> Result<CellResult> {
        closed_as_error(self.result_rx.recv().await, "results")
    }

    /// Stop accepting work and wait for every worker to exit
    pub async fn shutdown(self) {
        let WorkerPool {
            assign_txs,
            idle_rx,
            result_rx,
            handles,
            ..
        } = self;
        drop(assign_txs);
        drop(idle_rx);
        drop(result_rx);
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                debug!("Worker task ended abnormally: {}", e);
            }
        }
    }

    /// Abort every worker without waiting for in-flight cells
    pub fn abandon(self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Map a closed pool channel to a channel error
pub(crate) fn closed_as_error<T>(value: Option<T>, channel: &str) -> Result<T> {
    value.ok_or_else(|| LifeError::channel(channel, "all workers have exited"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ALIVE, DEAD};
    use pretty_assertions::assert_eq;

    fn blinker() -> Arc<Snapshot> {
        Arc::new(Snapshot::from_alive(
            5,
            5,
            &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)],
        ))
    }

    #[tokio::test]
    async fn every_worker_announces_itself_idle() {
        let mut pool = WorkerPool::spawn(3, 3, blinker());
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(pool.idle_rx.recv().await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2]);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn assigned_cell_comes_back_tagged() {
        let mut pool = WorkerPool::spawn(2, 1, blinker());
        let worker = pool.idle_rx.recv().await.unwrap();
        pool.assign(worker, Cell::new(2, 1)).await.unwrap();

        let result = pool.next_result().await.unwrap();
        assert_eq!(
            result,
            CellResult {
                worker,
                cell: Cell::new(2, 1),
                state: ALIVE,
            }
        );
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn published_snapshot_is_used_for_later_assignments() {
        let mut pool = WorkerPool::spawn(1, 1, blinker());
        pool.publish(Arc::new(Snapshot::new(5, 5)));

        let worker = pool.idle_rx.recv().await.unwrap();
        pool.assign(worker, Cell::new(2, 1)).await.unwrap();
        assert_eq!(pool.next_result().await.unwrap().state, DEAD);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn assigning_unknown_worker_fails() {
        let pool = WorkerPool::spawn(1, 1, blinker());
        let err = pool.assign(4, Cell::new(0, 0)).await.unwrap_err();
        assert_eq!(err.category(), "channel");
        pool.abandon();
    }

    #[tokio::test]
    async fn empty_pool_reports_closed_results() {
        let mut pool = WorkerPool::spawn(0, 1, blinker());
        assert!(pool.is_empty());
        assert!(pool.next_result().await.is_err());
    }
}
