//! Per-turn assignment loop.
//!
//! Coordinates are handed out in row-major order, one per idle announcement.
//! While waiting for the next idle worker the loop also services control
//! tokens, incoming results and status ticks; none of those consume a
//! coordinate. Once every coordinate is out, the loop drains results until
//! the whole board is resolved.

use crate::core::errors::Result;
use crate::engine::control::{ControlSource, ControlToken};
use crate::engine::events::{EventBus, RunState, SimulationEvent};
use crate::engine::metrics::SimulationMetrics;
use crate::engine::ticker::Ticker;
use crate::engine::worker::{closed_as_error, CellResult, WorkerPool};
use crate::grid::{Cell, Grid, Snapshot};
use crate::io::{output_name, IoService};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Every cell was resolved into the live buffer
    Completed { cells_resolved: usize },
    /// A quit token arrived; the pre-quit snapshot was saved as `filename`
    Quit { filename: String },
}

pub struct Dispatcher {
    pool: WorkerPool,
    controls: ControlSource,
    ticker: Box<dyn Ticker>,
    io: Arc<dyn IoService>,
    events: Arc<EventBus>,
    metrics: Arc<SimulationMetrics>,
}

impl Dispatcher {
    pub fn new(
        pool: WorkerPool,
        controls: ControlSource,
        ticker: Box<dyn Ticker>,
        io: Arc<dyn IoService>,
        events: Arc<EventBus>,
        metrics: Arc<SimulationMetrics>,
    ) -> Self {
        Self {
            pool,
            controls,
            ticker,
            io,
            events,
            metrics,
        }
    }

    /// Make `snapshot` the board workers compute the next turn against
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.pool.publish(snapshot);
    }

    /// Resolve every cell of `grid` for the turn after `completed_turns`.
    ///
    /// The caller must have frozen and published the grid's snapshot first.
    pub async fn run_turn(&mut self, grid: &mut Grid, completed_turns: usize) -> Result<TurnOutcome> {
        let total = grid.cell_count();
        let mut resolved = 0usize;

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let cell = Cell::new(x, y);
                loop {
                    tokio::select! {
                        token = self.controls.recv() => {
                            let Some(token) = token else { continue };
                            if let Some(filename) = self.handle_control(token, grid, completed_turns, resolved).await? {
                                return Ok(TurnOutcome::Quit { filename });
                            }
                        }
                        idle = self.pool.idle_rx.recv() => {
                            let worker = closed_as_error(idle, "idle")?;
                            self.pool.assign(worker, cell).await?;
                            break;
                        }
                        result = self.pool.result_rx.recv() => {
                            let result = closed_as_error(result, "results")?;
                            self.collect(grid, result);
                            resolved += 1;
                        }
                        _ = self.ticker.tick() => {
                            self.report_status(grid, completed_turns);
                        }
                    }
                }
            }
        }

        while resolved < total {
            let result = self.pool.next_result().await?;
            self.collect(grid, result);
            resolved += 1;
        }

        Ok(TurnOutcome::Completed {
            cells_resolved: resolved,
        })
    }

    fn collect(&self, grid: &mut Grid, result: CellResult) {
        grid.write(result.cell, result.state);
        self.metrics.record_result(result.worker);
    }

    fn report_status(&self, grid: &Grid, completed_turns: usize) {
        let cells_count = grid.snapshot().alive_count();
        info!(completed_turns, cells_count, "Alive cells");
        self.metrics.record_status_report();
        self.events.emit(SimulationEvent::AliveCellsCount {
            completed_turns,
            cells_count,
        });
    }

    /// Returns the saved filename when the token ends the run
    async fn handle_control(
        &mut self,
        token: ControlToken,
        grid: &Grid,
        completed_turns: usize,
        resolved: usize,
    ) -> Result<Option<String>> {
        match token {
            ControlToken::Save => {
                self.save(grid, completed_turns).await?;
                Ok(None)
            }
            ControlToken::Quit => {
                info!(completed_turns, "Quit requested");
                self.events.emit(SimulationEvent::StateChange {
                    completed_turns,
                    state: RunState::Quitting,
                    cells_resolved: resolved,
                });
                let filename = self.save(grid, completed_turns).await?;
                Ok(Some(filename))
            }
            ControlToken::Pause => {
                self.pause(completed_turns, resolved).await;
                Ok(None)
            }
            ControlToken::Other(key) => {
                debug!(key = %key, "Ignoring unrecognised key");
                Ok(None)
            }
        }
    }

    /// Emit the current snapshot and wait for the collaborator to finish
    async fn save(&self, grid: &Grid, completed_turns: usize) -> Result<String> {
        let snapshot = grid.snapshot();
        let filename = output_name(snapshot.width(), snapshot.height(), completed_turns);
        self.io
            .request_output(&filename, snapshot.width(), snapshot.height(), snapshot.as_bytes())
            .await?;
        self.metrics.record_save();
        self.metrics.record_image();
        info!(filename = %filename, "Snapshot saved");
        self.events.emit(SimulationEvent::ImageOutputComplete {
            completed_turns,
            filename: filename.clone(),
        });
        Ok(filename)
    }

    /// Block until a second pause token. Every other token is discarded.
    async fn pause(&mut self, completed_turns: usize, resolved: usize) {
        info!(completed_turns, "Paused");
        self.metrics.record_pause();
        self.events.emit(SimulationEvent::StateChange {
            completed_turns,
            state: RunState::Paused,
            cells_resolved: resolved,
        });

        loop {
            match self.controls.recv().await {
                Some(ControlToken::Pause) => break,
                Some(token) => debug!(?token, "Ignoring token while paused"),
                None => {
                    warn!("Control source closed while paused, resuming");
                    break;
                }
            }
        }

        info!(completed_turns, "Continuing");
        self.events.emit(SimulationEvent::StateChange {
            completed_turns,
            state: RunState::Executing,
            cells_resolved: resolved,
        });
    }

    /// Stop the pool and wait for every worker to exit
    pub async fn shutdown(self) {
        debug!(workers = self.pool.len(), "Stopping worker pool");
        self.pool.shutdown().await;
    }

    /// Drop in-flight work without waiting for it
    pub fn abandon(self) {
        debug!(workers = self.pool.len(), "Abandoning worker pool");
        self.pool.abandon();
    }
}
