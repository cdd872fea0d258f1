//! Turn sequencing and worker-pool lifecycle.
//!
//! A run moves through three phases: the board is seeded from the I/O
//! collaborator, every turn is frozen and dispatched in order, and the final
//! board is written out and handed back to the caller.

use crate::core::config::SimulationConfig;
use crate::core::errors::{LifeError, Result};
use crate::engine::control::ControlSource;
use crate::engine::dispatcher::{Dispatcher, TurnOutcome};
use crate::engine::events::{EventBus, EventSink, LoggingEventSink, SimulationEvent};
use crate::engine::metrics::{MetricsSnapshot, SimulationMetrics, TurnTimer};
use crate::engine::ticker::{IntervalTicker, Ticker};
use crate::engine::worker::WorkerPool;
use crate::grid::{Cell, Grid, Snapshot};
use crate::io::{output_name, IoService};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Seeding,
    Running,
    Finalizing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Seeding => write!(f, "seeding"),
            Phase::Running => write!(f, "running"),
            Phase::Finalizing => write!(f, "finalizing"),
        }
    }
}

/// Result of a run that reached its last turn
#[derive(Debug, Clone)]
pub struct FinalState {
    pub completed_turns: usize,
    /// Live cells of the final board in row-major order
    pub alive: Vec<Cell>,
    pub board: Snapshot,
    /// Name the final board was written under
    pub filename: String,
    pub metrics: MetricsSnapshot,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum SimulationOutcome {
    Completed(FinalState),
    /// Stopped by a quit token after saving the pre-quit snapshot
    Quit {
        completed_turns: usize,
        filename: String,
        metrics: MetricsSnapshot,
    },
}

impl SimulationOutcome {
    pub fn completed_turns(&self) -> usize {
        match self {
            Self::Completed(state) => state.completed_turns,
            Self::Quit {
                completed_turns, ..
            } => *completed_turns,
        }
    }

    pub fn metrics(&self) -> &MetricsSnapshot {
        match self {
            Self::Completed(state) => &state.metrics,
            Self::Quit { metrics, .. } => metrics,
        }
    }
}

/// A configured run, ready to start
pub struct Simulation {
    config: SimulationConfig,
    io: Arc<dyn IoService>,
    controls: ControlSource,
    ticker: Option<Box<dyn Ticker>>,
    events: Arc<EventBus>,
    metrics: Arc<SimulationMetrics>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("run_id", &self.run_id())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    pub fn builder(config: SimulationConfig) -> SimulationBuilder {
        SimulationBuilder::new(config)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        self.events.run_id()
    }

    /// Live counters, readable while the run is in progress
    pub fn metrics(&self) -> Arc<SimulationMetrics> {
        self.metrics.clone()
    }

    pub async fn run(self) -> Result<SimulationOutcome> {
        let Simulation {
            config,
            io,
            controls,
            ticker,
            events,
            metrics,
        } = self;
        let (width, height) = (config.width, config.height);

        info!(run_id = %events.run_id(), phase = %Phase::Seeding, width, height, "Starting simulation");
        let mut grid = Grid::new(width, height);
        let seed = io.request_input(width, height).await?;
        let seeded = grid.seed(&seed)?;
        info!(alive = seeded.len(), "Board seeded");

        let pool = WorkerPool::spawn(config.threads, config.channel_capacity, grid.freeze());
        let ticker: Box<dyn Ticker> = match ticker {
            Some(ticker) => ticker,
            None => Box::new(IntervalTicker::new(config.status_interval)),
        };
        let mut dispatcher = Dispatcher::new(
            pool,
            controls,
            ticker,
            io.clone(),
            events.clone(),
            metrics.clone(),
        );

        info!(phase = %Phase::Running, turns = config.turns, threads = config.threads, "Dispatching turns");
        for turn in 0..config.turns {
            let timer = TurnTimer::start();
            dispatcher.publish(grid.freeze());

            match dispatcher.run_turn(&mut grid, turn).await? {
                TurnOutcome::Completed { cells_resolved } => {
                    metrics.record_turn(timer.stop());
                    debug!(turn = turn + 1, cells_resolved, "Turn complete");
                    events.emit(SimulationEvent::TurnComplete {
                        completed_turns: turn + 1,
                        cells_resolved,
                    });
                }
                TurnOutcome::Quit { filename } => {
                    dispatcher.abandon();
                    info!(completed_turns = turn, filename = %filename, "Run stopped by quit");
                    return Ok(SimulationOutcome::Quit {
                        completed_turns: turn,
                        filename,
                        metrics: metrics.snapshot(),
                    });
                }
            }
        }

        info!(phase = %Phase::Finalizing, "Writing final board");
        let alive = grid.alive_cells();
        let board = grid.live_snapshot();
        let filename = output_name(width, height, config.turns);
        io.request_output(&filename, width, height, board.as_bytes()).await?;
        metrics.record_image();
        events.emit(SimulationEvent::ImageOutputComplete {
            completed_turns: config.turns,
            filename: filename.clone(),
        });
        events.emit(SimulationEvent::FinalTurnComplete {
            completed_turns: config.turns,
            alive: alive.clone(),
        });
        dispatcher.shutdown().await;

        info!(alive = alive.len(), filename = %filename, "Simulation complete");
        Ok(SimulationOutcome::Completed(FinalState {
            completed_turns: config.turns,
            alive,
            board,
            filename,
            metrics: metrics.snapshot(),
        }))
    }
}

/// Builder for Simulation
pub struct SimulationBuilder {
    config: SimulationConfig,
    io: Option<Arc<dyn IoService>>,
    controls: Option<ControlSource>,
    ticker: Option<Box<dyn Ticker>>,
    sink: Option<Arc<dyn EventSink>>,
    run_id: Option<String>,
}

impl SimulationBuilder {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            io: None,
            controls: None,
            ticker: None,
            sink: None,
            run_id: None,
        }
    }

    /// Image collaborator; required
    pub fn with_io(mut self, io: Arc<dyn IoService>) -> Self {
        self.io = Some(io);
        self
    }

    /// Keyboard collaborator; without one no tokens ever arrive
    pub fn with_controls(mut self, controls: ControlSource) -> Self {
        self.controls = Some(controls);
        self
    }

    /// Status report source; defaults to a wall-clock ticker at the
    /// configured interval
    pub fn with_ticker(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker = Some(ticker);
        self
    }

    /// Event destination; defaults to logging
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn build(self) -> Result<Simulation> {
        self.config.validate()?;
        let io = self
            .io
            .ok_or_else(|| LifeError::configuration_field("an I/O collaborator is required", "io"))?;
        let run_id = self
            .run_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let sink: Arc<dyn EventSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(LoggingEventSink),
        };
        let metrics = Arc::new(SimulationMetrics::new(self.config.threads));

        Ok(Simulation {
            config: self.config,
            io,
            controls: self.controls.unwrap_or_else(ControlSource::disconnected),
            ticker: self.ticker,
            events: Arc::new(EventBus::new(run_id, sink)),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ticker::NeverTicker;
    use crate::io::MemoryIo;

    fn config(turns: usize) -> SimulationConfig {
        SimulationConfig::builder()
            .dimensions(4, 4)
            .turns(turns)
            .threads(2)
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_io() {
        let err = Simulation::builder(config(1)).build().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[tokio::test]
    async fn zero_turns_writes_the_seed_back() {
        let mut seed = vec![0u8; 16];
        seed[5] = 0xFF;
        let io = MemoryIo::new(seed.clone());
        let simulation = Simulation::builder(config(0))
            .with_io(Arc::new(io.clone()))
            .with_ticker(Box::new(NeverTicker))
            .with_run_id("zero")
            .build()
            .unwrap();
        assert_eq!(simulation.run_id(), "zero");

        match simulation.run().await.unwrap() {
            SimulationOutcome::Completed(state) => {
                assert_eq!(state.completed_turns, 0);
                assert_eq!(state.alive, vec![Cell::new(1, 1)]);
                assert_eq!(state.filename, "4x4x0");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(io.output("4x4x0"), Some(seed));
    }

    #[tokio::test]
    async fn short_seed_is_rejected_before_any_turn() {
        let io = MemoryIo::new(vec![0u8; 15]);
        let simulation = Simulation::builder(config(3))
            .with_io(Arc::new(io.clone()))
            .with_ticker(Box::new(NeverTicker))
            .build()
            .unwrap();
        let err = simulation.run().await.unwrap_err();
        assert!(matches!(err, LifeError::InvalidSeed { expected: 16, actual: 15 }));
        assert_eq!(io.output_count(), 0);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Finalizing.to_string(), "finalizing");
    }
}
