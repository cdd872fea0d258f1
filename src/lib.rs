// Core infrastructure modules
pub mod core {
    pub mod config;
    pub mod errors;
}

pub mod engine; // Worker pool, dispatch loop and run driver
pub mod grid; // Board storage and transition rule
pub mod io; // Image and keyboard collaborators

// Re-exports for convenience
pub use crate::core::config::{SimulationConfig, SimulationConfigBuilder};
pub use crate::core::errors::{LifeError, Result};
pub use engine::{
    ControlSource, ControlToken, FinalState, Simulation, SimulationBuilder, SimulationEvent,
    SimulationOutcome,
};
pub use grid::{Cell, Grid, Snapshot, ALIVE, DEAD};
pub use io::{IoService, MemoryIo, PgmIo};
