//! Concurrent turn engine: worker pool, dispatch loop and run driver.

pub mod control;
pub mod dispatcher;
pub mod driver;
pub mod events;
pub mod metrics;
pub mod ticker;
pub mod worker;

pub use control::{ControlSender, ControlSource, ControlToken};
pub use dispatcher::{Dispatcher, TurnOutcome};
pub use driver::{FinalState, Phase, Simulation, SimulationBuilder, SimulationOutcome};
pub use events::{
    BroadcastEventSink, BufferingEventSink, CompositeEventSink, EventBus, EventEnvelope, EventSink,
    LoggingEventSink, RunState, SimulationEvent,
};
pub use metrics::{MetricsSnapshot, SimulationMetrics};
pub use ticker::{IntervalTicker, ManualTicker, NeverTicker, Ticker};
pub use worker::{CellResult, WorkerId, WorkerPool};
