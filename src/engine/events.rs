//! Event system for simulation runs
//!
//! Provides typed event emission for turn progress, status reports, saves
//! and state changes.

use crate::grid::Cell;
use async_broadcast::{InactiveReceiver, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Execution state reported through `StateChange`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Paused,
    Executing,
    Quitting,
}

/// Runtime event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimulationEvent {
    /// Periodic status report, counted on the current snapshot
    AliveCellsCount {
        completed_turns: usize,
        cells_count: usize,
    },
    /// The I/O collaborator confirmed an image write
    ImageOutputComplete {
        completed_turns: usize,
        filename: String,
    },
    /// Pause, resume or quit; `cells_resolved` counts results collected so
    /// far in the turn in progress
    StateChange {
        completed_turns: usize,
        state: RunState,
        cells_resolved: usize,
    },
    /// Every cell of a turn has been resolved into the live buffer
    TurnComplete {
        completed_turns: usize,
        cells_resolved: usize,
    },
    /// Emitted once after the last turn
    FinalTurnComplete {
        completed_turns: usize,
        alive: Vec<Cell>,
    },
}

/// Event envelope with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub version: u32,
    pub sequence: u64,
    pub run_id: String,
    pub timestamp: i64,
    pub event: SimulationEvent,
}

/// Event sink trait for emitting events
pub trait EventSink: Send + Sync {
    /// Emit an event
    fn emit(&self, envelope: &EventEnvelope);
}

/// A simple logging event sink
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        match serde_json::to_string(&envelope.event) {
            Ok(json) => debug!(run_id = %envelope.run_id, seq = envelope.sequence, "Event: {}", json),
            Err(e) => warn!("Failed to serialize event {:?}: {}", envelope.event, e),
        }
    }
}

/// A buffering event sink that collects events
#[derive(Default)]
pub struct BufferingEventSink {
    envelopes: RwLock<Vec<EventEnvelope>>,
}

impl BufferingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn envelopes(&self) -> Vec<EventEnvelope> {
        self.envelopes.read().clone()
    }

    /// Collected events without their envelopes, in emission order
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.envelopes().into_iter().map(|e| e.event).collect()
    }

    pub fn clear(&self) {
        self.envelopes.write().clear();
    }
}

impl EventSink for BufferingEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        self.envelopes.write().push(envelope.clone());
    }
}

/// Fans events out to any number of async subscribers.
///
/// Never blocks the control loop: when a subscriber lags behind, the oldest
/// buffered event is dropped.
pub struct BroadcastEventSink {
    tx: Sender<EventEnvelope>,
    keepalive: InactiveReceiver<EventEnvelope>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (mut tx, rx) = async_broadcast::broadcast(capacity.max(1));
        tx.set_overflow(true);
        Self {
            tx,
            keepalive: rx.deactivate(),
        }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> Receiver<EventEnvelope> {
        self.keepalive.activate_cloned()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        match self.tx.try_broadcast(envelope.clone()) {
            Ok(Some(dropped)) => debug!(seq = dropped.sequence, "Subscriber lagging, dropped event"),
            Ok(None) => {}
            Err(TrySendError::Inactive(_)) => {}
            Err(e) => debug!("Broadcast sink unavailable: {}", e),
        }
    }
}

/// A sink that forwards to multiple sinks
#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

impl EventSink for CompositeEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        for sink in &self.sinks {
            sink.emit(envelope);
        }
    }
}

/// Stamps events with run metadata and hands them to the configured sink
pub struct EventBus {
    run_id: String,
    sequence: AtomicU64,
    sink: Arc<dyn EventSink>,
}

impl EventBus {
    pub fn new(run_id: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            run_id: run_id.into(),
            sequence: AtomicU64::new(0),
            sink,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event: SimulationEvent) {
        let envelope = EventEnvelope {
            version: 1,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            run_id: self.run_id.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            event,
        };
        self.sink.emit(&envelope);
    }
}
