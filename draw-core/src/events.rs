//! Typed event bus (spec.md section 9, "Event fan-out after write"): a
//! bounded broadcast channel standing in for the source's in-process
//! emitter. `draw-committed`, `prediction-committed`, and
//! `all-predictions-committed` (spec.md section 6.4) are all carried as
//! variants of the same `PipelineEvent`, so every subscriber gets a
//! single receiver rather than one callback per event name.

use draw_contracts::PipelineEvent;
use tokio::sync::broadcast;
use tracing::warn;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event to all current subscribers. A send error
    /// only ever means "no subscribers right now", which is harmless --
    /// there is nothing to roll back on the publisher side.
    pub fn publish(&self, event: PipelineEvent) {
        if self.sender.send(event).is_err() {
            warn!("published event with no active subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
