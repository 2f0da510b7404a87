//! EventSink implementations.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::domain::EffectEvent;
use crate::ports::EventSink;

/// Logs every event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: EffectEvent) {
        debug!(event = ?event, "effect event");
    }
}

/// Keeps every event in order (tests, CLI summary).
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EffectEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EffectEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: EffectEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
