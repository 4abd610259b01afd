//! Port for structured event logging.
//!
//! Defines the [`EditorEventLogger`] trait for recording bus traffic to a
//! structured log (one record per event).
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures every
//! editor event in a machine-readable format (JSONL).

use crate::events::{EventBus, Listener};
use inkframe_domain::{EditorEvent, EventKind};
use serde_json::Value;
use std::sync::Arc;

/// A structured record of one bus event.
pub struct EventRecord {
    /// Event name, e.g. `toolManager.toolActivated`.
    pub event_type: String,
    /// JSON payload of the event.
    pub payload: Value,
}

impl EventRecord {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

impl From<&EditorEvent> for EventRecord {
    fn from(event: &EditorEvent) -> Self {
        Self::new(event.kind().as_str(), event.payload_json())
    }
}

/// Port for logging editor events to a structured log.
///
/// The `log` method is synchronous and non-fallible so it never disrupts
/// event dispatch; logging failures are dropped by the implementation.
pub trait EditorEventLogger: Send + Sync {
    fn log(&self, record: EventRecord);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEventLogger;

impl EditorEventLogger for NoEventLogger {
    fn log(&self, _record: EventRecord) {}
}

/// Subscribe `logger` to every built-in event kind on `bus`.
///
/// Returns the listener so callers can detach it with [`EventBus::off`].
pub fn attach_event_logger(bus: &EventBus, logger: Arc<dyn EditorEventLogger>) -> Listener {
    let listener = Listener::sync(move |event| {
        logger.log(EventRecord::from(event));
        Ok(())
    });
    for kind in EventKind::builtin() {
        bus.on(kind, listener.clone());
    }
    listener
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_domain::event::PluginRef;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        records: Mutex<Vec<String>>,
    }

    impl EditorEventLogger for RecordingLogger {
        fn log(&self, record: EventRecord) {
            self.records.lock().unwrap().push(record.event_type);
        }
    }

    #[test]
    fn test_attached_logger_records_builtin_events() {
        let bus = EventBus::new();
        let logger = Arc::new(RecordingLogger::default());
        let listener = attach_event_logger(&bus, logger.clone());

        bus.emit(&EditorEvent::PluginActivated(PluginRef::new("p1")));
        bus.emit(&EditorEvent::ManagerInitialized(()));
        assert_eq!(
            *logger.records.lock().unwrap(),
            vec!["plugin.activated", "toolManager.initialized"]
        );

        bus.off(&EventKind::PluginActivated, Some(&listener));
        bus.emit(&EditorEvent::PluginActivated(PluginRef::new("p1")));
        assert_eq!(logger.records.lock().unwrap().len(), 2);
    }
}
