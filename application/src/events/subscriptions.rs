//! Bookkeeping for components that subscribe to the bus and must detach later

use super::bus::{EventBus, HandlerError, Listener};
use inkframe_domain::{EditorEvent, EventKind};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Listeners registered by one component, removable in a single call.
pub struct Subscriptions {
    bus: EventBus,
    entries: Mutex<Vec<(EventKind, Listener)>>,
}

impl Subscriptions {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn add(&self, kind: EventKind, listener: Listener) {
        self.bus.on(kind.clone(), listener.clone());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, listener));
    }

    /// Subscribe a method of `owner` without keeping `owner` alive.
    ///
    /// Once `owner` is dropped the listener does nothing.
    pub fn add_weak<T>(&self, kind: EventKind, owner: &Arc<T>, handler: fn(&T, &EditorEvent))
    where
        T: Send + Sync + 'static,
    {
        let weak: Weak<T> = Arc::downgrade(owner);
        self.add(
            kind,
            Listener::sync(move |event| {
                if let Some(owner) = weak.upgrade() {
                    handler(&owner, event);
                }
                Ok::<(), HandlerError>(())
            }),
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detach every listener added through this set.
    pub fn clear(&self) {
        let entries = std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (kind, listener) in &entries {
            self.bus.off(kind, Some(listener));
        }
    }
}
