//! Event bus with persistent and one-shot listeners.
//!
//! Listeners are stored per [`EventKind`] in registration order. Two maps
//! are kept: persistent listeners (`on`) and one-shot listeners (`once`).
//!
//! # Dispatch rules
//!
//! - Persistent listeners run first, then one-shot listeners.
//! - The one-shot list for a kind is detached from the map *before* any
//!   listener runs, so a re-entrant `emit` or `once` from inside a handler
//!   never sees a half-consumed list.
//! - A handler that returns `Err` or panics is logged and skipped; the
//!   remaining handlers still run.
//! - The internal lock is never held while handlers run.
//!
//! # Synchronous vs asynchronous listeners
//!
//! | Listener | `emit` | `emit_async` |
//! |----------|--------|--------------|
//! | [`Listener::Sync`] | called inline | called inline |
//! | [`Listener::Async`] | spawned on the ambient tokio runtime | awaited in order |
//!
//! `emit_async` awaits handlers one after another, so a handler that never
//! resolves stalls the rest of that call.

use futures::FutureExt;
use futures::future::BoxFuture;
use inkframe_domain::{EditorEvent, EventKind, ToolError};
use std::collections::HashMap;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Error returned by a failing event handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<ToolError> for HandlerError {
    fn from(e: ToolError) -> Self {
        HandlerError(e.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError(message.to_string())
    }
}

pub type SyncHandler = Arc<dyn Fn(&EditorEvent) -> Result<(), HandlerError> + Send + Sync>;
pub type AsyncHandler =
    Arc<dyn Fn(EditorEvent) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

/// A registered event handler.
///
/// Cloning a listener shares the handler, which is what [`EventBus::off`]
/// compares against.
#[derive(Clone)]
pub enum Listener {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

impl Listener {
    /// Listener called inline with a borrowed event.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&EditorEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Listener::Sync(Arc::new(handler))
    }

    /// Listener returning a future over an owned event.
    pub fn future<F, Fut>(handler: F) -> Self
    where
        F: Fn(EditorEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Listener::Async(Arc::new(move |event| handler(event).boxed()))
    }

    /// Whether both listeners share the same handler.
    pub fn same_handler(&self, other: &Listener) -> bool {
        match (self, other) {
            (Listener::Sync(a), Listener::Sync(b)) => Arc::ptr_eq(a, b),
            (Listener::Async(a), Listener::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listener::Sync(_) => f.write_str("Listener::Sync"),
            Listener::Async(_) => f.write_str("Listener::Async"),
        }
    }
}

#[derive(Default)]
struct Listeners {
    persistent: HashMap<EventKind, Vec<Listener>>,
    once: HashMap<EventKind, Vec<Listener>>,
}

/// Session-scoped event hub.
///
/// Cheap to clone; clones share the same listener maps.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Listeners>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a persistent listener.
    pub fn on(&self, kind: EventKind, listener: Listener) -> &Self {
        self.lock().persistent.entry(kind).or_default().push(listener);
        self
    }

    /// Register a listener that runs for the next matching event only.
    pub fn once(&self, kind: EventKind, listener: Listener) -> &Self {
        self.lock().once.entry(kind).or_default().push(listener);
        self
    }

    /// Remove one listener, or every listener for `kind` when `listener` is `None`.
    pub fn off(&self, kind: &EventKind, listener: Option<&Listener>) -> &Self {
        let mut guard = self.lock();
        let listeners = &mut *guard;
        match listener {
            None => {
                listeners.persistent.remove(kind);
                listeners.once.remove(kind);
            }
            Some(target) => {
                for map in [&mut listeners.persistent, &mut listeners.once] {
                    if let Some(list) = map.get_mut(kind) {
                        list.retain(|l| !l.same_handler(target));
                        if list.is_empty() {
                            map.remove(kind);
                        }
                    }
                }
            }
        }
        drop(guard);
        self
    }

    /// Snapshot the listeners for `kind`, detaching the one-shot list.
    fn take_for_dispatch(&self, kind: &EventKind) -> Vec<Listener> {
        let mut listeners = self.lock();
        let mut batch = listeners.persistent.get(kind).cloned().unwrap_or_default();
        if let Some(once) = listeners.once.remove(kind) {
            batch.extend(once);
        }
        batch
    }

    /// Publish an event synchronously.
    ///
    /// Returns whether any listener was registered for the event's kind.
    pub fn emit(&self, event: &EditorEvent) -> bool {
        let kind = event.kind();
        let batch = self.take_for_dispatch(&kind);
        if batch.is_empty() {
            return false;
        }

        tracing::trace!(event = %kind, listeners = batch.len(), "Emitting event");
        for listener in &batch {
            match listener {
                Listener::Sync(handler) => Self::call_sync(&kind, handler, event),
                Listener::Async(handler) => Self::spawn_async(&kind, handler, event),
            }
        }
        true
    }

    /// Publish an event, awaiting each listener in registration order.
    pub async fn emit_async(&self, event: &EditorEvent) -> bool {
        let kind = event.kind();
        let batch = self.take_for_dispatch(&kind);
        if batch.is_empty() {
            return false;
        }

        tracing::trace!(event = %kind, listeners = batch.len(), "Emitting event (async)");
        for listener in &batch {
            match listener {
                Listener::Sync(handler) => Self::call_sync(&kind, handler, event),
                Listener::Async(handler) => {
                    let started = catch_unwind(AssertUnwindSafe(|| handler(event.clone())));
                    let Ok(future) = started else {
                        tracing::error!(event = %kind, "Async event handler panicked");
                        continue;
                    };
                    match AssertUnwindSafe(future).catch_unwind().await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::error!(event = %kind, error = %e, "Async event handler failed")
                        }
                        Err(_) => tracing::error!(event = %kind, "Async event handler panicked"),
                    }
                }
            }
        }
        true
    }

    fn call_sync(kind: &EventKind, handler: &SyncHandler, event: &EditorEvent) {
        match catch_unwind(AssertUnwindSafe(|| handler(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(event = %kind, error = %e, "Event handler failed"),
            Err(_) => tracing::error!(event = %kind, "Event handler panicked"),
        }
    }

    fn spawn_async(kind: &EventKind, handler: &AsyncHandler, event: &EditorEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(event = %kind, "No async runtime available, skipping async handler");
            return;
        };
        let Ok(future) = catch_unwind(AssertUnwindSafe(|| handler(event.clone()))) else {
            tracing::error!(event = %kind, "Async event handler panicked");
            return;
        };
        let kind = kind.clone();
        runtime.spawn(async move {
            if let Err(e) = future.await {
                tracing::error!(event = %kind, error = %e, "Async event handler failed");
            }
        });
    }

    /// Number of listeners (persistent and one-shot) for `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        let listeners = self.lock();
        listeners.persistent.get(kind).map_or(0, Vec::len)
            + listeners.once.get(kind).map_or(0, Vec::len)
    }

    /// Kinds that currently have at least one listener.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        let listeners = self.lock();
        let mut kinds: Vec<EventKind> = listeners
            .persistent
            .keys()
            .chain(listeners.once.keys())
            .cloned()
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let mut listeners = self.lock();
        listeners.persistent.clear();
        listeners.once.clear();
    }

    /// Whether two handles refer to the same bus.
    pub fn same_bus(&self, other: &EventBus) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds", &self.event_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_domain::event::{PluginRef, ToolRef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn activated() -> EditorEvent {
        EditorEvent::ToolActivated(ToolRef::new("image-editor", "image-editor"))
    }

    fn counter_listener(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = counter.clone();
        Listener::sync(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_emit_without_listeners_returns_false() {
        let bus = EventBus::new();
        assert!(!bus.emit(&activated()));
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            bus.on(
                EventKind::ToolActivated,
                Listener::sync(move |_| {
                    order.lock().unwrap().push(i);
                    Ok(())
                }),
            );
        }
        assert!(bus.emit(&activated()));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on(EventKind::ToolActivated, Listener::sync(|_| Err("boom".into())))
            .on(EventKind::ToolActivated, Listener::sync(|_| panic!("handler panic")))
            .on(EventKind::ToolActivated, counter_listener(&counter));

        assert!(bus.emit(&activated()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_runs_exactly_once() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.once(EventKind::ToolActivated, counter_listener(&counter));

        assert!(bus.emit(&activated()));
        assert!(!bus.emit(&activated()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(&EventKind::ToolActivated), 0);
    }

    #[test]
    fn test_once_reregistered_inside_handler_runs_once_per_emit() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let inner_counter = counter.clone();
        bus.once(
            EventKind::ToolActivated,
            Listener::sync(move |_| {
                inner_counter.fetch_add(1, Ordering::SeqCst);
                let again = inner_counter.clone();
                inner_bus.once(
                    EventKind::ToolActivated,
                    Listener::sync(move |_| {
                        again.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                );
                Ok(())
            }),
        );

        bus.emit(&activated());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        bus.emit(&activated());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentrant_emit_from_handler() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on(EventKind::PluginActivated, counter_listener(&counter));

        let inner = bus.clone();
        bus.on(
            EventKind::ToolActivated,
            Listener::sync(move |_| {
                inner.emit(&EditorEvent::PluginActivated(PluginRef::new("p")));
                Ok(())
            }),
        );

        bus.emit(&activated());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_specific_and_all() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let first = counter_listener(&counter);
        let second = counter_listener(&counter);
        bus.on(EventKind::ToolActivated, first.clone())
            .on(EventKind::ToolActivated, second.clone())
            .once(EventKind::ToolActivated, first.clone());

        bus.off(&EventKind::ToolActivated, Some(&first));
        assert_eq!(bus.listener_count(&EventKind::ToolActivated), 1);

        bus.emit(&activated());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        bus.off(&EventKind::ToolActivated, None);
        assert_eq!(bus.listener_count(&EventKind::ToolActivated), 0);
        assert!(bus.event_kinds().is_empty());
    }

    #[test]
    fn test_event_kinds_lists_registered() {
        let bus = EventBus::new();
        bus.on(EventKind::ToolActivated, Listener::sync(|_| Ok(())))
            .once(EventKind::PluginActivated, Listener::sync(|_| Ok(())));
        let kinds = bus.event_kinds();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&EventKind::PluginActivated));
    }

    #[tokio::test]
    async fn test_emit_async_awaits_sequentially() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let slow = order.clone();
        bus.on(
            EventKind::ToolActivated,
            Listener::future(move |_| {
                let slow = slow.clone();
                async move {
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    slow.lock().unwrap().push("slow");
                    Ok(())
                }
            }),
        );
        let fast = order.clone();
        bus.on(
            EventKind::ToolActivated,
            Listener::sync(move |_| {
                fast.lock().unwrap().push("fast");
                Ok(())
            }),
        );

        assert!(bus.emit_async(&activated()).await);
        assert_eq!(*order.lock().unwrap(), vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_emit_async_isolates_errors() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on(
            EventKind::ToolActivated,
            Listener::future(|_| async { Err(HandlerError::from("failed")) }),
        )
        .on(EventKind::ToolActivated, counter_listener(&counter));

        assert!(bus.emit_async(&activated()).await);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sync_emit_spawns_async_listener() {
        let bus = EventBus::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        bus.on(
            EventKind::ToolActivated,
            Listener::future(move |_| {
                let tx = tx.clone();
                async move {
                    if let Some(tx) = tx.lock().unwrap().take() {
                        let _ = tx.send(());
                    }
                    Ok(())
                }
            }),
        );

        assert!(bus.emit(&activated()));
        tokio::time::timeout(std::time::Duration::from_secs(1), rx)
            .await
            .expect("async listener should run")
            .unwrap();
    }
}
