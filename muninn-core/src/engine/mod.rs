//! Event dispatch engine.
//!
//! One [`EventEngine`] owns a FIFO queue and a single dispatch thread.
//! Producers on any thread hand events off asynchronously via
//! [`EventEngine::put`] (or a cloned [`EventSender`]); the dispatch
//! thread pops one event per iteration and invokes the registered
//! handlers serially, type-specific first, wildcard after.
//!
//! Because every handler runs on that one thread, consumer state is
//! linearized without cross-handler locking. The flip side is documented
//! and deliberate: a slow handler stalls the whole pipeline, and events
//! still queued when [`EventEngine::stop`] lands are dropped. Callers
//! that want a full drain poll [`EventEngine::pending`] before stopping.

pub mod log_handler;
pub mod registry;

pub use log_handler::LogEventHandler;
pub use registry::{EventHandler, HandlerRegistry};

use crate::event::{Event, EventType};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long the dispatch loop blocks on an empty queue before rechecking
/// the active flag. Bounds the latency with which `stop()` is observed.
const RECV_TIMEOUT: Duration = Duration::from_millis(200);

/// Dispatch counters, shared with the dispatch thread.
#[derive(Default)]
struct StatsInner {
    events_dispatched: AtomicU64,
    handler_errors: AtomicU64,
}

/// Point-in-time dispatch statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Events popped from the queue and dispatched.
    pub events_dispatched: u64,
    /// Handler invocations that returned an error.
    pub handler_errors: u64,
}

/// Cheap clonable producer handle.
///
/// Collaborators that only need to enqueue (strategies emitting signals,
/// replay feeds) hold one of these instead of the engine itself.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Enqueue an event. Never blocks on dispatch completion.
    pub fn put(&self, event: Event) {
        // Send only fails once the engine (and its receiver) is gone;
        // that is the documented shutdown race, not a caller error.
        if self.tx.send(event).is_err() {
            warn!("event dropped: engine already shut down");
        }
    }
}

/// Single-threaded publish/subscribe event engine.
///
/// Lifecycle: `NotStarted → start() → Running → stop() → Stopped`.
/// `put`, `register` and `unregister` are valid in any state; events
/// enqueued before `start()` buffer and are processed once running.
pub struct EventEngine {
    name: String,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    registry: Arc<HandlerRegistry>,
    active: Arc<AtomicBool>,
    stats: Arc<StatsInner>,
    worker: Option<JoinHandle<()>>,
}

impl EventEngine {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            name: name.into(),
            tx,
            rx,
            registry: Arc::new(HandlerRegistry::new()),
            active: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(StatsInner::default()),
            worker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue an event from any thread, including from inside a handler.
    ///
    /// Re-entrant enqueue, never re-entrant dispatch: an event put by a
    /// handler is processed on a later iteration of the dispatch loop.
    pub fn put(&self, event: Event) {
        // Cannot fail: self keeps the receiver alive.
        let _ = self.tx.send(event);
    }

    /// Producer handle for collaborators that enqueue but never dispatch.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Register a handler for one event type. Idempotent; returns `true`
    /// if the handler was newly added.
    pub fn register(&self, kind: EventType, handler: Arc<dyn EventHandler>) -> bool {
        self.registry.register(kind, handler)
    }

    /// Register a handler invoked for every event regardless of type.
    pub fn register_wildcard(&self, handler: Arc<dyn EventHandler>) -> bool {
        self.registry.register_wildcard(handler)
    }

    /// Remove a handler from one event type. No-op if absent.
    pub fn unregister(&self, kind: EventType, handler: &Arc<dyn EventHandler>) {
        self.registry.unregister(kind, handler)
    }

    /// Remove a wildcard handler. No-op if absent.
    pub fn unregister_wildcard(&self, handler: &Arc<dyn EventHandler>) {
        self.registry.unregister_wildcard(handler)
    }

    /// Spawn the dispatch thread.
    ///
    /// Calling `start` on an already running engine is rejected with a
    /// warning; a second dispatch thread would break the single-mutator
    /// guarantee every consumer relies on.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            warn!(engine = %self.name, "start() called on a running engine, ignoring");
            return;
        }

        self.active.store(true, Ordering::Release);

        let rx = self.rx.clone();
        let registry = Arc::clone(&self.registry);
        let active = Arc::clone(&self.active);
        let stats = Arc::clone(&self.stats);
        let name = self.name.clone();

        let handle = std::thread::Builder::new()
            .name(format!("muninn-dispatch-{name}"))
            .spawn(move || {
                debug!(engine = %name, "dispatch thread running");
                while active.load(Ordering::Acquire) {
                    match rx.recv_timeout(RECV_TIMEOUT) {
                        Ok(event) => Self::dispatch(&registry, &stats, &event),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!(engine = %name, "dispatch thread exiting");
            })
            .expect("failed to spawn dispatch thread");

        self.worker = Some(handle);
        info!(engine = %self.name, "event engine started");
    }

    /// Signal termination and join the dispatch thread.
    ///
    /// Cooperative: the in-flight event finishes dispatch, then the loop
    /// observes the cleared flag within one `RECV_TIMEOUT`. Events still
    /// queued at that point are discarded; callers must not rely on
    /// post-stop delivery.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
            let dropped = self.rx.len();
            if dropped > 0 {
                warn!(engine = %self.name, dropped, "undispatched events discarded on stop");
            }
            info!(engine = %self.name, "event engine stopped");
        }
    }

    /// Events enqueued but not yet dispatched.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.active.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            events_dispatched: self.stats.events_dispatched.load(Ordering::Relaxed),
            handler_errors: self.stats.handler_errors.load(Ordering::Relaxed),
        }
    }

    /// Invoke every handler registered for the event, in registration
    /// order, specific-type handlers before wildcard handlers.
    ///
    /// A handler error is logged with its context and dispatch moves on
    /// to the next handler: one failing consumer never stalls the
    /// pipeline.
    fn dispatch(registry: &HandlerRegistry, stats: &StatsInner, event: &Event) {
        stats.events_dispatched.fetch_add(1, Ordering::Relaxed);
        for handler in registry.handlers_for(event.kind()) {
            if let Err(err) = handler.on_event(event) {
                stats.handler_errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    handler = handler.name(),
                    event_type = %event.kind(),
                    "handler failed: {err:#}"
                );
            }
        }
    }
}

impl Drop for EventEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
