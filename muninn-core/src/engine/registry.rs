use crate::event::{Event, EventType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A consumer of dispatched events.
///
/// Handlers are invoked serially on the engine's single dispatch thread,
/// so implementations that mutate state can use an interior
/// `parking_lot::Mutex` that is never contended. An `Err` return is
/// caught at the per-handler call site in the dispatch loop, logged, and
/// never stops the pipeline.
pub trait EventHandler: Send + Sync {
    /// Handler name for registry logs and failure context.
    fn name(&self) -> &str;

    /// React to one event.
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

type HandlerRef = Arc<dyn EventHandler>;

#[derive(Default)]
struct RegistryInner {
    by_type: HashMap<EventType, Vec<HandlerRef>>,
    wildcard: Vec<HandlerRef>,
}

/// Ordered handler lists per event type, plus a wildcard lane invoked for
/// every event.
///
/// Registration order is preserved and duplicates are rejected by `Arc`
/// pointer identity. The registry has its own lock, independent of the
/// event queue, so handlers can be added or removed while dispatch is
/// active (e.g. strategies registering at startup while data already
/// flows).
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<RegistryInner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for one event type.
    ///
    /// Idempotent: registering the same handler twice for the same type
    /// is a no-op. Returns `true` if the handler was newly added.
    pub fn register(&self, kind: EventType, handler: HandlerRef) -> bool {
        let mut inner = self.inner.write();
        let list = inner.by_type.entry(kind).or_default();
        if list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        tracing::debug!(handler = handler.name(), event_type = %kind, "handler registered");
        list.push(handler);
        true
    }

    /// Register `handler` for every event regardless of type.
    pub fn register_wildcard(&self, handler: HandlerRef) -> bool {
        let mut inner = self.inner.write();
        if inner.wildcard.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        tracing::debug!(handler = handler.name(), "wildcard handler registered");
        inner.wildcard.push(handler);
        true
    }

    /// Remove `handler` from one event type. No-op if absent.
    pub fn unregister(&self, kind: EventType, handler: &HandlerRef) {
        let mut inner = self.inner.write();
        if let Some(list) = inner.by_type.get_mut(&kind) {
            list.retain(|h| !Arc::ptr_eq(h, handler));
        }
    }

    /// Remove `handler` from the wildcard lane. No-op if absent.
    pub fn unregister_wildcard(&self, handler: &HandlerRef) {
        let mut inner = self.inner.write();
        inner.wildcard.retain(|h| !Arc::ptr_eq(h, handler));
    }

    /// Snapshot of the handlers to invoke for `kind`, in dispatch order:
    /// type-specific handlers first, wildcard handlers after.
    ///
    /// Clones the `Arc` list so the caller never holds the registry lock
    /// while invoking handlers: a handler is free to register or
    /// unregister from inside its own `on_event`.
    pub fn handlers_for(&self, kind: EventType) -> Vec<HandlerRef> {
        let inner = self.inner.read();
        let mut out: Vec<HandlerRef> = inner
            .by_type
            .get(&kind)
            .map(|list| list.to_vec())
            .unwrap_or_default();
        out.extend(inner.wildcard.iter().cloned());
        out
    }

    /// Total registered handler count, wildcard included.
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.by_type.values().map(Vec::len).sum::<usize>() + inner.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(&'static str);

    impl EventHandler for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn on_event(&self, _event: &Event) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn handler(name: &'static str) -> HandlerRef {
        Arc::new(Noop(name))
    }

    #[test]
    fn register_is_idempotent_by_identity() {
        let registry = HandlerRegistry::new();
        let h = handler("a");
        assert!(registry.register(EventType::MarketSnapshot, h.clone()));
        assert!(!registry.register(EventType::MarketSnapshot, h.clone()));
        assert_eq!(registry.handlers_for(EventType::MarketSnapshot).len(), 1);

        // A distinct instance with the same name is a different handler.
        assert!(registry.register(EventType::MarketSnapshot, handler("a")));
        assert_eq!(registry.handlers_for(EventType::MarketSnapshot).len(), 2);
    }

    #[test]
    fn same_handler_may_watch_multiple_types() {
        let registry = HandlerRegistry::new();
        let h = handler("multi");
        assert!(registry.register(EventType::MarketSnapshot, h.clone()));
        assert!(registry.register(EventType::StrategySignal, h.clone()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn wildcard_comes_after_type_handlers() {
        let registry = HandlerRegistry::new();
        let specific = handler("specific");
        let wild = handler("wild");
        registry.register_wildcard(wild.clone());
        registry.register(EventType::Heartbeat, specific.clone());

        let order: Vec<String> = registry
            .handlers_for(EventType::Heartbeat)
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(order, ["specific", "wild"]);
    }

    #[test]
    fn unregister_absent_is_noop() {
        let registry = HandlerRegistry::new();
        let h = handler("ghost");
        registry.unregister(EventType::LogEvent, &h);
        registry.unregister_wildcard(&h);
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_removes_only_that_handler() {
        let registry = HandlerRegistry::new();
        let a = handler("a");
        let b = handler("b");
        registry.register(EventType::LogEvent, a.clone());
        registry.register(EventType::LogEvent, b.clone());
        registry.unregister(EventType::LogEvent, &a);

        let remaining = registry.handlers_for(EventType::LogEvent);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name(), "b");
    }
}
