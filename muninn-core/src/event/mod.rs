//! Event model for the dispatch pipeline.
//!
//! An [`Event`] is an immutable typed message: a kind from the closed
//! [`EventType`] taxonomy, an opaque [`Payload`] map, a creation
//! timestamp, and a free-form source label. Events are created by a
//! producer, observed by zero or more handlers on the dispatch thread,
//! then discarded; nothing downstream ever mutates one.

pub mod payload;
pub mod types;

pub use payload::{keys, Payload};
pub use types::EventType;

use chrono::{DateTime, Utc};

/// Immutable message record flowing through the engine.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventType,
    payload: Payload,
    timestamp: DateTime<Utc>,
    source: Option<String>,
}

impl Event {
    /// Create an event stamped with the current time and no source label.
    pub fn new(kind: EventType, payload: Payload) -> Self {
        Self {
            kind,
            payload,
            timestamp: Utc::now(),
            source: None,
        }
    }

    /// Create an event tagged with its origin (feed name, strategy name, ...).
    pub fn with_source(kind: EventType, payload: Payload, source: impl Into<String>) -> Self {
        Self {
            kind,
            payload,
            timestamp: Utc::now(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> EventType {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_defaults_to_none() {
        let ev = Event::new(EventType::Heartbeat, Payload::new());
        assert_eq!(ev.kind(), EventType::Heartbeat);
        assert!(ev.source().is_none());
        assert!(ev.payload().is_empty());
    }

    #[test]
    fn with_source_tags_origin() {
        let ev = Event::with_source(EventType::StrategySignal, Payload::new(), "ma_cross_demo");
        assert_eq!(ev.source(), Some("ma_cross_demo"));
    }
}
