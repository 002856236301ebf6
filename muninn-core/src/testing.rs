//! Test doubles and assertion helpers shared by unit and integration
//! tests.

use crate::engine::EventHandler;
use crate::event::{Event, EventType};
use crate::record::{SignalRow, SignalSink};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handler that records every event it sees, in order.
pub struct CollectingHandler {
    name: String,
    seen: Mutex<Vec<Event>>,
}

impl CollectingHandler {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.seen.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventType> {
        self.seen.lock().iter().map(Event::kind).collect()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl EventHandler for CollectingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        self.seen.lock().push(event.clone());
        Ok(())
    }
}

/// Handler that always fails, for isolation tests.
pub struct FailingHandler {
    name: String,
    calls: Mutex<usize>,
}

impl FailingHandler {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl EventHandler for FailingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, _event: &Event) -> anyhow::Result<()> {
        *self.calls.lock() += 1;
        anyhow::bail!("handler deliberately broken")
    }
}

/// In-memory sink for recorder tests.
pub struct VecSink {
    rows: Arc<Mutex<Vec<SignalRow>>>,
}

impl VecSink {
    pub fn new(rows: Arc<Mutex<Vec<SignalRow>>>) -> Self {
        Self { rows }
    }
}

impl SignalSink for VecSink {
    fn append(&mut self, row: &SignalRow) -> anyhow::Result<()> {
        self.rows.lock().push(row.clone());
        Ok(())
    }
}

/// Poll `predicate` until it holds or `timeout` elapses.
///
/// Dispatch is asynchronous, so tests assert on eventual state instead
/// of sleeping for a guessed duration.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
