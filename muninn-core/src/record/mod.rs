//! Audit trail for strategy signals.
//!
//! The [`SignalRecorder`] filters the event stream down to
//! `StrategySignal`, keeps every row in memory, and appends it to a
//! durable [`SignalSink`]. The canonical sink is a CSV file whose header
//! is written exactly once at construction; anything with append-row
//! semantics satisfies the trait.

use crate::engine::EventHandler;
use crate::event::{Event, EventType};
use crate::strategy::Signal;
use anyhow::Context;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Human-readable timestamp format used in the audit trail.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub time: String,
    pub action: String,
    pub symbol: String,
    pub price: f64,
    pub source: String,
}

impl SignalRow {
    fn new(signal: &Signal, time: DateTime<Utc>, source: &str) -> Self {
        Self {
            time: time.format(TIME_FORMAT).to_string(),
            action: signal.action.to_string(),
            symbol: signal.symbol.clone(),
            price: signal.price,
            source: source.to_string(),
        }
    }
}

/// Durable append-row sink for audit rows.
pub trait SignalSink: Send {
    fn append(&mut self, row: &SignalRow) -> anyhow::Result<()>;
}

/// CSV file sink. Creates parent directories, writes the header once at
/// construction, then appends one row per signal.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating audit directory {}", parent.display()))?;
            }
        }

        let file = File::create(path)
            .with_context(|| format!("creating audit file {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["time", "action", "symbol", "price", "source"])?;
        writer.flush()?;
        Ok(Self { writer })
    }
}

impl SignalSink for CsvSink {
    fn append(&mut self, row: &SignalRow) -> anyhow::Result<()> {
        self.writer.write_record([
            row.time.as_str(),
            row.action.as_str(),
            row.symbol.as_str(),
            &row.price.to_string(),
            row.source.as_str(),
        ])?;
        // Flush per row so the trail survives an abrupt exit.
        self.writer.flush()?;
        Ok(())
    }
}

/// Event handler recording every strategy signal.
pub struct SignalRecorder {
    name: String,
    rows: Mutex<Vec<SignalRow>>,
    sink: Mutex<Box<dyn SignalSink>>,
}

impl SignalRecorder {
    pub fn new(sink: Box<dyn SignalSink>) -> Self {
        Self {
            name: "signal_recorder".to_string(),
            rows: Mutex::new(Vec::new()),
            sink: Mutex::new(sink),
        }
    }

    /// Recorder backed by a CSV file at `path`.
    pub fn to_csv(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(Box::new(CsvSink::create(path)?)))
    }

    pub fn rows(&self) -> Vec<SignalRow> {
        self.rows.lock().clone()
    }
}

impl EventHandler for SignalRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        if event.kind() != EventType::StrategySignal {
            return Ok(());
        }
        let Some(signal) = Signal::from_payload(event.payload()) else {
            return Ok(());
        };

        let row = SignalRow::new(
            &signal,
            event.timestamp(),
            event.source().unwrap_or("unknown"),
        );
        debug!(
            recorder = %self.name,
            action = %row.action,
            symbol = %row.symbol,
            "signal recorded"
        );
        self.rows.lock().push(row.clone());
        // A broken sink is a real handler failure; the engine logs it
        // and keeps the rest of the pipeline running.
        self.sink.lock().append(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Payload;
    use crate::testing::VecSink;
    use std::sync::Arc;

    fn signal_event(action: &str, price: f64) -> Event {
        let mut payload = Payload::new();
        payload.insert("action", serde_json::Value::from(action));
        payload.insert("symbol", serde_json::Value::from("600519"));
        payload.insert("price", serde_json::Value::from(price));
        Event::with_source(EventType::StrategySignal, payload, "ma_cross_demo")
    }

    #[test]
    fn records_signals_and_ignores_other_kinds() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let recorder = SignalRecorder::new(Box::new(VecSink::new(sink.clone())));

        recorder.on_event(&signal_event("buy", 104.0)).unwrap();
        recorder
            .on_event(&Event::new(EventType::Heartbeat, Payload::new()))
            .unwrap();
        recorder.on_event(&signal_event("sell", 100.0)).unwrap();

        let rows = recorder.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, "buy");
        assert_eq!(rows[0].source, "ma_cross_demo");
        assert_eq!(rows[1].action, "sell");
        assert_eq!(sink.lock().len(), 2);
    }

    #[test]
    fn malformed_signal_payloads_are_skipped() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let recorder = SignalRecorder::new(Box::new(VecSink::new(sink.clone())));

        recorder
            .on_event(&Event::new(EventType::StrategySignal, Payload::new()))
            .unwrap();
        assert!(recorder.rows().is_empty());
    }

    #[test]
    fn csv_sink_writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("trades.csv");
        let recorder = SignalRecorder::to_csv(&path).unwrap();

        recorder.on_event(&signal_event("buy", 104.0)).unwrap();
        recorder.on_event(&signal_event("sell", 100.0)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time,action,symbol,price,source");
        assert!(lines[1].contains("buy"));
        assert!(lines[1].contains("104"));
        assert!(lines[2].contains("sell"));
    }
}
