//! Strategy abstraction and engine plumbing.
//!
//! A [`Strategy`] is a pure state machine: price sample in, optional
//! [`Signal`] out. It never touches the event engine directly; the
//! [`StrategyRunner`] adapter owns that seam, extracting a [`Tick`] from
//! market events and enqueueing emitted signals back through an
//! [`EventSender`]. Concrete strategies live in `muninn-strategies` and
//! are built by name through the [`StrategyRegistry`].

use crate::engine::{EventHandler, EventSender};
use crate::errors::ConfigError;
use crate::event::{keys, Event, EventType, Payload};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// One usable price sample extracted from a market data event.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
}

impl Tick {
    /// Extract a tick from a market data event.
    ///
    /// Returns `None` for non-market events and for payloads without a
    /// usable symbol + price pair; strategies silently skip those.
    pub fn from_event(event: &Event) -> Option<Self> {
        if !event.kind().is_market_data() {
            return None;
        }
        let symbol = event.payload().str_field(keys::SYMBOL)?;
        let price = event.payload().f64_field(keys::LAST_PRICE)?;
        Some(Self {
            symbol: symbol.to_string(),
            price,
        })
    }
}

/// Direction of a strategy signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
}

impl SignalAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            SignalAction::Buy => "buy",
            SignalAction::Sell => "sell",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trading intention emitted by a strategy.
///
/// `volume` is optional; the account ledger substitutes its configured
/// lot size when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: SignalAction,
    pub symbol: String,
    pub price: f64,
    pub volume: Option<u64>,
}

impl Signal {
    pub fn buy(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            action: SignalAction::Buy,
            symbol: symbol.into(),
            price,
            volume: None,
        }
    }

    pub fn sell(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            action: SignalAction::Sell,
            symbol: symbol.into(),
            price,
            volume: None,
        }
    }

    /// Wire form: `{action, symbol, price, volume?}`.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(keys::ACTION, Value::from(self.action.as_str()));
        payload.insert(keys::SYMBOL, Value::from(self.symbol.as_str()));
        payload.insert(keys::PRICE, Value::from(self.price));
        if let Some(volume) = self.volume {
            payload.insert(keys::VOLUME, Value::from(volume));
        }
        payload
    }

    /// Parse the wire form back. `None` if any mandatory field is
    /// missing or malformed.
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        let action = match payload.str_field(keys::ACTION)? {
            "buy" => SignalAction::Buy,
            "sell" => SignalAction::Sell,
            _ => return None,
        };
        Some(Self {
            action,
            symbol: payload.str_field(keys::SYMBOL)?.to_string(),
            price: payload.f64_field(keys::PRICE)?,
            volume: payload.u64_field(keys::VOLUME),
        })
    }
}

/// A windowed indicator strategy.
///
/// Implementations keep their own sliding-window state and decide, per
/// tick, whether to emit a signal. The contract is edge-triggered by
/// convention: emit on state transitions, not on every tick where the
/// condition holds.
pub trait Strategy: Send {
    /// Strategy instance name, used as the signal source label.
    fn name(&self) -> &str;

    /// Feed one price sample; optionally emit a signal.
    fn on_tick(&mut self, tick: &Tick) -> Option<Signal>;
}

/// Adapter that mounts a [`Strategy`] on the event engine.
///
/// Implements [`EventHandler`] for market data events: extracts the
/// tick, drives the strategy, and enqueues any emitted signal as a
/// `StrategySignal` event tagged with the strategy's name. The enqueue
/// goes through the engine's sender, so a signal produced while handling
/// a market event is processed on a later loop iteration, never
/// recursively.
pub struct StrategyRunner {
    name: String,
    strategy: Mutex<Box<dyn Strategy>>,
    sender: EventSender,
}

impl StrategyRunner {
    pub fn new(strategy: Box<dyn Strategy>, sender: EventSender) -> Self {
        Self {
            name: strategy.name().to_string(),
            strategy: Mutex::new(strategy),
            sender,
        }
    }
}

impl EventHandler for StrategyRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        let Some(tick) = Tick::from_event(event) else {
            return Ok(());
        };

        // Uncontended: all dispatch happens on the engine's one thread.
        let signal = self.strategy.lock().on_tick(&tick);

        if let Some(signal) = signal {
            info!(
                strategy = %self.name,
                action = %signal.action,
                symbol = %signal.symbol,
                price = signal.price,
                "signal emitted"
            );
            self.sender.put(Event::with_source(
                EventType::StrategySignal,
                signal.to_payload(),
                self.name.clone(),
            ));
        }
        Ok(())
    }
}

/// Builder signature: instance name + raw parameters in, strategy out.
pub type StrategyBuilder = fn(&str, &Value) -> Result<Box<dyn Strategy>, ConfigError>;

/// Compile-time registry from strategy kind to factory.
///
/// Replaces runtime class lookup: binaries install the builders they
/// ship (see `muninn_strategies::register_builtins`) and configuration
/// refers to strategies by kind string.
#[derive(Default)]
pub struct StrategyRegistry {
    builders: HashMap<String, StrategyBuilder>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a builder for `kind`, replacing any previous one.
    pub fn insert(&mut self, kind: impl Into<String>, builder: StrategyBuilder) {
        self.builders.insert(kind.into(), builder);
    }

    /// Build a strategy instance by kind.
    pub fn build(
        &self,
        kind: &str,
        name: &str,
        params: &Value,
    ) -> Result<Box<dyn Strategy>, ConfigError> {
        let builder = self
            .builders
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownStrategy(kind.to_string()))?;
        builder(name, params)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_requires_market_event_with_price() {
        let ok = Event::new(
            EventType::MarketSnapshot,
            Payload::snapshot("600519", 101.0, 10, 20250424, 93_000_000),
        );
        let tick = Tick::from_event(&ok).unwrap();
        assert_eq!(tick.symbol, "600519");
        assert_eq!(tick.price, 101.0);

        // Market event without a price field.
        let mut partial = Payload::new();
        partial.insert(keys::SYMBOL, Value::from("600519"));
        let no_price = Event::new(EventType::MarketSnapshot, partial);
        assert!(Tick::from_event(&no_price).is_none());

        // Right shape, wrong event kind.
        let wrong_kind = Event::new(
            EventType::StrategySignal,
            Payload::snapshot("600519", 101.0, 10, 20250424, 93_000_000),
        );
        assert!(Tick::from_event(&wrong_kind).is_none());
    }

    #[test]
    fn signal_payload_round_trip() {
        let mut signal = Signal::buy("600519", 104.0);
        signal.volume = Some(200);
        let parsed = Signal::from_payload(&signal.to_payload()).unwrap();
        assert_eq!(parsed, signal);
    }

    #[test]
    fn signal_volume_defaults_to_absent() {
        let signal = Signal::sell("600519", 100.0);
        let parsed = Signal::from_payload(&signal.to_payload()).unwrap();
        assert_eq!(parsed.volume, None);
    }

    #[test]
    fn malformed_signal_payload_is_rejected() {
        let mut payload = Payload::new();
        payload.insert(keys::ACTION, Value::from("hold"));
        payload.insert(keys::SYMBOL, Value::from("600519"));
        payload.insert(keys::PRICE, Value::from(100.0));
        assert!(Signal::from_payload(&payload).is_none());
    }

    #[test]
    fn unknown_strategy_kind_errors() {
        let registry = StrategyRegistry::new();
        let err = registry
            .build("no_such_kind", "s1", &Value::Null)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnknownStrategy(_)));
    }
}
