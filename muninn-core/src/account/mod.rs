//! Paper-trading account ledger.
//!
//! Consumes strategy signals and market prices; maintains cash, a
//! position book, last observed prices, and append-only trade and
//! valuation history. No external I/O and no emitted events.
//!
//! Invariant: cash and every position are non-negative at all times.
//! A signal that would violate that is rejected outright: logged, no
//! state mutation, nothing clamped. The emitting strategy is not
//! notified; rejection is visible only here.

use crate::engine::EventHandler;
use crate::errors::TradeError;
use crate::event::{keys, Event, EventType};
use crate::strategy::{Signal, SignalAction};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Fallback fill size when a signal carries no volume.
pub const DEFAULT_LOT_SIZE: u64 = 100;

/// One executed (simulated) fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub time: DateTime<Utc>,
    pub action: SignalAction,
    pub symbol: String,
    pub price: f64,
    pub volume: u64,
}

/// Point-in-time account valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub time: DateTime<Utc>,
    pub cash: f64,
    pub positions: HashMap<String, u64>,
    /// `cash + Σ positions[s] * last_prices[s]`; symbols with no
    /// observed price value at 0 (documented approximation).
    pub total_value: f64,
}

#[derive(Debug)]
struct AccountState {
    cash: f64,
    positions: HashMap<String, u64>,
    last_prices: HashMap<String, f64>,
    trades: Vec<Trade>,
    snapshots: Vec<AccountSnapshot>,
}

impl AccountState {
    fn total_value(&self) -> f64 {
        let holdings: f64 = self
            .positions
            .iter()
            .map(|(symbol, qty)| *qty as f64 * self.last_prices.get(symbol).copied().unwrap_or(0.0))
            .sum();
        self.cash + holdings
    }

    fn take_snapshot(&mut self, time: DateTime<Utc>) {
        let snapshot = AccountSnapshot {
            time,
            cash: self.cash,
            positions: self.positions.clone(),
            total_value: self.total_value(),
        };
        self.snapshots.push(snapshot);
    }
}

/// Simulated account consuming `StrategySignal` and market data events.
pub struct PaperAccount {
    name: String,
    lot_size: u64,
    state: Mutex<AccountState>,
}

impl PaperAccount {
    pub fn new(initial_cash: f64) -> Self {
        Self::with_lot_size(initial_cash, DEFAULT_LOT_SIZE)
    }

    pub fn with_lot_size(initial_cash: f64, lot_size: u64) -> Self {
        Self {
            name: "paper_account".to_string(),
            lot_size,
            state: Mutex::new(AccountState {
                cash: initial_cash,
                positions: HashMap::new(),
                last_prices: HashMap::new(),
                trades: Vec::new(),
                snapshots: Vec::new(),
            }),
        }
    }

    /// Apply a signal: validate, mutate, record trade + snapshot.
    ///
    /// `Err` leaves the account exactly as it was.
    pub fn apply_signal(&self, signal: &Signal, time: DateTime<Utc>) -> Result<(), TradeError> {
        let volume = signal.volume.unwrap_or(self.lot_size);
        let mut state = self.state.lock();

        match signal.action {
            SignalAction::Buy => {
                let cost = signal.price * volume as f64;
                if state.cash < cost {
                    return Err(TradeError::InsufficientCash {
                        required: cost,
                        available: state.cash,
                    });
                }
                state.cash -= cost;
                *state.positions.entry(signal.symbol.clone()).or_insert(0) += volume;
            }
            SignalAction::Sell => {
                let held = state.positions.get(&signal.symbol).copied().unwrap_or(0);
                if held < volume {
                    return Err(TradeError::InsufficientPosition {
                        symbol: signal.symbol.clone(),
                        required: volume,
                        available: held,
                    });
                }
                state.cash += signal.price * volume as f64;
                *state
                    .positions
                    .get_mut(&signal.symbol)
                    .expect("position checked above") -= volume;
            }
        }

        // The fill price is also the freshest observation for valuation.
        state.last_prices.insert(signal.symbol.clone(), signal.price);
        state.trades.push(Trade {
            time,
            action: signal.action,
            symbol: signal.symbol.clone(),
            price: signal.price,
            volume,
        });
        state.take_snapshot(time);

        info!(
            account = %self.name,
            action = %signal.action,
            symbol = %signal.symbol,
            price = signal.price,
            volume,
            cash = state.cash,
            "trade accepted"
        );
        Ok(())
    }

    /// Record a price observation; mark-to-market if we hold the symbol.
    pub fn update_price(&self, symbol: &str, price: f64, time: DateTime<Utc>) {
        let mut state = self.state.lock();
        state.last_prices.insert(symbol.to_string(), price);
        let held = state.positions.get(symbol).copied().unwrap_or(0);
        if held > 0 {
            state.take_snapshot(time);
            debug!(
                account = %self.name,
                symbol,
                price,
                total_value = state.snapshots.last().map(|s| s.total_value).unwrap_or(0.0),
                "mark-to-market"
            );
        }
    }

    pub fn cash(&self) -> f64 {
        self.state.lock().cash
    }

    /// Held quantity; absent symbol reads as zero.
    pub fn position(&self, symbol: &str) -> u64 {
        self.state.lock().positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn total_value(&self) -> f64 {
        self.state.lock().total_value()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.state.lock().trades.clone()
    }

    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        self.state.lock().snapshots.clone()
    }
}

impl EventHandler for PaperAccount {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match event.kind() {
            EventType::StrategySignal => {
                let Some(signal) = Signal::from_payload(event.payload()) else {
                    warn!(account = %self.name, "malformed signal payload ignored");
                    return Ok(());
                };
                // A business rejection is not a handler failure: log and
                // move on, keeping the pipeline healthy.
                if let Err(err) = self.apply_signal(&signal, event.timestamp()) {
                    warn!(
                        account = %self.name,
                        source = event.source().unwrap_or("unknown"),
                        "trade rejected: {err}"
                    );
                }
            }
            kind if kind.is_market_data() => {
                if let (Some(symbol), Some(price)) = (
                    event.payload().str_field(keys::SYMBOL),
                    event.payload().f64_field(keys::LAST_PRICE),
                ) {
                    self.update_price(symbol, price, event.timestamp());
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn buy_debits_cash_and_credits_position() {
        let account = PaperAccount::new(100_000.0);
        account.apply_signal(&Signal::buy("X", 104.0), now()).unwrap();

        assert_relative_eq!(account.cash(), 100_000.0 - 104.0 * 100.0);
        assert_eq!(account.position("X"), 100);
        assert_eq!(account.trades().len(), 1);
        assert_eq!(account.snapshots().len(), 1);
    }

    #[test]
    fn sell_credits_cash_and_debits_position() {
        let account = PaperAccount::new(100_000.0);
        account.apply_signal(&Signal::buy("X", 100.0), now()).unwrap();
        account.apply_signal(&Signal::sell("X", 110.0), now()).unwrap();

        assert_relative_eq!(account.cash(), 100_000.0 + 10.0 * 100.0);
        assert_eq!(account.position("X"), 0);
    }

    #[test]
    fn buy_beyond_cash_is_rejected_without_mutation() {
        let account = PaperAccount::new(1_000.0);
        let err = account
            .apply_signal(&Signal::buy("X", 104.0), now())
            .unwrap_err();

        assert!(matches!(err, TradeError::InsufficientCash { .. }));
        assert_relative_eq!(account.cash(), 1_000.0);
        assert_eq!(account.position("X"), 0);
        assert!(account.trades().is_empty());
        assert!(account.snapshots().is_empty());
    }

    #[test]
    fn sell_beyond_position_is_rejected_without_mutation() {
        let account = PaperAccount::new(100_000.0);
        account.apply_signal(&Signal::buy("X", 100.0), now()).unwrap();

        let mut oversized = Signal::sell("X", 100.0);
        oversized.volume = Some(500);
        let err = account.apply_signal(&oversized, now()).unwrap_err();

        assert!(matches!(err, TradeError::InsufficientPosition { .. }));
        assert_eq!(account.position("X"), 100);
        assert_eq!(account.trades().len(), 1);
    }

    #[test]
    fn explicit_volume_overrides_lot_size() {
        let account = PaperAccount::with_lot_size(100_000.0, 100);
        let mut signal = Signal::buy("X", 10.0);
        signal.volume = Some(37);
        account.apply_signal(&signal, now()).unwrap();
        assert_eq!(account.position("X"), 37);
        assert_relative_eq!(account.cash(), 100_000.0 - 370.0);
    }

    #[test]
    fn mark_to_market_snapshots_only_held_symbols() {
        let account = PaperAccount::new(100_000.0);

        // No position: price observation only, no snapshot.
        account.update_price("X", 99.0, now());
        assert!(account.snapshots().is_empty());

        account.apply_signal(&Signal::buy("X", 100.0), now()).unwrap();
        account.update_price("X", 105.0, now());

        let snapshots = account.snapshots();
        assert_eq!(snapshots.len(), 2); // trade snapshot + mark-to-market
        let last = snapshots.last().unwrap();
        assert_relative_eq!(last.total_value, account.cash() + 100.0 * 105.0);
    }

    #[test]
    fn valuation_identity_holds_across_snapshots() {
        let account = PaperAccount::new(100_000.0);
        account.apply_signal(&Signal::buy("X", 100.0), now()).unwrap();
        account.update_price("X", 103.0, now());
        account.apply_signal(&Signal::buy("Y", 50.0), now()).unwrap();
        account.update_price("Y", 48.0, now());
        account.apply_signal(&Signal::sell("X", 101.0), now()).unwrap();

        assert_eq!(account.snapshots().len(), 5);
        assert_relative_eq!(
            account.total_value(),
            account.cash() + account.position("Y") as f64 * 48.0
        );
    }

    #[test]
    fn unpriced_symbol_values_at_zero() {
        let account = PaperAccount::new(100_000.0);
        account.apply_signal(&Signal::buy("X", 100.0), now()).unwrap();
        // The fill recorded a price for X; forge a held symbol with no
        // observation by checking a fresh one instead.
        assert_eq!(account.position("UNSEEN"), 0);
        assert_relative_eq!(account.total_value(), account.cash() + 100.0 * 100.0);
    }
}
