//! Muninn Core - Event-Driven Paper-Trading Research Pipeline
//!
//! Decouples market-data ingestion from strategy evaluation and trade
//! simulation through an in-process publish/subscribe event engine: a
//! producer emits typed events, independent consumers (strategies, the
//! paper account, the audit recorder) react without coupling to each
//! other.
//!
//! ## Architecture
//! - **Single dispatch thread** per engine: all handler invocations are
//!   serialized, so consumer state is linearized without locks. A slow
//!   handler therefore stalls the whole pipeline (accepted trade-off).
//! - **Thread-safe enqueue** from anywhere, including from inside a
//!   handler (strategies emit signals back into the queue; they are
//!   dispatched on a later loop iteration, never recursively).
//! - **Per-handler failure isolation**: handler errors are caught at the
//!   call site, logged, and never crash or stall dispatch.
//! - **Drop-on-stop**: events still queued when `stop()` lands are
//!   discarded; callers wanting a full drain poll `pending()` first.
//!
//! ## Core Modules
//! - `event`: immutable typed messages and the closed event taxonomy
//! - `engine`: handler registry + single-threaded dispatch engine
//! - `strategy`: `Strategy` trait, signal types, engine adapter, registry
//! - `account`: simulated cash/position ledger with mark-to-market
//! - `record`: append-only audit trail for strategy signals
//! - `replay`: mock/CSV/random-walk market data producer
//! - `config`: JSON configuration loading

pub mod account;
pub mod config;
pub mod engine;
pub mod errors;
pub mod event;
pub mod record;
pub mod replay;
pub mod strategy;

// Test doubles shared between unit and integration tests.
pub mod testing;

pub use account::{AccountSnapshot, PaperAccount, Trade, DEFAULT_LOT_SIZE};
pub use engine::{EngineStats, EventEngine, EventHandler, EventSender, HandlerRegistry};
pub use errors::{ConfigError, TradeError};
pub use event::{Event, EventType, Payload};
pub use record::{CsvSink, SignalRecorder, SignalSink};
pub use strategy::{Signal, SignalAction, Strategy, StrategyRegistry, StrategyRunner, Tick};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::account::PaperAccount;
    pub use crate::engine::{EventEngine, EventHandler, EventSender};
    pub use crate::event::{Event, EventType, Payload};
    pub use crate::record::SignalRecorder;
    pub use crate::strategy::{Signal, SignalAction, Strategy, StrategyRunner, Tick};
    pub use crate::{Error, Result};
}
