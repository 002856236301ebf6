//! Domain error types for the pipeline.
//!
//! Handler failures travel as `anyhow::Error` through the per-handler
//! boundary in the dispatch loop; the types here cover the two places
//! with a fixed, matchable failure vocabulary: trade acceptance and
//! configuration loading.

use thiserror::Error;

/// A signal the paper account refused to execute.
///
/// Rejection is logged and leaves account state untouched. It is never
/// propagated back to the strategy that emitted the signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("insufficient cash for buy: need {required:.2}, have {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("insufficient position in {symbol} for sell: need {required}, have {available}")]
    InsufficientPosition {
        symbol: String,
        required: u64,
        available: u64,
    },
}

/// Load-time configuration failure.
///
/// Surfaced before the engine starts; once running, the core assumes
/// well-formed inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown strategy kind: {0}")]
    UnknownStrategy(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
