use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed event taxonomy for the dispatch pipeline.
///
/// Every event flowing through the engine carries exactly one of these
/// kinds. The wildcard subscription is not a variant: it is a separate
/// registry lane (see [`crate::engine::HandlerRegistry`]), so the type
/// space stays closed and exhaustively matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Market data
    MarketSnapshot,
    MarketTick,
    OrderBook,

    // Strategy control
    StrategyDeploy,
    StrategyStart,
    StrategyStop,
    StrategySignal,

    // Trading
    OrderSubmit,
    OrderCancel,
    OrderFilled,

    // System
    BacktestStart,
    BacktestEnd,
    Heartbeat,
    LogEvent,
    Exception,
    RiskAlert,
}

impl EventType {
    /// Stable string key, used in logs and serialized payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventType::MarketSnapshot => "MARKET_SNAPSHOT",
            EventType::MarketTick => "MARKET_TICK",
            EventType::OrderBook => "ORDER_BOOK",
            EventType::StrategyDeploy => "STRATEGY_DEPLOY",
            EventType::StrategyStart => "STRATEGY_START",
            EventType::StrategyStop => "STRATEGY_STOP",
            EventType::StrategySignal => "STRATEGY_SIGNAL",
            EventType::OrderSubmit => "ORDER_SUBMIT",
            EventType::OrderCancel => "ORDER_CANCEL",
            EventType::OrderFilled => "ORDER_FILLED",
            EventType::BacktestStart => "BACKTEST_START",
            EventType::BacktestEnd => "BACKTEST_END",
            EventType::Heartbeat => "HEARTBEAT",
            EventType::LogEvent => "LOG_EVENT",
            EventType::Exception => "EXCEPTION",
            EventType::RiskAlert => "RISK_ALERT",
        }
    }

    /// True for the event kinds that carry a market price sample.
    pub const fn is_market_data(self) -> bool {
        matches!(
            self,
            EventType::MarketSnapshot | EventType::MarketTick | EventType::OrderBook
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
