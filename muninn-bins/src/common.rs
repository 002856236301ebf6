//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and pipeline wiring.

use anyhow::Result;
use clap::Parser;
use muninn_core::account::PaperAccount;
use muninn_core::config::Config;
use muninn_core::engine::{EventEngine, LogEventHandler};
use muninn_core::event::EventType;
use muninn_core::record::SignalRecorder;
use muninn_core::strategy::{StrategyRegistry, StrategyRunner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Common CLI arguments for all binaries
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Pipeline configuration file (JSON)
    #[arg(short = 'f', long, default_value = "config/settings.json")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Initialize tracing/logging
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

/// Assemble the standard consumer set on an engine: log handler,
/// configured strategies, paper account, signal recorder.
///
/// Returns the account and recorder so callers can report on them after
/// the run.
pub fn wire_pipeline(
    engine: &EventEngine,
    config: &Config,
) -> Result<(Arc<PaperAccount>, Arc<SignalRecorder>)> {
    LogEventHandler::install(engine);

    let mut registry = StrategyRegistry::new();
    muninn_strategies::register_builtins(&mut registry);

    for strategy_config in &config.strategies {
        let strategy = registry.build(
            &strategy_config.kind,
            &strategy_config.name,
            &strategy_config.parameters,
        )?;
        info!(
            name = %strategy_config.name,
            kind = %strategy_config.kind,
            "strategy loaded"
        );
        let runner = Arc::new(StrategyRunner::new(strategy, engine.sender()));
        engine.register(EventType::MarketSnapshot, runner.clone());
        engine.register(EventType::MarketTick, runner);
    }

    let account = Arc::new(PaperAccount::with_lot_size(
        config.account.initial_cash,
        config.account.lot_size,
    ));
    engine.register(EventType::StrategySignal, account.clone());
    engine.register(EventType::MarketSnapshot, account.clone());
    engine.register(EventType::MarketTick, account.clone());

    let recorder = Arc::new(SignalRecorder::to_csv(&config.recorder.output_path)?);
    engine.register(EventType::StrategySignal, recorder.clone());
    info!(path = %config.recorder.output_path.display(), "audit trail open");

    Ok((account, recorder))
}

/// Wait until the queue is empty, then give the in-flight event one poll
/// interval to finish. Used before `stop()` when a full drain is wanted.
pub fn drain(engine: &EventEngine, timeout: Duration) {
    let deadline = std::time::Instant::now() + timeout;
    while engine.pending() > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    std::thread::sleep(Duration::from_millis(250));
}

/// Log the run outcome: executed trades and final valuation.
pub fn print_account_report(account: &PaperAccount, recorder: &SignalRecorder) {
    info!("=== Trades ===");
    for trade in account.trades() {
        info!(
            "  {} | {:<4} | {} | {:>10.2} x {}",
            trade.time.format("%Y-%m-%d %H:%M:%S"),
            trade.action.to_string(),
            trade.symbol,
            trade.price,
            trade.volume
        );
    }

    info!("=== Account ===");
    info!(
        cash = account.cash(),
        total_value = account.total_value(),
        trades = account.trades().len(),
        snapshots = account.snapshots().len(),
        signals_recorded = recorder.rows().len(),
        "final state"
    );
}
