//! Continuous paper trading against a synthetic feed.
//!
//! Same pipeline as the replay binary, fed by a random walk instead of a
//! file. Runs until the walk is exhausted or Ctrl+C requests a
//! cooperative stop.

use anyhow::Result;
use clap::Parser;
use muninn_bins::common::{drain, init_logging, print_account_report, wire_pipeline, CommonArgs};
use muninn_core::config::Config;
use muninn_core::engine::EventEngine;
use muninn_core::replay::{DataPlayer, ReplaySource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct PaperArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Symbol for the synthetic feed
    #[arg(long, default_value = "600519")]
    symbol: String,

    /// Starting price of the random walk
    #[arg(long, default_value = "100.0")]
    start_price: f64,

    /// Number of ticks to generate
    #[arg(long, default_value = "1000")]
    steps: usize,

    /// Maximum per-tick move as a fraction (0.01 = 1%)
    #[arg(long, default_value = "0.01")]
    step_pct: f64,
}

fn main() -> Result<()> {
    let args = PaperArgs::parse();
    init_logging(&args.common.log_level)?;

    info!("=== Muninn: synthetic paper trading ===");
    warn!("PAPER TRADING ONLY - no real orders are placed");

    let config = Config::load(&args.common.config)?;
    let mut engine = EventEngine::new("paper");
    let (account, recorder) = wire_pipeline(&engine, &config)?;
    engine.start();

    let stop = Arc::new(AtomicBool::new(false));
    let stop_ctrlc = stop.clone();
    ctrlc::set_handler(move || {
        warn!("Ctrl+C received, stopping feed");
        stop_ctrlc.store(true, Ordering::Release);
    })?;

    let player = DataPlayer::new(
        engine.sender(),
        ReplaySource::RandomWalk {
            symbol: args.symbol.clone(),
            start: args.start_price,
            steps: args.steps,
            step_pct: args.step_pct,
        },
        Duration::from_millis(config.replay.delay_ms),
    )
    .with_stop_flag(stop.clone());

    let published = player.run()?;
    info!(published, interrupted = stop.load(Ordering::Acquire), "feed finished");

    drain(&engine, Duration::from_secs(30));
    engine.stop();

    print_account_report(&account, &recorder);
    Ok(())
}
