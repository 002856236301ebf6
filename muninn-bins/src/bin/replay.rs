//! Tick replay through the full pipeline.
//!
//! Loads the pipeline config, replays the configured tick file (or the
//! builtin mock sequence) into the event engine, drains, and reports the
//! resulting account state. Paper trading only: no orders leave the
//! process.

use anyhow::Result;
use clap::Parser;
use muninn_bins::common::{drain, init_logging, print_account_report, wire_pipeline, CommonArgs};
use muninn_core::config::Config;
use muninn_core::engine::EventEngine;
use muninn_core::replay::{DataPlayer, ReplaySource};
use std::time::Duration;
use tracing::info;

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    init_logging(&args.log_level)?;

    info!("=== Muninn: tick replay (paper trading) ===");

    let config = Config::load(&args.config)?;
    info!(config = %args.config.display(), strategies = config.strategies.len(), "config loaded");

    let mut engine = EventEngine::new("replay");
    let (account, recorder) = wire_pipeline(&engine, &config)?;
    engine.start();

    let source = match &config.replay.ticks_path {
        Some(path) => ReplaySource::Csv(path.clone()),
        None => ReplaySource::Mock,
    };
    let player = DataPlayer::new(
        engine.sender(),
        source,
        Duration::from_millis(config.replay.delay_ms),
    );
    let published = player.run()?;
    info!(published, "replay finished");

    // Replay wants every tick accounted for, so drain before stopping;
    // stop() itself would drop whatever is still queued.
    drain(&engine, Duration::from_secs(30));
    engine.stop();

    print_account_report(&account, &recorder);
    Ok(())
}
