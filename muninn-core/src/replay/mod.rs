//! Market data replay producer.
//!
//! Stands in for a live feed: publishes `MarketSnapshot` events through
//! an [`EventSender`] from a fixed mock sequence, a CSV file, or a
//! random walk. Runs on the caller's thread; the engine's queue is the
//! only synchronization boundary it touches.

use crate::engine::EventSender;
use crate::event::{Event, EventType, Payload};
use anyhow::Context;
use rand::Rng;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Where replay ticks come from.
#[derive(Debug, Clone)]
pub enum ReplaySource {
    /// Fixed eight-tick demo sequence (rise then fall).
    Mock,
    /// Headered CSV file: `symbol,last_price,volume,trade_date,update_time`.
    Csv(PathBuf),
    /// Random walk around `start`, stepping ±`step_pct` per tick.
    RandomWalk {
        symbol: String,
        start: f64,
        steps: usize,
        step_pct: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct CsvTick {
    symbol: String,
    last_price: f64,
    #[serde(default)]
    volume: u64,
    #[serde(default)]
    trade_date: u32,
    #[serde(default)]
    update_time: u32,
}

/// Replays a tick source into the event engine.
pub struct DataPlayer {
    sender: EventSender,
    source: ReplaySource,
    delay: Duration,
    stop: Option<Arc<AtomicBool>>,
}

impl DataPlayer {
    pub fn new(sender: EventSender, source: ReplaySource, delay: Duration) -> Self {
        Self {
            sender,
            source,
            delay,
            stop: None,
        }
    }

    /// Cooperative stop: the player checks the flag between ticks.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Publish every tick; returns the number of events published.
    pub fn run(&self) -> anyhow::Result<usize> {
        match &self.source {
            ReplaySource::Mock => {
                info!("replaying mock tick sequence");
                self.play(Self::mock_ticks().into_iter().map(Ok))
            }
            ReplaySource::Csv(path) => {
                info!(path = %path.display(), "replaying CSV ticks");
                let mut reader = csv::Reader::from_path(path)
                    .with_context(|| format!("opening tick file {}", path.display()))?;
                let rows: Vec<_> = reader
                    .deserialize::<CsvTick>()
                    .collect::<Result<_, _>>()
                    .context("parsing tick file")?;
                self.play(rows.into_iter().map(Ok))
            }
            ReplaySource::RandomWalk {
                symbol,
                start,
                steps,
                step_pct,
            } => {
                info!(symbol = %symbol, start = *start, steps = *steps, "replaying random walk");
                let mut rng = rand::thread_rng();
                let mut price = *start;
                let symbol = symbol.clone();
                let ticks: Vec<CsvTick> = (0..*steps)
                    .map(|i| {
                        let drift = rng.gen_range(-*step_pct..=*step_pct);
                        price *= 1.0 + drift;
                        CsvTick {
                            symbol: symbol.clone(),
                            last_price: (price * 100.0).round() / 100.0,
                            volume: 100 * (i as u64 + 1),
                            trade_date: 0,
                            update_time: 0,
                        }
                    })
                    .collect();
                self.play(ticks.into_iter().map(Ok))
            }
        }
    }

    fn play(&self, ticks: impl Iterator<Item = anyhow::Result<CsvTick>>) -> anyhow::Result<usize> {
        let mut published = 0usize;
        for tick in ticks {
            if let Some(stop) = &self.stop {
                if stop.load(Ordering::Acquire) {
                    info!(published, "replay stopped by request");
                    break;
                }
            }
            let tick = tick?;
            self.sender.put(Event::with_source(
                EventType::MarketSnapshot,
                Payload::snapshot(
                    &tick.symbol,
                    tick.last_price,
                    tick.volume,
                    tick.trade_date,
                    tick.update_time,
                ),
                "replay",
            ));
            published += 1;
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }
        Ok(published)
    }

    /// The demo sequence: a climb from 100 to 110, then a pullback.
    fn mock_ticks() -> Vec<CsvTick> {
        let prices = [100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 105.0, 100.0];
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| CsvTick {
                symbol: "600519".to_string(),
                last_price: *price,
                volume: 1_000 + 500 * i as u64,
                trade_date: 20250424,
                update_time: 93_000_000 + 10_000 * i as u32,
            })
            .collect()
    }
}
