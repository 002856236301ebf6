//! Moving-average crossover strategy.
//!
//! Maintains a short and a long fixed-capacity price window per
//! configured size (oldest sample evicted on overflow). No signal is
//! possible until the long window is full (warm-up). After warm-up the
//! crossover is edge-triggered through the position flag: Buy only when
//! the short average moves strictly above the long average while flat,
//! Sell only on the strict reverse while long. Ties trigger nothing.

use muninn_core::errors::ConfigError;
use muninn_core::strategy::{Signal, Strategy, Tick};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaCrossParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MaCrossParams {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
        }
    }
}

impl MaCrossParams {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.short_window == 0 {
            return Err(ConfigError::Invalid("short_window must be positive".into()));
        }
        if self.short_window >= self.long_window {
            return Err(ConfigError::Invalid(format!(
                "short_window ({}) must be smaller than long_window ({})",
                self.short_window, self.long_window
            )));
        }
        Ok(())
    }
}

pub struct MaCross {
    name: String,
    short_window: usize,
    long_window: usize,
    short_prices: VecDeque<f64>,
    long_prices: VecDeque<f64>,
    in_position: bool,
}

impl MaCross {
    pub fn new(name: impl Into<String>, params: MaCrossParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            short_window: params.short_window,
            long_window: params.long_window,
            short_prices: VecDeque::with_capacity(params.short_window),
            long_prices: VecDeque::with_capacity(params.long_window),
            in_position: false,
        })
    }

    /// Registry builder: deserialize raw parameters, validate, box.
    pub fn build(name: &str, params: &Value) -> Result<Box<dyn Strategy>, ConfigError> {
        let params: MaCrossParams = if params.is_null() {
            MaCrossParams::default()
        } else {
            serde_json::from_value(params.clone())
                .map_err(|e| ConfigError::Invalid(format!("ma_cross parameters: {e}")))?
        };
        Ok(Box::new(Self::new(name, params)?))
    }

    pub fn in_position(&self) -> bool {
        self.in_position
    }

    fn push(window: &mut VecDeque<f64>, capacity: usize, price: f64) {
        if window.len() == capacity {
            window.pop_front();
        }
        window.push_back(price);
    }

    fn mean(window: &VecDeque<f64>) -> f64 {
        window.iter().sum::<f64>() / window.len() as f64
    }
}

impl Strategy for MaCross {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_tick(&mut self, tick: &Tick) -> Option<Signal> {
        Self::push(&mut self.short_prices, self.short_window, tick.price);
        Self::push(&mut self.long_prices, self.long_window, tick.price);

        // Warm-up: the short window fills first (short < long enforced
        // at construction), so only the long window gates.
        if self.long_prices.len() < self.long_window {
            return None;
        }

        let short_avg = Self::mean(&self.short_prices);
        let long_avg = Self::mean(&self.long_prices);

        debug!(
            strategy = %self.name,
            price = tick.price,
            short_avg,
            long_avg,
            in_position = self.in_position,
            "tick evaluated"
        );

        if short_avg > long_avg && !self.in_position {
            self.in_position = true;
            Some(Signal::buy(tick.symbol.clone(), tick.price))
        } else if short_avg < long_avg && self.in_position {
            self.in_position = false;
            Some(Signal::sell(tick.symbol.clone(), tick.price))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muninn_core::strategy::SignalAction;

    fn strategy(short: usize, long: usize) -> MaCross {
        MaCross::new(
            "ma_test",
            MaCrossParams {
                short_window: short,
                long_window: long,
            },
        )
        .unwrap()
    }

    fn feed(s: &mut MaCross, prices: &[f64]) -> Vec<(usize, Signal)> {
        prices
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                s.on_tick(&Tick {
                    symbol: "X".to_string(),
                    price: *p,
                })
                .map(|sig| (i, sig))
            })
            .collect()
    }

    #[test]
    fn warm_up_suppresses_all_signals() {
        let mut s = strategy(3, 5);
        // Four samples: long window still short one, whatever the shape.
        let signals = feed(&mut s, &[100.0, 200.0, 50.0, 300.0]);
        assert!(signals.is_empty());
    }

    #[test]
    fn strictly_rising_prices_emit_exactly_one_buy() {
        let mut s = strategy(3, 5);
        let prices: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let signals = feed(&mut s, &prices);

        assert_eq!(signals.len(), 1);
        let (index, signal) = &signals[0];
        // First possible tick: the long window fills at index 4.
        assert_eq!(*index, 4);
        assert_eq!(signal.action, SignalAction::Buy);
        assert!(s.in_position());
    }

    #[test]
    fn reference_sequence_buys_then_sells() {
        let mut s = strategy(3, 5);
        let prices = [100.0, 101.0, 102.0, 103.0, 104.0, 102.0, 100.0, 98.0, 96.0];
        let signals = feed(&mut s, &prices);

        assert_eq!(signals.len(), 2);

        let (buy_index, buy) = &signals[0];
        assert_eq!(*buy_index, 4);
        assert_eq!(buy.action, SignalAction::Buy);
        assert_eq!(buy.price, 104.0);

        let (sell_index, sell) = &signals[1];
        assert_eq!(*sell_index, 6);
        assert_eq!(sell.action, SignalAction::Sell);
        assert_eq!(sell.price, 100.0);
        assert!(!s.in_position());
    }

    #[test]
    fn equal_averages_trigger_nothing() {
        let mut s = strategy(2, 4);
        // Constant prices: short_avg == long_avg forever.
        let signals = feed(&mut s, &[100.0; 10]);
        assert!(signals.is_empty());
        assert!(!s.in_position());
    }

    #[test]
    fn no_sell_without_prior_buy() {
        let mut s = strategy(3, 5);
        let prices: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let signals = feed(&mut s, &prices);
        assert!(signals.is_empty());
    }

    #[test]
    fn invalid_window_sizes_rejected_at_build() {
        assert!(MaCross::new(
            "bad",
            MaCrossParams {
                short_window: 5,
                long_window: 5
            }
        )
        .is_err());
        assert!(MaCross::new(
            "bad",
            MaCrossParams {
                short_window: 0,
                long_window: 5
            }
        )
        .is_err());
    }

    #[test]
    fn builder_accepts_null_params_as_defaults() {
        let built = MaCross::build("defaults", &Value::Null).unwrap();
        assert_eq!(built.name(), "defaults");
    }

    proptest::proptest! {
        /// No price pattern can produce a signal before the long window
        /// is full.
        #[test]
        fn warm_up_never_signals(
            prices in proptest::collection::vec(1.0f64..1000.0, 1..20)
        ) {
            let mut s = strategy(3, 20);
            for price in &prices {
                let out = s.on_tick(&Tick {
                    symbol: "X".to_string(),
                    price: *price,
                });
                proptest::prop_assert!(out.is_none());
            }
        }
    }
}
