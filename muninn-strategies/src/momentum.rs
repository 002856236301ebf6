//! Window momentum strategy.
//!
//! Same `on_tick` contract as the crossover strategy, different
//! indicator: percent change across one full price window. Buy when the
//! change exceeds `threshold_pct` while flat, Sell when it drops below
//! `-threshold_pct` while long. Edge-triggered through the position flag
//! like every strategy in this crate.

use muninn_core::errors::ConfigError;
use muninn_core::strategy::{Signal, Strategy, Tick};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub window: usize,
    /// Trigger threshold as a fraction, e.g. 0.02 for 2%.
    pub threshold_pct: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            window: 10,
            threshold_pct: 0.02,
        }
    }
}

impl MomentumParams {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::Invalid(
                "momentum window must hold at least 2 samples".into(),
            ));
        }
        if self.threshold_pct <= 0.0 {
            return Err(ConfigError::Invalid(
                "threshold_pct must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub struct Momentum {
    name: String,
    window: usize,
    threshold_pct: f64,
    prices: VecDeque<f64>,
    in_position: bool,
}

impl Momentum {
    pub fn new(name: impl Into<String>, params: MomentumParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            window: params.window,
            threshold_pct: params.threshold_pct,
            prices: VecDeque::with_capacity(params.window),
            in_position: false,
        })
    }

    pub fn build(name: &str, params: &Value) -> Result<Box<dyn Strategy>, ConfigError> {
        let params: MomentumParams = if params.is_null() {
            MomentumParams::default()
        } else {
            serde_json::from_value(params.clone())
                .map_err(|e| ConfigError::Invalid(format!("momentum parameters: {e}")))?
        };
        Ok(Box::new(Self::new(name, params)?))
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_tick(&mut self, tick: &Tick) -> Option<Signal> {
        if self.prices.len() == self.window {
            self.prices.pop_front();
        }
        self.prices.push_back(tick.price);

        if self.prices.len() < self.window {
            return None;
        }

        let oldest = *self.prices.front().expect("window is full");
        if oldest == 0.0 {
            return None;
        }
        let change = (tick.price - oldest) / oldest;

        if change > self.threshold_pct && !self.in_position {
            self.in_position = true;
            Some(Signal::buy(tick.symbol.clone(), tick.price))
        } else if change < -self.threshold_pct && self.in_position {
            self.in_position = false;
            Some(Signal::sell(tick.symbol.clone(), tick.price))
        } else {
            None
        }
    }
}
