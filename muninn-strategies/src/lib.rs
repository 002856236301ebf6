//! Muninn Strategies - Builtin Windowed Indicator Strategies
//!
//! Concrete implementations of `muninn_core::strategy::Strategy`. Every
//! strategy here is a pure state machine over price ticks: windows in,
//! optional edge-triggered signal out. The engine adapter, signal wire
//! format, and registry live in `muninn-core`; this crate only supplies
//! indicator logic and the builder entry points.
//!
//! ## Available strategies
//! - [`MaCross`]: short/long moving-average crossover (`"ma_cross"`)
//! - [`Momentum`]: full-window percent-change threshold (`"momentum"`)
//!
//! ## Usage
//! ```rust
//! use muninn_core::strategy::StrategyRegistry;
//!
//! let mut registry = StrategyRegistry::new();
//! muninn_strategies::register_builtins(&mut registry);
//! let strategy = registry
//!     .build("ma_cross", "demo", &serde_json::json!({"short_window": 3, "long_window": 5}))
//!     .unwrap();
//! assert_eq!(strategy.name(), "demo");
//! ```

pub mod ma_cross;
pub mod momentum;

pub use ma_cross::{MaCross, MaCrossParams};
pub use momentum::{Momentum, MomentumParams};

use muninn_core::strategy::StrategyRegistry;

/// Install every builtin strategy builder under its kind key.
pub fn register_builtins(registry: &mut StrategyRegistry) {
    registry.insert("ma_cross", MaCross::build);
    registry.insert("momentum", Momentum::build);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_buildable_by_kind() {
        let mut registry = StrategyRegistry::new();
        register_builtins(&mut registry);

        let mut kinds: Vec<&str> = registry.kinds().collect();
        kinds.sort_unstable();
        assert_eq!(kinds, ["ma_cross", "momentum"]);

        let built = registry
            .build(
                "ma_cross",
                "s1",
                &serde_json::json!({"short_window": 3, "long_window": 5}),
            )
            .unwrap();
        assert_eq!(built.name(), "s1");
    }

    #[test]
    fn bad_parameters_surface_as_config_errors() {
        let mut registry = StrategyRegistry::new();
        register_builtins(&mut registry);
        assert!(registry
            .build(
                "ma_cross",
                "s1",
                &serde_json::json!({"short_window": 9, "long_window": 5}),
            )
            .is_err());
    }
}
