//! Pipeline configuration.
//!
//! JSON file deserialized with serde. Strategy parameters stay opaque
//! here (`serde_json::Value`); each strategy builder deserializes and
//! validates its own parameter shape, so configuration errors surface at
//! load time with the offending strategy named.

use crate::errors::ConfigError;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,
    pub strategies: Vec<StrategyConfig>,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Starting cash balance.
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    /// Fill size used when a signal carries no volume.
    #[serde(default = "default_lot_size")]
    pub lot_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Instance name; becomes the signal source label.
    pub name: String,
    /// Registry key, e.g. "ma_cross".
    pub kind: String,
    /// Opaque parameters, owned by the strategy builder.
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecorderConfig {
    /// Audit CSV output path.
    #[serde(default = "default_recorder_path")]
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Tick file for CSV replay; `None` selects the mock sequence.
    #[serde(default)]
    pub ticks_path: Option<PathBuf>,
    /// Inter-tick delay in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_initial_cash() -> f64 {
    1_000_000.0
}

fn default_lot_size() -> u64 {
    100
}

fn default_recorder_path() -> PathBuf {
    PathBuf::from("logs/trades.csv")
}

fn default_delay_ms() -> u64 {
    100
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            lot_size: default_lot_size(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_path: default_recorder_path(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            ticks_path: None,
            delay_ms: default_delay_ms(),
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.account.initial_cash < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_cash must be non-negative, got {}",
                self.account.initial_cash
            )));
        }
        if self.account.lot_size == 0 {
            return Err(ConfigError::Invalid("lot_size must be positive".into()));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("no strategies configured".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"strategies": [{"name": "demo", "kind": "ma_cross"}]}"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.account.initial_cash, 1_000_000.0);
        assert_eq!(config.account.lot_size, 100);
        assert_eq!(config.replay.delay_ms, 100);
        assert!(config.replay.ticks_path.is_none());
        assert_eq!(config.strategies[0].parameters, Value::Null);
    }

    #[test]
    fn zero_lot_size_is_invalid() {
        let config: Config = serde_json::from_str(
            r#"{
                "account": {"initial_cash": 1000, "lot_size": 0},
                "strategies": [{"name": "demo", "kind": "ma_cross"}]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn empty_strategy_list_is_invalid() {
        let config: Config = serde_json::from_str(r#"{"strategies": []}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
