//! Engine configuration.
//!
//! Constructed once (usually deserialized from the runner's TOML file),
//! validated, and passed by reference into the backtest driver. There is no
//! ambient global configuration.

use crate::domain::Symbol;
use crate::execution::CostModel;
use crate::portfolio::{EquitySampling, PositionSizer};
use crate::strategy::BollingerParams;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one instrument must be configured")]
    NoInstruments,

    #[error("instrument '{0}' is configured more than once")]
    DuplicateInstrument(String),

    #[error("instrument identifiers must be non-empty")]
    EmptyInstrument,

    #[error("window size must be > 0")]
    ZeroWindow,

    #[error("std_factor must be a finite value > 0, got {0}")]
    InvalidStdFactor(f64),

    #[error("initial equity must be a finite value > 0, got {0}")]
    InvalidEquity(f64),

    #[error("invalid position sizing: {0}")]
    InvalidSizing(String),

    #[error("invalid cost model: {0}")]
    InvalidCosts(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Instruments to trade; all per-instrument state is created from this list.
    pub instruments: Vec<Symbol>,

    #[serde(default)]
    pub strategy: BollingerParams,

    pub initial_equity: f64,

    #[serde(default)]
    pub sizing: PositionSizer,

    #[serde(default)]
    pub costs: CostModel,

    #[serde(default)]
    pub equity_sampling: EquitySampling,
}

impl EngineConfig {
    pub fn new(instruments: Vec<Symbol>, strategy: BollingerParams, initial_equity: f64) -> Self {
        Self {
            instruments,
            strategy,
            initial_equity,
            sizing: PositionSizer::default(),
            costs: CostModel::default(),
            equity_sampling: EquitySampling::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        let mut seen = HashSet::new();
        for inst in &self.instruments {
            if inst.trim().is_empty() {
                return Err(ConfigError::EmptyInstrument);
            }
            if !seen.insert(inst.as_str()) {
                return Err(ConfigError::DuplicateInstrument(inst.clone()));
            }
        }
        if self.strategy.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        let k = self.strategy.std_factor;
        if !(k.is_finite() && k > 0.0) {
            return Err(ConfigError::InvalidStdFactor(k));
        }
        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(ConfigError::InvalidEquity(self.initial_equity));
        }
        self.sizing.validate().map_err(ConfigError::InvalidSizing)?;
        self.costs.validate().map_err(ConfigError::InvalidCosts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::new(
            vec!["GBPUSD".into(), "EURUSD".into()],
            BollingerParams { window: 50, std_factor: 2.0 },
            100_000.0,
        )
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        let mut c = config();
        c.instruments.push("GBPUSD".into());
        assert_eq!(c.validate(), Err(ConfigError::DuplicateInstrument("GBPUSD".into())));

        let mut c = config();
        c.instruments.clear();
        assert_eq!(c.validate(), Err(ConfigError::NoInstruments));
    }

    #[test]
    fn rejects_bad_strategy_params() {
        let mut c = config();
        c.strategy.window = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroWindow));

        let mut c = config();
        c.strategy.std_factor = -1.0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidStdFactor(_))));
    }

    #[test]
    fn rejects_non_positive_equity() {
        let mut c = config();
        c.initial_equity = 0.0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidEquity(_))));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"instruments":["EURUSD"],"initial_equity":1000.0}"#;
        let c: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.strategy, BollingerParams::default());
        assert_eq!(c.sizing, PositionSizer::default());
        assert_eq!(c.costs, CostModel::None);
        assert_eq!(c.equity_sampling, EquitySampling::OnFill);
    }
}
