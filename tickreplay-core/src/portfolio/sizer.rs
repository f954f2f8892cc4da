//! Position sizing: translate an entry signal into a quantity.
//!
//! Sizers are equity-aware but signal-agnostic: they only see the account
//! equity and the price the entry would trade at.

use serde::{Deserialize, Serialize};

/// Position sizing policy
///
/// Two modes:
/// 1. **Fixed units**: always trade N units (e.g. 10,000 units per trade)
/// 2. **Equity fraction**: trade `fraction * equity` worth at the entry price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSizer {
    /// Fixed number of units per trade
    FixedUnits { units: f64 },

    /// Fraction of current equity per trade
    EquityFraction { fraction: f64 },
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::FixedUnits { units: 10_000.0 }
    }
}

impl PositionSizer {
    /// Quantity to trade. Returns 0.0 for non-positive equity or price.
    pub fn size(&self, equity: f64, price: f64) -> f64 {
        // Insufficient equity check
        if equity <= 0.0 {
            return 0.0;
        }

        match self {
            Self::FixedUnits { units } => *units,
            Self::EquityFraction { fraction } => {
                if price <= 0.0 {
                    return 0.0;
                }
                fraction * equity / price
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::FixedUnits { units } if !(*units > 0.0 && units.is_finite()) => {
                Err(format!("units must be > 0, got {units}"))
            }
            Self::EquityFraction { fraction } if !(*fraction > 0.0 && *fraction <= 1.0) => {
                Err(format!("fraction must be in (0, 1], got {fraction}"))
            }
            _ => Ok(()),
        }
    }

    /// Sizer name for manifest/logging
    pub fn name(&self) -> &str {
        match self {
            Self::FixedUnits { .. } => "FixedUnits",
            Self::EquityFraction { .. } => "EquityFraction",
        }
    }
}
