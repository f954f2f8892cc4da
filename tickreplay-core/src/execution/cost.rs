//! Transaction cost model.
//!
//! Costs are charged on top of the fill price; the fill itself always prints
//! at the quoted bid/ask.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostModel {
    /// No transaction cost
    #[default]
    None,

    /// Fixed cost per fill
    PerTrade { amount: f64 },

    /// Cost per unit traded
    PerUnit { amount: f64 },

    /// Basis points of notional (1 bp = 0.01%)
    Bps { bps: f64 },
}

impl CostModel {
    pub fn cost(&self, price: f64, quantity: f64) -> f64 {
        match self {
            Self::None => 0.0,
            Self::PerTrade { amount } => *amount,
            Self::PerUnit { amount } => amount * quantity,
            Self::Bps { bps } => price * quantity * bps / 10_000.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let value = match self {
            Self::None => return Ok(()),
            Self::PerTrade { amount } | Self::PerUnit { amount } => *amount,
            Self::Bps { bps } => *bps,
        };
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(format!("transaction cost must be finite and >= 0, got {value}"))
        }
    }
}
