//! Tick: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One timestamped bid/ask quote for a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
}

impl Tick {
    pub fn new(instrument: impl Into<String>, timestamp: DateTime<Utc>, bid: f64, ask: f64) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            bid,
            ask,
        }
    }

    /// Sanity check: finite positive prices and a non-crossed quote.
    pub fn validate(&self) -> Result<(), TickError> {
        if !self.bid.is_finite() || !self.ask.is_finite() {
            return Err(TickError::NonFinite {
                instrument: self.instrument.clone(),
                timestamp: self.timestamp,
            });
        }
        if self.bid <= 0.0 || self.ask <= 0.0 {
            return Err(TickError::NonPositive {
                instrument: self.instrument.clone(),
                bid: self.bid,
                ask: self.ask,
            });
        }
        if self.ask < self.bid {
            return Err(TickError::Crossed {
                instrument: self.instrument.clone(),
                bid: self.bid,
                ask: self.ask,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    #[error("non-finite quote for {instrument} at {timestamp}")]
    NonFinite {
        instrument: String,
        timestamp: DateTime<Utc>,
    },

    #[error("non-positive quote for {instrument}: bid={bid} ask={ask}")]
    NonPositive { instrument: String, bid: f64, ask: f64 },

    #[error("crossed quote for {instrument}: bid={bid} > ask={ask}")]
    Crossed { instrument: String, bid: f64, ask: f64 },
}
