//! Equity curve: append-only, timestamp-monotonic account value series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sample of total account value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EquityError {
    #[error("equity sample at {got} precedes last sample at {last}")]
    NonMonotonic {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    #[error("equity curve is sealed")]
    Sealed,
}

/// Ordered `(timestamp, equity)` samples.
///
/// Created empty at startup, appended to as fills are processed, sealed at
/// run end. A sealed curve rejects further samples.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
    sealed: bool,
}

impl EquityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: EquityPoint) -> Result<(), EquityError> {
        if self.sealed {
            return Err(EquityError::Sealed);
        }
        if let Some(last) = self.points.last() {
            if point.timestamp < last.timestamp {
                return Err(EquityError::NonMonotonic {
                    last: last.timestamp,
                    got: point.timestamp,
                });
            }
        }
        self.points.push(point);
        Ok(())
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
