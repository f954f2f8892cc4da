use super::order::{Direction, OrderKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directional trading intent produced by a strategy, not yet sized or routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub instrument: String,
    pub kind: OrderKind,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    pub fn market(instrument: impl Into<String>, direction: Direction, timestamp: DateTime<Utc>) -> Self {
        Self {
            instrument: instrument.into(),
            kind: OrderKind::Market,
            direction,
            timestamp,
        }
    }
}
