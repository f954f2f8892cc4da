use crate::domain::ids::{FillId, OrderId};
use crate::domain::order::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fill record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: FillId,
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
    pub instrument: String,
    pub direction: Direction,
    pub price: f64,
    pub quantity: f64,
    pub cost: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Cash impact of the fill including transaction cost.
    pub fn cash_delta(&self) -> f64 {
        -self.direction.sign() * self.notional() - self.cost
    }
}
