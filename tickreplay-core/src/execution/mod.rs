//! Execution simulator: turns orders into fills.
//!
//! Market orders fill immediately and completely at the prevailing quote
//! (ask for buys, bid for sells), stamped with the order's own timestamp.
//! This models an idealized zero-latency market; there is no partial fill
//! or rejection modeling.

pub mod cost;

pub use cost::CostModel;

use crate::data::QuoteBook;
use crate::domain::{Fill, FillId, Order, OrderKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("no quote for '{instrument}' when executing order {order}")]
    NoQuote { instrument: String, order: String },

    #[error("order {order} has invalid quantity {quantity}")]
    InvalidQuantity { order: String, quantity: f64 },
}

/// Order execution.
pub trait ExecutionHandler: Send {
    fn on_order(&mut self, order: &Order, quotes: &QuoteBook) -> Result<Fill, ExecutionError>;

    fn name(&self) -> &str;
}

/// Fills market orders at the quoted price.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecution {
    costs: CostModel,
    next_fill_id: u64,
}

impl SimulatedExecution {
    pub fn new(costs: CostModel) -> Self {
        Self {
            costs,
            next_fill_id: 1,
        }
    }

    pub fn costs(&self) -> CostModel {
        self.costs
    }
}

impl ExecutionHandler for SimulatedExecution {
    fn on_order(&mut self, order: &Order, quotes: &QuoteBook) -> Result<Fill, ExecutionError> {
        if !(order.quantity.is_finite() && order.quantity > 0.0) {
            return Err(ExecutionError::InvalidQuantity {
                order: order.id.to_string(),
                quantity: order.quantity,
            });
        }
        let quote = quotes
            .get(&order.instrument)
            .ok_or_else(|| ExecutionError::NoQuote {
                instrument: order.instrument.clone(),
                order: order.id.to_string(),
            })?;

        let price = match order.kind {
            OrderKind::Market => quote.price_for(order.direction),
        };

        let id = FillId(self.next_fill_id.max(1));
        self.next_fill_id = id.0 + 1;

        Ok(Fill {
            id,
            order_id: order.id,
            timestamp: order.timestamp,
            instrument: order.instrument.clone(),
            direction: order.direction,
            price,
            quantity: order.quantity,
            cost: self.costs.cost(price, order.quantity),
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, OrderId, Tick};
    use chrono::{TimeZone, Utc};

    fn order(direction: Direction, instrument: &str) -> Order {
        Order {
            id: OrderId(1),
            instrument: instrument.into(),
            kind: OrderKind::Market,
            direction,
            quantity: 10_000.0,
            timestamp: Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 5).unwrap(),
        }
    }

    fn quotes() -> QuoteBook {
        let mut book = QuoteBook::new();
        book.update(&Tick::new(
            "EURUSD",
            Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 5).unwrap(),
            1.3000,
            1.3002,
        ));
        book
    }

    #[test]
    fn buys_fill_at_ask_sells_at_bid() {
        let mut exec = SimulatedExecution::default();
        let buy = exec.on_order(&order(Direction::Buy, "EURUSD"), &quotes()).unwrap();
        let sell = exec.on_order(&order(Direction::Sell, "EURUSD"), &quotes()).unwrap();
        assert_eq!(buy.price, 1.3002);
        assert_eq!(sell.price, 1.3000);
        assert_eq!(buy.id, FillId(1));
        assert_eq!(sell.id, FillId(2));
    }

    #[test]
    fn fill_carries_order_timestamp_and_quantity() {
        let mut exec = SimulatedExecution::new(CostModel::PerTrade { amount: 3.0 });
        let o = order(Direction::Buy, "EURUSD");
        let fill = exec.on_order(&o, &quotes()).unwrap();
        assert_eq!(fill.timestamp, o.timestamp);
        assert_eq!(fill.quantity, o.quantity);
        assert_eq!(fill.order_id, o.id);
        assert_eq!(fill.cost, 3.0);
    }

    #[test]
    fn missing_quote_is_an_error() {
        let mut exec = SimulatedExecution::default();
        let err = exec.on_order(&order(Direction::Buy, "GBPUSD"), &quotes()).unwrap_err();
        assert!(matches!(err, ExecutionError::NoQuote { .. }));
    }
}
