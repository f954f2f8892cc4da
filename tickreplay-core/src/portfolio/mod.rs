//! Portfolio: authoritative position, cash and equity state.
//!
//! Consumes signals (sizing them into orders, or suppressing them) and fills
//! (updating cash, positions and the equity curve). The strategy's invested
//! flag is advisory; the position held here decides what capital does.

pub mod accounting;
pub mod sizer;

pub use accounting::Accounting;
pub use sizer::PositionSizer;

use crate::data::QuoteBook;
use crate::domain::{
    Direction, EquityCurve, EquityError, EquityPoint, Fill, Order, OrderId, Position, Signal,
    Symbol,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("no position state for instrument '{0}' (instruments must be declared upfront)")]
    UnknownInstrument(String),

    #[error("no quote available for '{0}'")]
    NoQuote(String),

    #[error("fill for order {got} but order in flight is {expected:?}")]
    UnexpectedFill {
        expected: Option<OrderId>,
        got: OrderId,
    },

    #[error(transparent)]
    Equity(#[from] EquityError),
}

/// When the portfolio appends equity samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquitySampling {
    /// One sample per processed fill.
    #[default]
    OnFill,
    /// One sample per fill plus one mark-to-market sample per tick.
    EveryTick,
}

/// Why a signal produced no order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuppressionReason {
    /// BUY while already long.
    AlreadyLong,
    /// SELL with nothing to sell.
    NoPosition,
    /// An order for the instrument has not been filled yet.
    OrderInFlight,
    /// Sizer returned a non-positive quantity.
    ZeroQuantity,
}

/// Outcome of handing a signal to the portfolio: zero or one order.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalDecision {
    Order(Order),
    Suppressed(SuppressionReason),
}

impl SignalDecision {
    pub fn into_order(self) -> Option<Order> {
        match self {
            SignalDecision::Order(order) => Some(order),
            SignalDecision::Suppressed(_) => None,
        }
    }
}

/// Authoritative per-instrument state.
#[derive(Debug, Clone)]
pub struct PositionState {
    pub position: Position,
    /// Order submitted but not yet filled.
    pub in_flight: Option<(OrderId, Direction)>,
}

impl PositionState {
    fn new(instrument: &str) -> Self {
        Self {
            position: Position::flat(instrument),
            in_flight: None,
        }
    }

    pub fn invested(&self) -> bool {
        self.position.is_long()
    }
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    positions: HashMap<Symbol, PositionState>,
    accounting: Accounting,
    sizer: PositionSizer,
    sampling: EquitySampling,
    curve: EquityCurve,
    next_order_id: u64,
    fills_processed: usize,
}

impl Portfolio {
    pub fn new(
        instruments: &[Symbol],
        initial_equity: f64,
        sizer: PositionSizer,
        sampling: EquitySampling,
    ) -> Self {
        let positions = instruments
            .iter()
            .map(|s| (s.clone(), PositionState::new(s)))
            .collect();
        Self {
            positions,
            accounting: Accounting::new(initial_equity),
            sizer,
            sampling,
            curve: EquityCurve::new(),
            next_order_id: 1,
            fills_processed: 0,
        }
    }

    /// Size a signal into an order, or suppress it.
    pub fn on_signal(
        &mut self,
        signal: &Signal,
        quotes: &QuoteBook,
    ) -> Result<SignalDecision, PortfolioError> {
        let equity = self.equity(quotes);
        let state = self
            .positions
            .get(&signal.instrument)
            .ok_or_else(|| PortfolioError::UnknownInstrument(signal.instrument.clone()))?;

        if state.in_flight.is_some() {
            return Ok(SignalDecision::Suppressed(SuppressionReason::OrderInFlight));
        }

        let quantity = match signal.direction {
            Direction::Buy => {
                if state.invested() {
                    return Ok(SignalDecision::Suppressed(SuppressionReason::AlreadyLong));
                }
                let price = quotes
                    .ask(&signal.instrument)
                    .ok_or_else(|| PortfolioError::NoQuote(signal.instrument.clone()))?;
                self.sizer.size(equity, price)
            }
            Direction::Sell => {
                if !state.invested() {
                    return Ok(SignalDecision::Suppressed(SuppressionReason::NoPosition));
                }
                // Exit closes the whole long position
                state.position.quantity
            }
        };

        if quantity.is_nan() || quantity <= 0.0 {
            return Ok(SignalDecision::Suppressed(SuppressionReason::ZeroQuantity));
        }

        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        if let Some(state) = self.positions.get_mut(&signal.instrument) {
            state.in_flight = Some((id, signal.direction));
        }

        Ok(SignalDecision::Order(Order {
            id,
            instrument: signal.instrument.clone(),
            kind: signal.kind,
            direction: signal.direction,
            quantity,
            timestamp: signal.timestamp,
        }))
    }

    /// Book a fill and append an equity sample.
    ///
    /// The filled instrument is marked at the fill price; every other open
    /// position at its last known bid.
    pub fn on_fill(&mut self, fill: &Fill, quotes: &QuoteBook) -> Result<EquityPoint, PortfolioError> {
        let state = self
            .positions
            .get_mut(&fill.instrument)
            .ok_or_else(|| PortfolioError::UnknownInstrument(fill.instrument.clone()))?;

        match state.in_flight {
            Some((id, _)) if id == fill.order_id => state.in_flight = None,
            other => {
                return Err(PortfolioError::UnexpectedFill {
                    expected: other.map(|(id, _)| id),
                    got: fill.order_id,
                })
            }
        }

        let realized = state.position.apply(fill.direction, fill.quantity, fill.price);
        self.accounting.apply_fill(fill, realized);
        self.fills_processed += 1;

        let equity = self.accounting.compute_equity(
            self.positions.values().map(|s| &s.position),
            |instrument| {
                if instrument == fill.instrument {
                    Some(fill.price)
                } else {
                    quotes.bid(instrument)
                }
            },
        );
        let point = EquityPoint {
            timestamp: fill.timestamp,
            equity,
        };
        self.curve.push(point)?;
        Ok(point)
    }

    /// Mark-to-market sample at tick time, when sampling every tick.
    pub fn on_tick_mark(
        &mut self,
        timestamp: DateTime<Utc>,
        quotes: &QuoteBook,
    ) -> Result<Option<EquityPoint>, PortfolioError> {
        if self.sampling != EquitySampling::EveryTick {
            return Ok(None);
        }
        let point = EquityPoint {
            timestamp,
            equity: self.equity(quotes),
        };
        self.curve.push(point)?;
        Ok(Some(point))
    }

    /// Current equity with every open position marked at its last bid.
    pub fn equity(&self, quotes: &QuoteBook) -> f64 {
        self.accounting
            .compute_equity(self.positions.values().map(|s| &s.position), |i| quotes.bid(i))
    }

    pub fn position(&self, instrument: &str) -> Option<&PositionState> {
        self.positions.get(instrument)
    }

    /// Positions in instrument order.
    pub fn positions(&self) -> BTreeMap<&str, &Position> {
        self.positions
            .iter()
            .map(|(k, v)| (k.as_str(), &v.position))
            .collect()
    }

    pub fn accounting(&self) -> &Accounting {
        &self.accounting
    }

    pub fn cash(&self) -> f64 {
        self.accounting.cash()
    }

    pub fn fills_processed(&self) -> usize {
        self.fills_processed
    }

    pub fn equity_curve(&self) -> &EquityCurve {
        &self.curve
    }

    pub fn seal(&mut self) {
        self.curve.seal();
    }
}
