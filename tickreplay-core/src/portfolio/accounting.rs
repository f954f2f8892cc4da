use crate::domain::{Fill, Position};

/// Cash and PnL ledger
#[derive(Debug, Clone)]
pub struct Accounting {
    cash: f64,
    realized_pnl: f64,
    costs_paid: f64,
}

impl Accounting {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            realized_pnl: 0.0,
            costs_paid: 0.0,
        }
    }

    /// Apply a fill to cash, with the PnL the position realized on it
    pub fn apply_fill(&mut self, fill: &Fill, realized: f64) {
        // Outflow for buys, inflow for sells, cost always deducted
        self.cash += fill.cash_delta();
        self.costs_paid += fill.cost;
        self.realized_pnl += realized;
    }

    /// Cash plus positions marked at `mark(instrument)`.
    ///
    /// Instruments without a mark fall back to their average entry price.
    pub fn compute_equity<'a, F>(&self, positions: impl Iterator<Item = &'a Position>, mark: F) -> f64
    where
        F: Fn(&str) -> Option<f64>,
    {
        let position_value: f64 = positions
            .filter(|p| !p.is_flat())
            .map(|p| p.market_value(mark(&p.instrument).unwrap_or(p.avg_entry_price)))
            .sum();
        self.cash + position_value
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn costs_paid(&self) -> f64 {
        self.costs_paid
    }
}
