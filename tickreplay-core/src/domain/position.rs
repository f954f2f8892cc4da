use super::order::Direction;
use serde::{Deserialize, Serialize};

/// Position tracking for a single instrument.
///
/// Quantity is signed; the Bollinger strategy is long-only so in practice it
/// is either zero or positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: String,
    pub quantity: f64,
    pub avg_entry_price: f64,
    pub realized_pnl: f64,
}

impl Position {
    pub fn flat(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Default::default()
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    /// Apply a filled quantity at `price`, returning the PnL realized by it.
    ///
    /// Adding to a position re-weights the average entry price; reducing it
    /// realizes PnL against the average entry. Crossing through zero opens
    /// the remainder at `price`.
    pub fn apply(&mut self, direction: Direction, quantity: f64, price: f64) -> f64 {
        let signed = direction.sign() * quantity;
        let same_side = self.quantity == 0.0 || self.quantity.signum() == signed.signum();

        if same_side {
            let new_qty = self.quantity + signed;
            self.avg_entry_price =
                (self.avg_entry_price * self.quantity.abs() + price * quantity) / new_qty.abs();
            self.quantity = new_qty;
            return 0.0;
        }

        let closing = quantity.min(self.quantity.abs());
        let realized = closing * (price - self.avg_entry_price) * self.quantity.signum();
        self.realized_pnl += realized;

        let remaining = self.quantity + signed;
        if remaining.abs() < 1e-12 {
            self.quantity = 0.0;
            self.avg_entry_price = 0.0;
        } else if remaining.signum() == self.quantity.signum() {
            self.quantity = remaining;
        } else {
            self.quantity = remaining;
            self.avg_entry_price = price;
        }
        realized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_add_reweights_entry() {
        let mut pos = Position::flat("EURUSD");
        pos.apply(Direction::Buy, 100.0, 1.0);
        pos.apply(Direction::Buy, 100.0, 2.0);
        assert_eq!(pos.quantity, 200.0);
        assert!((pos.avg_entry_price - 1.5).abs() < 1e-12);
        assert!(pos.is_long());
    }

    #[test]
    fn close_realizes_pnl_and_goes_flat() {
        let mut pos = Position::flat("EURUSD");
        pos.apply(Direction::Buy, 1000.0, 1.20);
        let pnl = pos.apply(Direction::Sell, 1000.0, 1.25);
        assert!((pnl - 50.0).abs() < 1e-9);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_entry_price, 0.0);
        assert!((pos.realized_pnl - 50.0).abs() < 1e-9);
    }

    #[test]
    fn partial_close_keeps_entry_price() {
        let mut pos = Position::flat("EURUSD");
        pos.apply(Direction::Buy, 1000.0, 1.20);
        pos.apply(Direction::Sell, 400.0, 1.10);
        assert!((pos.quantity - 600.0).abs() < 1e-9);
        assert!((pos.avg_entry_price - 1.20).abs() < 1e-12);
        assert!((pos.realized_pnl + 40.0).abs() < 1e-9);
    }

    #[test]
    fn market_value_marks_quantity() {
        let mut pos = Position::flat("SPY");
        pos.apply(Direction::Buy, 10.0, 100.0);
        assert_eq!(pos.market_value(110.0), 1100.0);
    }
}
