//! Quote book: last known bid/ask per instrument.

use crate::domain::{Direction, Tick};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Price a market order in `direction` would trade at.
    pub fn price_for(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Buy => self.ask,
            Direction::Sell => self.bid,
        }
    }
}

/// Latest quote per instrument as of the event currently being processed.
///
/// Owned and updated by the backtest driver only; components receive it by
/// shared reference, so prices can never come from a tick that has not been
/// dispatched yet.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    quotes: HashMap<String, Quote>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, tick: &Tick) {
        self.quotes.insert(
            tick.instrument.clone(),
            Quote {
                bid: tick.bid,
                ask: tick.ask,
                timestamp: tick.timestamp,
            },
        );
    }

    pub fn get(&self, instrument: &str) -> Option<&Quote> {
        self.quotes.get(instrument)
    }

    /// Last bid, used to mark long positions.
    pub fn bid(&self, instrument: &str) -> Option<f64> {
        self.quotes.get(instrument).map(|q| q.bid)
    }

    pub fn ask(&self, instrument: &str) -> Option<f64> {
        self.quotes.get(instrument).map(|q| q.ask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn update_overwrites_previous_quote() {
        let ts = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let mut book = QuoteBook::new();
        book.update(&Tick::new("EURUSD", ts, 1.10, 1.12));
        book.update(&Tick::new("EURUSD", ts, 1.20, 1.22));
        assert_eq!(book.bid("EURUSD"), Some(1.20));
        assert_eq!(book.ask("EURUSD"), Some(1.22));
        assert!(book.get("GBPUSD").is_none());
    }

    #[test]
    fn price_for_direction() {
        let ts = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let q = Quote { bid: 1.0, ask: 1.1, timestamp: ts };
        assert_eq!(q.price_for(Direction::Buy), 1.1);
        assert_eq!(q.price_for(Direction::Sell), 1.0);
    }
}
