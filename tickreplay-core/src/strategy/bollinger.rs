//! Bollinger Bands mean-reversion signal generator.
//!
//! Per instrument, over a rolling window of the last W bids:
//! - Middle: mean(bid, W)
//! - Upper: middle + k * stddev(bid, W)
//! - Lower: middle - k * stddev(bid, W)
//!
//! Uses population stddev (divide by N). Buys when the bid closes below the
//! lower band while not invested; sells when it closes above the upper band
//! while invested. No signal until W ticks have been seen for the instrument.

use super::rolling::RollingWindow;
use super::{Strategy, StrategyError};
use crate::domain::{Direction, Signal, Symbol, Tick};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    /// Number of samples in the rolling window (W).
    pub window: usize,
    /// Band half-width in standard deviations (k).
    pub std_factor: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            window: 50,
            std_factor: 2.0,
        }
    }
}

/// Band values computed for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub mean: f64,
    pub std_dev: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Rolling state for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    ticks: u64,
    invested: bool,
    window: RollingWindow,
}

impl InstrumentState {
    fn new(window: usize) -> Self {
        Self {
            ticks: 0,
            invested: false,
            window: RollingWindow::new(window),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advisory flag: what the strategy believes. The portfolio's position is
    /// authoritative for capital.
    pub fn invested(&self) -> bool {
        self.invested
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    params: BollingerParams,
    states: HashMap<Symbol, InstrumentState>,
    last_bands: HashMap<Symbol, Bands>,
}

impl BollingerBands {
    pub fn new(instruments: &[Symbol], params: BollingerParams) -> Self {
        assert!(params.window >= 1, "Bollinger window must be >= 1");
        let states = instruments
            .iter()
            .map(|s| (s.clone(), InstrumentState::new(params.window)))
            .collect();
        Self {
            params,
            states,
            last_bands: HashMap::new(),
        }
    }

    pub fn params(&self) -> BollingerParams {
        self.params
    }

    pub fn state(&self, instrument: &str) -> Option<&InstrumentState> {
        self.states.get(instrument)
    }

    /// Bands from the most recent post-warm-up evaluation of `instrument`.
    pub fn last_bands(&self, instrument: &str) -> Option<Bands> {
        self.last_bands.get(instrument).copied()
    }
}

impl Strategy for BollingerBands {
    fn on_tick(&mut self, tick: &Tick) -> Result<Vec<Signal>, StrategyError> {
        let state = self
            .states
            .get_mut(&tick.instrument)
            .ok_or_else(|| StrategyError::UnknownInstrument(tick.instrument.clone()))?;

        let price = tick.bid;
        state.window.push(price);
        state.ticks += 1;

        // Warm-up: not enough samples yet
        if state.ticks < self.params.window as u64 {
            return Ok(Vec::new());
        }

        let (Some(mean), Some(std_dev)) = (state.window.mean(), state.window.std_dev()) else {
            return Ok(Vec::new());
        };
        let bands = Bands {
            mean,
            std_dev,
            upper: mean + self.params.std_factor * std_dev,
            lower: mean - self.params.std_factor * std_dev,
        };
        self.last_bands.insert(tick.instrument.clone(), bands);

        tracing::trace!(
            instrument = %tick.instrument,
            price,
            mean = bands.mean,
            upper = bands.upper,
            lower = bands.lower,
            "bands evaluated"
        );

        let direction = if price > bands.upper && state.invested {
            state.invested = false;
            Some(Direction::Sell)
        } else if price < bands.lower && !state.invested {
            state.invested = true;
            Some(Direction::Buy)
        } else {
            None
        };

        Ok(direction
            .map(|d| vec![Signal::market(&tick.instrument, d, tick.timestamp)])
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "bollinger_bands"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ticks(instrument: &str, bids: &[f64]) -> Vec<Tick> {
        let base = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        bids.iter()
            .enumerate()
            .map(|(i, &bid)| Tick::new(instrument, base + Duration::seconds(i as i64), bid, bid + 0.0001))
            .collect()
    }

    fn run(strategy: &mut BollingerBands, ticks: &[Tick]) -> Vec<Vec<Signal>> {
        ticks.iter().map(|t| strategy.on_tick(t).unwrap()).collect()
    }

    #[test]
    fn flat_then_narrow_band_emits_nothing() {
        let mut s = BollingerBands::new(
            &["EURUSD".into()],
            BollingerParams { window: 3, std_factor: 2.0 },
        );
        let out = run(&mut s, &ticks("EURUSD", &[1.0, 1.0, 1.0, 1.0, 1.10, 0.80]));
        assert!(out.iter().all(Vec::is_empty));

        let bands = s.last_bands("EURUSD").unwrap();
        // window [1.0, 1.10, 0.80]
        assert!((bands.mean - 0.966_666_666).abs() < 1e-6);
        assert!((bands.std_dev - 0.124_721_912).abs() < 1e-6);
        assert!((bands.lower - 0.717_222_842).abs() < 1e-6);
    }

    #[test]
    fn flat_window_has_collapsed_bands() {
        let mut s = BollingerBands::new(
            &["EURUSD".into()],
            BollingerParams { window: 3, std_factor: 2.0 },
        );
        run(&mut s, &ticks("EURUSD", &[1.0, 1.0, 1.0, 1.0]));
        let bands = s.last_bands("EURUSD").unwrap();
        assert_eq!(bands.std_dev, 0.0);
        assert_eq!(bands.upper, bands.lower);
        assert_eq!(bands.mean, 1.0);
    }

    #[test]
    fn buy_below_lower_then_sell_above_upper() {
        let mut s = BollingerBands::new(
            &["EURUSD".into()],
            BollingerParams { window: 3, std_factor: 1.0 },
        );
        let out = run(&mut s, &ticks("EURUSD", &[1.0, 1.0, 1.0, 0.5, 2.0]));
        assert!(out[..3].iter().all(Vec::is_empty));
        assert_eq!(out[3].len(), 1);
        assert_eq!(out[3][0].direction, Direction::Buy);
        assert_eq!(out[4].len(), 1);
        assert_eq!(out[4][0].direction, Direction::Sell);
        assert!(!s.state("EURUSD").unwrap().invested());
    }

    #[test]
    fn duplicate_buy_not_emitted_while_invested() {
        let mut s = BollingerBands::new(
            &["EURUSD".into()],
            BollingerParams { window: 3, std_factor: 1.0 },
        );
        let out = run(&mut s, &ticks("EURUSD", &[1.0, 1.0, 1.0, 0.5, 0.2]));
        assert_eq!(out[3].len(), 1);
        assert!(out[4].is_empty(), "already invested, no second buy");
        assert!(s.state("EURUSD").unwrap().invested());
    }

    #[test]
    fn no_signal_during_warmup() {
        let mut s = BollingerBands::new(
            &["EURUSD".into()],
            BollingerParams { window: 5, std_factor: 0.1 },
        );
        let out = run(&mut s, &ticks("EURUSD", &[1.0, 2.0, 0.1, 5.0]));
        assert!(out.iter().all(Vec::is_empty));
        assert!(s.last_bands("EURUSD").is_none());
        assert_eq!(s.state("EURUSD").unwrap().ticks(), 4);
    }

    #[test]
    fn window_length_tracks_min_ticks_w() {
        let mut s = BollingerBands::new(
            &["EURUSD".into()],
            BollingerParams { window: 3, std_factor: 2.0 },
        );
        for (i, t) in ticks("EURUSD", &[1.0, 1.1, 1.2, 1.3, 1.4]).iter().enumerate() {
            s.on_tick(t).unwrap();
            assert_eq!(s.state("EURUSD").unwrap().window().len(), (i + 1).min(3));
        }
    }

    #[test]
    fn instruments_are_independent() {
        let mut s = BollingerBands::new(
            &["EURUSD".into(), "GBPUSD".into()],
            BollingerParams { window: 3, std_factor: 1.0 },
        );
        let eur = ticks("EURUSD", &[1.0, 1.0, 1.0, 0.5]);
        let gbp = ticks("GBPUSD", &[1.5, 1.5]);
        for t in &gbp {
            assert!(s.on_tick(t).unwrap().is_empty());
        }
        let out = run(&mut s, &eur);
        assert_eq!(out[3].len(), 1);
        assert_eq!(s.state("GBPUSD").unwrap().ticks(), 2);
        assert!(!s.state("GBPUSD").unwrap().invested());
    }

    #[test]
    fn unknown_instrument_is_an_error() {
        let mut s = BollingerBands::new(&["EURUSD".into()], BollingerParams::default());
        let err = s.on_tick(&ticks("USDJPY", &[100.0])[0]).unwrap_err();
        assert_eq!(err, StrategyError::UnknownInstrument("USDJPY".into()));
    }
}
