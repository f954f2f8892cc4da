//! Strategy engine: turns ticks into directional signals.
//!
//! Strategies own their per-instrument state outright. They never see the
//! portfolio: the only output is a list of signals for the portfolio to size
//! (or suppress).

pub mod bollinger;
pub mod rolling;

pub use bollinger::{Bands, BollingerBands, BollingerParams, InstrumentState};
pub use rolling::RollingWindow;

use crate::domain::{Signal, Tick};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("tick for unconfigured instrument '{0}'")]
    UnknownInstrument(String),
}

/// Signal generation from market data.
///
/// # Responsibilities
/// - Maintain rolling statistics per instrument
/// - Emit zero or more signals per tick
///
/// # Non-Responsibilities
/// - Strategies do NOT size positions (that's the portfolio's job)
/// - Strategies do NOT decide fill prices (that's the execution simulator's job)
pub trait Strategy: Send {
    fn on_tick(&mut self, tick: &Tick) -> Result<Vec<Signal>, StrategyError>;

    /// Strategy name for manifest/logging
    fn name(&self) -> &str;
}
