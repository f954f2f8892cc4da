//! Run failures.
//!
//! Any component error halts the run. The failure names the component, the
//! event being processed when it happened, and the last equity sample that
//! was recorded before it.

use crate::data::SourceError;
use crate::domain::{EquityPoint, TickError};
use crate::events::Event;
use crate::execution::ExecutionError;
use crate::portfolio::PortfolioError;
use crate::strategy::StrategyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The component that raised a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Component {
    PriceSource,
    Strategy,
    Portfolio,
    Execution,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::PriceSource => "price source",
            Component::Strategy => "strategy",
            Component::Portfolio => "portfolio",
            Component::Execution => "execution",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid tick: {0}")]
    InvalidTick(#[from] TickError),

    #[error("tick for {instrument} at {got} precedes previous tick at {last}")]
    OutOfOrder {
        instrument: String,
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    #[error("tick for unconfigured instrument '{0}'")]
    UnknownInstrument(String),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("driver already halted by an earlier failure")]
    Halted,
}

/// Display carries the context only; the cause is reachable through `source()`.
#[derive(Debug, Error)]
#[error(
    "backtest halted in {component} while processing {}, last equity {}",
    describe_event(.event),
    describe_equity(.last_equity)
)]
pub struct RunFailure {
    pub component: Component,
    /// Event being processed; `None` when the source failed to produce one.
    pub event: Option<Event>,
    /// Last equity sample recorded before the failure.
    pub last_equity: Option<EquityPoint>,
    #[source]
    pub source: EngineError,
}

impl RunFailure {
    pub fn new(
        component: Component,
        event: Option<Event>,
        last_equity: Option<EquityPoint>,
        source: impl Into<EngineError>,
    ) -> Self {
        Self {
            component,
            event,
            last_equity,
            source: source.into(),
        }
    }
}

fn describe_event(event: &Option<Event>) -> String {
    match event {
        Some(event) => format!("[{event}]"),
        None => "no event".to_string(),
    }
}

fn describe_equity(point: &Option<EquityPoint>) -> String {
    match point {
        Some(p) => format!("{:.2} at {}", p.equity, p.timestamp),
        None => "none".to_string(),
    }
}
