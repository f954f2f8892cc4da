//! Domain types for tickreplay

pub mod equity;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;
pub mod signal;
pub mod tick;

pub use equity::{EquityCurve, EquityError, EquityPoint};
pub use fill::Fill;
pub use ids::{FillId, OrderId};
pub use order::{Direction, Order, OrderKind};
pub use position::Position;
pub use signal::Signal;
pub use tick::{Tick, TickError};

/// Instrument identifier (e.g. "EURUSD").
pub type Symbol = String;
