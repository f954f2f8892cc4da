//! Event model and the FIFO queue that connects every component.
//!
//! Events are immutable once created. The queue is the only channel between
//! the strategy, portfolio and execution simulator; no component calls
//! another directly.

pub mod queue;

pub use queue::EventQueue;

use crate::domain::{Fill, Order, Signal, Tick};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tagged event flowing through the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Tick(Tick),
    Signal(Signal),
    Order(Order),
    Fill(Fill),
}

/// Event tag without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Tick,
    Signal,
    Order,
    Fill,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Tick(_) => EventKind::Tick,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Tick(t) => t.timestamp,
            Event::Signal(s) => s.timestamp,
            Event::Order(o) => o.timestamp,
            Event::Fill(f) => f.timestamp,
        }
    }

    pub fn instrument(&self) -> &str {
        match self {
            Event::Tick(t) => &t.instrument,
            Event::Signal(s) => &s.instrument,
            Event::Order(o) => &o.instrument,
            Event::Fill(f) => &f.instrument,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Tick => "TICK",
            EventKind::Signal => "SIGNAL",
            EventKind::Order => "ORDER",
            EventKind::Fill => "FILL",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Tick(t) => write!(
                f,
                "TICK {} {} bid={} ask={}",
                t.instrument, t.timestamp, t.bid, t.ask
            ),
            Event::Signal(s) => write!(
                f,
                "SIGNAL {} {} {} {}",
                s.instrument, s.kind, s.direction, s.timestamp
            ),
            Event::Order(o) => write!(
                f,
                "ORDER {} {} {} {} qty={} {}",
                o.id, o.instrument, o.kind, o.direction, o.quantity, o.timestamp
            ),
            Event::Fill(x) => write!(
                f,
                "FILL {} {} {} qty={} @ {} cost={} {}",
                x.id, x.instrument, x.direction, x.quantity, x.price, x.cost, x.timestamp
            ),
        }
    }
}
