//! Audit log: one record per signal, suppression, order and fill, in
//! processing order.

use super::observer::EventObserver;
use crate::domain::{Direction, EquityPoint, Fill, FillId, Order, OrderId, OrderKind, Signal};
use crate::portfolio::SuppressionReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntry {
    Signal {
        direction: Direction,
        order_kind: OrderKind,
    },
    Suppressed {
        direction: Direction,
        reason: SuppressionReason,
    },
    Order {
        order_id: OrderId,
        direction: Direction,
        quantity: f64,
    },
    Fill {
        fill_id: FillId,
        order_id: OrderId,
        direction: Direction,
        quantity: f64,
        price: f64,
        cost: f64,
        /// Equity sample appended for this fill.
        equity: f64,
    },
}

impl AuditEntry {
    pub fn label(&self) -> &'static str {
        match self {
            AuditEntry::Signal { .. } => "SIGNAL",
            AuditEntry::Suppressed { .. } => "SUPPRESSED",
            AuditEntry::Order { .. } => "ORDER",
            AuditEntry::Fill { .. } => "FILL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub instrument: String,
    pub entry: AuditEntry,
}

/// Collects [`AuditRecord`]s as the driver dispatches events.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, timestamp: DateTime<Utc>, instrument: &str, entry: AuditEntry) {
        let seq = self.records.len() as u64;
        self.records.push(AuditRecord {
            seq,
            timestamp,
            instrument: instrument.to_string(),
            entry,
        });
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventObserver for AuditLog {
    fn on_signal(&mut self, signal: &Signal) {
        self.record(
            signal.timestamp,
            &signal.instrument,
            AuditEntry::Signal {
                direction: signal.direction,
                order_kind: signal.kind,
            },
        );
    }

    fn on_suppressed(&mut self, signal: &Signal, reason: SuppressionReason) {
        self.record(
            signal.timestamp,
            &signal.instrument,
            AuditEntry::Suppressed {
                direction: signal.direction,
                reason,
            },
        );
    }

    fn on_order(&mut self, order: &Order) {
        self.record(
            order.timestamp,
            &order.instrument,
            AuditEntry::Order {
                order_id: order.id,
                direction: order.direction,
                quantity: order.quantity,
            },
        );
    }

    fn on_fill(&mut self, fill: &Fill, equity: &EquityPoint) {
        self.record(
            fill.timestamp,
            &fill.instrument,
            AuditEntry::Fill {
                fill_id: fill.id,
                order_id: fill.order_id,
                direction: fill.direction,
                quantity: fill.quantity,
                price: fill.price,
                cost: fill.cost,
                equity: equity.equity,
            },
        );
    }
}
