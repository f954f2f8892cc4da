//! Observation hooks and output sinks.
//!
//! Observers see every signal, suppression, order and fill as the driver
//! dispatches them. They cannot influence the run.

use crate::domain::{EquityCurve, EquityPoint, Fill, Order, Signal};
use crate::portfolio::SuppressionReason;

use super::audit::AuditRecord;

/// Read-only hooks invoked by the driver. Every method defaults to a no-op.
pub trait EventObserver: Send {
    fn on_signal(&mut self, _signal: &Signal) {}

    fn on_suppressed(&mut self, _signal: &Signal, _reason: SuppressionReason) {}

    fn on_order(&mut self, _order: &Order) {}

    fn on_fill(&mut self, _fill: &Fill, _equity: &EquityPoint) {}
}

/// Emits one `tracing` event per observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_signal(&mut self, signal: &Signal) {
        tracing::debug!(
            instrument = %signal.instrument,
            direction = %signal.direction,
            ts = %signal.timestamp,
            "signal generated"
        );
    }

    fn on_suppressed(&mut self, signal: &Signal, reason: SuppressionReason) {
        tracing::warn!(
            instrument = %signal.instrument,
            direction = %signal.direction,
            reason = ?reason,
            "signal suppressed"
        );
    }

    fn on_order(&mut self, order: &Order) {
        tracing::debug!(
            order = %order.id,
            instrument = %order.instrument,
            direction = %order.direction,
            quantity = order.quantity,
            "order placed"
        );
    }

    fn on_fill(&mut self, fill: &Fill, equity: &EquityPoint) {
        tracing::debug!(
            fill = %fill.id,
            order = %fill.order_id,
            instrument = %fill.instrument,
            direction = %fill.direction,
            price = fill.price,
            quantity = fill.quantity,
            cost = fill.cost,
            equity = equity.equity,
            "fill received"
        );
    }
}

/// Destination for a finished run's equity curve and audit log.
pub trait OutputSink {
    type Error;

    fn write_run(&mut self, curve: &EquityCurve, log: &[AuditRecord]) -> Result<(), Self::Error>;
}

/// Keeps a copy of everything written, for tests and in-process consumers.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub curve: Option<EquityCurve>,
    pub records: Vec<AuditRecord>,
}

impl OutputSink for MemorySink {
    type Error = std::convert::Infallible;

    fn write_run(&mut self, curve: &EquityCurve, log: &[AuditRecord]) -> Result<(), Self::Error> {
        self.curve = Some(curve.clone());
        self.records = log.to_vec();
        Ok(())
    }
}
