//! Performance metrics: pure functions over a finished run.
//!
//! Everything here is computed from the equity curve and the audit log; no
//! dependency on the data pipeline or the driver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tickreplay_core::domain::{Direction, EquityPoint};
use tickreplay_core::engine::{AuditEntry, AuditRecord, RunResult};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_return: f64,
    /// Largest peak-to-trough decline of the equity curve, as a positive fraction.
    pub max_drawdown: f64,
    pub realized_pnl: f64,
    pub total_cost: f64,
    pub tick_count: u64,
    pub signal_count: u64,
    pub suppressed_count: u64,
    pub order_count: u64,
    pub fill_count: u64,
    /// Completed BUY→SELL pairs.
    pub round_trips: usize,
    /// Fraction of round trips with positive net PnL.
    pub win_rate: f64,
}

impl PerformanceMetrics {
    pub fn compute(result: &RunResult) -> Self {
        let trips = round_trip_pnls(&result.audit_log);
        Self {
            initial_equity: result.initial_equity,
            final_equity: result.final_equity,
            total_return: result.total_return(),
            max_drawdown: max_drawdown(result.equity_curve.points(), result.initial_equity),
            realized_pnl: result.realized_pnl,
            total_cost: result.costs_paid,
            tick_count: result.stats.ticks,
            signal_count: result.stats.signals,
            suppressed_count: result.stats.suppressed,
            order_count: result.stats.orders,
            fill_count: result.stats.fills,
            round_trips: trips.len(),
            win_rate: win_rate(&trips),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Max drawdown measured from the running peak, starting at `initial`.
pub fn max_drawdown(points: &[EquityPoint], initial: f64) -> f64 {
    let mut peak = initial;
    let mut max_dd = 0.0_f64;
    for p in points {
        peak = peak.max(p.equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - p.equity) / peak);
        }
    }
    max_dd
}

/// Net PnL of every closed round trip, in close order.
///
/// Each SELL fill closes the open BUY fills of its instrument; costs of both
/// legs are charged to the trip.
pub fn round_trip_pnls(log: &[AuditRecord]) -> Vec<f64> {
    // instrument -> (cost basis incl. entry costs, quantity)
    let mut open: HashMap<&str, (f64, f64)> = HashMap::new();
    let mut trips = Vec::new();

    for record in log {
        let AuditEntry::Fill {
            direction,
            quantity,
            price,
            cost,
            ..
        } = record.entry
        else {
            continue;
        };
        match direction {
            Direction::Buy => {
                let entry = open.entry(record.instrument.as_str()).or_insert((0.0, 0.0));
                entry.0 += price * quantity + cost;
                entry.1 += quantity;
            }
            Direction::Sell => {
                if let Some((basis, held)) = open.remove(record.instrument.as_str()) {
                    let closed = quantity.min(held);
                    let basis_closed = if held > 0.0 { basis * closed / held } else { 0.0 };
                    trips.push(price * closed - cost - basis_closed);
                    if held - closed > 1e-12 {
                        open.insert(record.instrument.as_str(), (basis - basis_closed, held - closed));
                    }
                }
            }
        }
    }
    trips
}

pub fn win_rate(trips: &[f64]) -> f64 {
    if trips.is_empty() {
        return 0.0;
    }
    trips.iter().filter(|&&pnl| pnl > 0.0).count() as f64 / trips.len() as f64
}
