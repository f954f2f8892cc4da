//! tickreplay core: event-driven tick backtesting.
//!
//! This crate contains the whole simulation:
//! - Domain types (ticks, signals, orders, fills, positions, equity curve)
//! - The FIFO event queue and event model
//! - Price sources and the quote book
//! - Bollinger Bands mean-reversion strategy
//! - Portfolio with position sizing and accounting
//! - Simulated market-order execution with cost models
//! - The backtest driver, audit log and observers

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod events;
pub mod execution;
pub mod portfolio;
pub mod strategy;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Backtest, DriverState, RunFailure, RunResult};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across threads by the runner are
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Tick>();
        require_sync::<domain::Tick>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::EquityCurve>();
        require_sync::<domain::EquityCurve>();
        require_send::<events::Event>();
        require_sync::<events::Event>();
        require_send::<config::EngineConfig>();
        require_sync::<config::EngineConfig>();
        require_send::<engine::RunResult>();
        require_sync::<engine::RunResult>();
        require_send::<engine::AuditRecord>();
        require_sync::<engine::AuditRecord>();
        require_send::<strategy::BollingerBands>();
        require_send::<portfolio::Portfolio>();
        require_send::<execution::SimulatedExecution>();
    }

    /// Strategies cannot see the portfolio: `on_tick` takes only the tick.
    #[test]
    fn strategy_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            strategy: &mut dyn strategy::Strategy,
            tick: &domain::Tick,
        ) -> Result<Vec<domain::Signal>, strategy::StrategyError> {
            strategy.on_tick(tick)
        }
    }
}
