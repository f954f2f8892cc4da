//! TickReplay Runner: backtest orchestration around `tickreplay-core`.
//!
//! This crate provides:
//! - TOML run configuration with environment overrides
//! - CSV tick loading and seeded synthetic ticks
//! - Single-backtest runner with performance metrics
//! - JSON/CSV artifact export
//! - Parallel parameter sweeps

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{ConfigError, DataConfig, OutputConfig, RunConfig, RunId};
pub use data_loader::{dataset_hash, CsvTickLoader, LoadError, LoadedTicks};
pub use export::{load_artifacts, save_artifacts, save_halted_run, CsvSink};
pub use metrics::PerformanceMetrics;
pub use runner::{
    run_backtest, run_backtest_from_ticks, run_synthetic, BacktestResult, RunError, SCHEMA_VERSION,
};
pub use sweep::{run_sweep, SweepEntry, SweepGrid};
pub use synthetic::synthetic_ticks;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<SweepGrid>();
        assert_sync::<SweepGrid>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
