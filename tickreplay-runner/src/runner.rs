//! Backtest runner: wires data loading, the engine and metrics together.
//!
//! Three entry points:
//! - `run_backtest()`: loads CSV ticks per the run config, then runs. Used by the CLI.
//! - `run_synthetic()`: runs on seeded synthetic ticks.
//! - `run_backtest_from_ticks()`: takes pre-loaded ticks, no I/O. Used by sweeps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tickreplay_core::data::VecSource;
use tickreplay_core::domain::{EquityPoint, Position, Tick};
use tickreplay_core::engine::{
    AuditRecord, Backtest, RunFailure, RunResult, RunStats, TracingObserver,
};
use tickreplay_core::EngineConfig;

use crate::config::{engine_run_id, ConfigError, RunConfig, RunId};
use crate::data_loader::{dataset_hash, CsvTickLoader, LoadError};
use crate::metrics::PerformanceMetrics;
use crate::synthetic::synthetic_ticks;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("engine config error: {0}")]
    Engine(#[from] tickreplay_core::ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    /// The engine halted mid-run. `partial` holds everything recorded up to
    /// the failure.
    #[error(
        "run halted with {} equity samples recorded",
        .partial.equity_curve.len()
    )]
    Halted {
        #[source]
        failure: Box<RunFailure>,
        partial: Box<RunResult>,
    },
}

impl RunError {
    /// Output of a halted run, up to the failure.
    pub fn partial(&self) -> Option<&RunResult> {
        match self {
            RunError::Halted { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub config: EngineConfig,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub metrics: PerformanceMetrics,
    pub stats: RunStats,
    pub equity_curve: Vec<EquityPoint>,
    pub audit_log: Vec<AuditRecord>,
    pub positions: Vec<Position>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest from a `RunConfig`, loading ticks from its CSV directory.
pub fn run_backtest(config: &RunConfig) -> Result<BacktestResult, RunError> {
    let loader = CsvTickLoader::new(&config.data.csv_dir);
    let loaded = loader.load(&config.engine.instruments)?;
    run_backtest_from_ticks(&config.engine, loaded.ticks, &loaded.dataset_hash)
}

/// Run on `n` synthetic ticks per configured instrument. The result is
/// tagged as synthetic.
pub fn run_synthetic(engine: &EngineConfig, n: usize, seed: u64) -> Result<BacktestResult, RunError> {
    tracing::warn!(ticks_per_instrument = n, seed, "running on synthetic data");
    let ticks = synthetic_ticks(&engine.instruments, n, seed);
    let hash = dataset_hash(&ticks);
    let mut result = run_backtest_from_ticks(engine, ticks, &hash)?;
    result.has_synthetic = true;
    Ok(result)
}

/// Run a backtest on pre-loaded, time-ordered ticks. No I/O.
pub fn run_backtest_from_ticks(
    engine: &EngineConfig,
    ticks: Vec<Tick>,
    dataset_hash: &str,
) -> Result<BacktestResult, RunError> {
    let run_id = engine_run_id(engine);
    let span = tracing::info_span!("run", run_id = &run_id[..12]);
    let _guard = span.enter();

    let mut backtest = Backtest::new(engine, Box::new(VecSource::new(ticks)))?
        .with_observer(Box::new(TracingObserver));
    let result = backtest.run().map_err(|failure| RunError::Halted {
        failure: Box::new(failure),
        partial: Box::new(backtest.result()),
    })?;
    let metrics = PerformanceMetrics::compute(&result);

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: result.strategy,
        config: engine.clone(),
        dataset_hash: dataset_hash.to_string(),
        has_synthetic: false,
        metrics,
        stats: result.stats,
        equity_curve: result.equity_curve.points().to_vec(),
        audit_log: result.audit_log,
        positions: result.positions,
    })
}
