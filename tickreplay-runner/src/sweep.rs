//! Parameter sweep over Bollinger `window × std_factor`.
//!
//! Every grid point is an independent, single-threaded backtest over the
//! same ticks, so the grid runs in parallel with rayon and the output is
//! identical whatever the thread count.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tickreplay_core::domain::Tick;
use tickreplay_core::strategy::BollingerParams;
use tickreplay_core::EngineConfig;

use crate::config::RunId;
use crate::metrics::PerformanceMetrics;
use crate::runner::{run_backtest_from_ticks, RunError};

/// Parameter grid specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub windows: Vec<usize>,
    pub std_factors: Vec<f64>,
}

impl SweepGrid {
    pub fn new(windows: Vec<usize>, std_factors: Vec<f64>) -> Self {
        Self {
            windows,
            std_factors,
        }
    }

    /// Total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.windows.len() * self.std_factors.len()
    }

    /// One engine config per grid point, window-major. Everything except the
    /// strategy parameters is copied from `base`.
    pub fn generate_configs(&self, base: &EngineConfig) -> Vec<EngineConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &window in &self.windows {
            for &std_factor in &self.std_factors {
                let mut config = base.clone();
                config.strategy = BollingerParams { window, std_factor };
                configs.push(config);
            }
        }
        configs
    }
}

/// Result of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub params: BollingerParams,
    pub run_id: RunId,
    pub metrics: PerformanceMetrics,
}

/// Run every grid point over `ticks` and rank the results.
///
/// Sorted by total return (best first), ties broken by window then
/// std_factor ascending. The first failing grid point aborts the sweep.
pub fn run_sweep(
    grid: &SweepGrid,
    base: &EngineConfig,
    ticks: &[Tick],
    dataset_hash: &str,
) -> Result<Vec<SweepEntry>, RunError> {
    let configs = grid.generate_configs(base);
    tracing::info!(grid_size = configs.len(), ticks = ticks.len(), "sweep started");

    let mut entries = configs
        .par_iter()
        .map(|config| {
            let result = run_backtest_from_ticks(config, ticks.to_vec(), dataset_hash)?;
            Ok(SweepEntry {
                params: config.strategy,
                run_id: result.run_id,
                metrics: result.metrics,
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    entries.sort_by(|a, b| {
        b.metrics
            .total_return
            .total_cmp(&a.metrics.total_return)
            .then(a.params.window.cmp(&b.params.window))
            .then(a.params.std_factor.total_cmp(&b.params.std_factor))
    });

    if let Some(best) = entries.first() {
        tracing::info!(
            window = best.params.window,
            std_factor = best.params.std_factor,
            total_return = best.metrics.total_return,
            "sweep finished"
        );
    }
    Ok(entries)
}
