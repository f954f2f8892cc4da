//! TickReplay CLI: run and sweep commands.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config, on CSV or synthetic ticks
//! - `sweep`: run a Bollinger `window × std_factor` grid in parallel

mod obs;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tickreplay_core::domain::Tick;
use tickreplay_runner::{
    dataset_hash, run_backtest, run_sweep, run_synthetic, save_artifacts, save_halted_run,
    synthetic_ticks, BacktestResult, CsvTickLoader, RunConfig, RunError, SweepEntry, SweepGrid,
};

use obs::LogFormat;

#[derive(Parser)]
#[command(
    name = "tickreplay",
    about = "TickReplay: deterministic event-driven tick backtester"
)]
struct Cli {
    /// Log level or filter directive (overridden by TICKREPLAY_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Replace CSV data with N synthetic ticks per instrument.
        #[arg(long, value_name = "N")]
        synthetic: Option<usize>,

        /// Seed for synthetic ticks.
        #[arg(long, default_value_t = 42, requires = "synthetic")]
        seed: u64,

        /// Output directory for artifacts. Defaults to `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run a parameter grid over the same ticks and rank the results.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Rolling window sizes, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        windows: Vec<usize>,

        /// Band widths in standard deviations, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        std_factors: Vec<f64>,

        /// Replace CSV data with N synthetic ticks per instrument.
        #[arg(long, value_name = "N")]
        synthetic: Option<usize>,

        /// Seed for synthetic ticks.
        #[arg(long, default_value_t = 42, requires = "synthetic")]
        seed: u64,

        /// Output directory for the sweep table. Defaults to `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            synthetic,
            seed,
            output_dir,
        } => run_cmd(&config, synthetic, seed, output_dir),
        Commands::Sweep {
            config,
            windows,
            std_factors,
            synthetic,
            seed,
            output_dir,
        } => sweep_cmd(
            &config,
            SweepGrid::new(windows, std_factors),
            synthetic,
            seed,
            output_dir,
        ),
    }
}

fn run_cmd(
    config_path: &Path,
    synthetic: Option<usize>,
    seed: u64,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let outcome = match synthetic {
        Some(n) => run_synthetic(&config.engine, n, seed),
        None => run_backtest(&config),
    };
    let result = match outcome {
        Ok(result) => result,
        Err(err) => return Err(halted(err, &config, &output_dir)),
    };

    print_summary(&result);

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

/// Persist whatever a halted run recorded, then hand back the run error.
fn halted(err: RunError, config: &RunConfig, output_dir: &Path) -> anyhow::Error {
    if let Some(partial) = err.partial() {
        match save_halted_run(partial, &config.run_id(), output_dir) {
            Ok(dir) => println!("Partial run saved to: {}", dir.display()),
            Err(e) => tracing::error!(error = %e, "failed to write partial run"),
        }
    }
    err.into()
}

fn sweep_cmd(
    config_path: &Path,
    grid: SweepGrid,
    synthetic: Option<usize>,
    seed: u64,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let (ticks, hash) = load_ticks(&config, synthetic, seed)?;

    let entries = run_sweep(&grid, &config.engine, &ticks, &hash)?;
    print_sweep(&entries);

    let output_dir = output_dir.unwrap_or(config.output.dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let path = output_dir.join(format!("sweep_{}.json", hash.get(..12).unwrap_or(&hash)));
    std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
    println!("Sweep table saved to: {}", path.display());
    Ok(())
}

fn load_ticks(config: &RunConfig, synthetic: Option<usize>, seed: u64) -> Result<(Vec<Tick>, String)> {
    match synthetic {
        Some(n) => {
            tracing::warn!(ticks_per_instrument = n, seed, "sweeping synthetic data");
            let ticks = synthetic_ticks(&config.engine.instruments, n, seed);
            let hash = dataset_hash(&ticks);
            Ok((ticks, hash))
        }
        None => {
            let loaded = CsvTickLoader::new(&config.data.csv_dir).load(&config.engine.instruments)?;
            Ok((loaded.ticks, loaded.dataset_hash))
        }
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.strategy);
    println!("Instruments:    {}", result.config.instruments.join(", "));
    println!("Run ID:         {}", result.run_id);
    println!("Dataset Hash:   {}", result.dataset_hash);
    println!("Ticks:          {}", m.tick_count);
    println!(
        "Signals:        {} ({} suppressed)",
        m.signal_count, m.suppressed_count
    );
    println!("Fills:          {}", m.fill_count);
    println!("Round Trips:    {}", m.round_trips);
    println!();
    println!("--- Performance ---");
    println!("Initial Equity: {:.2}", m.initial_equity);
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Realized PnL:   {:.2}", m.realized_pnl);
    println!("Costs Paid:     {:.2}", m.total_cost);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    for p in result.positions.iter().filter(|p| !p.is_flat()) {
        println!(
            "Open Position:  {} {:.2} @ {:.5}",
            p.instrument, p.quantity, p.avg_entry_price
        );
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}

fn print_sweep(entries: &[SweepEntry]) {
    println!();
    println!("=== Sweep Results ({} runs) ===", entries.len());
    println!(
        "{:>6} {:>6} {:>10} {:>10} {:>7} {:>8}",
        "window", "k", "return", "max_dd", "fills", "win_rate"
    );
    for e in entries {
        println!(
            "{:>6} {:>6.2} {:>9.2}% {:>9.2}% {:>7} {:>7.1}%",
            e.params.window,
            e.params.std_factor,
            e.metrics.total_return * 100.0,
            e.metrics.max_drawdown * 100.0,
            e.metrics.fill_count,
            e.metrics.win_rate * 100.0
        );
    }
}
