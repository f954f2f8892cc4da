//! Artifact export: JSON manifest plus CSV equity curve and event log.
//!
//! All persisted manifests carry a `schema_version`. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tickreplay_core::domain::{EquityCurve, EquityPoint};
use tickreplay_core::engine::{AuditEntry, AuditRecord, OutputSink, RunResult};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const EQUITY_FILE: &str = "equity.csv";
pub const EVENTS_FILE: &str = "events.csv";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Equity samples as `timestamp,equity`.
pub fn export_equity_csv(points: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for p in points {
        wtr.write_record([p.timestamp.to_rfc3339(), format!("{:.2}", p.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// The audit log in processing order, one row per record.
///
/// Columns: seq, timestamp, instrument, kind, direction, order_kind, reason,
/// order_id, fill_id, quantity, price, cost, equity. Columns that do not
/// apply to a record's kind are empty.
pub fn export_events_csv(records: &[AuditRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "seq",
        "timestamp",
        "instrument",
        "kind",
        "direction",
        "order_kind",
        "reason",
        "order_id",
        "fill_id",
        "quantity",
        "price",
        "cost",
        "equity",
    ])?;

    for r in records {
        let mut row = vec![String::new(); 13];
        row[0] = r.seq.to_string();
        row[1] = r.timestamp.to_rfc3339();
        row[2] = r.instrument.clone();
        row[3] = r.entry.label().to_string();
        match &r.entry {
            AuditEntry::Signal {
                direction,
                order_kind,
            } => {
                row[4] = direction.to_string();
                row[5] = order_kind.to_string();
            }
            AuditEntry::Suppressed { direction, reason } => {
                row[4] = direction.to_string();
                row[6] = format!("{:?}", reason);
            }
            AuditEntry::Order {
                order_id,
                direction,
                quantity,
            } => {
                row[4] = direction.to_string();
                row[7] = order_id.to_string();
                row[9] = format!("{:.2}", quantity);
            }
            AuditEntry::Fill {
                fill_id,
                order_id,
                direction,
                quantity,
                price,
                cost,
                equity,
            } => {
                row[4] = direction.to_string();
                row[7] = order_id.to_string();
                row[8] = fill_id.to_string();
                row[9] = format!("{:.2}", quantity);
                row[10] = format!("{:.6}", price);
                row[11] = format!("{:.2}", cost);
                row[12] = format!("{:.2}", equity);
            }
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Writes `equity.csv` and `events.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_files(&self, points: &[EquityPoint], log: &[AuditRecord]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create artifact dir: {}", self.dir.display()))?;
        std::fs::write(self.dir.join(EQUITY_FILE), export_equity_csv(points)?)?;
        std::fs::write(self.dir.join(EVENTS_FILE), export_events_csv(log)?)?;
        Ok(())
    }
}

impl OutputSink for CsvSink {
    type Error = anyhow::Error;

    fn write_run(&mut self, curve: &EquityCurve, log: &[AuditRecord]) -> Result<()> {
        self.write_files(curve.points(), log)
    }
}

/// Save the full artifact set for a single backtest run.
///
/// Creates `{run_id[..12]}_{dataset_hash[..8]}/` under `output_dir` with
/// `manifest.json`, `equity.csv` and `events.csv`. The name is derived from
/// the run's content, so re-running the same config on the same data
/// overwrites the same directory.
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    CsvSink::new(&run_dir).write_files(&result.equity_curve, &result.audit_log)?;
    std::fs::write(run_dir.join(MANIFEST_FILE), export_json(result)?)?;
    tracing::info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Write the equity curve and event log of a run that halted, under
/// `<run>_halted`. No manifest is written, since there are no metrics.
pub fn save_halted_run(partial: &RunResult, run_id: &str, output_dir: &Path) -> Result<PathBuf> {
    let run = run_id.get(..12).unwrap_or(run_id);
    let mut sink = CsvSink::new(output_dir.join(format!("{run}_halted")));
    partial.write_to(&mut sink)?;
    tracing::warn!(dir = %sink.dir().display(), "partial run written");
    Ok(sink.dir().to_path_buf())
}

/// Load a `BacktestResult` from an artifact directory's manifest.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn artifact_dir_name(result: &BacktestResult) -> String {
    let run = result.run_id.get(..12).unwrap_or(&result.run_id);
    let data = result.dataset_hash.get(..8).unwrap_or(&result.dataset_hash);
    if result.has_synthetic {
        format!("{run}_{data}_synthetic")
    } else {
        format!("{run}_{data}")
    }
}
