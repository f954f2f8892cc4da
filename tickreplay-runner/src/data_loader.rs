//! Tick loading from CSV files.
//!
//! Each instrument's ticks live in one or more files under a single
//! directory, named `<INSTRUMENT>.csv` or `<INSTRUMENT>_<anything>.csv`
//! (e.g. `GBPUSD_20140101.csv`). Files are read in file-name order and the
//! per-instrument streams are merged into one `(timestamp, instrument)`
//! ordered stream.
//!
//! Expected columns: `Time,Ask,Bid` (extra columns such as volumes are
//! ignored). Accepted time formats:
//! - RFC 3339 (`2014-01-01T00:00:01.250Z`)
//! - `01.01.2014 00:00:01.250`
//! - `2014-01-01 00:00:01.250`
//!
//! Times without an offset are taken as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickreplay_core::data::MergedSource;
use tickreplay_core::domain::{Symbol, Tick};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("tick data directory {0} does not exist")]
    MissingDir(PathBuf),

    #[error("no CSV files for '{instrument}' in {dir}")]
    NoFiles { instrument: String, dir: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Csv {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("{path}:{line}: unrecognized timestamp '{value}'")]
    BadTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct TickRow {
    #[serde(rename = "Time", alias = "time", alias = "TIME", alias = "timestamp")]
    time: String,
    #[serde(rename = "Ask", alias = "ask", alias = "ASK")]
    ask: f64,
    #[serde(rename = "Bid", alias = "bid", alias = "BID")]
    bid: f64,
}

const NAIVE_FORMATS: [&str; 3] = [
    "%d.%m.%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse any of the accepted timestamp formats.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// BLAKE3 over instrument, timestamp, bid and ask of every tick, in order.
pub fn dataset_hash(ticks: &[Tick]) -> String {
    let mut hasher = blake3::Hasher::new();
    for tick in ticks {
        hasher.update(tick.instrument.as_bytes());
        hasher.update(&[0]);
        hasher.update(&tick.timestamp.timestamp_micros().to_le_bytes());
        hasher.update(&tick.bid.to_bits().to_le_bytes());
        hasher.update(&tick.ask.to_bits().to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Ticks for every requested instrument, merged into one ordered stream.
#[derive(Debug, Clone)]
pub struct LoadedTicks {
    pub ticks: Vec<Tick>,
    /// Tick count per instrument.
    pub counts: BTreeMap<String, usize>,
    /// Files read, in read order.
    pub files: Vec<PathBuf>,
    pub dataset_hash: String,
}

#[derive(Debug, Clone)]
pub struct CsvTickLoader {
    dir: PathBuf,
}

impl CsvTickLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// CSV files belonging to `instrument`, sorted by file name.
    pub fn files_for(&self, instrument: &str) -> Result<Vec<PathBuf>, LoadError> {
        if !self.dir.is_dir() {
            return Err(LoadError::MissingDir(self.dir.clone()));
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|source| LoadError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && belongs_to(&path, instrument) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(LoadError::NoFiles {
                instrument: instrument.to_string(),
                dir: self.dir.clone(),
            });
        }
        Ok(files)
    }

    /// All ticks for one instrument, in file order.
    pub fn load_instrument(&self, instrument: &str) -> Result<(Vec<Tick>, Vec<PathBuf>), LoadError> {
        let files = self.files_for(instrument)?;
        let mut ticks = Vec::new();
        for path in &files {
            read_file(path, instrument, &mut ticks)?;
        }
        tracing::debug!(instrument, files = files.len(), ticks = ticks.len(), "instrument loaded");
        Ok((ticks, files))
    }

    pub fn load(&self, instruments: &[Symbol]) -> Result<LoadedTicks, LoadError> {
        let mut streams = Vec::with_capacity(instruments.len());
        let mut counts = BTreeMap::new();
        let mut all_files = Vec::new();

        for instrument in instruments {
            let (ticks, files) = self.load_instrument(instrument)?;
            counts.insert(instrument.clone(), ticks.len());
            all_files.extend(files);
            streams.push(ticks);
        }

        let ticks = MergedSource::new(streams).into_vec();
        let hash = dataset_hash(&ticks);
        tracing::info!(
            dir = %self.dir.display(),
            instruments = instruments.len(),
            ticks = ticks.len(),
            dataset_hash = &hash[..12],
            "tick data loaded"
        );
        Ok(LoadedTicks {
            ticks,
            counts,
            files: all_files,
            dataset_hash: hash,
        })
    }
}

fn belongs_to(path: &Path, instrument: &str) -> bool {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    is_csv
        && stem
            .strip_prefix(instrument)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['_', '-', '.']))
}

fn read_file(path: &Path, instrument: &str, out: &mut Vec<Tick>) -> Result<(), LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| LoadError::Csv {
            path: path.to_path_buf(),
            line: 0,
            message: e.to_string(),
        })?;

    for (idx, row) in reader.deserialize::<TickRow>().enumerate() {
        // header is line 1
        let line = idx as u64 + 2;
        let row = row.map_err(|e| LoadError::Csv {
            path: path.to_path_buf(),
            line,
            message: e.to_string(),
        })?;
        let timestamp = parse_timestamp(&row.time).ok_or_else(|| LoadError::BadTimestamp {
            path: path.to_path_buf(),
            line,
            value: row.time.clone(),
        })?;
        out.push(Tick::new(instrument, timestamp, row.bid, row.ask));
    }
    Ok(())
}
