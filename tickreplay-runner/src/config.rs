//! Run configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! csv_dir = "data/ticks"
//!
//! [output]
//! dir = "output"
//!
//! [engine]
//! instruments = ["GBPUSD", "EURUSD"]
//! initial_equity = 100000.0
//!
//! [engine.strategy]
//! window = 50
//! std_factor = 2.0
//!
//! [engine.sizing]
//! type = "FIXED_UNITS"
//! units = 10000.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickreplay_core::EngineConfig;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Overrides `[data] csv_dir`.
pub const ENV_CSV_DATA_DIR: &str = "TICKREPLAY_CSV_DATA_DIR";
/// Overrides `[output] dir`.
pub const ENV_OUTPUT_DIR: &str = "TICKREPLAY_OUTPUT_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine config: {0}")]
    Engine(#[from] tickreplay_core::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `<INSTRUMENT>*.csv` tick files.
    pub csv_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for per-run artifact directories.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub output: OutputConfig,

    pub engine: EngineConfig,
}

impl RunConfig {
    /// Parse and validate a TOML document. Environment overrides are not applied.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Replace directories with values from `lookup` (normally the process
    /// environment). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_CSV_DATA_DIR).filter(|v| !v.is_empty()) {
            tracing::debug!(dir = %dir, "csv data dir overridden from environment");
            self.data.csv_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            tracing::debug!(dir = %dir, "output dir overridden from environment");
            self.output.dir = PathBuf::from(dir);
        }
    }

    /// Deterministic hash of the engine configuration.
    ///
    /// Directories are excluded: the same engine config on the same data is
    /// the same run wherever it is read from or written to.
    pub fn run_id(&self) -> RunId {
        engine_run_id(&self.engine)
    }
}

pub fn engine_run_id(engine: &EngineConfig) -> RunId {
    // serializing plain data structs into a String cannot fail
    let json = serde_json::to_string(engine).unwrap_or_default();
    blake3::hash(json.as_bytes()).to_hex().to_string()
}
