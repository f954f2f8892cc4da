use anyhow::{anyhow, Result};
use clap::ValueEnum;

/// Overrides `--log-level` with a full `EnvFilter` directive.
pub const ENV_LOG: &str = "TICKREPLAY_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logs go to stderr so stdout stays clean for summaries.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var(ENV_LOG).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow!("invalid log filter: {err}"))?;

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}
