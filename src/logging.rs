// src/logging.rs

//! Logging setup for `sitepipe` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen as:
//! 1. `--log-level` CLI flag, applied to sitepipe and the dev server's
//!    request tracing
//! 2. `SITEPIPE_LOG`, read as `EnvFilter` directives
//!    (e.g. `debug` or `sitepipe::watch=trace,tower_http=debug`)
//! 3. `info`
//!
//! Logs go to stderr so task output piped from stdout stays clean.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SITEPIPE_LOG";

/// Install the global subscriber. Call once, at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing tracing subscriber")?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        let level = level_name(level);
        return Ok(EnvFilter::new(format!(
            "warn,sitepipe={level},tower_http={level}"
        )));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value '{directives}'")),
        None => Ok(EnvFilter::new("info")),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Debug), Some("error")).unwrap();
        assert!(filter.to_string().contains("sitepipe=debug"));
    }

    #[test]
    fn env_directives_are_used_verbatim() {
        let filter = build_filter(None, Some("sitepipe::watch=trace")).unwrap();
        assert!(filter.to_string().contains("sitepipe::watch=trace"));
    }

    #[test]
    fn blank_env_falls_back_to_info() {
        let filter = build_filter(None, Some("  ")).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn garbage_env_is_rejected() {
        assert!(build_filter(None, Some("sitepipe=loud")).is_err());
    }
}
