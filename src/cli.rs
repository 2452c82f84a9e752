// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build static-site assets from a task graph and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Pipelines or tasks to run, in order (e.g. `build`, `start`, `css`).
    ///
    /// A task target runs its `after` dependencies first. Defaults to `build`.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// The directory containing it is treated as the project root.
    #[arg(long, value_name = "PATH", default_value = "Sitepipe.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print tasks, pipelines and watch rules, then exit.
    #[arg(long)]
    pub list: bool,

    /// Override `[server].port` for the dev server.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

impl CliArgs {
    /// Targets to run, falling back to `build` when none were given.
    pub fn effective_targets(&self) -> Vec<String> {
        if self.targets.is_empty() {
            vec!["build".to_string()]
        } else {
            self.targets.clone()
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
