// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `tooltask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tooltask",
    version,
    about = "Run one external tool, classify its output and report a verdict.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If the file does not exist and a tool is given after `--`, built-in
    /// defaults are used.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Override `[execution].timeout_ms`.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TOOLTASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the invocation, but don't start the tool.
    #[arg(long)]
    pub dry_run: bool,

    /// Tool and arguments; overrides `[tool].name` and `[tool].args`.
    #[arg(last = true, value_name = "TOOL [ARGS]...")]
    pub command: Vec<String>,
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
