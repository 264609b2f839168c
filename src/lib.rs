// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{RawToolTaskConfig, ToolTaskConfig, load_from_path};
use crate::exec::{CommandTool, ExecutionResult, ToolStrategy, ToolTask};
use crate::output::TracingSink;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the config-driven `CommandTool`
/// - Ctrl-C → cancellation
///
/// Returns the process exit code for the binary.
pub async fn run(args: CliArgs) -> Result<i32> {
    let raw = load_raw_config(&args)?;
    let raw = apply_cli_overrides(raw, &args);
    let config = ToolTaskConfig::try_from(raw).context("validating configuration")?;

    let tool = CommandTool::from_config(&config)?;
    let sink = Arc::new(TracingSink::new(tool.tool_name()));
    let task = ToolTask::new(tool, config.settings, sink);

    if args.dry_run {
        println!("{}", task.describe()?);
        return Ok(0);
    }

    // Ctrl-C → cooperative cancellation of the running tool.
    {
        let token = task.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; cancelling tool");
            token.cancel();
        });
    }

    let result = task.execute().await;
    Ok(process_exit_code(&result))
}

fn load_raw_config(args: &CliArgs) -> Result<RawToolTaskConfig> {
    let path = args.config.as_path();
    if path.exists() {
        return load_from_path(path)
            .with_context(|| format!("loading config file {}", path.display()));
    }
    if args.command.is_empty() {
        anyhow::bail!(
            "config file {} not found and no tool given after `--`",
            path.display()
        );
    }
    Ok(RawToolTaskConfig::default())
}

fn apply_cli_overrides(mut raw: RawToolTaskConfig, args: &CliArgs) -> RawToolTaskConfig {
    if let Some(ms) = args.timeout_ms {
        raw.execution.timeout_ms = Some(i64::try_from(ms).unwrap_or(i64::MAX));
    }
    if let Some((program, rest)) = args.command.split_first() {
        raw.tool.name = Some(program.clone());
        raw.tool.args = rest.to_vec();
    }
    raw
}

/// 0 on success; otherwise the tool's exit code, or 1 when that would read
/// as success.
pub fn process_exit_code(result: &ExecutionResult) -> i32 {
    if result.success {
        0
    } else if result.exit_code != 0 {
        result.exit_code
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(command: &[&str]) -> CliArgs {
        CliArgs {
            config: PathBuf::from("does-not-exist.toml"),
            timeout_ms: Some(250),
            log_level: None,
            dry_run: false,
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn trailing_command_overrides_tool_section() {
        let mut raw = RawToolTaskConfig::default();
        raw.tool.name = Some("old".to_string());
        raw.tool.args = vec!["x".to_string()];

        let raw = apply_cli_overrides(raw, &args(&["new", "-a", "b"]));
        assert_eq!(raw.tool.name.as_deref(), Some("new"));
        assert_eq!(raw.tool.args, vec!["-a".to_string(), "b".to_string()]);
        assert_eq!(raw.execution.timeout_ms, Some(250));
    }

    #[test]
    fn missing_config_without_command_is_an_error() {
        assert!(load_raw_config(&args(&[])).is_err());
        assert!(load_raw_config(&args(&["true"])).is_ok());
    }

    #[test]
    fn exit_code_never_reads_as_success_on_failure() {
        let mut result = ExecutionResult {
            exit_code: 0,
            termination: None,
            errors_logged: true,
            success: false,
            output: Vec::new(),
        };
        assert_eq!(process_exit_code(&result), 1);
        result.exit_code = 7;
        assert_eq!(process_exit_code(&result), 7);
        result.success = true;
        assert_eq!(process_exit_code(&result), 0);
    }
}
