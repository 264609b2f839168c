// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::model::{
    DEFAULT_TERMINATION_GRACE, RawToolTaskConfig, ToolTaskConfig, ToolTaskSettings,
};
use crate::errors::{Result, ToolTaskError};
use crate::output::classifier::ClassifierSettings;
use crate::types::{MessageImportance, TextEncoding};

/// Environment variable that overrides the post-kill grace period (ms).
pub const TERMINATION_GRACE_ENV: &str = "TOOLTASK_TERMINATION_GRACE_MS";

impl TryFrom<RawToolTaskConfig> for ToolTaskConfig {
    type Error = ToolTaskError;

    fn try_from(raw: RawToolTaskConfig) -> std::result::Result<Self, Self::Error> {
        let env_grace = std::env::var(TERMINATION_GRACE_ENV).ok();
        let settings = validate_settings(&raw, env_grace.as_deref())?;

        Ok(ToolTaskConfig {
            tool: raw.tool,
            settings,
            ignore_exit_code: raw.verdict.ignore_exit_code,
        })
    }
}

fn validate_settings(raw: &RawToolTaskConfig, env_grace: Option<&str>) -> Result<ToolTaskSettings> {
    let exec = &raw.execution;
    let out = &raw.output;
    let defaults = ToolTaskSettings::default();

    Ok(ToolTaskSettings {
        tool_path: raw.tool.tool_path.clone(),
        tool_exe: non_empty(raw.tool.tool_exe.as_deref()),
        working_directory: exec.working_directory.clone(),
        environment: parse_environment(&exec.environment)?,
        timeout: parse_timeout(exec.timeout_ms)?,
        use_command_processor: exec.use_command_processor,
        echo_off: exec.echo_off,
        kill_scope: exec.kill_scope,
        termination_grace: resolve_termination_grace(exec.termination_grace_ms, env_grace),
        stdout_importance: parse_importance(
            "output.stdout_importance",
            out.stdout_importance.as_deref(),
            defaults.stdout_importance,
        )?,
        stderr_importance: parse_importance(
            "output.stderr_importance",
            out.stderr_importance.as_deref(),
            defaults.stderr_importance,
        )?,
        log_stderr_as_error: out.log_stderr_as_error,
        stdout_encoding: parse_encoding("output.stdout_encoding", out.stdout_encoding.as_deref())?,
        stderr_encoding: parse_encoding("output.stderr_encoding", out.stderr_encoding.as_deref())?,
        response_file_encoding: parse_encoding(
            "output.response_file_encoding",
            out.response_file_encoding.as_deref(),
        )?,
        classifier: ClassifierSettings {
            ignore_standard_format: out.ignore_standard_error_warning_format,
            custom_error: parse_regex("output.custom_error_regex", out.custom_error_regex.as_deref())?,
            custom_warning: parse_regex(
                "output.custom_warning_regex",
                out.custom_warning_regex.as_deref(),
            )?,
        },
        capture_output: out.capture_output,
        diagnostic: raw.verdict.diagnostic,
    })
}

/// Parse `NAME=VALUE` entries, preserving order.
///
/// The value may itself contain `=`; an entry without `=` or with an empty
/// name is rejected.
pub fn parse_environment(entries: &[String]) -> Result<Vec<(String, String)>> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.to_string(), value.to_string()))
            }
            _ => Err(ToolTaskError::InvalidEnvironmentEntry {
                entry: entry.clone(),
            }),
        })
        .collect()
}

/// Resolve the grace period: the environment override wins over config,
/// config wins over the built-in default. An unparsable override is ignored.
pub fn resolve_termination_grace(config_ms: Option<u64>, env_value: Option<&str>) -> Duration {
    env_value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .or(config_ms)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TERMINATION_GRACE)
}

fn parse_timeout(timeout_ms: Option<i64>) -> Result<Option<Duration>> {
    match timeout_ms {
        None | Some(-1) => Ok(None),
        Some(ms) if ms < 0 => Err(ToolTaskError::Config(format!(
            "[execution].timeout_ms must be >= 0 or -1 for no limit (got {ms})"
        ))),
        Some(ms) => Ok(Some(Duration::from_millis(ms as u64))),
    }
}

fn parse_importance(
    field: &'static str,
    value: Option<&str>,
    default: MessageImportance,
) -> Result<MessageImportance> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ToolTaskError::InvalidImportance {
            field,
            value: v.to_string(),
        }),
    }
}

fn parse_encoding(field: &'static str, value: Option<&str>) -> Result<TextEncoding> {
    match value {
        None => Ok(TextEncoding::default()),
        Some(v) => v.parse().map_err(|_| ToolTaskError::InvalidEncoding {
            field,
            value: v.to_string(),
        }),
    }
}

fn parse_regex(field: &'static str, value: Option<&str>) -> Result<Option<Regex>> {
    match non_empty(value) {
        None => Ok(None),
        Some(pattern) => Regex::new(&pattern)
            .map(Some)
            .map_err(|source| ToolTaskError::InvalidRegex { field, source }),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
