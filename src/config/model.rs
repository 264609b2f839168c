// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::output::classifier::ClassifierSettings;
use crate::types::{KillScope, MessageImportance, TextEncoding};

/// Default wait after a kill before giving up on confirming process death.
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_millis(5000);

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [tool]
/// name = "cc"
/// args = ["-c", "main.c"]
///
/// [execution]
/// timeout_ms = 60000
/// environment = ["LANG=C", "CFLAGS=-O2"]
///
/// [output]
/// stderr_importance = "high"
/// ```
///
/// All sections are optional. Values that need validation (importance,
/// encodings, environment entries) are kept as strings here and checked by
/// `TryFrom<RawToolTaskConfig> for ToolTaskConfig`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawToolTaskConfig {
    #[serde(default)]
    pub tool: ToolSection,

    #[serde(default)]
    pub execution: ExecutionSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub verdict: VerdictSection,
}

/// `[tool]` section: what to run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    /// Executable name or path.
    #[serde(default)]
    pub name: Option<String>,

    /// Arguments passed inline (argv style, no shell parsing).
    #[serde(default)]
    pub args: Vec<String>,

    /// Pre-rendered response-file text. When non-empty it is written to a
    /// temporary file and referenced with `@"<path>"`.
    #[serde(default)]
    pub response_file: Option<String>,

    /// Directory containing the tool; overrides path resolution.
    #[serde(default)]
    pub tool_path: Option<PathBuf>,

    /// Executable file name; overrides `name` when building the path.
    #[serde(default)]
    pub tool_exe: Option<String>,
}

/// `[execution]` section: how to run it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionSection {
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// `NAME=VALUE` entries; later entries win.
    #[serde(default)]
    pub environment: Vec<String>,

    /// Milliseconds; absent or `-1` means no limit.
    #[serde(default)]
    pub timeout_ms: Option<i64>,

    #[serde(default)]
    pub use_command_processor: bool,

    #[serde(default)]
    pub echo_off: bool,

    #[serde(default)]
    pub kill_scope: KillScope,

    #[serde(default)]
    pub termination_grace_ms: Option<u64>,
}

/// `[output]` section: how tool output is decoded and logged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default)]
    pub stdout_importance: Option<String>,

    #[serde(default)]
    pub stderr_importance: Option<String>,

    /// Log every stderr line as an error, skipping classification.
    #[serde(default)]
    pub log_stderr_as_error: bool,

    #[serde(default)]
    pub stdout_encoding: Option<String>,

    #[serde(default)]
    pub stderr_encoding: Option<String>,

    #[serde(default)]
    pub response_file_encoding: Option<String>,

    /// Disable detection of `origin(line): error CODE: text` lines.
    #[serde(default)]
    pub ignore_standard_error_warning_format: bool,

    #[serde(default)]
    pub custom_error_regex: Option<String>,

    #[serde(default)]
    pub custom_warning_regex: Option<String>,

    /// Keep every logged line in the execution result.
    #[serde(default)]
    pub capture_output: bool,
}

/// `[verdict]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerdictSection {
    /// Report success even when the tool exits non-zero.
    #[serde(default)]
    pub ignore_exit_code: bool,

    /// Include full error chains when reporting launch failures.
    #[serde(default)]
    pub diagnostic: bool,
}

/// Validated configuration.
///
/// Constructed via `TryFrom<RawToolTaskConfig>`; holding one means no
/// configuration error can surface once execution starts.
#[derive(Debug, Clone)]
pub struct ToolTaskConfig {
    pub tool: ToolSection,
    pub settings: ToolTaskSettings,
    pub ignore_exit_code: bool,
}

/// Per-invocation execution settings, independent of which tool runs.
///
/// Every platform- or environment-dependent default is resolved into this
/// value once, when it is built.
#[derive(Debug, Clone)]
pub struct ToolTaskSettings {
    pub tool_path: Option<PathBuf>,
    pub tool_exe: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub environment: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub use_command_processor: bool,
    pub echo_off: bool,
    pub kill_scope: KillScope,
    pub termination_grace: Duration,
    pub stdout_importance: MessageImportance,
    pub stderr_importance: MessageImportance,
    pub log_stderr_as_error: bool,
    pub stdout_encoding: TextEncoding,
    pub stderr_encoding: TextEncoding,
    pub response_file_encoding: TextEncoding,
    pub classifier: ClassifierSettings,
    pub capture_output: bool,
    pub diagnostic: bool,
}

impl Default for ToolTaskSettings {
    fn default() -> Self {
        Self {
            tool_path: None,
            tool_exe: None,
            working_directory: None,
            environment: Vec::new(),
            timeout: None,
            use_command_processor: false,
            echo_off: false,
            kill_scope: KillScope::Tree,
            termination_grace: DEFAULT_TERMINATION_GRACE,
            stdout_importance: MessageImportance::Low,
            stderr_importance: MessageImportance::Normal,
            log_stderr_as_error: false,
            stdout_encoding: TextEncoding::Utf8,
            stderr_encoding: TextEncoding::Utf8,
            response_file_encoding: TextEncoding::Utf8,
            classifier: ClassifierSettings::default(),
            capture_output: false,
            diagnostic: false,
        }
    }
}
