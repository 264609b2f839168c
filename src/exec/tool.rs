// src/exec/tool.rs

//! Per-tool customisation points.
//!
//! A [`ToolStrategy`] supplies everything that differs between tools: its
//! name and path, how its command line and response file are rendered, and
//! how a non-zero exit code is judged. Every method except `tool_name` has a
//! default, so a simple tool only implements what it needs.

use std::path::{Path, PathBuf};

use crate::config::ToolTaskConfig;
use crate::errors::{Result, ToolTaskError};
use crate::output::sink::{TaskLogger, ToolError};
use crate::types::MessageImportance;

/// What the exit-code hook gets to look at.
#[derive(Debug)]
pub struct ExitContext<'a> {
    pub tool: &'a str,
    pub exit_code: i32,
    pub logger: &'a TaskLogger,
}

impl ExitContext<'_> {
    pub fn errors_logged(&self) -> bool {
        self.logger.has_logged_errors()
    }
}

pub trait ToolStrategy: Send + Sync {
    /// Executable file name, e.g. `cc` or `csc.exe`.
    fn tool_name(&self) -> String;

    /// Full path to the tool, if the strategy knows it. `None` means "search
    /// for `tool_name` on the system path".
    fn generate_full_path_to_tool(&self) -> Option<PathBuf> {
        None
    }

    /// Arguments passed directly on the command line.
    fn generate_command_line_commands(&self) -> Vec<String> {
        Vec::new()
    }

    /// Text written to a response file. Empty means no response file.
    fn generate_response_file_commands(&self) -> String {
        String::new()
    }

    /// Applied to the response-file text before it is written.
    fn response_file_escape(&self, text: &str) -> String {
        text.to_string()
    }

    /// Command-line text that makes the tool read `path`.
    fn response_file_switch(&self, path: &Path) -> String {
        format!("@\"{}\"", path.display())
    }

    /// Reject bad parameters before anything else happens.
    fn validate_parameters(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Return `true` to report success without running the tool.
    fn skip_task_execution(&self) -> bool {
        false
    }

    /// Called when the effective exit code is non-zero. Returns whether the
    /// task should still be reported as successful.
    fn handle_task_execution_errors(&self, ctx: &ExitContext<'_>) -> bool {
        report_exit_code(ctx)
    }

    fn log_tool_command(&self, logger: &TaskLogger, command_line: &str) {
        logger.command_line(command_line);
    }
}

/// Default exit-code handling: make sure the log says why the task failed,
/// then fail it.
pub fn report_exit_code(ctx: &ExitContext<'_>) -> bool {
    if !ctx.errors_logged() {
        ctx.logger.error(ToolError::ExitCode {
            tool: ctx.tool.to_string(),
            code: ctx.exit_code,
        });
    }
    false
}

/// Generic tool driven by configuration: a program, its arguments and an
/// optional response file.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: String,
    args: Vec<String>,
    response_file: Option<String>,
    ignore_exit_code: bool,
}

impl CommandTool {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            response_file: None,
            ignore_exit_code: false,
        }
    }

    pub fn with_response_file(mut self, text: impl Into<String>) -> Self {
        self.response_file = Some(text.into());
        self
    }

    pub fn ignore_exit_code(mut self, ignore: bool) -> Self {
        self.ignore_exit_code = ignore;
        self
    }

    pub fn from_config(config: &ToolTaskConfig) -> Result<Self> {
        let program = config
            .tool
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolTaskError::Config("[tool].name is required".to_string()))?;

        let mut tool = CommandTool::new(program, config.tool.args.clone())
            .ignore_exit_code(config.ignore_exit_code);
        if let Some(text) = &config.tool.response_file {
            tool = tool.with_response_file(text.clone());
        }
        Ok(tool)
    }
}

impl ToolStrategy for CommandTool {
    fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }

    fn generate_full_path_to_tool(&self) -> Option<PathBuf> {
        let path = PathBuf::from(&self.program);
        let has_dir = path.parent().is_some_and(|p| !p.as_os_str().is_empty());
        has_dir.then_some(path)
    }

    fn generate_command_line_commands(&self) -> Vec<String> {
        self.args.clone()
    }

    fn generate_response_file_commands(&self) -> String {
        self.response_file.clone().unwrap_or_default()
    }

    fn validate_parameters(&self) -> std::result::Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("no program to run".to_string());
        }
        Ok(())
    }

    fn handle_task_execution_errors(&self, ctx: &ExitContext<'_>) -> bool {
        if self.ignore_exit_code && !ctx.errors_logged() {
            ctx.logger.message(
                MessageImportance::Normal,
                &format!("'{}' exited with code {}; ignored", ctx.tool, ctx.exit_code),
            );
            return true;
        }
        report_exit_code(ctx)
    }
}
