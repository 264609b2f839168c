use std::path::PathBuf;

use tooltask::exec::{ExitContext, ToolStrategy, report_exit_code};

/// A tool that runs a shell snippet through `/bin/sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ScriptTool {
    script: String,
    extra_args: Vec<String>,
    response_file: String,
    invalid: Option<String>,
    skip: bool,
    ignore_exit_code: bool,
}

impl ScriptTool {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            ..Self::default()
        }
    }

    /// Positional parameters after `$0`; the script sees them as `$1..`.
    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.extra_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_response_file(mut self, text: &str) -> Self {
        self.response_file = text.to_string();
        self
    }

    pub fn invalid(mut self, reason: &str) -> Self {
        self.invalid = Some(reason.to_string());
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn ignoring_exit_code(mut self) -> Self {
        self.ignore_exit_code = true;
        self
    }
}

impl ToolStrategy for ScriptTool {
    fn tool_name(&self) -> String {
        "sh".to_string()
    }

    fn generate_full_path_to_tool(&self) -> Option<PathBuf> {
        Some(PathBuf::from("/bin/sh"))
    }

    fn generate_command_line_commands(&self) -> Vec<String> {
        let mut args = vec!["-c".to_string(), self.script.clone(), "sh".to_string()];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn generate_response_file_commands(&self) -> String {
        self.response_file.clone()
    }

    // The shell has no `@file` syntax; hand it the bare path as `$1`.
    fn response_file_switch(&self, path: &std::path::Path) -> String {
        shell_quote(&path.display().to_string())
    }

    fn validate_parameters(&self) -> Result<(), String> {
        match &self.invalid {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn skip_task_execution(&self) -> bool {
        self.skip
    }

    fn handle_task_execution_errors(&self, ctx: &ExitContext<'_>) -> bool {
        if self.ignore_exit_code && !ctx.errors_logged() {
            return true;
        }
        report_exit_code(ctx)
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
