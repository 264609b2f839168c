// src/exec/verdict.rs

//! Turning an exit code and the error log into pass/fail.

use crate::exec::tool::{ExitContext, ToolStrategy};
use crate::output::sink::TaskLogger;
use crate::types::Termination;

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Effective exit code. `-1` when the tool never produced a real code,
    /// or when it exited 0 after logging errors.
    pub exit_code: i32,
    /// Set when the tool was killed for a timeout or cancellation.
    pub termination: Option<Termination>,
    /// Whether any error was logged during the invocation.
    pub errors_logged: bool,
    pub success: bool,
    /// Captured output lines, when output capture is enabled.
    pub output: Vec<String>,
}

impl ExecutionResult {
    /// Result for a tool the strategy chose not to run.
    pub(crate) fn skipped() -> Self {
        Self {
            exit_code: 0,
            termination: None,
            errors_logged: false,
            success: true,
            output: Vec::new(),
        }
    }

    /// Result for an invocation that failed before the tool could run.
    pub(crate) fn not_run(termination: Option<Termination>, errors_logged: bool) -> Self {
        Self {
            exit_code: -1,
            termination,
            errors_logged,
            success: false,
            output: Vec::new(),
        }
    }
}

/// Effective exit code and pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub exit_code: i32,
    pub success: bool,
}

/// Reconcile the raw exit code with the error log.
///
/// - A killed tool always fails; its exit code is reported as captured.
/// - Exit code 0 with logged errors becomes `-1`.
/// - A non-zero code goes to the strategy's exit-code hook, which decides.
pub fn resolve_verdict(
    strategy: &dyn ToolStrategy,
    logger: &TaskLogger,
    tool: &str,
    raw_exit_code: i32,
    termination: Option<Termination>,
) -> Verdict {
    if termination.is_some() {
        return Verdict {
            exit_code: raw_exit_code,
            success: false,
        };
    }

    let exit_code = if raw_exit_code == 0 && logger.has_logged_errors() {
        -1
    } else {
        raw_exit_code
    };

    if exit_code == 0 {
        return Verdict {
            exit_code,
            success: true,
        };
    }

    let ctx = ExitContext {
        tool,
        exit_code,
        logger,
    };
    Verdict {
        exit_code,
        success: strategy.handle_task_execution_errors(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::exec::tool::CommandTool;
    use crate::output::sink::{ToolError, TracingSink};

    fn logger() -> TaskLogger {
        TaskLogger::new(Arc::new(TracingSink::default()))
    }

    #[test]
    fn clean_zero_exit_succeeds() {
        let logger = logger();
        let tool = CommandTool::new("t", vec![]);
        let v = resolve_verdict(&tool, &logger, "t", 0, None);
        assert_eq!(v, Verdict { exit_code: 0, success: true });
    }

    #[test]
    fn zero_exit_with_logged_errors_is_forced_to_minus_one() {
        let logger = logger();
        logger.error(ToolError::Stderr("error: x".to_string()));
        let tool = CommandTool::new("t", vec![]);
        let v = resolve_verdict(&tool, &logger, "t", 0, None);
        assert_eq!(v, Verdict { exit_code: -1, success: false });
    }

    #[test]
    fn termination_fails_regardless_of_exit_code() {
        let logger = logger();
        let tool = CommandTool::new("t", vec![]).ignore_exit_code(true);
        let v = resolve_verdict(&tool, &logger, "t", 0, Some(Termination::TimedOut));
        assert!(!v.success);
        assert!(!logger.has_logged_errors());
    }

    #[test]
    fn non_zero_exit_logs_an_error_once() {
        let logger = logger();
        let tool = CommandTool::new("t", vec![]);
        let v = resolve_verdict(&tool, &logger, "t", 7, None);
        assert_eq!(v, Verdict { exit_code: 7, success: false });
        assert!(logger.has_logged_errors());
    }
}
