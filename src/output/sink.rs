// src/output/sink.rs

//! The logging collaborator.
//!
//! The engine never prints anything itself: it reports the command line,
//! each output line, warnings and errors to a [`LogSink`]. [`TaskLogger`]
//! sits in front of the sink for one invocation and remembers whether any
//! error went through it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::types::{MessageImportance, Termination};

/// A warning or error recognised in a line of tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDiagnostic {
    /// File or tool the diagnostic points at, if the line named one.
    pub origin: Option<String>,
    /// Raw location text, e.g. `12,5`.
    pub location: Option<String>,
    /// Diagnostic code such as `CS0168`.
    pub code: Option<String>,
    pub text: String,
    /// The complete line as the tool printed it.
    pub line: String,
}

impl OutputDiagnostic {
    /// A diagnostic with no structure beyond the line itself.
    pub fn from_line(line: &str) -> Self {
        Self {
            origin: None,
            location: None,
            code: None,
            text: line.to_string(),
            line: line.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolWarning {
    /// Inline command line longer than the OS may accept.
    CommandLineTooLong { length: usize },
    /// A temporary response file or script could not be removed.
    TempFileNotDeleted { path: PathBuf, reason: String },
    /// The tool was killed before it exited.
    Terminated { tool: String, reason: Termination },
    /// The post-kill wait ran out before the OS confirmed the exit.
    KillNotConfirmed { tool: String, pid: Option<u32> },
    /// A warning line in the tool's output.
    Output(OutputDiagnostic),
}

impl fmt::Display for ToolWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolWarning::CommandLineTooLong { length } => write!(
                f,
                "command line is {length} characters long and may exceed the operating system limit"
            ),
            ToolWarning::TempFileNotDeleted { path, reason } => write!(
                f,
                "could not delete temporary file {}: {reason}",
                path.display()
            ),
            ToolWarning::Terminated { tool, reason } => write!(f, "'{tool}' {reason}; process killed"),
            ToolWarning::KillNotConfirmed { tool, pid } => match pid {
                Some(pid) => write!(f, "'{tool}' (pid {pid}) did not confirm exit after kill"),
                None => write!(f, "'{tool}' did not confirm exit after kill"),
            },
            ToolWarning::Output(diag) => f.write_str(&diag.line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// An error line in the tool's output.
    Output(OutputDiagnostic),
    /// A stderr line promoted to an error.
    Stderr(String),
    /// The tool exited non-zero without reporting an error of its own.
    ExitCode { tool: String, code: i32 },
    /// The invocation failed before or while starting the tool.
    Task(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Output(diag) => f.write_str(&diag.line),
            ToolError::Stderr(line) => f.write_str(line),
            ToolError::ExitCode { tool, code } => write!(f, "'{tool}' exited with code {code}"),
            ToolError::Task(message) => f.write_str(message),
        }
    }
}

/// Destination for everything an invocation reports.
pub trait LogSink: Send + Sync {
    /// The command line about to run.
    fn command_line(&self, command_line: &str);

    fn message(&self, importance: MessageImportance, text: &str);

    fn warning(&self, warning: &ToolWarning);

    fn error(&self, error: &ToolError);
}

/// Default sink: forwards everything to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    tool: String,
}

impl TracingSink {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl LogSink for TracingSink {
    fn command_line(&self, command_line: &str) {
        info!(tool = %self.tool, "{command_line}");
    }

    fn message(&self, importance: MessageImportance, text: &str) {
        match importance {
            MessageImportance::High | MessageImportance::Normal => {
                info!(tool = %self.tool, "{text}")
            }
            MessageImportance::Low => debug!(tool = %self.tool, "{text}"),
        }
    }

    fn warning(&self, warning: &ToolWarning) {
        warn!(tool = %self.tool, "{warning}");
    }

    fn error(&self, err: &ToolError) {
        error!(tool = %self.tool, "{err}");
    }
}

/// Per-invocation front for a [`LogSink`] that tracks logged errors.
pub struct TaskLogger {
    sink: Arc<dyn LogSink>,
    errors_logged: AtomicBool,
}

impl TaskLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            errors_logged: AtomicBool::new(false),
        }
    }

    pub fn command_line(&self, command_line: &str) {
        self.sink.command_line(command_line);
    }

    pub fn message(&self, importance: MessageImportance, text: &str) {
        self.sink.message(importance, text);
    }

    pub fn warning(&self, warning: ToolWarning) {
        self.sink.warning(&warning);
    }

    pub fn error(&self, error: ToolError) {
        self.errors_logged.store(true, Ordering::SeqCst);
        self.sink.error(&error);
    }

    /// Whether any error has been logged for this invocation so far.
    pub fn has_logged_errors(&self) -> bool {
        self.errors_logged.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TaskLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskLogger")
            .field("errors_logged", &self.has_logged_errors())
            .finish_non_exhaustive()
    }
}
