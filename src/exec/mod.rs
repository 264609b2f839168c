// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`tool`] defines the per-tool [`ToolStrategy`] hooks and the generic
//!   config-driven [`CommandTool`].
//! - [`path`] resolves the executable.
//! - [`invocation`] renders the command line, response file and optional
//!   command-processor script into an [`InvocationSpec`].
//! - [`temp_files`] owns those temporary files.
//! - [`process`] starts the tool, kills it and reports its exit code.
//! - [`dispatcher`] is the notification loop that drains output and
//!   enforces timeout and cancellation.
//! - [`verdict`] reconciles exit code and logged errors.
//! - [`task`] ties it together as [`ToolTask`].

pub mod dispatcher;
pub mod invocation;
pub mod path;
pub mod process;
pub mod task;
pub mod temp_files;
pub mod tool;
pub mod verdict;

pub use invocation::{InvocationSpec, MAX_COMMAND_LINE_LENGTH};
pub use process::KillOutcome;
pub use task::ToolTask;
pub use tool::{CommandTool, ExitContext, ToolStrategy, report_exit_code};
pub use verdict::{ExecutionResult, Verdict, resolve_verdict};
