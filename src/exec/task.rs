// src/exec/task.rs

//! `ToolTask`: run one external tool and report a verdict.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ToolTaskSettings;
use crate::errors::{Result, ToolTaskError};
use crate::exec::dispatcher::{DispatchOutcome, Dispatcher};
use crate::exec::invocation::{InvocationSpec, MAX_COMMAND_LINE_LENGTH, build_invocation};
use crate::exec::path::compute_path_to_tool;
use crate::exec::process::{KillOutcome, ProcessHandle};
use crate::exec::temp_files::TempArtifacts;
use crate::exec::tool::ToolStrategy;
use crate::exec::verdict::{ExecutionResult, resolve_verdict};
use crate::output::classifier::{CanonicalClassifier, OutputClassifier};
use crate::output::queue::OutputQueues;
use crate::output::router::LineRouter;
use crate::output::sink::{LogSink, TaskLogger, ToolError, ToolWarning};
use crate::types::{MessageImportance, Termination};

/// One tool, its settings and where to report.
///
/// `execute` may be called more than once; each call is an independent
/// invocation. Cancellation is cooperative: [`cancel`](Self::cancel) (or a
/// clone of [`cancellation_token`](Self::cancellation_token)) only raises a
/// signal, and the running invocation kills the tool through the same path
/// as a timeout.
pub struct ToolTask<S> {
    strategy: S,
    settings: ToolTaskSettings,
    sink: Arc<dyn LogSink>,
    classifier: Arc<dyn OutputClassifier>,
    cancel: CancellationToken,
}

impl<S: ToolStrategy> ToolTask<S> {
    pub fn new(strategy: S, settings: ToolTaskSettings, sink: Arc<dyn LogSink>) -> Self {
        let classifier = Arc::new(CanonicalClassifier::new(settings.classifier.clone()));
        Self {
            strategy,
            settings,
            sink,
            classifier,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the default canonical-format classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn OutputClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation. Idempotent, and a no-op once the tool exited.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolve the tool and render its command line without running it.
    ///
    /// Any response file or script is written and deleted again.
    pub fn describe(&self) -> Result<String> {
        let tool_path = compute_path_to_tool(&self.strategy, &self.settings)?;
        let logger = TaskLogger::new(Arc::clone(&self.sink));
        let mut temp = TempArtifacts::new();
        let spec = build_invocation(&tool_path, &self.strategy, &self.settings, &mut temp);
        temp.cleanup(&logger);

        let spec = spec?;
        Ok(match spec.response_file_text {
            Some(text) => format!("{}\n{text}", spec.command_line),
            None => spec.command_line,
        })
    }

    /// Run the tool to completion, timeout or cancellation.
    ///
    /// Never returns an error: every failure is logged to the sink and
    /// reflected in the result.
    pub async fn execute(&self) -> ExecutionResult {
        let tool = self.strategy.tool_name();
        let logger = TaskLogger::new(Arc::clone(&self.sink));

        match self.run(&logger, &tool).await {
            Ok(result) => {
                info!(
                    tool = %tool,
                    exit_code = result.exit_code,
                    success = result.success,
                    terminated = ?result.termination,
                    "tool task finished"
                );
                result
            }
            Err(err) => {
                error!(tool = %tool, error = %err, "tool task failed");
                logger.error(ToolError::Task(self.describe_error(&err)));
                ExecutionResult::not_run(None, true)
            }
        }
    }

    async fn run(&self, logger: &TaskLogger, tool: &str) -> Result<ExecutionResult> {
        self.strategy
            .validate_parameters()
            .map_err(ToolTaskError::InvalidParameters)?;

        if self.strategy.skip_task_execution() {
            info!(tool = %tool, "skipping tool execution");
            return Ok(ExecutionResult::skipped());
        }

        let tool_path = compute_path_to_tool(&self.strategy, &self.settings)?;

        let mut temp = TempArtifacts::new();
        let result = self.run_with_artifacts(logger, tool, &tool_path, &mut temp).await;
        temp.cleanup(logger);
        result
    }

    async fn run_with_artifacts(
        &self,
        logger: &TaskLogger,
        tool: &str,
        tool_path: &Path,
        temp: &mut TempArtifacts,
    ) -> Result<ExecutionResult> {
        let spec = build_invocation(tool_path, &self.strategy, &self.settings, temp)?;
        self.log_invocation(logger, &spec);

        if self.cancel.is_cancelled() {
            info!(tool = %tool, "cancelled before start; not launching");
            return Ok(ExecutionResult::not_run(
                Some(Termination::Cancelled),
                logger.has_logged_errors(),
            ));
        }

        let queues = OutputQueues::new();
        let mut process = ProcessHandle::start(&spec, tool, &queues)?;
        info!(
            tool = %tool,
            pid = ?process.pid(),
            timeout_ms = ?spec.timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            "tool started"
        );

        let mut router = LineRouter::new(
            logger,
            Arc::clone(&self.classifier),
            self.settings.stdout_importance,
            self.settings.stderr_importance,
            self.settings.log_stderr_as_error,
        )
        .capture_output(self.settings.capture_output);

        let outcome = Dispatcher::new(
            &queues,
            spec.timeout,
            self.cancel.clone(),
            spec.termination_grace,
        )
        .run(&mut process, &mut router)
        .await;

        let termination = match outcome {
            DispatchOutcome::Exited => None,
            DispatchOutcome::Terminated { reason, kill } => {
                logger.warning(ToolWarning::Terminated {
                    tool: tool.to_string(),
                    reason,
                });
                if kill == KillOutcome::NotConfirmed {
                    logger.warning(ToolWarning::KillNotConfirmed {
                        tool: tool.to_string(),
                        pid: process.pid(),
                    });
                }
                Some(reason)
            }
        };

        let raw_exit_code = process.exit_code();
        queues.dispose();
        drop(process);
        debug!(tool = %tool, raw_exit_code, "process released");

        let output = router.into_captured();
        let verdict = resolve_verdict(&self.strategy, logger, tool, raw_exit_code, termination);

        Ok(ExecutionResult {
            exit_code: verdict.exit_code,
            termination,
            errors_logged: logger.has_logged_errors(),
            success: verdict.success,
            output,
        })
    }

    fn log_invocation(&self, logger: &TaskLogger, spec: &InvocationSpec) {
        if spec.command_line_length > MAX_COMMAND_LINE_LENGTH {
            logger.warning(ToolWarning::CommandLineTooLong {
                length: spec.command_line_length,
            });
        }
        self.strategy.log_tool_command(logger, &spec.command_line);
        if let Some(text) = &spec.response_file_text {
            logger.message(MessageImportance::Low, text);
        }
    }

    fn describe_error(&self, err: &ToolTaskError) -> String {
        if self.settings.diagnostic {
            format!("{err}\n{err:#?}")
        } else {
            err.to_string()
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ToolTask<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolTask")
            .field("strategy", &self.strategy)
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
