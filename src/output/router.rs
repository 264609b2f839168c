// src/output/router.rs

//! Routes drained lines to the sink.

use std::sync::Arc;

use crate::output::classifier::{Classification, OutputClassifier};
use crate::output::sink::{TaskLogger, ToolError, ToolWarning};
use crate::output::StreamKind;
use crate::types::MessageImportance;

/// Sends each drained line through the classifier (or straight to the error
/// channel for stderr when `log_stderr_as_error` is set).
pub struct LineRouter<'a> {
    logger: &'a TaskLogger,
    classifier: Arc<dyn OutputClassifier>,
    stdout_importance: MessageImportance,
    stderr_importance: MessageImportance,
    log_stderr_as_error: bool,
    captured: Option<Vec<String>>,
}

impl<'a> LineRouter<'a> {
    pub fn new(
        logger: &'a TaskLogger,
        classifier: Arc<dyn OutputClassifier>,
        stdout_importance: MessageImportance,
        stderr_importance: MessageImportance,
        log_stderr_as_error: bool,
    ) -> Self {
        Self {
            logger,
            classifier,
            stdout_importance,
            stderr_importance,
            log_stderr_as_error,
            captured: None,
        }
    }

    /// Also keep every routed line, in routing order.
    pub fn capture_output(mut self, enabled: bool) -> Self {
        self.captured = enabled.then(Vec::new);
        self
    }

    pub fn route(&mut self, stream: StreamKind, line: String) {
        if stream == StreamKind::Stderr && self.log_stderr_as_error {
            self.logger.error(ToolError::Stderr(line.clone()));
        } else {
            let importance = match stream {
                StreamKind::Stdout => self.stdout_importance,
                StreamKind::Stderr => self.stderr_importance,
            };
            match self.classifier.classify(&line) {
                Classification::Error(diag) => self.logger.error(ToolError::Output(diag)),
                Classification::Warning(diag) => self.logger.warning(ToolWarning::Output(diag)),
                Classification::Message => self.logger.message(importance, &line),
            }
        }

        if let Some(captured) = self.captured.as_mut() {
            captured.push(line);
        }
    }

    /// Lines kept by [`capture_output`](Self::capture_output).
    pub fn into_captured(self) -> Vec<String> {
        self.captured.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::classifier::CanonicalClassifier;
    use crate::output::sink::TracingSink;

    fn router(logger: &TaskLogger, stderr_as_error: bool) -> LineRouter<'_> {
        LineRouter::new(
            logger,
            Arc::new(CanonicalClassifier::default()),
            MessageImportance::Low,
            MessageImportance::Normal,
            stderr_as_error,
        )
    }

    #[test]
    fn plain_stderr_is_not_an_error_by_default() {
        let logger = TaskLogger::new(Arc::new(TracingSink::default()));
        let mut r = router(&logger, false);
        r.route(StreamKind::Stderr, "just noise".to_string());
        assert!(!logger.has_logged_errors());
    }

    #[test]
    fn stderr_as_error_bypasses_classification() {
        let logger = TaskLogger::new(Arc::new(TracingSink::default()));
        let mut r = router(&logger, true);
        r.route(StreamKind::Stdout, "stdout stays a message".to_string());
        assert!(!logger.has_logged_errors());
        r.route(StreamKind::Stderr, "just noise".to_string());
        assert!(logger.has_logged_errors());
    }

    #[test]
    fn captures_lines_when_enabled() {
        let logger = TaskLogger::new(Arc::new(TracingSink::default()));
        let mut r = router(&logger, false).capture_output(true);
        r.route(StreamKind::Stdout, "a".to_string());
        r.route(StreamKind::Stderr, String::new());
        assert_eq!(r.into_captured(), vec!["a".to_string(), String::new()]);
    }
}
