use std::sync::{Arc, Mutex};

use tooltask::output::{LogSink, ToolError, ToolWarning};
use tooltask::types::MessageImportance;

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    CommandLine(String),
    Message(MessageImportance, String),
    Warning(ToolWarning),
    Error(ToolError),
}

/// A sink that remembers every call, in order.
///
/// Cloning shares the underlying log, so a test can keep one handle and give
/// the other to the task.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.filter(|e| match e {
            Recorded::CommandLine(line) => Some(line.clone()),
            _ => None,
        })
    }

    /// Message texts, without their importance.
    pub fn messages(&self) -> Vec<String> {
        self.filter(|e| match e {
            Recorded::Message(_, text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn messages_with_importance(&self) -> Vec<(MessageImportance, String)> {
        self.filter(|e| match e {
            Recorded::Message(importance, text) => Some((*importance, text.clone())),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<ToolWarning> {
        self.filter(|e| match e {
            Recorded::Warning(w) => Some(w.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<ToolError> {
        self.filter(|e| match e {
            Recorded::Error(err) => Some(err.clone()),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&Recorded) -> Option<T>) -> Vec<T> {
        self.events.lock().unwrap().iter().filter_map(f).collect()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

impl LogSink for RecordingSink {
    fn command_line(&self, command_line: &str) {
        self.push(Recorded::CommandLine(command_line.to_string()));
    }

    fn message(&self, importance: MessageImportance, text: &str) {
        self.push(Recorded::Message(importance, text.to_string()));
    }

    fn warning(&self, warning: &ToolWarning) {
        self.push(Recorded::Warning(warning.clone()));
    }

    fn error(&self, error: &ToolError) {
        self.push(Recorded::Error(error.clone()));
    }
}
