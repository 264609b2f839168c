// src/output/mod.rs

//! Everything between a tool's standard streams and the log sink.
//!
//! - [`reader`] pumps one stream into an [`OutputQueue`], a line at a time.
//! - [`queue`] holds captured lines until the dispatcher drains them.
//! - [`classifier`] decides whether a line is an error, a warning or a
//!   plain message.
//! - [`router`] sends drained lines through the classifier to the sink.
//! - [`sink`] is the logging collaborator plus the error-tracking wrapper
//!   the verdict depends on.

pub mod classifier;
pub mod queue;
pub mod reader;
pub mod router;
pub mod sink;

pub use classifier::{CanonicalClassifier, Classification, ClassifierSettings, OutputClassifier};
pub use queue::{Disposal, OutputQueue, OutputQueues};
pub use router::LineRouter;
pub use sink::{LogSink, OutputDiagnostic, TaskLogger, ToolError, ToolWarning, TracingSink};

use std::fmt;

/// Which standard stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}
