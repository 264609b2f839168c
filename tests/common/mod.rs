#![allow(dead_code)]

use std::sync::Arc;

pub use tooltask_test_utils::builders;
pub use tooltask_test_utils::{init_tracing, with_timeout, RecordingSink, ScriptTool, SettingsBuilder};

use tooltask::config::ToolTaskSettings;
use tooltask::exec::{ToolStrategy, ToolTask};

/// A task reporting into a fresh `RecordingSink`; returns both.
pub fn recorded_task<S: ToolStrategy>(
    strategy: S,
    settings: ToolTaskSettings,
) -> (ToolTask<S>, RecordingSink) {
    init_tracing();
    let sink = RecordingSink::new();
    let task = ToolTask::new(strategy, settings, Arc::new(sink.clone()));
    (task, sink)
}
