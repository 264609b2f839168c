#![cfg(unix)]

mod common;
use crate::common::{recorded_task, with_timeout, ScriptTool, SettingsBuilder};

use std::path::{Path, PathBuf};

use tooltask::config::ToolTaskSettings;
use tooltask::exec::{CommandTool, MAX_COMMAND_LINE_LENGTH};
use tooltask::output::{ToolError, ToolWarning};
use tooltask::types::MessageImportance;

#[tokio::test]
async fn environment_overrides_reach_the_tool() {
    let (task, sink) = recorded_task(
        ScriptTool::new(r#"echo "A=$A B=$B""#),
        SettingsBuilder::new().env("A", "1").env("B", "2").build(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(result.success);
    assert!(sink.messages().contains(&"A=1 B=2".to_string()));
}

#[tokio::test]
async fn later_environment_entries_win() {
    let (task, sink) = recorded_task(
        ScriptTool::new(r#"echo "A=$A""#),
        SettingsBuilder::new().env("A", "first").env("A", "second").build(),
    );

    with_timeout(task.execute()).await;
    assert!(sink.messages().contains(&"A=second".to_string()));
}

#[tokio::test]
async fn working_directory_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let (task, sink) = recorded_task(
        ScriptTool::new("pwd -P"),
        SettingsBuilder::new().working_directory(dir.path()).build(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(result.success);

    let expected = dir.path().canonicalize().unwrap();
    assert!(sink
        .messages()
        .iter()
        .any(|m| Path::new(m) == expected.as_path()));
}

#[tokio::test]
async fn long_command_line_warns_once_and_still_runs() {
    let long = "x".repeat(MAX_COMMAND_LINE_LENGTH + 1);
    let (task, sink) = recorded_task(
        ScriptTool::new(r#"echo "${#1}""#).with_args(&[&long]),
        SettingsBuilder::new().build(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(result.success);

    let too_long = sink
        .warnings()
        .into_iter()
        .filter(|w| matches!(w, ToolWarning::CommandLineTooLong { .. }))
        .count();
    assert_eq!(too_long, 1);
    assert!(sink.messages().contains(&(MAX_COMMAND_LINE_LENGTH + 1).to_string()));
}

#[tokio::test]
async fn command_line_is_logged_once() {
    let (task, sink) = recorded_task(ScriptTool::new("echo hi"), SettingsBuilder::new().build());

    with_timeout(task.execute()).await;

    let lines = sink.command_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("/bin/sh -c"));
}

#[tokio::test]
async fn response_file_is_passed_and_removed() {
    let (task, sink) = recorded_task(
        ScriptTool::new(r#"cat "$1"; echo; echo "path=$1""#).with_response_file("--flag value"),
        SettingsBuilder::new().build(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(result.success, "{:?}", sink.events());

    let messages = sink.messages_with_importance();
    // Response-file text is logged at low importance, then echoed by the tool.
    assert_eq!(
        messages
            .iter()
            .filter(|(_, m)| m == "--flag value")
            .map(|(imp, _)| *imp)
            .collect::<Vec<_>>(),
        vec![MessageImportance::Low, MessageImportance::Low]
    );

    let path = sink
        .messages()
        .into_iter()
        .find_map(|m| m.strip_prefix("path=").map(PathBuf::from))
        .expect("tool printed the response file path");
    assert!(!path.exists());
}

#[tokio::test]
async fn command_processor_runs_through_a_script() {
    let (task, sink) = recorded_task(
        ScriptTool::new(r#"echo "via $0""#),
        SettingsBuilder::new().command_processor().build(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(result.success, "{:?}", sink.events());
    assert!(sink.messages().contains(&"via sh".to_string()));
    assert!(sink.warnings().is_empty());
}

#[tokio::test]
async fn missing_bare_tool_is_a_launch_failure() {
    let (task, sink) = recorded_task(
        CommandTool::new("tooltask-no-such-tool-4711", Vec::new()),
        ToolTaskSettings::default(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(!result.success);
    assert_eq!(result.exit_code, -1);
    assert_eq!(result.termination, None);

    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ToolError::Task(_)));
    assert!(errors[0].to_string().contains("tooltask-no-such-tool-4711"));
}

#[tokio::test]
async fn missing_explicit_path_is_reported_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let (task, sink) = recorded_task(
        CommandTool::new("cc", Vec::new()),
        SettingsBuilder::new().tool_path(dir.path()).build(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(!result.success);
    assert!(sink.command_lines().is_empty());
    assert!(sink.errors()[0].to_string().contains(&dir.path().display().to_string()));
}

#[tokio::test]
async fn bare_tool_is_resolved_on_path() {
    let (task, sink) = recorded_task(
        CommandTool::new("sh", vec!["-c".to_string(), "echo found".to_string()]),
        ToolTaskSettings::default(),
    );

    let result = with_timeout(task.execute()).await;
    assert!(result.success);
    assert!(sink.messages().contains(&"found".to_string()));
    assert!(sink.command_lines()[0].contains("/sh"));
}

#[test]
fn describe_renders_without_running() {
    let tool = ScriptTool::new("echo hi").with_response_file("-v");
    let (task, sink) = recorded_task(tool, SettingsBuilder::new().build());

    let text = task.describe().unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("/bin/sh -c 'echo hi' sh /"));
    assert_eq!(lines.next(), Some("-v"));
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn diagnostic_mode_adds_the_error_details() {
    let run = |settings: ToolTaskSettings| async move {
        let (task, sink) = recorded_task(
            CommandTool::new("tooltask-no-such-tool-4711", Vec::new()),
            settings,
        );
        with_timeout(task.execute()).await;
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ToolError::Task(text) => text.clone(),
            other => panic!("unexpected error {other:?}"),
        }
    };

    let plain = run(SettingsBuilder::new().build()).await;
    assert!(plain.contains("failed to launch 'tooltask-no-such-tool-4711'"));
    assert!(!plain.contains("LaunchFailed"));
    assert_eq!(plain.lines().count(), 1);

    let detailed = run(SettingsBuilder::new().diagnostic().build()).await;
    assert!(detailed.starts_with(&plain));
    assert!(detailed.contains("LaunchFailed"));
    assert!(detailed.contains("NotFound"));
}
