// src/exec/invocation.rs

//! Building the immutable description of one process launch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ToolTaskSettings;
use crate::errors::Result;
use crate::exec::temp_files::TempArtifacts;
use crate::exec::tool::ToolStrategy;
use crate::types::{KillScope, TextEncoding};

/// Inline command lines longer than this may be rejected by the OS.
pub const MAX_COMMAND_LINE_LENGTH: usize = 32_000;

/// Everything needed to start the tool. Not modified once execution starts.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    /// Applied in order, so later entries win.
    pub environment: Vec<(String, String)>,
    pub stdout_encoding: TextEncoding,
    pub stderr_encoding: TextEncoding,
    pub timeout: Option<Duration>,
    pub kill_scope: KillScope,
    pub termination_grace: Duration,
    /// The tool command as it will run, for logging.
    pub command_line: String,
    /// Length of the inline arguments, excluding the tool path.
    pub command_line_length: usize,
    /// Response-file text as written, if a response file is used.
    pub response_file_text: Option<String>,
}

/// Render the tool's command line, write any response file or script, and
/// produce the launch description.
pub fn build_invocation(
    tool_path: &Path,
    strategy: &dyn ToolStrategy,
    settings: &ToolTaskSettings,
    temp: &mut TempArtifacts,
) -> Result<InvocationSpec> {
    let mut args = strategy.generate_command_line_commands();

    let response_commands = strategy.generate_response_file_commands();
    let response_file_text = if response_commands.trim().is_empty() {
        None
    } else {
        let text = strategy.response_file_escape(&response_commands);
        let path = temp.write(".rsp", &settings.response_file_encoding.encode(&text))?;
        args.extend(switch_args(&strategy.response_file_switch(&path)));
        Some(text)
    };

    let inline = join_command_line(args.iter().map(String::as_str));
    let tool = tool_path.to_string_lossy();
    let command_line = if inline.is_empty() {
        join_command_line([&*tool])
    } else {
        format!("{} {inline}", join_command_line([&*tool]))
    };

    let (program, args) = if settings.use_command_processor {
        wrap_in_command_processor(&command_line, settings.echo_off, temp)?
    } else {
        (tool_path.to_path_buf(), args)
    };

    Ok(InvocationSpec {
        program,
        args,
        working_directory: settings.working_directory.clone(),
        environment: settings.environment.clone(),
        stdout_encoding: settings.stdout_encoding,
        stderr_encoding: settings.stderr_encoding,
        timeout: settings.timeout,
        kill_scope: settings.kill_scope,
        termination_grace: settings.termination_grace,
        command_line_length: inline.chars().count(),
        command_line,
        response_file_text,
    })
}

/// Turn the switch text (e.g. `@"/tmp/x.rsp"`) into argv elements, the way
/// a shell would split it.
fn switch_args(switch: &str) -> Vec<String> {
    shell_words::split(switch).unwrap_or_else(|_| vec![switch.to_string()])
}

/// Write the command line to a script and run it through the platform's
/// command interpreter.
#[cfg(not(windows))]
fn wrap_in_command_processor(
    command_line: &str,
    _echo_off: bool,
    temp: &mut TempArtifacts,
) -> Result<(PathBuf, Vec<String>)> {
    // sh does not echo script lines, so there is nothing to suppress.
    let script = format!("{command_line}\n");
    let path = temp.write(".sh", script.as_bytes())?;
    Ok((
        PathBuf::from("/bin/sh"),
        vec![path.to_string_lossy().into_owned()],
    ))
}

#[cfg(windows)]
fn wrap_in_command_processor(
    command_line: &str,
    echo_off: bool,
    temp: &mut TempArtifacts,
) -> Result<(PathBuf, Vec<String>)> {
    let script = format!("{command_line}\r\n");
    let path = temp.write(".cmd", script.as_bytes())?;

    let mut args = Vec::new();
    if echo_off {
        args.push("/Q".to_string());
    }
    args.extend(["/D".to_string(), "/C".to_string()]);
    args.push(path.to_string_lossy().into_owned());
    Ok((PathBuf::from("cmd.exe"), args))
}

#[cfg(not(windows))]
fn join_command_line<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    shell_words::join(parts)
}

#[cfg(windows)]
fn join_command_line<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|p| {
            if p.is_empty() || p.contains([' ', '\t', '"']) {
                format!("\"{}\"", p.replace('"', "\\\""))
            } else {
                p.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
