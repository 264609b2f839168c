// src/exec/path.rs

//! Resolving the tool executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ToolTaskSettings;
use crate::errors::{Result, ToolTaskError};
use crate::exec::tool::ToolStrategy;

/// Work out which executable to start.
///
/// - `tool_path` (a directory) wins, joined with `tool_exe` or the tool name.
/// - Otherwise the strategy's full path is used, with its file name replaced
///   by `tool_exe` when that is set.
/// - A bare file name is looked up on `PATH`. Not finding it is not an
///   error here; the spawn will fail and report it.
/// - Anything with a directory component must exist.
pub fn compute_path_to_tool(
    strategy: &dyn ToolStrategy,
    settings: &ToolTaskSettings,
) -> Result<PathBuf> {
    let exe_name = settings
        .tool_exe
        .clone()
        .unwrap_or_else(|| strategy.tool_name());

    let candidate = match &settings.tool_path {
        Some(dir) => dir.join(&exe_name),
        None => match strategy.generate_full_path_to_tool() {
            Some(full) if settings.tool_exe.is_some() => full.with_file_name(&exe_name),
            Some(full) => full,
            None => PathBuf::from(&exe_name),
        },
    };

    if is_bare_file_name(&candidate) {
        let path_var = std::env::var_os("PATH");
        return Ok(match find_on_path(candidate.as_os_str(), path_var.as_deref()) {
            Some(found) => {
                debug!(tool = %exe_name, path = %found.display(), "resolved tool on PATH");
                found
            }
            None => {
                debug!(tool = %exe_name, "tool not found on PATH; leaving it to the OS");
                candidate
            }
        });
    }

    if !candidate.exists() {
        return Err(ToolTaskError::ToolNotFound { path: candidate });
    }
    Ok(candidate)
}

fn is_bare_file_name(path: &Path) -> bool {
    path.parent().is_none_or(|p| p.as_os_str().is_empty())
}

/// Search each directory in `path_var` for `name`.
pub fn find_on_path(name: &OsStr, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, name))
        .find(|p| p.is_file())
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &OsStr) -> Vec<PathBuf> {
    let base = dir.join(name);
    if base.extension().is_some() {
        return vec![base];
    }
    vec![base.with_extension("exe"), base.with_extension("cmd"), base.with_extension("bat")]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &OsStr) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::exec::tool::CommandTool;

    #[test]
    fn explicit_missing_path_is_tool_not_found() {
        let tool = CommandTool::new("/definitely/not/here/cc", vec![]);
        let err = compute_path_to_tool(&tool, &ToolTaskSettings::default()).unwrap_err();
        assert!(matches!(err, ToolTaskError::ToolNotFound { .. }));
    }

    #[test]
    fn unknown_bare_name_is_passed_through() {
        let tool = CommandTool::new("no-such-tool-xyz", vec![]);
        let path = compute_path_to_tool(&tool, &ToolTaskSettings::default()).unwrap();
        assert_eq!(path, PathBuf::from("no-such-tool-xyz"));
    }

    #[test]
    fn tool_path_and_tool_exe_override_the_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("real-tool");
        fs::write(&exe, b"").unwrap();

        let settings = ToolTaskSettings {
            tool_path: Some(dir.path().to_path_buf()),
            tool_exe: Some("real-tool".to_string()),
            ..ToolTaskSettings::default()
        };
        let tool = CommandTool::new("/elsewhere/other-tool", vec![]);
        assert_eq!(compute_path_to_tool(&tool, &settings).unwrap(), exe);
    }

    #[cfg(not(windows))]
    #[test]
    fn finds_file_in_path_directories() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("mytool"), b"").unwrap();

        let joined = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_on_path(OsStr::new("mytool"), Some(&joined));
        assert_eq!(found, Some(second.path().join("mytool")));
        assert_eq!(find_on_path(OsStr::new("missing"), Some(&joined)), None);
    }
}
