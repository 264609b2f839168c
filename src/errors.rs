// src/errors.rs

//! Crate-wide error type.
//!
//! Every failure is tagged at the point where it happens, carrying the data
//! needed to report it. Nothing downstream inspects OS error types to pick a
//! message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolTaskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("invalid environment entry '{entry}': expected NAME=VALUE with a non-empty name")]
    InvalidEnvironmentEntry { entry: String },

    #[error("invalid value '{value}' for {field}: expected high, normal or low")]
    InvalidImportance { field: &'static str, value: String },

    #[error("invalid value '{value}' for {field}: expected utf-8, utf-8-bom, latin1 or ascii")]
    InvalidEncoding { field: &'static str, value: String },

    #[error("invalid regular expression for {field}: {source}")]
    InvalidRegex {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("parameters rejected by tool: {0}")]
    InvalidParameters(String),

    #[error("tool not found: {}", path.display())]
    ToolNotFound { path: PathBuf },

    #[error("failed to launch '{tool}' ({kind}): {source}")]
    LaunchFailed {
        tool: String,
        kind: LaunchFailureKind,
        #[source]
        source: io::Error,
    },

    #[error("could not write temporary file: {source}")]
    TempFile {
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolTaskError {
    /// Tag a spawn failure with its kind at the point it happened.
    pub fn launch_failed(tool: &str, source: io::Error) -> Self {
        ToolTaskError::LaunchFailed {
            tool: tool.to_string(),
            kind: source.kind().into(),
            source,
        }
    }

    /// Whether this error was raised before any process could have started.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ToolTaskError::Config(_)
                | ToolTaskError::InvalidEnvironmentEntry { .. }
                | ToolTaskError::InvalidImportance { .. }
                | ToolTaskError::InvalidEncoding { .. }
                | ToolTaskError::InvalidRegex { .. }
                | ToolTaskError::InvalidParameters(_)
                | ToolTaskError::Toml(_)
        )
    }
}

/// Coarse classification of an OS-level spawn failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchFailureKind {
    NotFound,
    PermissionDenied,
    InvalidInput,
    Io,
}

impl From<io::ErrorKind> for LaunchFailureKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => LaunchFailureKind::NotFound,
            io::ErrorKind::PermissionDenied => LaunchFailureKind::PermissionDenied,
            io::ErrorKind::InvalidInput => LaunchFailureKind::InvalidInput,
            _ => LaunchFailureKind::Io,
        }
    }
}

impl std::fmt::Display for LaunchFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LaunchFailureKind::NotFound => "not found",
            LaunchFailureKind::PermissionDenied => "access denied",
            LaunchFailureKind::InvalidInput => "invalid arguments",
            LaunchFailureKind::Io => "i/o error",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, ToolTaskError>;
