// src/exec/temp_files.rs

//! Temporary response files and command-processor scripts.

use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::TempPath;
use tracing::debug;

use crate::errors::{Result, ToolTaskError};
use crate::output::sink::{TaskLogger, ToolWarning};

/// Files written for one invocation.
///
/// [`cleanup`](Self::cleanup) deletes them and reports failures. Anything
/// still held when the value is dropped (e.g. the invocation future was
/// dropped mid-run) is deleted silently.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    files: Vec<TempPath>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `bytes` to a new temporary file and remember it for cleanup.
    ///
    /// The file handle is closed before returning so the tool can open it.
    pub fn write(&mut self, suffix: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("tooltask-")
            .suffix(suffix)
            .tempfile()
            .map_err(|source| ToolTaskError::TempFile { source })?;

        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|source| ToolTaskError::TempFile { source })?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();

        debug!(path = %path.display(), "wrote temporary file");
        self.files.push(temp_path);
        Ok(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|p| p.to_path_buf()).collect()
    }

    /// Delete every file. Failures are warnings: scanners and indexers may
    /// hold the file open for a while.
    pub fn cleanup(&mut self, logger: &TaskLogger) {
        for temp_path in self.files.drain(..) {
            let path = temp_path.to_path_buf();
            match temp_path.close() {
                Ok(()) => debug!(path = %path.display(), "deleted temporary file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => logger.warning(ToolWarning::TempFileNotDeleted {
                    path,
                    reason: e.to_string(),
                }),
            }
        }
    }
}
