#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use tooltask::config::{RawToolTaskConfig, ToolTaskConfig, ToolTaskSettings};
use tooltask::output::ClassifierSettings;
use tooltask::types::{KillScope, MessageImportance};

/// Builder for `ToolTaskSettings` to simplify test setup.
///
/// Starts from the defaults with a short termination grace so kill paths
/// don't slow the suite down.
pub struct SettingsBuilder {
    settings: ToolTaskSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: ToolTaskSettings {
                termination_grace: Duration::from_millis(1000),
                ..ToolTaskSettings::default()
            },
        }
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.settings.timeout = Some(Duration::from_millis(ms));
        self
    }

    pub fn grace_ms(mut self, ms: u64) -> Self {
        self.settings.termination_grace = Duration::from_millis(ms);
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.settings
            .environment
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn working_directory(mut self, dir: &Path) -> Self {
        self.settings.working_directory = Some(dir.to_path_buf());
        self
    }

    pub fn command_processor(mut self) -> Self {
        self.settings.use_command_processor = true;
        self
    }

    pub fn kill_scope(mut self, scope: KillScope) -> Self {
        self.settings.kill_scope = scope;
        self
    }

    pub fn stdout_importance(mut self, importance: MessageImportance) -> Self {
        self.settings.stdout_importance = importance;
        self
    }

    pub fn log_stderr_as_error(mut self) -> Self {
        self.settings.log_stderr_as_error = true;
        self
    }

    pub fn classifier(mut self, classifier: ClassifierSettings) -> Self {
        self.settings.classifier = classifier;
        self
    }

    pub fn capture_output(mut self) -> Self {
        self.settings.capture_output = true;
        self
    }

    pub fn diagnostic(mut self) -> Self {
        self.settings.diagnostic = true;
        self
    }

    pub fn tool_path(mut self, path: &Path) -> Self {
        self.settings.tool_path = Some(path.to_path_buf());
        self
    }

    pub fn build(self) -> ToolTaskSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `text` to a temp `Tooltask.toml` and load it the way the binary
/// does.
pub fn config_from_toml(text: &str) -> tooltask::errors::Result<ToolTaskConfig> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Tooltask.toml");
    std::fs::write(&path, text)?;
    let raw: RawToolTaskConfig = tooltask::config::load_from_path(&path)?;
    ToolTaskConfig::try_from(raw)
}
