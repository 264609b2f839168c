// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawToolTaskConfig, ToolTaskConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawToolTaskConfig`.
///
/// This only performs TOML deserialization; it does **not** validate
/// environment entries, importance levels, etc. Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawToolTaskConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawToolTaskConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application. Any
/// error returned here is a configuration error: no process has been started.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ToolTaskConfig> {
    let raw_config = load_from_path(&path)?;
    let config = ToolTaskConfig::try_from(raw_config)?;
    Ok(config)
}

/// Default config path: `Tooltask.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Tooltask.toml")
}
