// src/config/mod.rs

//! Configuration loading and validation for tooltask.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate everything that must be rejected before a process starts
//!   (`validate.rs`): environment syntax, importance levels, encodings,
//!   regexes and the timeout.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ExecutionSection, OutputSection, RawToolTaskConfig, ToolSection, ToolTaskConfig,
    ToolTaskSettings, VerdictSection,
};
pub use validate::{parse_environment, resolve_termination_grace};
