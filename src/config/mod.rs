// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate graph invariants, pipelines and watch rules (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    load_and_validate, load_from_path, parse_and_validate, parse_raw, project_root_for,
};
pub use model::{
    BuiltinKind, ConfigFile, ConfigSection, PipelineConfig, ProjectLayout, ProjectSection,
    RawConfigFile, ServerSection, StepConfig, TaskConfig, WatchRuleConfig,
};
