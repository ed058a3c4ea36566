// src/config/mod.rs

//! Configuration loading and validation for gazer.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Ship the built-in command table (`default.rs`).
//! - Find and load a config file from disk (`loader.rs`).
//! - Compile matchers and check basic invariants (`validate.rs`).

pub mod default;
pub mod loader;
pub mod model;
pub mod validate;

pub use default::DEFAULT_CONFIG;
pub use loader::{load_and_validate, load_from_path, resolve_config, search_config_path};
pub use model::{CommandEntry, Config, LogTemplates, RawCommandEntry, RawConfigFile, RawLogSection};
