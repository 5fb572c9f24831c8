// src/config/mod.rs

//! Configuration loading and validation for worldbup.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate paths, durations and retention (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    AnnounceSection, BupSection, CommandsSection, ConfigFile, LivenessSection, PathsSection,
    RawConfigFile, RetentionSection, SessionSection, VerifySection,
};
pub use validate::validate_config;
