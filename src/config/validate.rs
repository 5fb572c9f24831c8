// src/config/validate.rs

use std::path::Path;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WorldbupError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WorldbupError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let (timeout, grace) = validate_verify(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, timeout, grace))
    }
}

/// Re-run validation on an already built config.
///
/// Useful after a caller mutated fields of a `ConfigFile` directly (e.g. CLI
/// overrides).
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_path("paths.backup_root", &cfg.paths.backup_root)?;
    ensure_path("paths.server_log", &cfg.paths.server_log)?;
    ensure_path("paths.world_dir", &cfg.paths.world_dir)?;
    validate_prefix(&cfg.paths.repo_prefix)?;
    validate_retention(cfg.retention.months)?;
    if cfg.verify_timeout.is_zero() {
        return Err(WorldbupError::ConfigError(
            "[verify].timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_session(cfg)?;
    validate_retention(cfg.retention.months)?;
    validate_commands(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    ensure_path("paths.backup_root", &cfg.paths.backup_root)?;
    ensure_path("paths.server_log", &cfg.paths.server_log)?;
    ensure_path("paths.world_dir", &cfg.paths.world_dir)?;
    if let Some(ref log_file) = cfg.paths.log_file {
        ensure_path("paths.log_file", log_file)?;
    }
    validate_prefix(&cfg.paths.repo_prefix)
}

fn ensure_path(key: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(WorldbupError::ConfigError(format!(
            "[{key}] must not be empty"
        )));
    }
    Ok(())
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.trim().is_empty() {
        return Err(WorldbupError::ConfigError(
            "[paths].repo_prefix must not be empty".to_string(),
        ));
    }
    if prefix.contains('/') || prefix.contains('\\') {
        return Err(WorldbupError::ConfigError(format!(
            "[paths].repo_prefix must be a plain name, got '{prefix}'"
        )));
    }
    Ok(())
}

fn validate_session(cfg: &RawConfigFile) -> Result<()> {
    if cfg.session.name.trim().is_empty() {
        return Err(WorldbupError::ConfigError(
            "[session].name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_retention(months: u32) -> Result<()> {
    if months == 0 {
        return Err(WorldbupError::ConfigError(
            "[retention].months must be >= 1 (got 0); month 0 is the live repository"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    let commands = [
        ("save_off", &cfg.commands.save_off),
        ("save_all", &cfg.commands.save_all),
        ("save_on", &cfg.commands.save_on),
    ];
    for (key, value) in commands {
        if value.trim().is_empty() {
            return Err(WorldbupError::ConfigError(format!(
                "[commands].{key} must not be empty"
            )));
        }
    }
    if cfg.liveness.enabled && cfg.liveness.command.trim().is_empty() {
        return Err(WorldbupError::ConfigError(
            "[liveness].command must not be empty when the probe is enabled".to_string(),
        ));
    }
    Ok(())
}

fn validate_verify(cfg: &RawConfigFile) -> Result<(Duration, Duration)> {
    let timeout = parse_duration(&cfg.verify.timeout).map_err(|e| {
        WorldbupError::ConfigError(format!("[verify].timeout: {e}"))
    })?;
    if timeout.is_zero() {
        return Err(WorldbupError::ConfigError(
            "[verify].timeout must be greater than zero".to_string(),
        ));
    }

    let grace = parse_duration(&cfg.verify.grace)
        .map_err(|e| WorldbupError::ConfigError(format!("[verify].grace: {e}")))?;
    if grace >= timeout {
        return Err(WorldbupError::ConfigError(format!(
            "[verify].grace ({grace:?}) must be shorter than [verify].timeout ({timeout:?})"
        )));
    }

    Ok((timeout, grace))
}
