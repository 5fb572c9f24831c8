// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{Multiplexer, ServerCommand};

/// Configuration exactly as read from the TOML file.
///
/// ```toml
/// [paths]
/// backup_root = "/srv/backups"
/// server_log = "/srv/minecraft/logs/latest.log"
/// world_dir = "/srv/minecraft"
///
/// [session]
/// name = "minecraft"
///
/// [verify]
/// timeout = "10s"
/// ```
///
/// Only `[paths]` is mandatory; every other section falls back to defaults
/// suited to a vanilla server.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub paths: PathsSection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub bup: BupSection,

    #[serde(default)]
    pub verify: VerifySection,

    #[serde(default)]
    pub retention: RetentionSection,

    #[serde(default)]
    pub liveness: LivenessSection,

    #[serde(default)]
    pub commands: CommandsSection,

    #[serde(default)]
    pub announce: AnnounceSection,
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Directory that holds the monthly repositories.
    pub backup_root: PathBuf,

    /// Repository names are `<repo_prefix>-<month>-<year>`.
    #[serde(default = "default_repo_prefix")]
    pub repo_prefix: String,

    /// Where this tool writes its own log. Defaults to
    /// `<backup_root>/<repo_prefix>_backup.log`.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// The server's console log, tailed to confirm commands.
    pub server_log: PathBuf,

    /// The directory that gets indexed and saved.
    pub world_dir: PathBuf,
}

fn default_repo_prefix() -> String {
    "minecraft".to_string()
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub multiplexer: Multiplexer,

    #[serde(default = "default_session_name")]
    pub name: String,

    /// screen window number / tmux window index.
    #[serde(default = "default_window")]
    pub window: String,
}

fn default_session_name() -> String {
    "minecraft".to_string()
}

fn default_window() -> String {
    "0".to_string()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            multiplexer: Multiplexer::default(),
            name: default_session_name(),
            window: default_window(),
        }
    }
}

/// `[bup]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BupSection {
    #[serde(default = "default_bup_binary")]
    pub binary: String,

    /// Branch name passed to `bup save -n`.
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_bup_binary() -> String {
    "bup".to_string()
}

fn default_branch() -> String {
    "minecraft_server".to_string()
}

impl Default for BupSection {
    fn default() -> Self {
        Self {
            binary: default_bup_binary(),
            branch: default_branch(),
        }
    }
}

/// `[verify]` section. Durations use the `"10s"` / `"250ms"` format.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifySection {
    /// How long to wait for the confirming log line. Large worlds may need
    /// more than the default.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Pause between starting the log watch and sending the command.
    #[serde(default = "default_grace")]
    pub grace: String,
}

fn default_timeout() -> String {
    "10s".to_string()
}

fn default_grace() -> String {
    "250ms".to_string()
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            grace: default_grace(),
        }
    }
}

/// `[retention]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionSection {
    /// Age in months at which a repository is deleted.
    #[serde(default = "default_retention_months")]
    pub months: u32,
}

fn default_retention_months() -> u32 {
    2
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            months: default_retention_months(),
        }
    }
}

/// `[liveness]` section.
///
/// When enabled, a harmless command is sent first; if its response never
/// shows up in the log the run ends quietly.
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_liveness_command")]
    pub command: String,

    #[serde(default = "default_liveness_expect")]
    pub expect: String,
}

fn default_liveness_command() -> String {
    "list".to_string()
}

fn default_liveness_expect() -> String {
    "players online".to_string()
}

impl Default for LivenessSection {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_liveness_command(),
            expect: default_liveness_expect(),
        }
    }
}

/// `[commands]` section: console commands and the log lines confirming them.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsSection {
    #[serde(default = "default_save_off")]
    pub save_off: String,
    #[serde(default = "default_save_off_expect")]
    pub save_off_expect: String,

    #[serde(default = "default_save_all")]
    pub save_all: String,
    #[serde(default = "default_save_all_expect")]
    pub save_all_expect: String,

    #[serde(default = "default_save_on")]
    pub save_on: String,
    #[serde(default = "default_save_on_expect")]
    pub save_on_expect: String,
}

fn default_save_off() -> String {
    "save-off".to_string()
}

fn default_save_off_expect() -> String {
    "Turned off world auto-saving".to_string()
}

fn default_save_all() -> String {
    "save-all".to_string()
}

fn default_save_all_expect() -> String {
    "Saved the world".to_string()
}

fn default_save_on() -> String {
    "save-on".to_string()
}

fn default_save_on_expect() -> String {
    "Turned on world auto-saving".to_string()
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            save_off: default_save_off(),
            save_off_expect: default_save_off_expect(),
            save_all: default_save_all(),
            save_all_expect: default_save_all_expect(),
            save_on: default_save_on(),
            save_on_expect: default_save_on_expect(),
        }
    }
}

/// `[announce]` section. Empty strings disable the broadcast.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnounceSection {
    #[serde(default = "default_announce_start")]
    pub start: String,

    #[serde(default = "default_announce_done")]
    pub done: String,
}

fn default_announce_start() -> String {
    "Backing up world...".to_string()
}

fn default_announce_done() -> String {
    "Backup complete".to_string()
}

impl Default for AnnounceSection {
    fn default() -> Self {
        Self {
            start: default_announce_start(),
            done: default_announce_done(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, so the
/// durations are already parsed and the paths are known to be non-empty.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub session: SessionSection,
    pub bup: BupSection,
    pub retention: RetentionSection,
    pub liveness: LivenessSection,
    pub commands: CommandsSection,
    pub announce: AnnounceSection,
    pub verify_timeout: Duration,
    pub verify_grace: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        verify_timeout: Duration,
        verify_grace: Duration,
    ) -> Self {
        Self {
            paths: raw.paths,
            session: raw.session,
            bup: raw.bup,
            retention: raw.retention,
            liveness: raw.liveness,
            commands: raw.commands,
            announce: raw.announce,
            verify_timeout,
            verify_grace,
        }
    }

    /// Effective path of this tool's own log file.
    pub fn log_file(&self) -> PathBuf {
        match &self.paths.log_file {
            Some(path) => path.clone(),
            None => self
                .paths
                .backup_root
                .join(format!("{}_backup.log", self.paths.repo_prefix)),
        }
    }

    pub fn liveness_probe(&self) -> Option<ServerCommand> {
        if !self.liveness.enabled {
            return None;
        }
        Some(ServerCommand::new(
            self.liveness.command.clone(),
            self.liveness.expect.clone(),
        ))
    }

    pub fn save_off(&self) -> ServerCommand {
        ServerCommand::new(
            self.commands.save_off.clone(),
            self.commands.save_off_expect.clone(),
        )
    }

    pub fn save_all(&self) -> ServerCommand {
        ServerCommand::new(
            self.commands.save_all.clone(),
            self.commands.save_all_expect.clone(),
        )
    }

    pub fn save_on(&self) -> ServerCommand {
        ServerCommand::new(
            self.commands.save_on.clone(),
            self.commands.save_on_expect.clone(),
        )
    }

    /// `say` broadcast sent before the backup starts, if configured.
    pub fn announce_start(&self) -> Option<ServerCommand> {
        announcement(&self.announce.start)
    }

    /// `say` broadcast sent after a successful backup, if configured.
    pub fn announce_done(&self) -> Option<ServerCommand> {
        announcement(&self.announce.done)
    }
}

fn announcement(message: &str) -> Option<ServerCommand> {
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(ServerCommand::fire_and_forget(format!("say {message}")))
    }
}
