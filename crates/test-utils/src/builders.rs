#![allow(dead_code)]

use std::path::{Path, PathBuf};

use worldbup::config::{
    AnnounceSection, BupSection, CommandsSection, ConfigFile, LivenessSection, PathsSection,
    RawConfigFile, RetentionSection, SessionSection, VerifySection,
};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Everything lives under one base directory: repositories in
/// `<base>/backups`, the world in `<base>/world`, the console log in
/// `<base>/logs/latest.log`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            config: RawConfigFile {
                paths: PathsSection {
                    backup_root: base.join("backups"),
                    repo_prefix: "minecraft".to_string(),
                    log_file: None,
                    server_log: base.join("logs").join("latest.log"),
                    world_dir: base.join("world"),
                },
                session: SessionSection::default(),
                bup: BupSection::default(),
                verify: VerifySection::default(),
                retention: RetentionSection::default(),
                liveness: LivenessSection::default(),
                commands: CommandsSection::default(),
                announce: AnnounceSection::default(),
            },
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.config.paths.repo_prefix = prefix.to_string();
        self
    }

    pub fn backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.paths.backup_root = root.into();
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.config.verify.timeout = timeout.to_string();
        self
    }

    pub fn grace(mut self, grace: &str) -> Self {
        self.config.verify.grace = grace.to_string();
        self
    }

    pub fn retention_months(mut self, months: u32) -> Self {
        self.config.retention.months = months;
        self
    }

    pub fn liveness(mut self, command: &str, expect: &str) -> Self {
        self.config.liveness = LivenessSection {
            enabled: true,
            command: command.to_string(),
            expect: expect.to_string(),
        };
        self
    }

    pub fn no_announcements(mut self) -> Self {
        self.config.announce = AnnounceSection {
            start: String::new(),
            done: String::new(),
        };
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
