// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;
use worldbup::config::{load_and_validate, parse_duration, validate_config, ConfigFile};
use worldbup::errors::WorldbupError;
use worldbup::types::Multiplexer;
use worldbup_test_utils::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn config_error(result: Result<ConfigFile, WorldbupError>) -> String {
    match result {
        Err(WorldbupError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn minimal_config_gets_vanilla_defaults() {
    let file = write_config(
        r#"
[paths]
backup_root = "/srv/backups"
server_log = "/srv/mc/logs/latest.log"
world_dir = "/srv/mc"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.paths.repo_prefix, "minecraft");
    assert_eq!(cfg.session.multiplexer, Multiplexer::Screen);
    assert_eq!(cfg.session.name, "minecraft");
    assert_eq!(cfg.session.window, "0");
    assert_eq!(cfg.bup.binary, "bup");
    assert_eq!(cfg.bup.branch, "minecraft_server");
    assert_eq!(cfg.verify_timeout, Duration::from_secs(10));
    assert_eq!(cfg.verify_grace, Duration::from_millis(250));
    assert_eq!(cfg.retention.months, 2);
    assert!(!cfg.liveness.enabled);
    assert!(cfg.liveness_probe().is_none());

    assert_eq!(cfg.save_off().text, "save-off");
    assert_eq!(cfg.save_off().expect, "Turned off world auto-saving");
    assert_eq!(cfg.save_all().expect, "Saved the world");
    assert_eq!(cfg.save_on().expect, "Turned on world auto-saving");

    assert_eq!(
        cfg.log_file(),
        PathBuf::from("/srv/backups/minecraft_backup.log")
    );
}

#[test]
fn full_config_overrides_every_section() {
    let file = write_config(
        r#"
[paths]
backup_root = "/data/bup"
repo_prefix = "survival"
log_file = "/var/log/worldbup.log"
server_log = "/data/mc/logs/latest.log"
world_dir = "/data/mc/world"

[session]
multiplexer = "tmux"
name = "mc"
window = "console"

[bup]
binary = "/usr/local/bin/bup"
branch = "survival"

[verify]
timeout = "1m"
grace = "500ms"

[retention]
months = 3

[liveness]
enabled = true
command = "list"
expect = "players online"

[commands]
save_all = "save-all flush"

[announce]
start = ""
done = "Snapshot done"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.session.multiplexer, Multiplexer::Tmux);
    assert_eq!(cfg.session.window, "console");
    assert_eq!(cfg.bup.binary, "/usr/local/bin/bup");
    assert_eq!(cfg.verify_timeout, Duration::from_secs(60));
    assert_eq!(cfg.verify_grace, Duration::from_millis(500));
    assert_eq!(cfg.retention.months, 3);
    assert_eq!(cfg.log_file(), PathBuf::from("/var/log/worldbup.log"));

    let probe = cfg.liveness_probe().unwrap();
    assert_eq!(probe.text, "list");
    assert!(probe.needs_confirmation());

    assert_eq!(cfg.save_all().text, "save-all flush");
    assert_eq!(cfg.save_all().expect, "Saved the world");

    assert!(cfg.announce_start().is_none());
    let done = cfg.announce_done().unwrap();
    assert_eq!(done.text, "say Snapshot done");
    assert!(!done.needs_confirmation());
}

#[test]
fn missing_paths_section_is_a_toml_error() {
    let file = write_config(
        r#"
[session]
name = "minecraft"
"#,
    );

    match load_and_validate(file.path()) {
        Err(WorldbupError::TomlError(_)) => {}
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn unknown_multiplexer_is_rejected() {
    let file = write_config(
        r#"
[paths]
backup_root = "/b"
server_log = "/l"
world_dir = "/w"

[session]
multiplexer = "zellij"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(WorldbupError::TomlError(_))
    ));
}

#[test]
fn unreadable_config_path_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let msg = config_error(load_and_validate(dir.path().join("nope.toml")));
    assert!(msg.contains("cannot read config"), "unexpected message: {msg}");
}

#[test]
fn zero_retention_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let raw = ConfigFileBuilder::new(dir.path()).retention_months(0).raw();

    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("[retention].months"), "unexpected message: {msg}");
}

#[test]
fn prefix_with_path_separator_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let raw = ConfigFileBuilder::new(dir.path()).prefix("../evil").raw();

    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("repo_prefix"), "unexpected message: {msg}");
}

#[test]
fn grace_must_be_shorter_than_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let raw = ConfigFileBuilder::new(dir.path())
        .timeout("1s")
        .grace("1s")
        .raw();

    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("[verify].grace"), "unexpected message: {msg}");
}

#[test]
fn zero_timeout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let raw = ConfigFileBuilder::new(dir.path())
        .timeout("0s")
        .grace("0ms")
        .raw();

    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("[verify].timeout"), "unexpected message: {msg}");
}

#[test]
fn bad_duration_unit_is_reported_with_its_key() {
    let dir = tempfile::tempdir().unwrap();
    let raw = ConfigFileBuilder::new(dir.path()).timeout("10 days").raw();

    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.starts_with("[verify].timeout"), "unexpected message: {msg}");
}

#[test]
fn overflowing_duration_is_a_config_error() {
    let file = write_config(
        r#"
[paths]
backup_root = "/srv/backups"
server_log = "/srv/mc/logs/latest.log"
world_dir = "/srv/mc"

[verify]
timeout = "10000000000000000h"
"#,
    );

    let msg = config_error(load_and_validate(file.path()));
    assert!(msg.starts_with("[verify].timeout"), "unexpected message: {msg}");
    assert!(msg.contains("too large"), "unexpected message: {msg}");

    assert!(parse_duration("18446744073709551615m").is_err());
    assert_eq!(
        parse_duration("18446744073709551615s").unwrap(),
        Duration::from_secs(u64::MAX)
    );
}

#[test]
fn enabled_liveness_needs_a_command() {
    let dir = tempfile::tempdir().unwrap();
    let raw = ConfigFileBuilder::new(dir.path())
        .liveness("  ", "players online")
        .raw();

    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("[liveness].command"), "unexpected message: {msg}");
}

#[test]
fn revalidation_catches_mutated_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = ConfigFileBuilder::new(dir.path()).build();
    assert!(validate_config(&cfg).is_ok());

    cfg.retention.months = 0;
    assert!(matches!(
        validate_config(&cfg),
        Err(WorldbupError::ConfigError(_))
    ));
}

#[test]
fn duration_parser_accepts_supported_units() {
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration(" 10s ").unwrap(), Duration::from_secs(10));
    assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));

    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("5d").is_err());
}
