// tests/cli_startup.rs

use std::ffi::OsString;
use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;
use worldbup::cli::{CliArgs, LogLevel};
use worldbup::errors::WorldbupError;
use worldbup::logging::{init_logging, parse_level_str, resolve_level};
use worldbup::types::{Multiplexer, ServerCommand};

const LIVENESS_CONFIG: &str = r#"
[paths]
backup_root = "/srv/backups"
server_log = "/srv/mc/logs/latest.log"
world_dir = "/srv/mc"

[liveness]
enabled = true
"#;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn cli_flags_parse() {
    let args = CliArgs::try_parse_from([
        "worldbup",
        "--config",
        "/etc/worldbup.toml",
        "--log-level",
        "debug",
        "--dry-run",
        "--no-liveness",
    ])
    .unwrap();

    assert_eq!(args.config.unwrap().to_str(), Some("/etc/worldbup.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
    assert!(args.no_liveness);
}

#[test]
fn no_liveness_flag_disables_the_probe() {
    let file = config_file(LIVENESS_CONFIG);

    let with_probe = CliArgs::try_parse_from([
        OsString::from("worldbup"),
        OsString::from("--config"),
        file.path().as_os_str().to_owned(),
    ])
    .unwrap();
    assert!(worldbup::load_config(&with_probe)
        .unwrap()
        .liveness_probe()
        .is_some());

    let without_probe = CliArgs {
        no_liveness: true,
        ..with_probe
    };
    assert!(worldbup::load_config(&without_probe)
        .unwrap()
        .liveness_probe()
        .is_none());
}

#[test]
fn cli_level_wins_over_environment() {
    assert_eq!(resolve_level(Some(LogLevel::Trace)), tracing::Level::TRACE);
    assert_eq!(resolve_level(Some(LogLevel::Error)), tracing::Level::ERROR);
}

#[test]
fn level_strings_are_case_insensitive() {
    assert_eq!(parse_level_str("WARN"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str(" warning "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("debug"), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str("loud"), None);
}

#[test]
fn unopenable_log_file_is_a_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("backup.log");

    match init_logging(&path, None) {
        Err(WorldbupError::Startup { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected Startup error, got {other:?}"),
    }
}

#[test]
fn multiplexer_names() {
    assert_eq!("tmux".parse::<Multiplexer>().unwrap(), Multiplexer::Tmux);
    assert_eq!(" Screen ".parse::<Multiplexer>().unwrap(), Multiplexer::Screen);
    assert!("byobu".parse::<Multiplexer>().is_err());
    assert_eq!(Multiplexer::Tmux.to_string(), "tmux");
}

#[test]
fn blank_expectation_means_no_confirmation() {
    assert!(ServerCommand::new("save-off", "Turned off").needs_confirmation());
    assert!(!ServerCommand::new("say hi", "  ").needs_confirmation());
    assert!(!ServerCommand::fire_and_forget("say hi").needs_confirmation());
}
