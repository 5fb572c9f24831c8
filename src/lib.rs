// src/lib.rs

pub mod backup;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod verify;
pub mod watch;

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::backup::{BupDriver, Rotation};
use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, validate_config, ConfigFile};
use crate::engine::{CommandPlan, RunController, RunReport};
use crate::errors::Result;
use crate::exec::{sender_for, ProcessRunner, TokioProcessRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::verify::CommandVerifier;
use crate::watch::FileFollower;

/// Load and validate the config named on the command line, applying CLI
/// overrides.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    let mut cfg = load_and_validate(&path)?;

    if args.no_liveness {
        cfg.liveness.enabled = false;
    }
    validate_config(&cfg)?;

    Ok(cfg)
}

/// Wire the production components together.
///
/// This builds:
/// - the process runner shared by the session sender and bup
/// - the log follower for the server console log
/// - the verifier, driver and rotation the controller runs with
pub fn build_controller(cfg: &ConfigFile) -> RunController {
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let sender = sender_for(&cfg.session, Arc::clone(&runner));
    let follower = Arc::new(FileFollower::new(cfg.paths.server_log.clone()));
    let verifier = CommandVerifier::new(sender, follower, cfg.verify_grace, cfg.verify_timeout);

    RunController::new(
        verifier,
        BupDriver::from_config(cfg, runner, fs),
        Rotation::from_config(cfg),
        cfg.paths.world_dir.clone(),
        CommandPlan::from_config(cfg),
    )
}

/// High-level entry point used by `main.rs`, after logging is up.
pub async fn run(cfg: &ConfigFile, today: NaiveDate) -> RunReport {
    info!(
        session = %cfg.session.name,
        multiplexer = %cfg.session.multiplexer,
        world = ?cfg.paths.world_dir,
        "starting backup run"
    );
    let controller = build_controller(cfg);
    debug!(?controller, "controller ready");
    controller.run(today).await
}

/// Print what a run on `today` would do without doing any of it.
pub fn print_dry_run(cfg: &ConfigFile, today: NaiveDate) {
    let rotation = Rotation::from_config(cfg);
    let plan = CommandPlan::from_config(cfg);

    println!("worldbup dry-run ({today})");
    println!("  log file:      {}", cfg.log_file().display());
    println!("  server log:    {}", cfg.paths.server_log.display());
    println!("  world dir:     {}", cfg.paths.world_dir.display());
    println!(
        "  session:       {} {}:{}",
        cfg.session.multiplexer, cfg.session.name, cfg.session.window
    );
    println!(
        "  verify:        timeout {:?}, grace {:?}",
        cfg.verify_timeout, cfg.verify_grace
    );
    println!();

    println!("repositories:");
    println!("  current: {}", rotation.current_repo(today).display());
    println!(
        "  expired: {} ({} months old, deleted after a successful backup)",
        rotation.expired_repo(today).display(),
        rotation.retention_months()
    );
    match RealFileSystem.read_dir(rotation.root()) {
        Ok(entries) => {
            for entry in entries {
                let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if rotation.parse_repo_name(name).is_some() {
                    println!("  existing: {}", entry.display());
                }
            }
        }
        Err(err) => println!("  (cannot list {}: {err})", rotation.root().display()),
    }
    println!();

    println!("commands:");
    let steps = [
        ("liveness", plan.liveness.as_ref()),
        ("announce", plan.announce_start.as_ref()),
        ("save-off", Some(&plan.save_off)),
        ("save-all", Some(&plan.save_all)),
        ("announce", plan.announce_done.as_ref()),
        ("save-on", Some(&plan.save_on)),
    ];
    for (label, command) in steps {
        let Some(command) = command else {
            continue;
        };
        if command.needs_confirmation() {
            println!("  {label:<9} {:?} until {:?}", command.text, command.expect);
        } else {
            println!("  {label:<9} {:?} (unconfirmed)", command.text);
        }
    }
    println!(
        "  bup       index + save -n {} {}",
        cfg.bup.branch,
        cfg.paths.world_dir.display()
    );

    debug!("dry-run complete (no execution)");
}
