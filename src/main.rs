// src/main.rs

use chrono::Local;
use worldbup::{cli, logging};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("worldbup error: {err:?}");
        std::process::exit(1);
    }
}

/// Only startup problems (config, log file) surface as errors here. A run
/// that aborts or finds the server unresponsive still exits 0; the log file
/// tells the story.
async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let cfg = worldbup::load_config(&args)?;
    let today = Local::now().date_naive();

    if args.dry_run {
        worldbup::print_dry_run(&cfg, today);
        return Ok(());
    }

    logging::init_logging(&cfg.log_file(), args.log_level)?;

    worldbup::run(&cfg, today).await;
    Ok(())
}
