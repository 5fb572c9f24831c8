// src/engine/controller.rs

//! One backup run: disable autosave, flush, snapshot, re-enable, prune.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::backup::{BupDriver, Rotation};
use crate::config::ConfigFile;
use crate::errors::WorldbupError;
use crate::types::ServerCommand;
use crate::verify::CommandVerifier;

use super::report::{Phase, RunOutcome, RunReport};

/// Console commands used by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub liveness: Option<ServerCommand>,
    pub announce_start: Option<ServerCommand>,
    pub save_off: ServerCommand,
    pub save_all: ServerCommand,
    pub save_on: ServerCommand,
    pub announce_done: Option<ServerCommand>,
}

impl CommandPlan {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            liveness: cfg.liveness_probe(),
            announce_start: cfg.announce_start(),
            save_off: cfg.save_off(),
            save_all: cfg.save_all(),
            save_on: cfg.save_on(),
            announce_done: cfg.announce_done(),
        }
    }
}

pub struct RunController {
    verifier: CommandVerifier,
    driver: BupDriver,
    rotation: Rotation,
    world_dir: PathBuf,
    plan: CommandPlan,
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController")
            .field("verifier", &self.verifier)
            .field("driver", &self.driver)
            .field("rotation", &self.rotation)
            .field("world_dir", &self.world_dir)
            .finish_non_exhaustive()
    }
}

impl RunController {
    pub fn new(
        verifier: CommandVerifier,
        driver: BupDriver,
        rotation: Rotation,
        world_dir: impl Into<PathBuf>,
        plan: CommandPlan,
    ) -> Self {
        Self {
            verifier,
            driver,
            rotation,
            world_dir: world_dir.into(),
            plan,
        }
    }

    /// Execute a full run for the month containing `today`.
    ///
    /// Never fails as a whole: every problem ends up in the report. Once the
    /// liveness check has passed, `save-on` is always attempted, whatever
    /// happened in between.
    pub async fn run(&self, today: NaiveDate) -> RunReport {
        let repo = self.rotation.current_repo(today);
        let mut report = RunReport::new(repo.clone());

        if let Some(ref probe) = self.plan.liveness {
            if let Err(err) = self.verifier.verify(probe).await {
                info!(error = %err, "server did not answer the liveness probe; nothing to back up");
                report.outcome = RunOutcome::Unresponsive(WorldbupError::Liveness(Box::new(err)));
                return report;
            }
        }
        report.enter(Phase::LivenessCheck);

        self.announce(self.plan.announce_start.as_ref()).await;

        let backed_up = match self.main_sequence(&repo, &mut report).await {
            Ok(()) => true,
            Err((phase, err)) => {
                error!(phase = %phase, error = %err, "backup run aborted");
                report.outcome = RunOutcome::Aborted { phase, error: err };
                false
            }
        };

        if backed_up {
            self.announce(self.plan.announce_done.as_ref()).await;
        }

        // Autosave must never stay off because of an earlier failure.
        report.enter(Phase::SavingReenabled);
        if let Err(err) = self.verifier.verify(&self.plan.save_on).await {
            error!(error = %err, "error turning world saving back on");
            report.reenable_error = Some(err);
        }

        if backed_up {
            info!("pruning old backups");
            let expired = self.rotation.expired_repo(today);
            match self.driver.prune(&expired) {
                Ok(removed) => {
                    if removed {
                        report.pruned = Some(expired);
                    }
                    report.enter(Phase::Pruned);
                }
                Err(err) => {
                    error!(repo = ?expired, error = %err, "error pruning old backups");
                    report.prune_error = Some(err);
                }
            }
        }

        info!(
            last_phase = %report.last_phase(),
            completed = report.is_completed(),
            "backup run finished"
        );
        report
    }

    async fn main_sequence(
        &self,
        repo: &Path,
        report: &mut RunReport,
    ) -> std::result::Result<(), (Phase, WorldbupError)> {
        info!("turning off world auto-saving");
        self.step(&self.plan.save_off, Phase::SavingDisabled).await?;
        report.enter(Phase::SavingDisabled);

        info!("saving world");
        self.step(&self.plan.save_all, Phase::Saved).await?;
        report.enter(Phase::Saved);

        info!(repo = ?repo, "backing up");
        self.driver
            .backup(repo, &self.world_dir)
            .await
            .map_err(|err| (Phase::BackedUp, err))?;
        report.enter(Phase::BackedUp);

        Ok(())
    }

    async fn step(
        &self,
        command: &ServerCommand,
        target: Phase,
    ) -> std::result::Result<(), (Phase, WorldbupError)> {
        self.verifier
            .verify(command)
            .await
            .map_err(|err| (target, err))
    }

    /// Broadcast an in-game message. Failures are only logged.
    async fn announce(&self, message: Option<&ServerCommand>) {
        let Some(message) = message else {
            return;
        };
        if let Err(err) = self.verifier.send(message).await {
            warn!(command = %message.text, error = %err, "announcement failed");
        }
    }
}
