// src/engine/report.rs

use std::fmt;
use std::path::PathBuf;

use crate::errors::WorldbupError;

/// States a backup run moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    LivenessCheck,
    SavingDisabled,
    Saved,
    BackedUp,
    SavingReenabled,
    Pruned,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::LivenessCheck => "liveness-check",
            Phase::SavingDisabled => "saving-disabled",
            Phase::Saved => "saved",
            Phase::BackedUp => "backed-up",
            Phase::SavingReenabled => "saving-reenabled",
            Phase::Pruned => "pruned",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The snapshot was taken. Prune and re-enable problems are recorded
    /// separately and do not change this.
    Completed,
    /// The liveness probe went unanswered; nothing else was sent.
    Unresponsive(WorldbupError),
    /// The main sequence stopped before reaching `phase`.
    Aborted { phase: Phase, error: WorldbupError },
}

/// What a single run did.
#[derive(Debug)]
pub struct RunReport {
    pub phases: Vec<Phase>,
    pub outcome: RunOutcome,
    pub repo: PathBuf,
    /// Set when `save-on` could not be confirmed.
    pub reenable_error: Option<WorldbupError>,
    /// The expired repository that was deleted, if one existed.
    pub pruned: Option<PathBuf>,
    pub prune_error: Option<WorldbupError>,
}

impl RunReport {
    pub(crate) fn new(repo: PathBuf) -> Self {
        Self {
            phases: vec![Phase::Idle],
            outcome: RunOutcome::Completed,
            repo,
            reenable_error: None,
            pruned: None,
            prune_error: None,
        }
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    pub fn reached(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    pub fn last_phase(&self) -> Phase {
        self.phases.last().copied().unwrap_or(Phase::Idle)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }
}
