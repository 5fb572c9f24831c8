// src/engine/mod.rs

//! Backup run orchestration.
//!
//! [`controller`] sequences the console commands and the bup driver;
//! [`report`] holds the phase/outcome types a run produces.

pub mod controller;
pub mod report;

pub use controller::{CommandPlan, RunController};
pub use report::{Phase, RunOutcome, RunReport};
