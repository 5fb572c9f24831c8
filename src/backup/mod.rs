// src/backup/mod.rs

//! Monthly bup repositories: which one is live, which one expires, and the
//! tool invocations that fill and prune them.

pub mod driver;
pub mod rotation;

pub use driver::BupDriver;
pub use rotation::{months_before, RepoId, Rotation};
