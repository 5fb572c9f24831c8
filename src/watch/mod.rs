// src/watch/mod.rs

//! Log following and confirmation matching.
//!
//! This module is responsible for:
//! - Following the server log from its current end, surviving rotation
//!   (`follower`).
//! - Scanning new lines for a plain substring in a cancellable background
//!   task (`log_watcher`).
//!
//! It does **not** send anything to the server; pairing a watch with a
//! command is the job of [`crate::verify`].

pub mod follower;
pub mod log_watcher;

pub use follower::{FileFollower, FileTail, LineSource, LogFollower, DEFAULT_POLL_INTERVAL};
pub use log_watcher::{LogWatcher, WatchHandle, WatchOutcome};
