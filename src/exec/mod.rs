// src/exec/mod.rs

//! External process layer.
//!
//! - [`process`] provides the `ProcessRunner` trait and the
//!   `TokioProcessRunner` used in production.
//! - [`session`] turns console commands into `screen` / `tmux` invocations
//!   through a `ProcessRunner`.

use std::future::Future;
use std::pin::Pin;

pub mod process;
pub mod session;

pub use process::{ProcessOutput, ProcessRunner, ProcessSpec, TokioProcessRunner};
pub use session::{sender_for, CommandSender, ScreenSender, TmuxSender};

/// Boxed future returned by the object-safe traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
