// src/verify.rs

//! Send-and-confirm protocol for console commands.
//!
//! The server has no acknowledgement channel, so a command counts as applied
//! only once its confirmation line shows up in the server log. Ordering per
//! verified command:
//!
//! 1. start a log watch (resolves once the follower sits at end of file),
//! 2. sleep the grace interval,
//! 3. send the command,
//! 4. wait for the watch outcome, bounded by the timeout,
//! 5. on timeout, cancel the watch.
//!
//! The follower's ready point already closes most of the race between the
//! watch starting and the confirmation being written. The grace sleep stays
//! as an approximation for servers that flush their log lazily; it is not a
//! guaranteed barrier.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{Result, WorldbupError};
use crate::exec::CommandSender;
use crate::types::ServerCommand;
use crate::watch::{LogFollower, LogWatcher, WatchOutcome};

/// Result of observing one command.
#[derive(Debug)]
pub enum Verification {
    Matched,
    TimedOut,
    WatcherError(io::Error),
}

pub struct CommandVerifier {
    sender: Arc<dyn CommandSender>,
    follower: Arc<dyn LogFollower>,
    grace: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for CommandVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandVerifier")
            .field("grace", &self.grace)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CommandVerifier {
    pub fn new(
        sender: Arc<dyn CommandSender>,
        follower: Arc<dyn LogFollower>,
        grace: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            sender,
            follower,
            grace,
            timeout,
        }
    }

    /// Send a command without waiting for any confirmation.
    pub async fn send(&self, command: &ServerCommand) -> Result<()> {
        debug!(command = %command.text, "sending unconfirmed command");
        self.sender.send(&command.text).await
    }

    /// Send `command` and wait for its confirmation using the configured
    /// timeout.
    pub async fn verify(&self, command: &ServerCommand) -> Result<()> {
        self.verify_with(command, self.timeout).await
    }

    /// Like [`CommandVerifier::verify`] with an explicit timeout.
    ///
    /// A command with a blank `expect` is sent fire-and-forget and always
    /// succeeds once delivered.
    pub async fn verify_with(&self, command: &ServerCommand, timeout: Duration) -> Result<()> {
        match self.observe(command, timeout).await? {
            Verification::Matched => Ok(()),
            Verification::TimedOut => Err(WorldbupError::VerificationTimeout {
                command: command.text.clone(),
                timeout,
            }),
            Verification::WatcherError(err) => Err(WorldbupError::Watcher(err)),
        }
    }

    /// Run the protocol and report what was observed.
    ///
    /// `Err` is reserved for failures to start the watch or to deliver the
    /// command; everything after delivery is a [`Verification`].
    pub async fn observe(
        &self,
        command: &ServerCommand,
        timeout: Duration,
    ) -> Result<Verification> {
        if !command.needs_confirmation() {
            self.send(command).await?;
            return Ok(Verification::Matched);
        }

        let mut watch = LogWatcher::start(self.follower.as_ref(), command.expect.clone())
            .await
            .map_err(WorldbupError::Watcher)?;

        if !self.grace.is_zero() {
            tokio::time::sleep(self.grace).await;
        }

        debug!(command = %command.text, expect = %command.expect, "sending command");
        if let Err(err) = self.sender.send(&command.text).await {
            watch.cancel().await;
            return Err(err);
        }

        let verification = match tokio::time::timeout(timeout, watch.wait()).await {
            Ok(WatchOutcome::Matched(line)) => {
                info!(command = %command.text, line = %line, "command confirmed");
                Verification::Matched
            }
            Ok(WatchOutcome::Ended) => Verification::WatcherError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "log stream ended before the confirmation appeared",
            )),
            Ok(WatchOutcome::Failed(err)) => Verification::WatcherError(err),
            Err(_elapsed) => {
                warn!(
                    command = %command.text,
                    expect = %command.expect,
                    timeout_ms = timeout.as_millis() as u64,
                    "command not confirmed in time"
                );
                Verification::TimedOut
            }
        };

        watch.cancel().await;
        Ok(verification)
    }
}
