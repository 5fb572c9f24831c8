// src/watch/log_watcher.rs

//! Background scan of a followed log for one substring.

use std::io;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::follower::{LineSource, LogFollower};

/// Terminal result of a single watch.
#[derive(Debug)]
pub enum WatchOutcome {
    /// A new line contained the pattern. Carries that line.
    Matched(String),
    /// The line stream ended before any line matched.
    Ended,
    /// Reading the log failed.
    Failed(io::Error),
}

/// Starts watches. Each watch owns its own reader task and result slot, so
/// concurrent watches never share state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogWatcher;

impl LogWatcher {
    /// Begin following the log and scanning for `pattern`.
    ///
    /// Resolves once the follower is positioned at the end of the log; only
    /// lines written after that are considered. A blank pattern is refused:
    /// it would match the very first line.
    pub async fn start(
        follower: &dyn LogFollower,
        pattern: impl Into<String>,
    ) -> io::Result<WatchHandle> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to watch for an empty pattern",
            ));
        }

        let source = follower.follow().await?;

        let (outcome_tx, outcome_rx) = oneshot::channel::<WatchOutcome>();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            // Either a terminal outcome or a cancellation request (or the
            // handle being dropped). Losing the scan future drops the source,
            // which closes the file and its filesystem watch.
            tokio::select! {
                outcome = scan(source, &pattern) => {
                    debug!(pattern = %pattern, ?outcome, "log watch finished");
                    let _ = outcome_tx.send(outcome);
                }
                _ = cancel_rx => {
                    debug!(pattern = %pattern, "log watch cancelled");
                }
            }
        });

        Ok(WatchHandle {
            outcome_rx,
            cancel_tx: Some(cancel_tx),
            task,
        })
    }
}

async fn scan(mut source: Box<dyn LineSource>, pattern: &str) -> WatchOutcome {
    loop {
        match source.next_line().await {
            Ok(Some(line)) => {
                if line.contains(pattern) {
                    return WatchOutcome::Matched(line);
                }
            }
            Ok(None) => return WatchOutcome::Ended,
            Err(err) => return WatchOutcome::Failed(err),
        }
    }
}

/// Handle to a running watch.
///
/// Cancellation contract: [`WatchHandle::cancel`] stops the reader and waits
/// until it has released the log. Dropping the handle requests the same stop
/// without waiting.
#[derive(Debug)]
pub struct WatchHandle {
    outcome_rx: oneshot::Receiver<WatchOutcome>,
    cancel_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Wait for the watch to reach a terminal outcome.
    ///
    /// Cancel-safe: can be raced against a timer and polled again.
    pub async fn wait(&mut self) -> WatchOutcome {
        match (&mut self.outcome_rx).await {
            Ok(outcome) => outcome,
            Err(_) => WatchOutcome::Failed(io::Error::other(
                "log watcher stopped without reporting an outcome",
            )),
        }
    }

    /// Stop the reader and wait for it to exit.
    pub async fn cancel(mut self) {
        if let Some(cancel) = self.cancel_tx.take() {
            // Err means the reader already finished on its own.
            let _ = cancel.send(());
        }
        if let Err(err) = (&mut self.task).await {
            debug!(error = %err, "log watch task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel_tx.take() {
            let _ = cancel.send(());
        }
    }
}
