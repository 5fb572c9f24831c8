// src/exec/session.rs

//! Injecting console commands into the multiplexer session that hosts the
//! server.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SessionSection;
use crate::errors::{Result, WorldbupError};
use crate::types::Multiplexer;

use super::process::{ProcessRunner, ProcessSpec};
use super::BoxFuture;

/// Line-submission marker for `screen -X stuff`; screen expands the escape
/// into a carriage return.
pub const SCREEN_SUBMIT: &str = "\\r";

/// Delivers one command line into the server console.
///
/// Delivery is a side effect only; whether the server acted on it is for the
/// caller to find out (see [`crate::verify`]).
pub trait CommandSender: Send + Sync {
    fn send<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Build the sender matching the configured multiplexer.
pub fn sender_for(
    session: &SessionSection,
    runner: Arc<dyn ProcessRunner>,
) -> Arc<dyn CommandSender> {
    match session.multiplexer {
        Multiplexer::Screen => Arc::new(ScreenSender::new(
            runner,
            session.name.clone(),
            session.window.clone(),
        )),
        Multiplexer::Tmux => Arc::new(TmuxSender::new(
            runner,
            session.name.clone(),
            session.window.clone(),
        )),
    }
}

/// `screen -S <session> -p <window> -X stuff "<command>\r"`.
pub struct ScreenSender {
    runner: Arc<dyn ProcessRunner>,
    session: String,
    window: String,
}

impl ScreenSender {
    pub fn new(runner: Arc<dyn ProcessRunner>, session: String, window: String) -> Self {
        Self {
            runner,
            session,
            window,
        }
    }

    pub fn spec_for(&self, command: &str) -> ProcessSpec {
        ProcessSpec::new("screen")
            .arg("-S")
            .arg(&self.session)
            .arg("-p")
            .arg(&self.window)
            .arg("-X")
            .arg("stuff")
            .arg(format!("{command}{SCREEN_SUBMIT}"))
    }
}

impl CommandSender for ScreenSender {
    fn send<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let spec = self.spec_for(command);
            run_delivery(self.runner.as_ref(), &spec, &self.session, command).await
        })
    }
}

/// `tmux send-keys -t <session>:<window> -l "<command>"` followed by `Enter`.
///
/// The text is sent literally (`-l`) so words like `Enter` inside a command
/// are not interpreted as key names.
pub struct TmuxSender {
    runner: Arc<dyn ProcessRunner>,
    session: String,
    window: String,
}

impl TmuxSender {
    pub fn new(runner: Arc<dyn ProcessRunner>, session: String, window: String) -> Self {
        Self {
            runner,
            session,
            window,
        }
    }

    fn target(&self) -> String {
        format!("{}:{}", self.session, self.window)
    }

    pub fn specs_for(&self, command: &str) -> [ProcessSpec; 2] {
        let target = self.target();
        [
            ProcessSpec::new("tmux")
                .args(["send-keys", "-t"])
                .arg(target.clone())
                .arg("-l")
                .arg(command),
            ProcessSpec::new("tmux")
                .args(["send-keys", "-t"])
                .arg(target)
                .arg("Enter"),
        ]
    }
}

impl CommandSender for TmuxSender {
    fn send<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for spec in self.specs_for(command) {
                run_delivery(self.runner.as_ref(), &spec, &self.session, command).await?;
            }
            Ok(())
        })
    }
}

async fn run_delivery(
    runner: &dyn ProcessRunner,
    spec: &ProcessSpec,
    session: &str,
    command: &str,
) -> Result<()> {
    debug!(session, command, "sending console command");

    let output = runner.run(spec).await.map_err(|err| WorldbupError::Sender {
        session: session.to_string(),
        command: command.to_string(),
        reason: format!("{err:#}"),
    })?;

    if !output.success() {
        // screen prints "No screen session found." and exits 1 when the
        // session is gone; tmux says "can't find session".
        warn!(session, command, reason = %output.failure_reason(), "command delivery failed");
        return Err(WorldbupError::Sender {
            session: session.to_string(),
            command: command.to_string(),
            reason: output.failure_reason(),
        });
    }

    Ok(())
}
