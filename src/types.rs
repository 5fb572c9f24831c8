use std::str::FromStr;
use serde::Deserialize;

/// Terminal multiplexer hosting the server console.
///
/// - `Screen`: GNU screen, commands are injected with `-X stuff`.
/// - `Tmux`: tmux, commands are injected with `send-keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplexer {
    Screen,
    Tmux,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Multiplexer::Screen
    }
}

impl FromStr for Multiplexer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "screen" => Ok(Multiplexer::Screen),
            "tmux" => Ok(Multiplexer::Tmux),
            other => Err(format!(
                "invalid multiplexer: {other} (expected \"screen\" or \"tmux\")"
            )),
        }
    }
}

impl std::fmt::Display for Multiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Multiplexer::Screen => f.write_str("screen"),
            Multiplexer::Tmux => f.write_str("tmux"),
        }
    }
}

/// A console command paired with the log substring that confirms it ran.
///
/// An empty (or blank) `expect` means the command is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub text: String,
    pub expect: String,
}

impl ServerCommand {
    pub fn new(text: impl Into<String>, expect: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expect: expect.into(),
        }
    }

    /// A command nobody waits on, e.g. an in-game broadcast.
    pub fn fire_and_forget(text: impl Into<String>) -> Self {
        Self::new(text, "")
    }

    pub fn needs_confirmation(&self) -> bool {
        !self.expect.trim().is_empty()
    }
}
