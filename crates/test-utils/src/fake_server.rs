use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Instant;
use worldbup::errors::{Result, WorldbupError};
use worldbup::exec::{BoxFuture, CommandSender};
use worldbup::watch::{LineSource, LogFollower};

/// A command the fake server received, and when.
#[derive(Debug, Clone)]
pub struct Received {
    pub command: String,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    responses: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    received: Vec<Received>,
    listeners: Vec<mpsc::UnboundedSender<io::Result<String>>>,
    follows: Vec<Instant>,
    refuse_follow: bool,
}

/// A scripted game server.
///
/// Acts as both the console ([`CommandSender`]) and the console log
/// ([`LogFollower`]): sending a command appends its scripted response lines
/// to every log follower that is currently attached. Followers only see
/// lines produced after they attached, like a real tail.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A server answering the stock vanilla commands.
    pub fn vanilla() -> Self {
        let server = Self::new();
        server.respond("save-off", "[Server thread/INFO]: Turned off world auto-saving");
        server.respond("save-all", "[Server thread/INFO]: Saving the game (this may take a moment!)");
        server.respond("save-all", "[Server thread/INFO]: Saved the world");
        server.respond("save-on", "[Server thread/INFO]: Turned on world auto-saving");
        server.respond("list", "[Server thread/INFO]: There are 0 of a max of 20 players online:");
        server
    }

    /// Append `line` to the log whenever `command` is received.
    pub fn respond(&self, command: &str, line: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .responses
            .entry(command.to_string())
            .or_default()
            .push(line.to_string());
    }

    /// Forget every scripted response for `command`; it will be silently
    /// accepted.
    pub fn ignore(&self, command: &str) {
        self.state.lock().unwrap().responses.remove(command);
    }

    /// Make delivery of `command` fail as if the session were gone.
    pub fn fail_delivery_of(&self, command: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(command.to_string());
    }

    pub fn refuse_follow(&self) {
        self.state.lock().unwrap().refuse_follow = true;
    }

    /// Write a line to the log without any command.
    pub fn emit(&self, line: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .listeners
            .retain(|tx| tx.send(Ok(line.to_string())).is_ok());
    }

    /// Make every attached follower fail its next read.
    pub fn break_log(&self) {
        let mut state = self.state.lock().unwrap();
        for tx in state.listeners.drain(..) {
            let _ = tx.send(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "log stream closed",
            )));
        }
    }

    /// End the log stream for every attached follower.
    pub fn close_log(&self) {
        self.state.lock().unwrap().listeners.clear();
    }

    pub fn received(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .received
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    pub fn received_at(&self) -> Vec<Received> {
        self.state.lock().unwrap().received.clone()
    }

    /// How many times a log follow was started.
    pub fn follow_count(&self) -> usize {
        self.state.lock().unwrap().follows.len()
    }

    pub fn follow_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().follows.clone()
    }

    /// Followers whose receiving end is still alive.
    pub fn live_followers(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        state.listeners.retain(|tx| !tx.is_closed());
        state.listeners.len()
    }
}

impl FakeServer {
    fn deliver(&self, command: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.received.push(Received {
            command: command.to_string(),
            at: Instant::now(),
        });

        if state.failing.contains(command) {
            return Err(WorldbupError::Sender {
                session: "fake".to_string(),
                command: command.to_string(),
                reason: "No screen session found.".to_string(),
            });
        }

        let lines = state.responses.get(command).cloned().unwrap_or_default();
        for line in lines {
            state.listeners.retain(|tx| tx.send(Ok(line.clone())).is_ok());
        }
        Ok(())
    }

    fn attach(&self) -> io::Result<Box<dyn LineSource>> {
        let mut state = self.state.lock().unwrap();
        state.follows.push(Instant::now());
        if state.refuse_follow {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot open log",
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.listeners.push(tx);
        Ok(Box::new(ChannelLines { rx }))
    }
}

impl CommandSender for FakeServer {
    fn send<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<()>> {
        let result = self.deliver(command);
        Box::pin(async move { result })
    }
}

impl LogFollower for FakeServer {
    fn follow(&self) -> BoxFuture<'_, io::Result<Box<dyn LineSource>>> {
        let result = self.attach();
        Box::pin(async move { result })
    }
}

struct ChannelLines {
    rx: mpsc::UnboundedReceiver<io::Result<String>>,
}

impl LineSource for ChannelLines {
    fn next_line(&mut self) -> BoxFuture<'_, io::Result<Option<String>>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(Ok(line)) => Ok(Some(line)),
                Some(Err(err)) => Err(err),
                None => Ok(None),
            }
        })
    }
}
