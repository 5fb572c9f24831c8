use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use worldbup::exec::{BoxFuture, ProcessOutput, ProcessRunner, ProcessSpec};

#[derive(Debug, Clone)]
enum Failure {
    Exit { code: i32, stderr: String },
    Spawn(String),
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<ProcessSpec>,
    failures: Vec<(String, Failure)>,
}

/// Process runner that records every invocation and succeeds unless told
/// otherwise.
///
/// Failures are keyed on an argument: the first invocation carrying that
/// argument (anywhere in its argument list) fails.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations carrying `arg` exit with `code` and `stderr`.
    pub fn fail_on(&self, arg: &str, code: i32, stderr: &str) {
        self.inner.lock().unwrap().failures.push((
            arg.to_string(),
            Failure::Exit {
                code,
                stderr: stderr.to_string(),
            },
        ));
    }

    /// Invocations carrying `arg` cannot even be started.
    pub fn spawn_error_on(&self, arg: &str, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .push((arg.to_string(), Failure::Spawn(message.to_string())));
    }

    pub fn calls(&self) -> Vec<ProcessSpec> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Each call rendered as one command line.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// The operation word (`init`, `index`, `save`) of every bup call.
    pub fn bup_operations(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|spec| spec.args.get(2).cloned())
            .collect()
    }

    fn record(&self, spec: &ProcessSpec) -> anyhow::Result<ProcessOutput> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(spec.clone());

        let failure = inner
            .failures
            .iter()
            .find(|(arg, _)| spec.args.iter().any(|a| a == arg))
            .map(|(_, failure)| failure.clone());

        match failure {
            None => Ok(ProcessOutput {
                code: Some(0),
                ..ProcessOutput::default()
            }),
            Some(Failure::Exit { code, stderr }) => Ok(ProcessOutput {
                code: Some(code),
                stdout: String::new(),
                stderr,
            }),
            Some(Failure::Spawn(message)) => Err(anyhow!("failed to spawn {}: {message}", spec.program)),
        }
    }
}

impl ProcessRunner for RecordingRunner {
    fn run<'a>(&'a self, spec: &'a ProcessSpec) -> BoxFuture<'a, anyhow::Result<ProcessOutput>> {
        let result = self.record(spec);
        Box::pin(async move { result })
    }
}
