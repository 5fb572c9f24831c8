// src/exec/process.rs

//! Pluggable external-process abstraction.
//!
//! Everything that shells out (`screen`, `tmux`, `bup`) goes through a
//! [`ProcessRunner`] instead of `tokio::process::Command` directly, so tests
//! can swap in a runner that records invocations and answers with canned
//! exit codes.

use std::fmt;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

use super::BoxFuture;

/// Program plus arguments. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short human-readable reason for a failed run, for error messages.
    pub fn failure_reason(&self) -> String {
        let code = match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let detail = if !self.stderr.trim().is_empty() {
            self.stderr.trim()
        } else {
            self.stdout.trim()
        };
        if detail.is_empty() {
            code
        } else {
            format!("{code}: {detail}")
        }
    }
}

/// Trait abstracting how external programs are run to completion.
///
/// Production code uses [`TokioProcessRunner`]. Spawn failures are errors;
/// a non-zero exit status is *not* an error at this level and is reported in
/// [`ProcessOutput::code`] for the caller to judge.
pub trait ProcessRunner: Send + Sync {
    fn run<'a>(&'a self, spec: &'a ProcessSpec) -> BoxFuture<'a, Result<ProcessOutput>>;
}

/// Real runner backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for TokioProcessRunner {
    fn run<'a>(&'a self, spec: &'a ProcessSpec) -> BoxFuture<'a, Result<ProcessOutput>> {
        Box::pin(async move {
            debug!(cmd = %spec, "running external process");

            let output = Command::new(&spec.program)
                .args(&spec.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("spawning `{}`", spec.program))?;

            let result = ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };

            debug!(
                cmd = %spec,
                exit_code = ?result.code,
                success = result.success(),
                "external process exited"
            );

            Ok(result)
        })
    }
}
