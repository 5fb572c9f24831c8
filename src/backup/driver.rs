// src/backup/driver.rs

//! `bup` invocations against one monthly repository.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{Result, WorldbupError};
use crate::exec::{ProcessRunner, ProcessSpec};
use crate::fs::FileSystem;

pub struct BupDriver {
    runner: Arc<dyn ProcessRunner>,
    fs: Arc<dyn FileSystem>,
    binary: String,
    branch: String,
}

impl std::fmt::Debug for BupDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BupDriver")
            .field("binary", &self.binary)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl BupDriver {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        fs: Arc<dyn FileSystem>,
        binary: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            fs,
            binary: binary.into(),
            branch: branch.into(),
        }
    }

    pub fn from_config(
        cfg: &ConfigFile,
        runner: Arc<dyn ProcessRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self::new(runner, fs, cfg.bup.binary.clone(), cfg.bup.branch.clone())
    }

    /// Create and `bup init` the repository unless something already exists
    /// at `repo`. Returns whether a new repository was created.
    pub async fn ensure_repo(&self, repo: &Path) -> Result<bool> {
        if self.fs.try_exists(repo)? {
            debug!(repo = ?repo, "repository already exists");
            return Ok(false);
        }

        info!(repo = ?repo, "creating new backup repository");
        self.fs.create_dir_all(repo)?;
        self.bup(repo, "init", &[]).await?;
        Ok(true)
    }

    /// Index `source` and save a snapshot of it on the configured branch.
    ///
    /// The two steps run strictly in order; a failed index never reaches
    /// `save`. Partial state inside the repository is left to bup.
    pub async fn backup(&self, repo: &Path, source: &Path) -> Result<()> {
        self.ensure_repo(repo).await?;

        let source_arg = source.to_string_lossy().into_owned();
        self.bup(repo, "index", &[source_arg.as_str()]).await?;
        self.bup(repo, "save", &["-n", self.branch.as_str(), source_arg.as_str()])
            .await?;

        info!(repo = ?repo, source = ?source, branch = %self.branch, "snapshot saved");
        Ok(())
    }

    /// Delete the repository at `repo` if there is one. Returns whether
    /// anything was removed; calling it again is a no-op.
    pub fn prune(&self, repo: &Path) -> Result<bool> {
        if !self.fs.try_exists(repo)? {
            debug!(repo = ?repo, "nothing to prune");
            return Ok(false);
        }
        self.fs.remove_dir_all(repo)?;
        info!(repo = ?repo, "pruned expired repository");
        Ok(true)
    }

    async fn bup(&self, repo: &Path, operation: &str, args: &[&str]) -> Result<()> {
        let spec = ProcessSpec::new(&self.binary)
            .arg("-d")
            .arg(repo.to_string_lossy())
            .arg(operation)
            .args(args.iter().copied());

        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|err| self.tool_error(operation, format!("{err:#}")))?;

        if !output.success() {
            return Err(self.tool_error(operation, output.failure_reason()));
        }
        Ok(())
    }

    fn tool_error(&self, operation: &str, detail: String) -> WorldbupError {
        WorldbupError::BackupTool {
            program: self.binary.clone(),
            operation: operation.to_string(),
            detail,
        }
    }
}
