// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, WorldbupError};

pub mod mock;

/// Abstract filesystem interface for the repository directories.
pub trait FileSystem: Send + Sync + Debug {
    /// `Ok(false)` only when the path definitely does not exist; any other
    /// stat failure is an error.
    fn try_exists(&self, path: &Path) -> Result<bool>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn try_exists(&self, path: &Path) -> Result<bool> {
        path.try_exists().map_err(|e| WorldbupError::fs(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o770);
        }
        builder.create(path).map_err(|e| WorldbupError::fs(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| WorldbupError::fs(path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| WorldbupError::fs(path, e))? {
            let entry = entry.map_err(|e| WorldbupError::fs(path, e))?;
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }
}
