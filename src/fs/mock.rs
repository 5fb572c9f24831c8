// src/fs/mock.rs

use super::FileSystem;
use crate::errors::{Result, WorldbupError};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    denied: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        insert_dirs(&mut entries, path.as_ref());
    }

    /// Make every mutation at or below `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.denied
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.lock().unwrap().contains_key(path.as_ref())
    }

    /// Every path currently in the tree, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    fn check_allowed(&self, path: &Path) -> Result<()> {
        let denied = self.denied.lock().unwrap();
        if denied.iter().any(|d| path.starts_with(d)) {
            return Err(WorldbupError::fs(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied by mock"),
            ));
        }
        Ok(())
    }
}

fn insert_dirs(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

impl FileSystem for MockFileSystem {
    fn try_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.entries.lock().unwrap().contains_key(path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check_allowed(path)?;
        let mut entries = self.entries.lock().unwrap();
        if let Some(MockEntry::File(_)) = entries.get(path) {
            return Err(WorldbupError::fs(
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "a file is in the way"),
            ));
        }
        insert_dirs(&mut entries, path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.check_allowed(path)?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir) => {
                entries.retain(|p, _| !p.starts_with(path));
                Ok(())
            }
            Some(MockEntry::File(_)) => Err(WorldbupError::fs(
                path,
                io::Error::new(io::ErrorKind::Other, "not a directory"),
            )),
            None => Err(WorldbupError::fs(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            )),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir) => Ok(entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(WorldbupError::fs(
                path,
                io::Error::new(io::ErrorKind::NotFound, "not a directory or not found"),
            )),
        }
    }
}
