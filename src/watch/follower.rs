// src/watch/follower.rs

//! Following a growing log file from its current end, `tail -F` style.

use std::collections::VecDeque;
use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::exec::BoxFuture;

/// Default interval at which the file is re-checked even without a
/// filesystem notification.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Most bytes taken from the log in one read.
const READ_CHUNK: usize = 64 * 1024;

/// A stream of complete log lines.
///
/// `Ok(None)` means the stream has ended and will never produce more lines.
pub trait LineSource: Send {
    fn next_line(&mut self) -> BoxFuture<'_, io::Result<Option<String>>>;
}

/// Something that can start following a log.
///
/// `follow` must only resolve once the returned source is positioned at the
/// current end of the log: lines written after that point are delivered,
/// lines written before it never are.
pub trait LogFollower: Send + Sync {
    fn follow(&self) -> BoxFuture<'_, io::Result<Box<dyn LineSource>>>;
}

/// Production follower for a log file on disk.
#[derive(Debug, Clone)]
pub struct FileFollower {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileFollower {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogFollower for FileFollower {
    fn follow(&self) -> BoxFuture<'_, io::Result<Box<dyn LineSource>>> {
        Box::pin(async move {
            let tail = FileTail::open(&self.path, self.poll_interval).await?;
            Ok(Box::new(tail) as Box<dyn LineSource>)
        })
    }
}

/// Identity of the file currently behind the path, so a rotated-in file is
/// told apart from the one we were reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Self {
        Self {}
    }
}

/// Open tail on a single file.
///
/// Dropping it closes the file and stops the filesystem watch.
pub struct FileTail {
    path: PathBuf,
    file: Option<File>,
    identity: Option<FileIdentity>,
    offset: u64,
    pending: Vec<u8>,
    lines: VecDeque<String>,
    wakeups: Option<mpsc::UnboundedReceiver<()>>,
    poll_interval: Duration,
    _watcher: Option<RecommendedWatcher>,
}

impl FileTail {
    /// Open `path` positioned at its current end.
    ///
    /// A file that does not exist yet is fine: it is picked up from its
    /// first byte once it appears.
    pub async fn open(path: &Path, poll_interval: Duration) -> io::Result<Self> {
        let (file, identity, offset) = match File::open(path).await {
            Ok(mut file) => {
                let meta = file.metadata().await?;
                let offset = file.seek(SeekFrom::End(0)).await?;
                (Some(file), Some(FileIdentity::of(&meta)), offset)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = ?path, "log file does not exist yet; waiting for it");
                (None, None, 0)
            }
            Err(e) => return Err(e),
        };

        let (watcher, wakeups) = match spawn_dir_watch(path) {
            Ok((watcher, rx)) => (Some(watcher), Some(rx)),
            Err(err) => {
                warn!(path = ?path, error = %err, "cannot watch log directory; polling only");
                (None, None)
            }
        };

        debug!(path = ?path, offset, "following log file");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            identity,
            offset,
            pending: Vec::new(),
            lines: VecDeque::new(),
            wakeups,
            poll_interval,
            _watcher: watcher,
        })
    }

    /// Read up to one chunk of whatever was appended since the last call
    /// and split it into lines. Reopens the file from the start after
    /// truncation or rotation. Returns whether unread bytes remain.
    async fn poll_file(&mut self) -> io::Result<bool> {
        let meta = match fs::metadata(&self.path).await {
            Ok(meta) => meta,
            // Rotated away and not recreated yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        let identity = FileIdentity::of(&meta);
        let replaced = self.identity.is_some_and(|current| current != identity);
        let truncated = meta.len() < self.offset;

        if self.file.is_none() || replaced || truncated {
            if self.file.is_some() {
                info!(path = ?self.path, replaced, truncated, "log file rotated; reopening");
            }
            self.file = Some(File::open(&self.path).await?);
            self.identity = Some(identity);
            self.offset = 0;
            self.pending.clear();
        }

        if meta.len() <= self.offset {
            return Ok(false);
        }

        let Some(file) = self.file.as_mut() else {
            return Ok(false);
        };
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = vec![0u8; READ_CHUNK];
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok(false);
        }
        self.offset += read as u64;
        self.pending.extend_from_slice(&buf[..read]);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            self.lines
                .push_back(line.trim_end_matches(['\n', '\r']).to_string());
        }

        Ok(self.offset < meta.len())
    }

    async fn wait_for_change(&mut self) {
        let poll = tokio::time::sleep(self.poll_interval);
        let closed = match self.wakeups.as_mut() {
            Some(rx) => {
                tokio::select! {
                    received = rx.recv() => received.is_none(),
                    _ = poll => false,
                }
            }
            None => {
                poll.await;
                false
            }
        };
        if closed {
            debug!(path = ?self.path, "log watch channel closed; polling only");
            self.wakeups = None;
        }
    }
}

impl LineSource for FileTail {
    fn next_line(&mut self) -> BoxFuture<'_, io::Result<Option<String>>> {
        Box::pin(async move {
            loop {
                if let Some(line) = self.lines.pop_front() {
                    return Ok(Some(line));
                }
                let more = self.poll_file().await?;
                if more || !self.lines.is_empty() {
                    continue;
                }
                self.wait_for_change().await;
            }
        })
    }
}

/// Watch the log's parent directory so creation and rotation of the file
/// are noticed as well as writes to it.
fn spawn_dir_watch(
    path: &Path,
) -> notify::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name().map(|n| n.to_os_string());

    let (tx, rx) = mpsc::unbounded_channel::<()>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let relevant = match &file_name {
                    Some(name) => event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(name.as_os_str())),
                    None => true,
                };
                if relevant {
                    let _ = tx.send(());
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    Ok((watcher, rx))
}
