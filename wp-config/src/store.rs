//! Workspace Config Store.
//!
//! Every mutating command holds [`WorkspaceLock`] across its whole
//! read-modify-write. Saves are atomic (temp file plus rename) and refuse to
//! overwrite a document whose `revision` moved since it was loaded.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::{debug, warn};
use wp_core::error::{Result, WpError};

use crate::workspace::Workspace;

pub const WORKSPACE_FILE: &str = "wp-workspace.json";

const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Exclusive advisory lock on `<workspace>/wp-workspace.json.lock`.
///
/// Released on drop.
#[derive(Debug)]
pub struct WorkspaceLock {
    file: File,
    path: PathBuf,
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("Failed to release workspace lock {:?}: {}", self.path, e);
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl WorkspaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(WORKSPACE_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(format!("{}.lock", WORKSPACE_FILE))
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Take the workspace lock, retrying until the configured timeout.
    pub fn lock(&self) -> Result<WorkspaceLock> {
        fs::create_dir_all(&self.root)?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) => {
                    attempts += 1;
                    if started.elapsed() >= self.lock_timeout {
                        return Err(WpError::Timeout(format!(
                            "workspace lock {:?} still held after {} attempts: {}",
                            path, attempts, e
                        )));
                    }
                    if attempts == 1 {
                        debug!("Workspace lock busy, waiting: {:?}", path);
                    }
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
            }
        }

        debug!("Acquired workspace lock after {} retries", attempts);
        Ok(WorkspaceLock { file, path })
    }

    /// Read the document; a missing file yields a default workspace.
    pub fn load(&self) -> Result<Workspace> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No workspace document at {:?}, using defaults", path);
                return Ok(Workspace::default());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Workspace::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            WpError::Config(format!("Failed to parse workspace document {:?}: {}", path, e))
        })
    }

    /// Read the document, failing when `init` has not run.
    pub fn load_required(&self) -> Result<Workspace> {
        let workspace = self.load()?;
        if !workspace.is_initialized() {
            return Err(WpError::NotFound(format!(
                "No workspace at {:?}. Run 'wp-manager init <name>' first",
                self.root
            )));
        }
        Ok(workspace)
    }

    fn disk_revision(&self) -> Result<Option<u64>> {
        let path = self.path();
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Some(0));
        }
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(Some(
            value
                .get("revision")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
        ))
    }

    /// Write the document atomically and bump its revision.
    ///
    /// Fails with [`WpError::ConcurrentModification`] if the on-disk revision
    /// differs from the one `workspace` was loaded with.
    pub fn save(&self, workspace: &mut Workspace) -> Result<()> {
        let on_disk = self.disk_revision()?;
        match on_disk {
            Some(rev) if rev != workspace.revision => {
                return Err(WpError::ConcurrentModification(format!(
                    "expected revision {}, found {}",
                    workspace.revision, rev
                )));
            }
            None if workspace.revision != 0 => {
                return Err(WpError::ConcurrentModification(format!(
                    "{:?} disappeared since revision {}",
                    self.path(),
                    workspace.revision
                )));
            }
            _ => {}
        }

        let mut next = workspace.clone();
        next.revision += 1;
        let json = serde_json::to_string_pretty(&next)?;

        fs::create_dir_all(&self.root)?;
        let path = self.path();
        let temp_path = self
            .root
            .join(format!("{}.tmp.{}", WORKSPACE_FILE, std::process::id()));
        fs::write(&temp_path, format!("{}\n", json))?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        workspace.revision = next.revision;
        debug!("Saved workspace document revision {}", workspace.revision);
        Ok(())
    }

    /// Lock, load, apply `f`, save. Nothing is written when `f` fails.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Workspace) -> Result<T>,
    {
        let _lock = self.lock()?;
        let mut workspace = self.load()?;
        let out = f(&mut workspace)?;
        self.save(&mut workspace)?;
        Ok(out)
    }
}
