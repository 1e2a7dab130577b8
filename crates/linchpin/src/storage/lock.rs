//! Advisory file lock serializing writers across processes.
//!
//! Each `linchpin` process keeps its own in-memory copy of the edges file,
//! so an in-process mutex cannot stop two processes from committing against
//! stale views. Every mutating store call holds a [`WriteLock`] on a sibling
//! `*.lock` file while it re-reads, modifies and rewrites the data file.

use crate::error::{Result, StorageError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long a writer waits for another process before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Lock file path for a data file: `deps.jsonl` -> `deps.jsonl.lock`.
#[must_use]
pub fn lock_path_for(data_file: &Path) -> PathBuf {
    let mut name = data_file.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// RAII guard for an exclusive advisory lock. Released on drop.
#[derive(Debug)]
pub(crate) struct WriteLock {
    file: File,
}

impl WriteLock {
    /// Acquire the lock at `path`, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] on timeout or if the lock file
    /// cannot be opened.
    pub(crate) async fn acquire(path: PathBuf, timeout: Duration) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::acquire_blocking(&path, timeout))
            .await
            .map_err(|e| StorageError::Unavailable(format!("lock task failed: {e}")))?
    }

    fn acquire_blocking(path: &Path, timeout: Duration) -> Result<Self> {
        let unavailable =
            |e: io::Error| StorageError::Unavailable(format!("cannot lock {}: {e}", path.display()));

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(unavailable)?;

        let start = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(_) if start.elapsed() >= timeout => {
                    return Err(StorageError::Unavailable(format!(
                        "timed out after {timeout:?} waiting for {}",
                        path.display()
                    ))
                    .into());
                }
                Err(_) => thread::sleep(RETRY_INTERVAL),
            }
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "Failed to release write lock");
        }
    }
}
