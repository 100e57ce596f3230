//! Cross-process lock on a storage root.
//!
//! Every document mutation runs while holding an exclusive `fs2` lock on
//! `<root>/.skillrepo.lock`. The file also records who holds it.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RepoError, Result};

pub const LOCK_FILENAME: &str = ".skillrepo.lock";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Information about the current lock holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub hostname: String,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at: Utc::now(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    /// Try to take the lock without blocking.
    pub fn try_acquire(root: &Path) -> Result<Option<Self>> {
        fs::create_dir_all(root)?;
        let path = root.join(LOCK_FILENAME);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| RepoError::LockFailed(format!("open lock file: {e}")))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                debug!("lock held by another process");
                return Ok(None);
            }
            Err(e) => return Err(RepoError::LockFailed(format!("try acquire lock: {e}"))),
        }

        // Holder info is advisory; a failed write does not release the lock.
        if let Ok(json) = serde_json::to_string(&LockHolder::current()) {
            let written = file
                .set_len(0)
                .and_then(|()| file.seek(SeekFrom::Start(0)))
                .and_then(|_| file.write_all(json.as_bytes()));
            if let Err(err) = written {
                debug!("could not record lock holder: {err}");
            }
        }

        debug!("acquired lock at {}", path.display());
        Ok(Some(Self { file, path }))
    }

    /// Poll for the lock until `timeout` elapses.
    pub fn acquire_timeout(root: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(root)? {
                return Ok(lock);
            }
            if start.elapsed() >= timeout {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        let holder = Self::status(root).ok().flatten().map_or_else(
            || "unknown holder".to_string(),
            |h| format!("pid {} on {} since {}", h.pid, h.hostname, h.acquired_at),
        );
        warn!("timeout waiting for lock after {:?} ({holder})", start.elapsed());
        Err(RepoError::LockTimeout(format!(
            "{} held by {holder}",
            root.join(LOCK_FILENAME).display()
        )))
    }

    /// Read the recorded holder without acquiring.
    pub fn status(root: &Path) -> Result<Option<LockHolder>> {
        let path = root.join(LOCK_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let holder: LockHolder = serde_json::from_str(&content)
            .map_err(|e| RepoError::LockFailed(format!("parse lock holder: {e}")))?;

        #[cfg(target_os = "linux")]
        {
            if !Path::new(&format!("/proc/{}", holder.pid)).exists() {
                return Ok(None);
            }
        }

        Ok(Some(holder))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            warn!("failed to release lock {}: {err}", self.path.display());
        }
    }
}
