use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

/// Coalesces external change notifications until a quiet window passes.
///
/// Only paths that name a manifest (or a skill directory) under the store's
/// `skills/` directory count.
#[derive(Debug)]
pub struct ChangeDebouncer {
    skills_dir: PathBuf,
    manifest_file: String,
    quiet: Duration,
    pending: BTreeSet<PathBuf>,
    last_event: Option<Instant>,
}

impl ChangeDebouncer {
    pub fn new(skills_dir: impl Into<PathBuf>, manifest_file: impl Into<String>, quiet: Duration) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            manifest_file: manifest_file.into(),
            quiet,
            pending: BTreeSet::new(),
            last_event: None,
        }
    }

    /// Record changed paths now. Returns how many were relevant.
    pub fn record<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.record_at(paths, Instant::now())
    }

    pub fn record_at<I, P>(&mut self, paths: I, now: Instant) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut relevant = 0;
        for path in paths {
            let path = path.as_ref();
            if self.is_relevant(path) {
                self.pending.insert(path.to_path_buf());
                relevant += 1;
            } else {
                debug!("ignoring change to {}", path.display());
            }
        }
        if relevant > 0 {
            self.last_event = Some(now);
        }
        relevant
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether the quiet window has elapsed since the last relevant event.
    #[must_use]
    pub fn due_at(&self, now: Instant) -> bool {
        match self.last_event {
            Some(last) if self.is_pending() => now.saturating_duration_since(last) >= self.quiet,
            _ => false,
        }
    }

    #[must_use]
    pub fn due(&self) -> bool {
        self.due_at(Instant::now())
    }

    /// Drain the pending set.
    pub fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    fn is_relevant(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.skills_dir) else {
            return false;
        };
        let mut parts = rel.components();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), None, None) => true,
            (Some(_), Some(file), None) => file.as_os_str() == self.manifest_file.as_str(),
            _ => false,
        }
    }
}
