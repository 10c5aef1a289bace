//! Durable storage for the quota ledger
//!
//! The file backend keeps an append-only log of `count,day` lines; the last
//! line is authoritative. A day change truncates the log so the previous
//! day's count never carries over. Reads and writes hold an advisory lock on
//! a sibling `.lock` file, but the read-modify-write across processes is not
//! atomic: concurrent runs resolve as last-writer-wins.

use super::{QuotaError, QuotaState};
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Narrow persistence seam for [`QuotaState`]
pub trait QuotaStore: Send + Sync {
    /// Read the authoritative state, `None` if nothing has been persisted
    fn read(&self) -> Result<Option<QuotaState>, QuotaError>;

    /// Durably persist `state` before returning
    fn write(&self, state: &QuotaState) -> Result<(), QuotaError>;
}

/// File-backed quota log
#[derive(Debug, Clone)]
pub struct FileQuotaStore {
    path: PathBuf,
}

impl FileQuotaStore {
    /// Store backed by the log file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock_file(&self) -> Result<File, QuotaError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| QuotaError::IoError(e.to_string()))?;
            }
        }

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.path.with_extension("lock"))
            .map_err(|e| QuotaError::LockError(format!("Failed to open lock file: {e}")))
    }

    /// Last entry of the log, without taking the lock
    fn read_last_entry(&self) -> Result<Option<QuotaState>, QuotaError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| QuotaError::IoError(e.to_string()))?;

        // A single-entry log is both first and last entry
        match contents.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(line) => QuotaState::parse_line(line).map(Some),
            None => Ok(None),
        }
    }
}

impl QuotaStore for FileQuotaStore {
    fn read(&self) -> Result<Option<QuotaState>, QuotaError> {
        let lock = RwLock::new(self.open_lock_file()?);
        let _guard = lock
            .read()
            .map_err(|e| QuotaError::LockError(format!("Failed to acquire read lock: {e}")))?;

        let state = self.read_last_entry()?;
        debug!(path = %self.path.display(), ?state, "Read quota record");
        Ok(state)
    }

    fn write(&self, state: &QuotaState) -> Result<(), QuotaError> {
        let mut lock = RwLock::new(self.open_lock_file()?);
        let _guard = lock
            .write()
            .map_err(|e| QuotaError::LockError(format!("Failed to acquire write lock: {e}")))?;

        let replace = match self.read_last_entry() {
            Ok(Some(last)) => last.day_of_month != state.day_of_month,
            Ok(None) => true,
            // An unreadable log is replaced by the state we are about to record
            Err(QuotaError::CorruptRecord(_)) => true,
            Err(e) => return Err(e),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!replace)
            .truncate(replace)
            .open(&self.path)
            .map_err(|e| QuotaError::IoError(format!("Failed to open quota file: {e}")))?;

        writeln!(file, "{}", state.to_line())
            .map_err(|e| QuotaError::IoError(format!("Failed to write quota entry: {e}")))?;
        file.flush()
            .map_err(|e| QuotaError::IoError(format!("Failed to flush quota file: {e}")))?;
        file.sync_all()
            .map_err(|e| QuotaError::IoError(format!("Failed to sync quota file: {e}")))?;

        debug!(
            path = %self.path.display(),
            calls_today = state.calls_today,
            day = state.day_of_month,
            replaced = replace,
            "Persisted quota entry"
        );
        Ok(())
    }
}

/// In-memory store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    state: Mutex<Option<QuotaState>>,
    writes: AtomicUsize,
}

impl MemoryQuotaStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `state`, as if persisted by an earlier run
    pub fn with_state(state: QuotaState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn read(&self) -> Result<Option<QuotaState>, QuotaError> {
        let state = self.state.lock().map_err(|_| QuotaError::Poisoned)?;
        Ok(*state)
    }

    fn write(&self, state: &QuotaState) -> Result<(), QuotaError> {
        let mut current = self.state.lock().map_err(|_| QuotaError::Poisoned)?;
        *current = Some(*state);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<S: QuotaStore + ?Sized> QuotaStore for std::sync::Arc<S> {
    fn read(&self) -> Result<Option<QuotaState>, QuotaError> {
        (**self).read()
    }

    fn write(&self, state: &QuotaState) -> Result<(), QuotaError> {
        (**self).write(state)
    }
}
