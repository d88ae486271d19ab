use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use crate::error::AtlasError;

/// Default wait before giving up on a contended state lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug)]
enum LockKind {
    Shared,
    Exclusive,
}

/// RAII advisory lock guarding the progress state file.
///
/// Readers take a shared lock, writers an exclusive one. The lock lives in a
/// sibling `.lock` file so the state file itself can be replaced by rename.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Acquire a shared (read) lock.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::LockTimeout`] if a writer holds the lock for longer
    /// than `timeout`, or [`AtlasError::StateRead`] on I/O failure.
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, AtlasError> {
        Self::acquire(path, timeout, LockKind::Shared).map_err(|err| match err {
            LockFailure::Timeout(waited) => AtlasError::LockTimeout {
                path: path.to_path_buf(),
                waited,
            },
            LockFailure::Io(e) => AtlasError::StateRead(e),
        })
    }

    /// Acquire an exclusive (write) lock.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::LockTimeout`] if the lock is held for longer than
    /// `timeout`, or [`AtlasError::StateWrite`] on I/O failure.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, AtlasError> {
        Self::acquire(path, timeout, LockKind::Exclusive).map_err(|err| match err {
            LockFailure::Timeout(waited) => AtlasError::LockTimeout {
                path: path.to_path_buf(),
                waited,
            },
            LockFailure::Io(e) => AtlasError::StateWrite(e),
        })
    }

    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockFailure> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        fs::create_dir_all(parent)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            let contended = match kind {
                LockKind::Shared => file.try_lock_shared().is_err(),
                LockKind::Exclusive => file.try_lock_exclusive().is_err(),
            };

            if !contended {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                tracing::warn!(path = %path.display(), ?kind, "state lock timed out");
                return Err(LockFailure::Timeout(start.elapsed()));
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

enum LockFailure {
    Timeout(Duration),
    Io(io::Error),
}

impl From<io::Error> for LockFailure {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
