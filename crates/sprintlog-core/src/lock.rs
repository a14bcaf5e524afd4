use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Default time to wait for another run to release a log.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Advisory lock errors for snapshot logs.
#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    IoError(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::LogWriteFailed,
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, waited } => {
                write!(
                    f,
                    "{}: lock timed out after {:?} at {}",
                    self.code().code(),
                    waited,
                    path.display()
                )
            }
            Self::IoError(err) => write!(f, "{}: {}", self.code().code(), err),
        }
    }
}

impl std::error::Error for LockError {}

/// RAII guard holding the exclusive lock of one snapshot log.
///
/// The lock lives in a sibling `<log>.lock` file so the log itself can be
/// replaced by rename while the lock is held.
#[derive(Debug)]
pub struct LogLock {
    file: File,
    path: PathBuf,
}

impl LogLock {
    /// Lock file path for the log at `log_path`.
    #[must_use]
    pub fn path_for(log_path: &Path) -> PathBuf {
        let mut name = log_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Acquire the exclusive lock for `log_path`, polling until `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if another process keeps the lock for
    /// longer than `timeout`, or [`LockError::IoError`] if the lock file
    /// cannot be created.
    pub fn acquire(log_path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = Self::path_for(log_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            if file.try_lock_exclusive().is_ok() {
                tracing::debug!(path = %path.display(), "acquired log lock");
                return Ok(Self { file, path });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path,
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        drop(self);
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_is_sibling_of_log() {
        assert_eq!(
            LogLock::path_for(Path::new("snapshots/Sprint-1.json")),
            PathBuf::from("snapshots/Sprint-1.json.lock")
        );
    }

    #[test]
    fn second_lock_times_out_while_first_is_held() {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("s.json");

        let held = LogLock::acquire(&log, Duration::from_millis(50)).expect("first lock");
        let err = LogLock::acquire(&log, Duration::from_millis(30)).expect_err("contention");
        assert!(matches!(err, LockError::Timeout { .. }));
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.to_string().starts_with("E5002"));

        held.release();
        let again = LogLock::acquire(&log, Duration::from_millis(50)).expect("relock");
        assert!(again.path().ends_with("s.json.lock"));
    }
}
