//! Locked, atomic file writes for the data file.
//!
//! The data file is rewritten in full after every mutation. Writes go to a
//! temp file in the same directory and are renamed into place while an
//! advisory `fs2` lock is held on `<file>.lock`, so a reader never sees a
//! half-written file and two `kanban` processes never interleave writes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const LOCK_RETRY_INTERVAL_MS: u64 = 25;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // Windows reports sharing/lock violations as raw OS errors 32 and 33.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Exclusive advisory lock, released on drop.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Wait up to `timeout_ms` for an exclusive lock on `path`.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(err) if is_lock_contended(&err) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    std::thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(file)
}

/// Lock file guarding `path`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

/// Write `data` to `path` via temp file and rename. Takes no lock.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = PathBuf::from(format!("{}.tmp.{}", path.display(), std::process::id()));
    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Atomic write while holding the lock on `<path>.lock`.
pub fn write_atomic_locked(path: impl AsRef<Path>, data: &[u8], timeout_ms: u64) -> Result<()> {
    let path = path.as_ref();
    let _lock = FileLock::acquire(lock_path_for(path), timeout_ms)?;
    write_atomic(path, data)
}

/// Read `path` as UTF-8 while holding the lock on `<path>.lock`.
pub fn read_locked_str(path: impl AsRef<Path>, timeout_ms: u64) -> Result<String> {
    let path = path.as_ref();
    let _lock = FileLock::acquire(lock_path_for(path), timeout_ms)?;
    Ok(fs::read_to_string(path)?)
}
