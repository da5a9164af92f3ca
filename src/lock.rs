//! File-based locking for single-writer safety across processes.
//!
//! Cross-platform (fs2) advisory locks:
//! - Exclusive: writer store, blocks other writers and readers.
//! - Shared: read-only stores (`Store::open_ro`), many at once.
//!
//! Lock file path: <root>/LOCK
//! Lock is released on Drop.

use fs2::FileExt;
use log::debug;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE;
use crate::error::{IoContext, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Debug)]
pub struct LockGuard {
    file: std::fs::File,
    path: PathBuf,
    mode: LockMode,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("released {:?} lock {}", self.mode, self.path.display());
    }
}

fn open_lock_file(root: &Path) -> Result<(std::fs::File, PathBuf)> {
    let path = root.join(LOCK_FILE);
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .at(&path)?;
    Ok((f, path))
}

/// Try to acquire a lock in the requested mode. Returns Err if already locked
/// (a second writer, or a writer while readers hold the shared lock).
pub fn try_acquire_lock(root: &Path, mode: LockMode) -> Result<LockGuard> {
    let (file, path) = open_lock_file(root)?;
    match mode {
        LockMode::Shared => FileExt::try_lock_shared(&file).at(&path)?,
        LockMode::Exclusive => FileExt::try_lock_exclusive(&file).at(&path)?,
    }
    Ok(LockGuard { file, path, mode })
}
