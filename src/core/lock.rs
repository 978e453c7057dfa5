//! Exclusive run lock over the queue root.
//!
//! Two runs against the same directories could both list and process the
//! same pending idea, so a run refuses to start while another holds the lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

/// Held for the duration of a run; released on drop
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    _file: File,
}

impl RunLock {
    pub const FILE_NAME: &'static str = ".idea-review.lock";

    /// Take the lock in `root`, failing immediately if another process has it
    pub fn acquire(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create queue root: {}", root.display()))?;

        let path = root.join(Self::FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        file.try_lock_exclusive().with_context(|| {
            format!(
                "Another idea-review run is using {} (lock: {})",
                root.display(),
                path.display()
            )
        })?;

        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
