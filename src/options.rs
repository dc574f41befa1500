//! Writer configuration.
//!
//! The flush threshold has a process-wide default that individual writers
//! can override through [`StagingOptions`].

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::fs::StagedFile;

/// Default number of unsynced bytes tolerated before a forced sync (4 MiB).
pub const DEFAULT_SYNC_THRESHOLD: usize = 4 * 1024 * 1024;

/// Default mode for a missing temporary directory.
pub const DEFAULT_DIR_MODE: u32 = 0o770;

/// Default mode for missing destination parent directories.
pub const DEFAULT_PARENT_MODE: u32 = 0o755;

static SYNC_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_SYNC_THRESHOLD);

/// Returns the process-wide flush threshold used by new writers.
pub fn default_sync_threshold() -> usize {
    SYNC_THRESHOLD.load(Ordering::Relaxed)
}

/// Changes the process-wide flush threshold.
///
/// Only writers created afterwards pick up the new value.
pub fn set_default_sync_threshold(bytes: usize) {
    SYNC_THRESHOLD.store(bytes, Ordering::Relaxed);
}

/// Builder for a [`StagedFile`].
///
/// ```no_run
/// # fn example() -> atomic_writer::Result<()> {
/// use atomic_writer::StagingOptions;
///
/// let writer = StagingOptions::new()
///     .sync_threshold(64 * 1024)
///     .prefix(".upload")
///     .create("/var/tmp/stage", "/srv/data")?;
/// # drop(writer);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StagingOptions {
    pub(crate) sync_threshold: usize,
    pub(crate) prefix: String,
    pub(crate) dir_mode: u32,
    pub(crate) parent_mode: u32,
    pub(crate) sync_parent: bool,
}

impl Default for StagingOptions {
    fn default() -> Self {
        Self {
            sync_threshold: default_sync_threshold(),
            prefix: ".tmp".to_string(),
            dir_mode: DEFAULT_DIR_MODE,
            parent_mode: DEFAULT_PARENT_MODE,
            sync_parent: true,
        }
    }
}

impl StagingOptions {
    /// Options with the current process-wide defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsynced bytes tolerated before `write` forces a sync.
    ///
    /// Zero is treated as one.
    pub fn sync_threshold(mut self, bytes: usize) -> Self {
        self.sync_threshold = bytes.max(1);
        self
    }

    /// Name prefix of the staging file.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Mode of the temporary directory when it has to be created (unix only).
    pub fn dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Mode of destination parents created on commit (unix only).
    pub fn parent_mode(mut self, mode: u32) -> Self {
        self.parent_mode = mode;
        self
    }

    /// Whether to fsync the destination directory after the rename.
    pub fn sync_parent(mut self, enabled: bool) -> Self {
        self.sync_parent = enabled;
        self
    }

    /// Creates a writer staging into `temp_dir`.
    pub fn create(
        self,
        temp_dir: impl AsRef<Path>,
        dst_dir_hint: impl AsRef<Path>,
    ) -> Result<StagedFile> {
        StagedFile::with_options(temp_dir.as_ref(), dst_dir_hint.as_ref(), self)
    }
}
