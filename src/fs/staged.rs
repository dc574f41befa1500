//! A single staged write with an atomic commit.
//!
//! ## Lifecycle
//!
//! 1. **Create**: allocate a uniquely named file inside a private temporary
//!    directory (created if missing)
//! 2. **Write**: append bytes; every `sync_threshold` unsynced bytes force a
//!    durability flush
//! 3. **Commit**: sync, create destination parents, rename over the
//!    destination, release the handle
//! 4. **Discard**: delete the staging file and release the handle
//!
//! Commit and discard are terminal. Discard after commit is a no-op, and a
//! writer dropped in the middle discards itself.
//!
//! ## Example
//!
//! ```no_run
//! # use atomic_writer::{AtomicWrite, StagedFile};
//! # use std::io::Write;
//! # use std::path::Path;
//! # fn example() -> atomic_writer::Result<()> {
//! let mut staged = StagedFile::create("/var/tmp/stage", "/data/out")?;
//!
//! staged.write_all(b"AAAA")?;
//! staged.write_all(b"BBBB")?;
//!
//! staged.commit(Path::new("/data/out/file.bin"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AtomicError, Result};
use crate::fs::AtomicWrite;
use crate::fs::dirs;
use crate::options::StagingOptions;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, PathPersistError, PersistError, TempPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StagingState {
    /// Accepting writes.
    Staging,
    /// Renamed onto its destination.
    Committed,
    /// Staging file removed.
    Discarded,
}

/// Where the staged bytes currently live.
#[derive(Debug)]
enum Stage {
    /// Handle still open.
    Open(NamedTempFile),
    /// Handle released by a failed commit; content already synced.
    Closed(TempPath),
}

impl Stage {
    fn path(&self) -> &Path {
        match self {
            Stage::Open(file) => file.path(),
            Stage::Closed(path) => path,
        }
    }

    /// Drops the file handle, keeping the staged path.
    fn release(self) -> Stage {
        match self {
            Stage::Open(file) => Stage::Closed(file.into_temp_path()),
            closed => closed,
        }
    }
}

/// Write counters for a [`StagedFile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagingStats {
    /// Bytes accepted by the staging file so far.
    pub bytes_written: u64,
    /// Bytes written since the last sync.
    pub unsynced_bytes: usize,
    /// Durability flushes performed, automatic and explicit.
    pub syncs: u64,
}

/// A file staged in a temporary directory until committed.
///
/// Not internally synchronized; share it across threads only behind a lock.
#[must_use = "StagedFile must be committed or discarded"]
#[derive(Debug)]
pub struct StagedFile {
    stage: Option<Stage>,
    state: StagingState,
    sync_threshold: usize,
    unsynced: usize,
    bytes_written: u64,
    syncs: u64,
    parent_mode: u32,
    sync_parent: bool,
}

impl StagedFile {
    /// Creates a writer with default options.
    ///
    /// `dst_dir_hint` names the directory the content will most likely be
    /// committed into. It is only used for diagnostics.
    pub fn create(temp_dir: impl AsRef<Path>, dst_dir_hint: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(
            temp_dir.as_ref(),
            dst_dir_hint.as_ref(),
            StagingOptions::default(),
        )
    }

    pub(crate) fn with_options(
        temp_dir: &Path,
        dst_dir_hint: &Path,
        opts: StagingOptions,
    ) -> Result<Self> {
        dirs::create_dir_all(temp_dir, opts.dir_mode).map_err(|source| {
            log::error!(
                "Failed to create temporary directory {}: {}",
                temp_dir.display(),
                source
            );
            AtomicError::TempDir {
                path: temp_dir.to_path_buf(),
                source,
            }
        })?;

        let file = tempfile::Builder::new()
            .prefix(&opts.prefix)
            .tempfile_in(temp_dir)
            .map_err(|source| AtomicError::Allocate {
                dir: temp_dir.to_path_buf(),
                source,
            })?;

        log::debug!(
            "Staging {} for {}",
            file.path().display(),
            dst_dir_hint.display()
        );

        Ok(Self {
            stage: Some(Stage::Open(file)),
            state: StagingState::Staging,
            sync_threshold: opts.sync_threshold.max(1),
            unsynced: 0,
            bytes_written: 0,
            syncs: 0,
            parent_mode: opts.parent_mode,
            sync_parent: opts.sync_parent,
        })
    }

    /// Path of the staging file, while one exists.
    pub fn path(&self) -> Option<&Path> {
        self.stage.as_ref().map(Stage::path)
    }

    /// Returns true once the content has been renamed into place.
    pub fn is_committed(&self) -> bool {
        self.state == StagingState::Committed
    }

    /// Unsynced bytes tolerated before a write forces a sync.
    pub fn sync_threshold(&self) -> usize {
        self.sync_threshold
    }

    /// Current write counters.
    pub fn stats(&self) -> StagingStats {
        StagingStats {
            bytes_written: self.bytes_written,
            unsynced_bytes: self.unsynced,
            syncs: self.syncs,
        }
    }

    fn open_file(&mut self) -> Result<&mut NamedTempFile> {
        match self.stage.as_mut() {
            Some(Stage::Open(file)) => Ok(file),
            _ => Err(AtomicError::Released),
        }
    }

    /// Forces staged content down to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        let synced = self.sync_file();
        self.record_sync(synced)
    }

    fn sync_file(&mut self) -> Result<()> {
        let file = self.open_file()?;
        file.as_file()
            .sync_all()
            .map_err(|source| AtomicError::Sync {
                path: file.path().to_path_buf(),
                source,
            })
    }

    /// Resets the unsynced counter only when the sync went through.
    fn record_sync(&mut self, synced: Result<()>) -> Result<()> {
        synced?;
        self.unsynced = 0;
        self.syncs += 1;
        Ok(())
    }

    /// Settles a threshold sync triggered by `write`.
    ///
    /// The bytes are already staged, so a failure is logged and the sync is
    /// retried by the next write or by `commit`.
    fn finish_threshold_sync(&mut self, synced: Result<()>) {
        if let Err(e) = self.record_sync(synced) {
            log::warn!("{}; retrying on next write or commit", e);
        }
    }

    /// Ensures the destination's parent exists, then renames the stage onto it.
    fn publish(&mut self, stage: Stage, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(source) = dirs::create_dir_all(parent, self.parent_mode) {
                // Content is synced; only the path is still needed.
                self.stage = Some(stage.release());
                return Err(AtomicError::CreateParent {
                    path: parent.to_path_buf(),
                    source,
                });
            }
        }

        let from = stage.path().to_path_buf();
        let renamed = match stage {
            Stage::Open(file) => file
                .persist(dst)
                .map(drop)
                .map_err(|PersistError { error, file }| (error, file.into_temp_path())),
            Stage::Closed(path) => path
                .persist(dst)
                .map_err(|PathPersistError { error, path }| (error, path)),
        };

        match renamed {
            Ok(()) => {
                self.state = StagingState::Committed;
                log::debug!("Committed {} → {}", from.display(), dst.display());

                if self.sync_parent {
                    if let Err(e) = dirs::sync_parent_dir(dst) {
                        log::warn!("Failed to sync directory of {}: {}", dst.display(), e);
                    }
                }
                Ok(())
            }
            Err((source, path)) => {
                log::error!(
                    "Failed to rename {} → {}: {}",
                    from.display(),
                    dst.display(),
                    source
                );
                self.stage = Some(Stage::Closed(path));
                Err(AtomicError::Rename {
                    from,
                    to: dst.to_path_buf(),
                    source,
                })
            }
        }
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.open_file()?.write(buf)?;

        self.bytes_written += written as u64;
        self.unsynced += written;
        if self.unsynced >= self.sync_threshold {
            log::debug!(
                "{} unsynced bytes reached threshold {}, syncing",
                self.unsynced,
                self.sync_threshold
            );
            let synced = self.sync_file();
            self.finish_threshold_sync(synced);
        }

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.open_file()?.flush()
    }
}

impl AtomicWrite for StagedFile {
    fn commit(&mut self, dst: &Path) -> Result<()> {
        if self.state != StagingState::Staging {
            return Err(AtomicError::Released);
        }

        if matches!(self.stage, Some(Stage::Open(_))) {
            self.sync()?;
        }

        let stage = self.stage.take().ok_or(AtomicError::Released)?;
        self.publish(stage, dst)
    }

    fn discard(&mut self) -> Result<()> {
        if self.state == StagingState::Committed {
            return Ok(());
        }

        let Some(stage) = self.stage.take() else {
            return Ok(());
        };
        self.state = StagingState::Discarded;

        let path = stage.path().to_path_buf();
        let removed = match stage {
            Stage::Open(file) => file.close(),
            Stage::Closed(temp_path) => temp_path.close(),
        };

        match removed {
            Ok(()) => {
                log::debug!("Discarded {}", path.display());
                Ok(())
            }
            Err(source) => Err(AtomicError::Remove { path, source }),
        }
    }

    #[cfg(target_os = "linux")]
    fn preallocate(&mut self, size: u64, reserve: u64) -> Result<()> {
        let file = self.open_file()?;
        crate::fs::prealloc::reserve(file.as_file(), file.path(), size, reserve)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.state == StagingState::Staging && self.stage.is_some() {
            if let Some(path) = self.path() {
                log::warn!(
                    "Staging file dropped without commit or discard: {}",
                    path.display()
                );
            }
            if let Err(e) = self.discard() {
                log::warn!("{}", e);
            }
        }
    }
}
