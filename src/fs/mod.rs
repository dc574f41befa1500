//! Staged file writes with an atomic commit.
//!
//! A writer accumulates bytes in a private temporary file and publishes
//! them with a single rename, or deletes them on discard.

mod dirs;
#[cfg(target_os = "linux")]
mod prealloc;
pub mod staged;

pub use staged::{StagedFile, StagingStats};

use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// A file being written somewhere private until it is committed.
///
/// Exactly one of [`commit`](AtomicWrite::commit) or
/// [`discard`](AtomicWrite::discard) ends the writer's life. Discarding an
/// already committed writer is a no-op.
pub trait AtomicWrite: Write {
    /// Syncs staged content and renames it onto `dst`.
    ///
    /// Missing parent directories of `dst` are created. On a failed rename
    /// the staged content stays in place and the call may be retried.
    fn commit(&mut self, dst: &Path) -> Result<()>;

    /// Deletes staged content unless it was already committed.
    fn discard(&mut self) -> Result<()>;

    /// Asks the filesystem to reserve `size` bytes, keeping `reserve` bytes
    /// free afterwards.
    ///
    /// Advisory. Writers on platforms without a reservation primitive keep
    /// this default, which does nothing.
    fn preallocate(&mut self, size: u64, reserve: u64) -> Result<()> {
        let _ = (size, reserve);
        Ok(())
    }
}
