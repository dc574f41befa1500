//! Shared helpers for atomic-writer integration tests.
//!
//! Each test gets its own sandbox with a `stage/` temporary directory and a
//! `data/` tree for destinations.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sandbox holding a staging directory and a destination tree.
pub struct Sandbox {
    pub root: TempDir,
}

#[allow(unused)]
impl Sandbox {
    pub fn new() -> Self {
        init_logging();
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    pub fn stage_dir(&self) -> PathBuf {
        self.root.path().join("stage")
    }

    pub fn data(&self, rel: &str) -> PathBuf {
        self.root.path().join("data").join(rel)
    }

    /// Number of entries left in the staging directory.
    pub fn staged_files(&self) -> usize {
        count_entries(&self.stage_dir())
    }
}

#[allow(unused)]
pub fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

/// Routes `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
