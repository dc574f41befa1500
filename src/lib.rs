#![doc = include_str!("../README.md")]

pub mod error;
pub mod fs;
pub mod ops;
pub mod options;

pub use error::*;
pub use fs::{AtomicWrite, StagedFile, StagingStats};
pub use ops::{write_all_atomic, write_atomic};
pub use options::{StagingOptions, default_sync_threshold, set_default_sync_threshold};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
