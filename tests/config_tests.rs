//! Process-wide threshold. Kept alone in its own binary since it mutates
//! global state.

mod common;

use atomic_writer::{
    AtomicWrite, StagedFile, StagingOptions, default_sync_threshold, set_default_sync_threshold,
};
use common::*;
use std::io::Write;

#[test]
fn test_process_default_threshold() -> anyhow::Result<()> {
    let sandbox = Sandbox::new();
    assert_eq!(default_sync_threshold(), 4 * 1024 * 1024);

    let mut before = StagedFile::create(sandbox.stage_dir(), sandbox.data(""))?;
    assert_eq!(before.sync_threshold(), 4 * 1024 * 1024);

    set_default_sync_threshold(16);
    let mut after = StagedFile::create(sandbox.stage_dir(), sandbox.data(""))?;
    assert_eq!(after.sync_threshold(), 16);
    // Existing writers keep their threshold.
    assert_eq!(before.sync_threshold(), 4 * 1024 * 1024);

    after.write_all(&[0u8; 17])?;
    assert_eq!(after.stats().syncs, 1);

    let overridden = StagingOptions::new()
        .sync_threshold(1024)
        .create(sandbox.stage_dir(), sandbox.data(""))?;
    assert_eq!(overridden.sync_threshold(), 1024);
    drop(overridden);

    set_default_sync_threshold(4 * 1024 * 1024);
    before.discard()?;
    after.discard()?;
    Ok(())
}
