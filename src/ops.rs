//! One-shot atomic writes built on [`StagedFile`].

use crate::error::Result;
use crate::fs::{AtomicWrite, StagedFile};

use std::io::{self, Write};
use std::path::Path;

/// Writes `dst` atomically through a staging file in `temp_dir`.
///
/// `write_fn` receives the staged writer. If it fails, the staging file is
/// discarded and its error returned; otherwise the content is committed.
///
/// ```no_run
/// # use std::io::Write;
/// # fn example() -> atomic_writer::Result<()> {
/// atomic_writer::write_atomic("/var/tmp/stage", "/srv/data/state.json", |w| {
///     w.write_all(b"{\"version\":2}")
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn write_atomic<F>(
    temp_dir: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    write_fn: F,
) -> Result<()>
where
    F: FnOnce(&mut StagedFile) -> io::Result<()>,
{
    let dst = dst.as_ref();
    let dst_dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = StagedFile::create(temp_dir, dst_dir)?;

    if let Err(e) = write_fn(&mut staged) {
        abandon(&mut staged);
        return Err(e.into());
    }

    if let Err(e) = staged.commit(dst) {
        abandon(&mut staged);
        return Err(e);
    }

    Ok(())
}

/// Writes `contents` to `dst` atomically.
pub fn write_all_atomic(
    temp_dir: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    contents: impl AsRef<[u8]>,
) -> Result<()> {
    write_atomic(temp_dir, dst, |w| w.write_all(contents.as_ref()))
}

fn abandon(staged: &mut StagedFile) {
    if let Err(e) = staged.discard() {
        log::warn!("Failed to discard staging file: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtomicError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_commits() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("data/state.json");

        write_atomic(temp.path().join("stage"), &dst, |w| {
            w.write_all(b"{")?;
            w.write_all(b"}")
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "{}");
    }

    #[test]
    fn test_write_atomic_discards_on_error() {
        let temp = TempDir::new().unwrap();
        let stage = temp.path().join("stage");
        let dst = temp.path().join("dst");
        fs::write(&dst, "previous").unwrap();

        let err = write_atomic(&stage, &dst, |w| {
            w.write_all(b"half")?;
            Err(io::Error::other("producer failed"))
        })
        .unwrap_err();

        assert!(matches!(err, AtomicError::Io(_)));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "previous");
        assert_eq!(fs::read_dir(&stage).unwrap().count(), 0);
    }

    #[test]
    fn test_write_atomic_discards_on_failed_rename() {
        let temp = TempDir::new().unwrap();
        let stage = temp.path().join("stage");
        let dst = temp.path().join("occupied");
        fs::create_dir(&dst).unwrap();
        fs::write(dst.join("inner"), "x").unwrap();

        let err = write_all_atomic(&stage, &dst, b"data").unwrap_err();

        assert!(matches!(err, AtomicError::Rename { .. }));
        assert_eq!(fs::read_dir(&stage).unwrap().count(), 0);
    }

    #[test]
    fn test_write_all_atomic() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("out.txt");

        write_all_atomic(temp.path().join("stage"), &dst, "hello").unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "hello");
    }
}
