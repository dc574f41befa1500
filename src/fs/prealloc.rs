//! Space reservation through `fallocate(2)`.

use crate::error::{AtomicError, Result};
use rustix::fs::{FallocateFlags, fallocate, fstatvfs};
use rustix::io::Errno;
use std::fs::File;
use std::path::Path;

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e.raw_os_error())
}

/// Reserves `size` bytes for `file` without changing its length.
///
/// With a non-zero `margin`, fails with [`AtomicError::NoSpace`] when fewer
/// than `margin` bytes would remain free afterwards. Filesystems without
/// `fallocate` support are treated as a successful no-op.
pub(crate) fn reserve(file: &File, path: &Path, size: u64, margin: u64) -> Result<()> {
    if margin > 0 {
        let st = fstatvfs(file).map_err(|e| AtomicError::Preallocate {
            path: path.to_path_buf(),
            size,
            source: errno_to_io(e),
        })?;
        let available = st.f_bavail.saturating_mul(st.f_frsize);
        if available.saturating_sub(size) < margin {
            return Err(AtomicError::NoSpace {
                requested: size.saturating_add(margin),
                available,
            });
        }
    }

    if size == 0 {
        return Ok(());
    }

    match fallocate(file, FallocateFlags::KEEP_SIZE, 0, size) {
        Ok(()) => {
            log::debug!("Reserved {} bytes for {}", size, path.display());
            Ok(())
        }
        Err(e) if e == Errno::OPNOTSUPP || e == Errno::NOSYS => {
            log::warn!(
                "Preallocation not supported for {}, skipping",
                path.display()
            );
            Ok(())
        }
        Err(e) => Err(AtomicError::Preallocate {
            path: path.to_path_buf(),
            size,
            source: errno_to_io(e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reserve_keeps_length() {
        let tmp = NamedTempFile::new().unwrap();
        reserve(tmp.as_file(), tmp.path(), 8192, 0).unwrap();

        assert_eq!(tmp.as_file().metadata().unwrap().len(), 0);
    }

    #[test]
    fn test_reserve_zero_is_noop() {
        let tmp = NamedTempFile::new().unwrap();
        reserve(tmp.as_file(), tmp.path(), 0, 0).unwrap();
    }

    #[test]
    fn test_reserve_impossible_margin() {
        let tmp = NamedTempFile::new().unwrap();
        let err = reserve(tmp.as_file(), tmp.path(), 0, u64::MAX).unwrap_err();

        assert!(matches!(err, AtomicError::NoSpace { .. }));
    }
}
