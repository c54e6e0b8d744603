//! Filesystem capacity via `statvfs` (through `fs2`).

use std::path::Path;

use crate::domain::ports::{StorageUsage, StorageUsageProbe, SystemUsageError};

/// Reads total and available space of the filesystem holding a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorageProbe;

impl StorageUsageProbe for FsStorageProbe {
    fn usage(&self, path: &Path) -> Result<StorageUsage, SystemUsageError> {
        let unavailable =
            |error: std::io::Error| SystemUsageError::unavailable(format!("{}: {error}", path.display()));
        Ok(StorageUsage {
            total_bytes: fs2::total_space(path).map_err(unavailable)?,
            available_bytes: fs2::available_space(path).map_err(unavailable)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn reports_capacity_of_an_existing_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let usage = FsStorageProbe.usage(temp.path()).expect("usage readable");
        assert!(usage.total_bytes > 0);
        assert!(usage.available_bytes <= usage.total_bytes);
    }

    #[rstest]
    fn missing_paths_are_unavailable() {
        let error = FsStorageProbe
            .usage(Path::new("/definitely/not/a/real/mount/point"))
            .expect_err("missing path rejected");
        assert!(error.to_string().contains("/definitely/not/a/real/mount/point"));
    }
}
