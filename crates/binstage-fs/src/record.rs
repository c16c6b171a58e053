use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CleanupError, PathFailure};

/// Paths created by one install, removed together on demand.
///
/// Removal attempts every recorded path regardless of earlier failures and
/// treats already-missing paths as removed. Paths that fail to delete stay
/// recorded so a later [`InstallRecord::remove_all`] can retry them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallRecord {
    paths: Vec<PathBuf>,
}

impl InstallRecord {
    pub fn new() -> Self { Self::default() }

    /// Record a created path. Duplicates are ignored.
    pub fn record(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn extend<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.record(path);
        }
    }

    pub fn paths(&self) -> &[PathBuf] { &self.paths }

    pub fn contains(&self, path: &Path) -> bool { self.paths.iter().any(|p| p == path) }

    pub fn len(&self) -> usize { self.paths.len() }

    pub fn is_empty(&self) -> bool { self.paths.is_empty() }

    /// Delete every recorded path, newest first.
    pub fn remove_all(&mut self) -> Result<(), CleanupError> {
        let attempted = self.paths.len();
        let mut failures = Vec::new();

        for path in self.paths.drain(..).rev() {
            match remove_path(&path) {
                Ok(true) => tracing::debug!(path = %path.display(), "removed"),
                Ok(false) => tracing::debug!(path = %path.display(), "already absent"),
                Err(source) => {
                    tracing::warn!(path = %path.display(), error = %source, "failed to remove");
                    failures.push(PathFailure { path, source });
                }
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        // keep original recording order for the retained paths
        self.paths = failures.iter().rev().map(|f| f.path.clone()).collect();
        Err(CleanupError { attempted, failures })
    }
}

/// `Ok(false)` when nothing was there to remove.
fn remove_path(path: &Path) -> io::Result<bool> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn record_ignores_duplicates() {
        let mut record = InstallRecord::new();
        record.record("/a");
        record.extend(["/b", "/a"]);
        assert_eq!(record.paths(), &[PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn removes_files_and_directories() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bin");
        let nested = dir.path().join("install");
        std::fs::write(&file, b"x").unwrap();
        std::fs::create_dir_all(nested.join("deep")).unwrap();
        std::fs::write(nested.join("deep/file"), b"y").unwrap();

        let mut record = InstallRecord::new();
        record.extend([&file, &nested]);
        record.remove_all().unwrap();

        assert!(!file.exists());
        assert!(!nested.exists());
        assert!(record.is_empty());
    }

    #[test]
    fn missing_paths_are_not_errors() {
        let dir = tempdir().unwrap();
        let mut record = InstallRecord::new();
        record.record(dir.path().join("never-created"));
        record.remove_all().unwrap();
        record.remove_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn failures_are_aggregated_and_retained() {
        use std::os::unix::fs::PermissionsExt;

        // root ignores directory write bits
        if running_as_root() {
            return;
        }

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let stuck = locked.join("stuck");
        std::fs::write(&stuck, b"x").unwrap();
        let free = dir.path().join("free");
        std::fs::write(&free, b"x").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        let mut record = InstallRecord::new();
        record.extend([&stuck, &free]);
        let err = record.remove_all().unwrap_err();

        assert_eq!(err.attempted, 2);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].path, stuck);
        assert!(!free.exists());
        assert_eq!(record.paths(), &[stuck.clone()]);

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();
        record.remove_all().unwrap();
        assert!(!stuck.exists());
    }

    #[cfg(unix)]
    fn running_as_root() -> bool {
        use std::os::unix::fs::MetadataExt;
        std::fs::metadata("/proc/self").is_ok_and(|m| m.uid() == 0)
    }
}
