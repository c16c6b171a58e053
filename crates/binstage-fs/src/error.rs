use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to set permissions on {path}")]
    Permissions {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// One path that could not be removed.
#[derive(Debug)]
pub struct PathFailure {
    pub path:   PathBuf,
    pub source: std::io::Error,
}

/// Aggregate of every removal failure from a single cleanup pass.
#[derive(Debug, thiserror::Error)]
#[error("failed to remove {} of {attempted} recorded path(s): {}", .failures.len(), summarize(.failures))]
pub struct CleanupError {
    pub attempted: usize,
    pub failures:  Vec<PathFailure>,
}

fn summarize(failures: &[PathFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.source))
        .collect::<Vec<_>>()
        .join("; ")
}
