use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("zip-slip attack detected: entry '{entry}' resolves outside the target directory")]
    ZipSlip { entry: String },

    #[error("invalid entry path '{entry}'")]
    InvalidPath { entry: String },

    #[error("unsupported entry '{entry}': symlinks are not extracted")]
    UnsupportedEntry { entry: String },

    #[error("archive is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self { Self::Corrupted { reason: e.to_string() } }
}

pub type Result<T> = std::result::Result<T, Error>;
