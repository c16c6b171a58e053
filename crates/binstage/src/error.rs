use std::path::PathBuf;

use binstage_fetch::FetchError;

/// Broad failure classes. Callers branch on these to decide whether a retry
/// or a cleanup makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, rejected before any I/O.
    Validation,
    /// Nothing in the index satisfies the request.
    Resolution,
    /// Network failures, including deadline and cancellation.
    Transport,
    /// Manifest authenticity could not be established.
    Trust,
    /// Artifact bytes do not match the authenticated manifest.
    Integrity,
    Filesystem,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed version {input:?}: {reason}")]
    MalformedVersion { input: String, reason: String },

    #[error("malformed constraint {input:?}: {reason}")]
    MalformedConstraint { input: String, reason: String },

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("failed to fetch release index from {url}: {source}")]
    IndexFetch {
        url:    String,
        #[source]
        source: FetchError,
    },

    #[error("failed to parse release index from {url}: {reason}")]
    IndexParse { url: String, reason: String },

    #[error("no versions found for {product:?}")]
    EmptyIndex { product: String },

    #[error("deadline exceeded while fetching {url}")]
    Timeout { url: String },

    #[error("cancelled while fetching {url}")]
    Cancelled { url: String },

    #[error("version {version} of {product:?} not found")]
    VersionNotFound { product: String, version: String },

    #[error("no matching version found for {product:?} with constraints {constraints:?} (prereleases {})", if *.include_prereleases { "included" } else { "excluded" })]
    NoMatchingVersion {
        product:             String,
        constraints:         String,
        include_prereleases: bool,
    },

    #[error("{product} {version} has no build for {os}/{arch}")]
    UnsupportedPlatform {
        product: String,
        version: String,
        os:      String,
        arch:    String,
    },

    #[error("failed to download {file}: {source}")]
    Download {
        file:   String,
        #[source]
        source: FetchError,
    },

    #[error("unable to verify signature of {file}: {source}")]
    SignatureVerification {
        file:   String,
        #[source]
        source: binstage_verify::VerifyError,
    },

    #[error("no checksum found for {filename} in {manifest}")]
    ChecksumNotFound { filename: String, manifest: String },

    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual:   String,
    },

    #[error("failed to extract {}: {source}", .archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source:  binstage_archive::Error,
    },

    #[error("no license files found in {}", .dir.display())]
    LicenseNotFound { dir: PathBuf },

    #[error(transparent)]
    Cleanup(#[from] binstage_fs::CleanupError),

    #[error("failed to run {}: {reason}", .path.display())]
    VersionProbe { path: PathBuf, reason: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedVersion { .. } | Self::MalformedConstraint { .. } | Self::Validation { .. } => {
                ErrorKind::Validation
            }
            Self::EmptyIndex { .. }
            | Self::VersionNotFound { .. }
            | Self::NoMatchingVersion { .. }
            | Self::UnsupportedPlatform { .. } => ErrorKind::Resolution,
            Self::IndexFetch { .. }
            | Self::IndexParse { .. }
            | Self::Timeout { .. }
            | Self::Cancelled { .. }
            | Self::Download { .. } => ErrorKind::Transport,
            Self::SignatureVerification { .. } => ErrorKind::Trust,
            Self::ChecksumNotFound { .. } | Self::ChecksumMismatch { .. } => ErrorKind::Integrity,
            Self::Extraction { .. }
            | Self::LicenseNotFound { .. }
            | Self::Cleanup(_)
            | Self::VersionProbe { .. }
            | Self::Io { .. } => ErrorKind::Filesystem,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Index requests keep deadline and cancellation distinct from other
    /// transport failures.
    pub(crate) fn index_fetch(url: &str, err: FetchError) -> Self {
        match err {
            FetchError::Timeout { url } => Self::Timeout { url },
            FetchError::Cancelled { url } => Self::Cancelled { url },
            source => Self::IndexFetch {
                url: url.to_string(),
                source,
            },
        }
    }

    pub(crate) fn download(file: &str, err: FetchError) -> Self {
        match err {
            FetchError::Timeout { url } => Self::Timeout { url },
            FetchError::Cancelled { url } => Self::Cancelled { url },
            source => Self::Download {
                file: file.to_string(),
                source,
            },
        }
    }
}

impl From<binstage_version::Error> for Error {
    fn from(e: binstage_version::Error) -> Self {
        match e {
            binstage_version::Error::MalformedVersion { input, reason } => Self::MalformedVersion { input, reason },
            binstage_version::Error::MalformedConstraint { input, reason } => {
                Self::MalformedConstraint { input, reason }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_deadline_is_not_a_generic_transport_error() {
        let err = Error::index_fetch("u", FetchError::Timeout { url: "u".into() });
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = Error::download("tool.zip", FetchError::Cancelled { url: "u".into() });
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[test]
    fn not_found_keeps_status() {
        let err = Error::index_fetch("u", FetchError::Status {
            url:    "u".into(),
            status: 404,
        });
        match err {
            Error::IndexFetch { source, .. } => assert_eq!(source.status(), Some(404)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn version_errors_convert() {
        let err: Error = binstage_version::Version::parse("nope").unwrap_err().into();
        assert!(matches!(err, Error::MalformedVersion { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn no_matching_version_message() {
        let err = Error::NoMatchingVersion {
            product:             "tofu".into(),
            constraints:         ">= 9".into(),
            include_prereleases: false,
        };
        assert_eq!(
            err.to_string(),
            r#"no matching version found for "tofu" with constraints ">= 9" (prereleases excluded)"#
        );
    }
}
