//! Error types for binstage-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("{url}: HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("{url}: network error: {message}")]
    Network { url: String, message: String },

    #[error("{url}: deadline exceeded")]
    Timeout { url: String },

    #[error("{url}: request cancelled")]
    Cancelled { url: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn network(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            url:     url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool { matches!(self, Self::Timeout { .. }) }

    pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled { .. }) }
}

pub type Result<T> = std::result::Result<T, FetchError>;
