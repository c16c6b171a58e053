use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("malformed version {input:?}: {reason}")]
    MalformedVersion { input: String, reason: String },

    #[error("malformed constraint {input:?}: {reason}")]
    MalformedConstraint { input: String, reason: String },
}

impl Error {
    pub(crate) fn version(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedVersion {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn constraint(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedConstraint {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
