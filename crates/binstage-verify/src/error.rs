#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("malformed checksum manifest at line {line}: {reason}")]
    MalformedManifest { line: usize, reason: String },

    #[error("checksum manifest has no entry for {filename:?}")]
    MissingEntry { filename: String },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("signature does not match the signed content")]
    BadSignature,
}

pub type Result<T> = std::result::Result<T, VerifyError>;
