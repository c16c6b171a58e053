use std::collections::HashMap;

use crate::{Result, VerifyError};

/// Parsed `SHA256SUMS` style manifest.
///
/// Each non-blank line is `<64 hex chars><whitespace><filename>`. A leading
/// `*` on the filename (binary mode marker) is stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: HashMap<String, [u8; 32]>,
}

impl ChecksumManifest {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| VerifyError::MalformedManifest {
            line:   0,
            reason: format!("not valid UTF-8: {e}"),
        })?;

        let mut entries = HashMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = |reason: &str| VerifyError::MalformedManifest {
                line:   idx + 1,
                reason: reason.to_string(),
            };

            let (digest, rest) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| malformed("expected `<digest>  <filename>`"))?;
            let filename = rest.trim_start();
            let filename = filename.strip_prefix('*').unwrap_or(filename);
            if filename.is_empty() {
                return Err(malformed("missing filename"));
            }

            let mut out = [0u8; 32];
            hex::decode_to_slice(digest, &mut out)
                .map_err(|_| malformed("digest is not 64 hex characters"))?;
            entries.insert(filename.to_string(), out);
        }

        Ok(Self { entries })
    }

    pub fn digest_for(&self, filename: &str) -> Result<&[u8; 32]> {
        self.entries.get(filename).ok_or_else(|| VerifyError::MissingEntry {
            filename: filename.to_string(),
        })
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn filenames(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }
}
