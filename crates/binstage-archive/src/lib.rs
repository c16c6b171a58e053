//! Archive extraction with path sanitization.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry path validation (zip-slip prevention)
//! - `extract.rs` - Two-pass zip extraction: validate every entry, then write

pub use error::{Error, Result};
pub use extract::{ArchiveReport, EntryKind, ExtractedEntry, extract_zip};
pub use sanitize::{SanitizedPath, sanitize_entry_path};

mod error;
mod extract;
mod sanitize;
