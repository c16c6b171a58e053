//! Filesystem bookkeeping for staged installs.

mod error;
mod permissions;
mod record;

pub use error::{CleanupError, Error, PathFailure, Result};
pub use permissions::PermissionMode;
pub use record::InstallRecord;
