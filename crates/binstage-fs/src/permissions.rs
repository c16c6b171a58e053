use crate::{Error, Result};
use std::path::Path;

/// File permission modes applied to staged files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the file was created with.
    #[default]
    Inherit,

    /// Owner-only executable, `0o700` on Unix. On Windows the file is made
    /// writable.
    Executable,
}

impl PermissionMode {
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::Executable => Some(0o700),
        }
    }

    /// Apply the mode to an existing path.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        let Some(mode) = self.to_unix_mode() else {
            return Ok(());
        };
        let wrap = |source| Error::Permissions {
            path: path.to_path_buf(),
            source,
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(wrap)?;
        }

        #[cfg(not(unix))]
        {
            let mut perms = std::fs::metadata(path).map_err(wrap)?.permissions();
            perms.set_readonly(mode & 0o222 == 0);
            std::fs::set_permissions(path, perms).map_err(wrap)?;
        }

        tracing::debug!(path = %path.display(), mode = format_args!("{mode:o}"), "applied permissions");
        Ok(())
    }
}
