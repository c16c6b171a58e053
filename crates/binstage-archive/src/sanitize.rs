use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedPath {
    /// Normalized path relative to the extraction root.
    pub relative: PathBuf,
    pub resolved: PathBuf,
}

/// Resolve an archive entry name against `base`.
///
/// Absolute names, drive prefixes, and `..` segments that climb above the
/// archive root are rejected rather than clamped. Returns `Ok(None)` for names
/// that normalize to the root itself (e.g. `./`).
pub fn sanitize_entry_path(entry: &str, base: &Path) -> Result<Option<SanitizedPath>> {
    if entry.contains('\0') {
        return Err(Error::InvalidPath {
            entry: entry.to_string(),
        });
    }

    // zip names always use '/', but some writers emit '\'
    let unified = entry.replace('\\', "/");
    let normalized = normalize_relative(Path::new(&unified)).ok_or_else(|| Error::ZipSlip {
        entry: entry.to_string(),
    })?;

    if normalized.as_os_str().is_empty() {
        return Ok(None);
    }

    let resolved = base.join(&normalized);
    if !resolved.starts_with(base) {
        return Err(Error::ZipSlip {
            entry: entry.to_string(),
        });
    }

    Ok(Some(SanitizedPath {
        relative: normalized,
        resolved,
    }))
}

/// `None` if the path is rooted or climbs above its start.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Normal(part) => {
                result.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth.checked_sub(1)?;
                result.pop();
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> &'static Path {
        if cfg!(windows) { Path::new("C:/opt/tool") } else { Path::new("/opt/tool") }
    }

    fn sanitize(entry: &str) -> Result<Option<SanitizedPath>> {
        sanitize_entry_path(entry, base())
    }

    #[test]
    fn plain_entry_resolves_under_base() {
        let path = sanitize("bin/tool").unwrap().unwrap();
        assert_eq!(path.relative, Path::new("bin/tool"));
        assert_eq!(path.resolved, base().join("bin/tool"));
    }

    #[test]
    fn inner_parent_segments_collapse() {
        let path = sanitize("a/./b/../c").unwrap().unwrap();
        assert_eq!(path.relative, Path::new("a/c"));
    }

    #[test]
    fn escaping_entries_are_rejected() {
        for entry in ["../evil", "a/../../evil", "/etc/passwd", "..\\evil", "./../x"] {
            assert!(matches!(sanitize(entry), Err(Error::ZipSlip { .. })), "{entry}");
        }
    }

    #[test]
    fn root_only_entries_are_skipped() {
        assert_eq!(sanitize("./").unwrap(), None);
        assert_eq!(sanitize("a/..").unwrap(), None);
    }

    #[test]
    fn nul_byte_is_invalid() {
        assert!(matches!(sanitize("a\0b"), Err(Error::InvalidPath { .. })));
    }

}
