use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sanitize::{SanitizedPath, sanitize_entry_path};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug)]
pub struct ExtractedEntry {
    pub original_path: String,
    pub target_path:   PathBuf,
    pub size:          u64,
    pub kind:          EntryKind,
}

#[derive(Clone, Debug, Default)]
pub struct ArchiveReport {
    pub total_bytes: u64,
    pub entries:     Vec<ExtractedEntry>,
}

impl ArchiveReport {
    pub fn entry_count(&self) -> usize { self.entries.len() }
}

struct Planned {
    index: usize,
    name:  String,
    path:  SanitizedPath,
    kind:  EntryKind,
}

/// Extract a zip archive into `dest`.
///
/// Every entry name is validated before anything is written, so a rejected
/// archive leaves `dest` untouched. Files are written with the process's
/// default permissions.
pub fn extract_zip<R: Read + Seek>(reader: R, dest: &Path) -> Result<ArchiveReport> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let plan = plan_entries(&mut archive, dest)?;

    fs::create_dir_all(dest).map_err(|source| Error::DirectoryCreationFailed {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut report = ArchiveReport::default();
    for planned in plan {
        let target = planned.path.resolved;
        match planned.kind {
            EntryKind::Directory => {
                create_dir(&target)?;
                report.entries.push(ExtractedEntry {
                    original_path: planned.name,
                    target_path:   target,
                    size:          0,
                    kind:          EntryKind::Directory,
                });
            }
            EntryKind::File => {
                if let Some(parent) = target.parent() {
                    create_dir(parent)?;
                }
                let mut file = archive.by_index(planned.index)?;
                let size = write_file(&mut file, &target)?;

                tracing::trace!(entry = %planned.name, path = %target.display(), size, "extracted");
                report.total_bytes += size;
                report.entries.push(ExtractedEntry {
                    original_path: planned.name,
                    target_path:   target,
                    size,
                    kind:          EntryKind::File,
                });
            }
        }
    }

    tracing::debug!(
        dest = %dest.display(),
        entries = report.entry_count(),
        bytes = report.total_bytes,
        "archive extracted"
    );
    Ok(report)
}

fn plan_entries<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, dest: &Path) -> Result<Vec<Planned>> {
    let mut plan = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        let name = file.name().to_string();
        if file.unix_mode().is_some_and(|m| m & S_IFMT == S_IFLNK) {
            return Err(Error::UnsupportedEntry { entry: name });
        }
        let kind = if file.is_dir() { EntryKind::Directory } else { EntryKind::File };

        match sanitize_entry_path(&name, dest)? {
            Some(path) => plan.push(Planned {
                index,
                name,
                path,
                kind,
            }),
            None if kind == EntryKind::Directory => {}
            None => return Err(Error::InvalidPath { entry: name }),
        }
    }
    Ok(plan)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(reader: &mut impl Read, target: &Path) -> Result<u64> {
    let wrap = |source| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source,
    };
    let mut out = File::create(target).map_err(wrap)?;
    let size = io::copy(reader, &mut out).map_err(wrap)?;
    out.sync_all().map_err(wrap)?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn nested_entries_create_parents() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_with(&[("tool", b"bin"), ("docs/a.md", b"a"), ("docs/b.md", b"b")]);
        let report = extract_zip(Cursor::new(bytes), dir.path()).unwrap();

        assert_eq!(report.entry_count(), 3);
        assert_eq!(report.total_bytes, 5);
        assert_eq!(report.entries[1].target_path, dir.path().join("docs/a.md"));
        assert!(dir.path().join("docs/b.md").is_file());
    }

    #[test]
    fn garbage_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_zip(Cursor::new(b"not a zip".to_vec()), dir.path()).unwrap_err();
        assert!(matches!(err, Error::Corrupted { .. }));
    }
}
