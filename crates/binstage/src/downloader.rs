//! Download, verify and unpack one release artifact.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use binstage_archive::extract_zip;
use binstage_fetch::{HttpClient, RequestContext};
use binstage_fs::{InstallRecord, PermissionMode};
use binstage_verify::{ChecksumManifest, PublicKey, VerifyError};

use crate::config::ReleasesConfig;
use crate::error::{Error, Result};
use crate::index::{Artifact, ProductVersionEntry, ReleasesClient};
use crate::platform::Platform;

/// License files copied out of an archive, in lookup order.
pub const LICENSE_FILES: [&str; 3] = ["LICENSE.txt", "EULA.txt", "TermsOfEvaluation.txt"];

const SCRATCH_PREFIX: &str = ".binstage-download-";

/// Where and what to unpack.
#[derive(Debug, Clone, Copy)]
pub struct UnpackTarget<'a> {
    pub product:          &'a str,
    pub entry:            &'a ProductVersionEntry,
    pub install_dir:      &'a Path,
    pub license_dir:      Option<&'a Path>,
    /// Fail with [`Error::LicenseNotFound`] when no license file is present.
    pub license_required: bool,
    pub binary_name:      &'a str,
}

pub struct Downloader<'a, C: HttpClient> {
    releases:   &'a ReleasesClient<C>,
    platform:   &'a Platform,
    verify:     bool,
    public_key: Option<&'a str>,
}

impl<'a, C: HttpClient> Downloader<'a, C> {
    pub fn new(releases: &'a ReleasesClient<C>, config: &'a ReleasesConfig, platform: &'a Platform) -> Self {
        Self {
            releases,
            platform,
            verify: !config.skip_checksum_verification,
            public_key: config.public_key(),
        }
    }

    /// Everything [`download_and_unpack`](Self::download_and_unpack) can
    /// reject before touching the network or the filesystem: the platform
    /// build, the trust file names and the signing key.
    pub fn check(&self, product: &str, entry: &ProductVersionEntry) -> Result<()> {
        let artifact = artifact_for(product, entry, self.platform)?;
        if self.verify {
            let (manifest_name, _) = trust_file_names(entry, &artifact.filename)?;
            self.trusted_key(manifest_name)?;
        }
        Ok(())
    }

    /// Fetch, verify and unpack `target.entry`, returning the absolute path
    /// of the executable.
    ///
    /// Every path created along the way is added to `record` as soon as it
    /// exists, so a failed call can still be cleaned up.
    pub async fn download_and_unpack(
        &self,
        target: &UnpackTarget<'_>,
        record: &mut InstallRecord,
        ctx: &RequestContext,
    ) -> Result<PathBuf> {
        let entry = target.entry;
        let artifact = artifact_for(target.product, entry, self.platform)?;

        let trust_files = if self.verify { Some(trust_file_names(entry, &artifact.filename)?) } else { None };
        let key = match trust_files {
            Some((manifest_name, _)) => Some(self.trusted_key(manifest_name)?),
            None => None,
        };

        ensure_dir(target.install_dir, record)?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(target.install_dir)
            .map_err(|e| Error::io(target.install_dir, e))?
            .keep();
        record.record(&scratch);
        tracing::debug!(path = %scratch.display(), "created download scratch dir");

        let archive_path = scratch.join(&artifact.filename);
        let artifact_url = self.releases.artifact_url(target.product, entry, artifact)?;
        let fetcher = self.releases.fetcher();

        let download = async {
            tracing::info!(url = %artifact_url, "downloading artifact");
            fetcher
                .fetch_to_file(&artifact_url, &archive_path, ctx)
                .await
                .map_err(|e| Error::download(&artifact.filename, e))
        };
        let trust = async {
            let Some((manifest_name, signature_name)) = trust_files else {
                return Ok(None);
            };
            let manifest_url = self.releases.release_file_url(target.product, entry, manifest_name);
            let signature_url = self.releases.release_file_url(target.product, entry, signature_name);
            let (manifest, signature) = tokio::try_join!(
                async {
                    fetcher
                        .fetch_bytes(&manifest_url, ctx)
                        .await
                        .map_err(|e| Error::download(manifest_name, e))
                },
                async {
                    fetcher
                        .fetch_bytes(&signature_url, ctx)
                        .await
                        .map_err(|e| Error::download(signature_name, e))
                },
            )?;
            Ok::<_, Error>(Some((manifest_name, manifest, signature)))
        };
        let (fetched, trust) = tokio::try_join!(download, trust)?;

        match (trust, &key) {
            (Some((manifest_name, manifest, signature)), Some(key)) => {
                verify_artifact(key, manifest_name, &manifest, &signature, &artifact.filename, &fetched.sha256)?;
            }
            _ => tracing::warn!(filename = %artifact.filename, "checksum verification skipped"),
        }

        unpack(&archive_path, target.install_dir, record).await?;

        if let Some(license_dir) = target.license_dir {
            copy_licenses(target.install_dir, license_dir, target.license_required, record)?;
        }

        let exec_path = target.install_dir.join(target.binary_name);
        if !exec_path.is_file() {
            return Err(Error::io(
                &exec_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "archive did not contain the binary"),
            ));
        }
        record.record(&exec_path);
        PermissionMode::Executable
            .apply_to_path(&exec_path)
            .map_err(|e| Error::io(&exec_path, std::io::Error::other(e)))?;
        tracing::debug!(path = %exec_path.display(), "marked executable");

        match std::fs::remove_dir_all(&scratch) {
            Ok(()) => tracing::debug!(path = %scratch.display(), "removed download scratch dir"),
            Err(e) => tracing::warn!(path = %scratch.display(), error = %e, "failed to remove scratch dir"),
        }

        std::path::absolute(&exec_path).map_err(|e| Error::io(&exec_path, e))
    }

    /// Parse the configured key, failing before anything is fetched.
    fn trusted_key(&self, manifest_name: &str) -> Result<PublicKey> {
        let armored = self.public_key.ok_or_else(|| {
            VerifyError::InvalidPublicKey("no release signing key embedded or configured".to_string())
        });
        armored
            .and_then(PublicKey::from_armored)
            .map_err(|source| Error::SignatureVerification {
                file: manifest_name.to_string(),
                source,
            })
    }
}

fn verify_artifact(
    key: &PublicKey,
    manifest_name: &str,
    manifest: &[u8],
    signature: &[u8],
    filename: &str,
    actual: &[u8],
) -> Result<()> {
    let trust_err = |source: VerifyError| Error::SignatureVerification {
        file: manifest_name.to_string(),
        source,
    };

    key.verify_detached(manifest, signature).map_err(trust_err)?;
    tracing::debug!(manifest = manifest_name, openpgp = key.is_openpgp(), "manifest signature verified");

    let sums = ChecksumManifest::parse(manifest).map_err(trust_err)?;
    let expected = sums.digest_for(filename).map_err(|_| Error::ChecksumNotFound {
        filename: filename.to_string(),
        manifest: manifest_name.to_string(),
    })?;

    if expected.as_slice() != actual {
        return Err(Error::ChecksumMismatch {
            filename: filename.to_string(),
            expected: hex::encode(expected),
            actual:   hex::encode(actual),
        });
    }
    tracing::debug!(filename, "checksum verified");
    Ok(())
}

/// The build of `entry` for `platform`, or [`Error::UnsupportedPlatform`].
fn artifact_for<'e>(
    product: &str,
    entry: &'e ProductVersionEntry,
    platform: &Platform,
) -> Result<&'e Artifact> {
    entry.artifact_for(platform).ok_or_else(|| Error::UnsupportedPlatform {
        product: product.to_string(),
        version: entry.version.to_string(),
        os:      platform.os.clone(),
        arch:    platform.arch.clone(),
    })
}

fn trust_file_names<'e>(entry: &'e ProductVersionEntry, filename: &str) -> Result<(&'e str, &'e str)> {
    if entry.shasums.is_empty() {
        return Err(Error::ChecksumNotFound {
            filename: filename.to_string(),
            manifest: format!("(no checksum manifest listed for {})", entry.version),
        });
    }
    let signature = entry.signature_filename().ok_or_else(|| Error::SignatureVerification {
        file:   entry.shasums.clone(),
        source: VerifyError::InvalidSignature("no detached signature listed".to_string()),
    })?;
    Ok((&entry.shasums, signature))
}

/// Create `dir` if missing, recording the topmost directory created.
fn ensure_dir(dir: &Path, record: &mut InstallRecord) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut topmost = dir;
    while let Some(parent) = topmost.parent() {
        if parent.as_os_str().is_empty() || parent.exists() {
            break;
        }
        topmost = parent;
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    record.record(topmost);
    tracing::debug!(path = %dir.display(), "created directory");
    Ok(())
}

fn dir_names(dir: &Path) -> std::io::Result<HashSet<OsString>> {
    std::fs::read_dir(dir)?.map(|e| e.map(|e| e.file_name())).collect()
}

/// Extract on the blocking pool. Every new top-level path in `dest` is
/// recorded, including after a partial failure.
async fn unpack(archive: &Path, dest: &Path, record: &mut InstallRecord) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest_dir = dest;
    let dest = dest.to_path_buf();
    tracing::info!(archive = %archive.display(), dest = %dest.display(), "unpacking");

    let (created, result) = tokio::task::spawn_blocking(move || {
        let before = dir_names(&dest).unwrap_or_default();
        let result = File::open(&archive)
            .map_err(|e| Error::io(&archive, e))
            .and_then(|file| {
                extract_zip(file, &dest).map_err(|source| Error::Extraction {
                    archive: archive.clone(),
                    source,
                })
            });
        let created: Vec<PathBuf> = dir_names(&dest)
            .unwrap_or_default()
            .difference(&before)
            .map(|name| dest.join(name))
            .collect();
        (created, result)
    })
    .await
    .map_err(|e| Error::io(dest_dir, std::io::Error::other(e)))?;

    record.extend(created);
    let report = result?;
    tracing::debug!(entries = report.entry_count(), bytes = report.total_bytes, "unpacked");
    Ok(())
}

fn copy_licenses(src_dir: &Path, license_dir: &Path, required: bool, record: &mut InstallRecord) -> Result<()> {
    let found: Vec<PathBuf> = LICENSE_FILES
        .iter()
        .map(|name| src_dir.join(name))
        .filter(|p| p.is_file())
        .collect();

    if found.is_empty() {
        if required {
            return Err(Error::LicenseNotFound {
                dir: src_dir.to_path_buf(),
            });
        }
        tracing::debug!(dir = %src_dir.display(), "no license files to copy");
        return Ok(());
    }

    ensure_dir(license_dir, record)?;
    for src in found {
        let Some(name) = src.file_name() else { continue };
        let dest = license_dir.join(name);
        if dest == src {
            continue;
        }
        std::fs::copy(&src, &dest).map_err(|e| Error::io(&dest, e))?;
        record.record(&dest);
        tracing::debug!(from = %src.display(), to = %dest.display(), "copied license file");
    }
    Ok(())
}
