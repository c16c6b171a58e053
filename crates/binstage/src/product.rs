//! Static product profiles.

use std::borrow::Cow;
use std::path::Path;

use binstage_version::Version;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

macro_rules! simple_version {
    () => {
        r"v?(?<version>[0-9]+(?:\.[0-9]+)*(?:-[A-Za-z0-9\.]+)?)"
    };
}

static OPEN_TOFU_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(concat!("OpenTofu ", simple_version!())).unwrap());
static OPEN_BAO_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(concat!("OpenBao ", simple_version!())).unwrap());

fn open_tofu_version() -> &'static Regex { &OPEN_TOFU_VERSION }

fn open_bao_version() -> &'static Regex { &OPEN_BAO_VERSION }

/// How to ask an installed binary for its version.
#[derive(Debug, Clone, Copy)]
pub struct VersionProbe {
    pub args:    &'static [&'static str],
    /// Text immediately preceding the version in the output, e.g. `OpenTofu`.
    pub prefix:  &'static str,
    /// Compiled `<prefix> v?X.Y.Z[-pre]` pattern with a `version` group.
    pub pattern: fn() -> &'static Regex,
}

impl VersionProbe {
    /// Pull the version out of the command's stdout.
    pub fn parse_output(&self, output: &str) -> Result<Version> {
        let stdout = output.trim();
        let caps = (self.pattern)().captures(stdout).ok_or_else(|| Error::MalformedVersion {
            input:  stdout.to_string(),
            reason: format!("no {:?} version in output", self.prefix),
        })?;
        Ok(Version::parse(&caps["version"])?)
    }
}

/// A releasable product and the facts needed to stage it.
#[derive(Debug, Clone)]
pub struct Product {
    pub name:          Cow<'static, str>,
    pub binary_name:   fn() -> String,
    pub version_probe: VersionProbe,
}

pub const OPEN_TOFU: Product = Product {
    name:          Cow::Borrowed("tofu"),
    binary_name:   tofu_binary,
    version_probe: VersionProbe {
        args:    &["version"],
        prefix:  "OpenTofu",
        pattern: open_tofu_version,
    },
};

pub const OPEN_BAO: Product = Product {
    name:          Cow::Borrowed("vault"),
    binary_name:   vault_binary,
    version_probe: VersionProbe {
        args:    &["version"],
        prefix:  "OpenBao",
        pattern: open_bao_version,
    },
};

fn tofu_binary() -> String { executable_name("tofu") }

fn vault_binary() -> String { executable_name("vault") }

/// Append `.exe` on Windows.
pub fn executable_name(stem: &str) -> String {
    if cfg!(windows) { format!("{stem}.exe") } else { stem.to_string() }
}

impl Product {
    pub fn binary_name(&self) -> String { (self.binary_name)() }

    /// Run the installed binary and parse the version it reports.
    pub async fn probe_version(&self, path: &Path) -> Result<Version> {
        let output = tokio::process::Command::new(path)
            .args(self.version_probe.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::VersionProbe {
                path:   path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::VersionProbe {
                path:   path.to_path_buf(),
                reason: format!("exited with {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = self.version_probe.parse_output(&stdout)?;
        tracing::debug!(product = %self.name, path = %path.display(), %version, "detected version");
        Ok(version)
    }
}
