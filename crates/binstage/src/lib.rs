//! Resolve, verify, download and stage release binaries.
//!
//! # Key Features
//!
//! - **Resolution**: exact versions, newest-matching under constraints, and
//!   listing of every eligible release from `{base_url}/{product}/index.json`.
//! - **Trust**: the checksum manifest's detached OpenPGP (or Ed25519) signature
//!   is checked against a pinned key, then the artifact's SHA-256 against the
//!   manifest.
//! - **Containment**: zip entries that would land outside the install
//!   directory are rejected before anything is written.
//! - **Reversible**: every path an install creates is recorded, and `remove`
//!   deletes them again, tolerating paths that are already gone.
//!
//! # Example
//!
//! ```no_run
//! use binstage::{Constraints, LatestVersion, OPEN_TOFU, RequestContext};
//!
//! # async fn run() -> binstage::Result<()> {
//! let mut source = LatestVersion::new(OPEN_TOFU).constraints(Constraints::parse("~> 1.6")?);
//! let tofu = source.install(&RequestContext::new()).await?;
//! println!("installed {}", tofu.display());
//! source.remove()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod downloader;
mod enterprise;
mod error;
mod index;
mod platform;
mod product;
mod pubkey;
mod resolve;
mod sources;
mod validate;

pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReleasesConfig};
pub use downloader::{Downloader, LICENSE_FILES, UnpackTarget};
pub use enterprise::{EnterpriseOptions, enterprise_version_metadata};
pub use error::{Error, ErrorKind, Result};
pub use index::{Artifact, ProductVersionEntry, ReleaseIndex, ReleasesClient};
pub use platform::Platform;
pub use product::{OPEN_BAO, OPEN_TOFU, Product, VersionProbe, executable_name};
pub use pubkey::DEFAULT_PUBLIC_KEY;
pub use resolve::{list_matching, resolve_exact, resolve_latest};
pub use sources::{ExactVersion, InstallOptions, LatestVersion, Versions};
pub use validate::{is_binary_name_valid, is_product_name_valid, validate_enterprise_options, validate_product};

pub use binstage_fetch::{CancellationToken, HttpClient, HttpResponse, RequestContext};
pub use binstage_fs::InstallRecord;
pub use binstage_version::{Constraint, Constraints, Operator, Version};
