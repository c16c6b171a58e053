//! Install sources: pick a release, stage it, and remember what was written.
//!
//! Each adapter owns its [`InstallRecord`], so independent adapters can run
//! concurrently without any shared locking. A single adapter is driven
//! through `install` then `remove` by one caller at a time.

mod exact;
mod latest;
mod versions;

use std::path::PathBuf;

use binstage_fetch::{HttpClient, ReqwestClient, RequestContext};
use binstage_fs::InstallRecord;

use crate::config::ReleasesConfig;
use crate::downloader::{Downloader, UnpackTarget};
use crate::enterprise::EnterpriseOptions;
use crate::error::{Error, Result};
use crate::index::{ProductVersionEntry, ReleasesClient};
use crate::platform::Platform;
use crate::product::Product;
use crate::validate::{validate_enterprise_options, validate_product};

pub use exact::ExactVersion;
pub use latest::LatestVersion;
pub use versions::Versions;

/// Where and how a source stages its release.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Target directory. A fresh `<product>_*` temp dir when unset.
    pub install_dir: Option<PathBuf>,
    /// Receives license files from the archive. Required for enterprise builds.
    pub license_dir: Option<PathBuf>,
    /// Overrides [`Platform::current`].
    pub platform:    Option<Platform>,
    pub config:      ReleasesConfig,
}

impl InstallOptions {
    pub fn install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    pub fn license_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.license_dir = Some(dir.into());
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn config(mut self, config: ReleasesConfig) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn validate(&self, product: &Product, enterprise: Option<&EnterpriseOptions>) -> Result<()> {
        validate_product(product)?;
        validate_enterprise_options(enterprise, self.license_dir.as_deref())
    }

    pub(crate) fn releases<C: HttpClient>(&self, client: C) -> ReleasesClient<C> {
        ReleasesClient::new(client, &self.config.base_url).with_user_agent(&self.config.user_agent)
    }

    pub(crate) fn default_client(&self) -> Result<ReqwestClient> {
        ReqwestClient::new(&self.config.user_agent).map_err(|e| Error::index_fetch(&self.config.base_url, e))
    }

    /// `ctx` with the configured install deadline applied from now.
    pub(crate) fn bounded(&self, ctx: &RequestContext) -> RequestContext {
        ctx.clone().limit_timeout(self.config.effective_timeout())
    }

    /// Download, verify and unpack `entry`, recording every path created.
    pub(crate) async fn stage<C: HttpClient>(
        &self,
        releases: &ReleasesClient<C>,
        product: &Product,
        entry: &ProductVersionEntry,
        enterprise: Option<&EnterpriseOptions>,
        record: &mut InstallRecord,
        ctx: &RequestContext,
    ) -> Result<PathBuf> {
        let platform = self.platform.clone().unwrap_or_else(Platform::current);
        let downloader = Downloader::new(releases, &self.config, &platform);
        downloader.check(&product.name, entry)?;
        let install_dir = match &self.install_dir {
            Some(dir) => dir.clone(),
            None => create_temp_install_dir(&product.name, record)?,
        };
        let binary_name = product.binary_name();

        let target = UnpackTarget {
            product:          &product.name,
            entry,
            install_dir:      &install_dir,
            license_dir:      self.license_dir.as_deref(),
            license_required: enterprise.is_some(),
            binary_name:      &binary_name,
        };
        let exec_path = downloader.download_and_unpack(&target, record, ctx).await?;

        tracing::info!(
            product = %product.name,
            version = %entry.version,
            path = %exec_path.display(),
            "installed"
        );
        Ok(exec_path)
    }
}

fn create_temp_install_dir(product: &str, record: &mut InstallRecord) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(&format!("{product}_"))
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))?
        .keep();
    record.record(&dir);
    tracing::debug!(path = %dir.display(), "created temporary install directory");
    Ok(dir)
}

/// Delete everything `record` holds; paths that could not be removed stay
/// recorded for a later attempt.
pub(crate) fn remove_recorded(product: &str, record: &mut InstallRecord) -> Result<()> {
    if record.is_empty() {
        tracing::debug!(product, "nothing to remove");
        return Ok(());
    }
    tracing::info!(product, paths = record.len(), "removing installed paths");
    record.remove_all()?;
    Ok(())
}
