use std::path::PathBuf;

use binstage_fetch::{HttpClient, RequestContext};
use binstage_fs::InstallRecord;
use binstage_version::Version;

use super::{InstallOptions, remove_recorded};
use crate::enterprise::{EnterpriseOptions, enterprise_version_metadata};
use crate::error::Result;
use crate::index::ReleaseIndex;
use crate::product::Product;
use crate::resolve::resolve_exact;

/// Installs one literal version.
///
/// With [`EnterpriseOptions`] set, the enterprise build of that version
/// (`1.9.8+ent.hsm`) is installed instead of the community one.
#[derive(Debug)]
pub struct ExactVersion {
    pub product:    Product,
    pub version:    Version,
    pub enterprise: Option<EnterpriseOptions>,
    pub options:    InstallOptions,
    record:         InstallRecord,
}

/// A clone shares the configuration but starts with an empty record, so
/// removing one never deletes the other's files.
impl Clone for ExactVersion {
    fn clone(&self) -> Self {
        Self {
            product: self.product.clone(),
            version: self.version.clone(),
            enterprise: self.enterprise.clone(),
            options: self.options.clone(),
            record: InstallRecord::new(),
        }
    }
}

impl ExactVersion {
    pub fn new(product: Product, version: Version) -> Self {
        Self {
            product,
            version,
            enterprise: None,
            options: InstallOptions::default(),
            record: InstallRecord::new(),
        }
    }

    pub fn enterprise(mut self, enterprise: EnterpriseOptions) -> Self {
        self.enterprise = Some(enterprise);
        self
    }

    pub fn options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    /// Paths written by [`install`](Self::install) and not yet removed.
    pub fn record(&self) -> &InstallRecord { &self.record }

    pub fn validate(&self) -> Result<()> { self.options.validate(&self.product, self.enterprise.as_ref()) }

    /// Install over HTTPS with the configured user agent.
    pub async fn install(&mut self, ctx: &RequestContext) -> Result<PathBuf> {
        let client = self.options.default_client()?;
        self.install_with(client, ctx).await
    }

    /// Install through `client`; returns the absolute path of the executable.
    pub async fn install_with<C: HttpClient>(&mut self, client: C, ctx: &RequestContext) -> Result<PathBuf> {
        self.validate()?;
        let ctx = self.options.bounded(ctx);
        let releases = self.options.releases(client);

        let wanted = self
            .version
            .with_metadata(&enterprise_version_metadata(self.enterprise.as_ref()))?;
        tracing::info!(product = %self.product.name, version = %wanted, "installing exact version");

        let entry = releases.get_product_version(&self.product.name, &wanted, &ctx).await?;
        let index = ReleaseIndex::from_entries(&*self.product.name, [entry]);
        let entry = resolve_exact(&index, &self.version, self.enterprise.as_ref())?;

        self.options
            .stage(&releases, &self.product, entry, self.enterprise.as_ref(), &mut self.record, &ctx)
            .await
    }

    /// Delete every recorded path. Safe to call repeatedly.
    pub fn remove(&mut self) -> Result<()> { remove_recorded(&self.product.name, &mut self.record) }
}
