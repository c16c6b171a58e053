use std::path::PathBuf;

use binstage_fetch::{HttpClient, RequestContext};
use binstage_fs::InstallRecord;
use binstage_version::Constraints;

use super::{InstallOptions, remove_recorded};
use crate::enterprise::EnterpriseOptions;
use crate::error::Result;
use crate::product::Product;
use crate::resolve::resolve_latest;

/// Installs the newest release satisfying `constraints`.
#[derive(Debug)]
pub struct LatestVersion {
    pub product:             Product,
    /// Empty constraints accept every version.
    pub constraints:         Constraints,
    pub include_prereleases: bool,
    pub enterprise:          Option<EnterpriseOptions>,
    pub options:             InstallOptions,
    record:                  InstallRecord,
}

/// A clone shares the configuration but starts with an empty record, so
/// removing one never deletes the other's files.
impl Clone for LatestVersion {
    fn clone(&self) -> Self {
        Self {
            product: self.product.clone(),
            constraints: self.constraints.clone(),
            include_prereleases: self.include_prereleases,
            enterprise: self.enterprise.clone(),
            options: self.options.clone(),
            record: InstallRecord::new(),
        }
    }
}

impl LatestVersion {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            constraints: Constraints::any(),
            include_prereleases: false,
            enterprise: None,
            options: InstallOptions::default(),
            record: InstallRecord::new(),
        }
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn include_prereleases(mut self, include: bool) -> Self {
        self.include_prereleases = include;
        self
    }

    pub fn enterprise(mut self, enterprise: EnterpriseOptions) -> Self {
        self.enterprise = Some(enterprise);
        self
    }

    pub fn options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn record(&self) -> &InstallRecord { &self.record }

    pub fn validate(&self) -> Result<()> { self.options.validate(&self.product, self.enterprise.as_ref()) }

    pub async fn install(&mut self, ctx: &RequestContext) -> Result<PathBuf> {
        let client = self.options.default_client()?;
        self.install_with(client, ctx).await
    }

    /// Fetch the index, pick the newest eligible release and stage it.
    pub async fn install_with<C: HttpClient>(&mut self, client: C, ctx: &RequestContext) -> Result<PathBuf> {
        self.validate()?;
        let ctx = self.options.bounded(ctx);
        let releases = self.options.releases(client);
        tracing::info!(
            product = %self.product.name,
            constraints = %self.constraints,
            prereleases = self.include_prereleases,
            "installing latest matching version"
        );

        let index = releases.list_versions(&self.product.name, &ctx).await?;
        let entry = resolve_latest(
            &index,
            &self.constraints,
            self.include_prereleases,
            self.enterprise.as_ref(),
        )?;

        self.options
            .stage(&releases, &self.product, entry, self.enterprise.as_ref(), &mut self.record, &ctx)
            .await
    }

    pub fn remove(&mut self) -> Result<()> { remove_recorded(&self.product.name, &mut self.record) }
}
