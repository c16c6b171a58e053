use binstage_fetch::{HttpClient, RequestContext};
use binstage_version::Constraints;

use super::{ExactVersion, InstallOptions};
use crate::enterprise::EnterpriseOptions;
use crate::error::Result;
use crate::product::Product;
use crate::resolve::list_matching;

/// Lists every eligible release as a ready-to-install [`ExactVersion`].
#[derive(Debug, Clone)]
pub struct Versions {
    pub product:             Product,
    pub constraints:         Constraints,
    pub include_prereleases: bool,
    pub enterprise:          Option<EnterpriseOptions>,
    /// Copied into every listed source.
    pub options:             InstallOptions,
}

impl Versions {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            constraints: Constraints::any(),
            include_prereleases: false,
            enterprise: None,
            options: InstallOptions::default(),
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

    pub fn validate(&self) -> Result<()> { self.options.validate(&self.product, self.enterprise.as_ref()) }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<ExactVersion>> {
        let client = self.options.default_client()?;
        self.list_with(client, ctx).await
    }

    /// Eligible releases, oldest first.
    pub async fn list_with<C: HttpClient>(&self, client: C, ctx: &RequestContext) -> Result<Vec<ExactVersion>> {
        self.validate()?;
        let ctx = self.options.bounded(ctx);
        let index = self.options.releases(client).list_versions(&self.product.name, &ctx).await?;

        let sources: Vec<ExactVersion> = list_matching(
            &index,
            &self.constraints,
            self.include_prereleases,
            self.enterprise.as_ref(),
        )
        .into_iter()
        .map(|entry| {
            let mut source = ExactVersion::new(self.product.clone(), entry.version.clone())
                .options(self.options.clone());
            source.enterprise = self.enterprise.clone();
            source
        })
        .collect();

        tracing::debug!(product = %self.product.name, count = sources.len(), "listed matching versions");
        Ok(sources)
    }
}
