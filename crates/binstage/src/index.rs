//! Release index client.
//!
//! `{base}/{product}/index.json` lists every published version of a product
//! together with its per-platform builds and the names of its checksum
//! manifest and signature.

use std::collections::{BTreeMap, HashMap};

use binstage_fetch::{FetchError, Fetcher, HttpClient, RequestContext};
use binstage_version::Version;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::validate::is_product_name_valid;

#[derive(Debug, Deserialize)]
struct ProductJson {
    #[serde(default)]
    versions: BTreeMap<String, VersionJson>,
}

#[derive(Debug, Deserialize)]
struct VersionJson {
    #[serde(default)]
    name:               String,
    #[serde(default)]
    version:            String,
    #[serde(default)]
    shasums:            String,
    #[serde(default)]
    shasums_signature:  String,
    #[serde(default)]
    shasums_signatures: Vec<String>,
    #[serde(default)]
    builds:             Vec<BuildJson>,
}

#[derive(Debug, Deserialize)]
struct BuildJson {
    os:       String,
    arch:     String,
    filename: String,
    #[serde(default)]
    url:      String,
}

/// One downloadable archive for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub platform: Platform,
    pub filename: String,
    /// As published; may be empty or absolute.
    pub url:      String,
}

/// One published version and its builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVersionEntry {
    pub name:               String,
    pub version:            Version,
    /// Version text exactly as published, used in download paths.
    pub raw_version:        String,
    pub shasums:            String,
    pub shasums_signature:  String,
    pub shasums_signatures: Vec<String>,
    pub artifacts:          HashMap<Platform, Artifact>,
}

impl ProductVersionEntry {
    pub fn artifact_for(&self, platform: &Platform) -> Option<&Artifact> { self.artifacts.get(platform) }

    /// Detached signature file name; the legacy single field wins.
    pub fn signature_filename(&self) -> Option<&str> {
        if !self.shasums_signature.is_empty() {
            return Some(&self.shasums_signature);
        }
        self.shasums_signatures.iter().map(String::as_str).find(|s| !s.is_empty())
    }

    fn from_json(key: &str, json: VersionJson, url: &str) -> Result<Self> {
        let raw_version = if json.version.is_empty() { key.to_string() } else { json.version };
        let version = Version::parse(&raw_version).map_err(|e| Error::IndexParse {
            url:    url.to_string(),
            reason: format!("version {key:?}: {e}"),
        })?;

        let artifacts = json
            .builds
            .into_iter()
            .map(|b| {
                let platform = Platform::new(b.os, b.arch);
                let artifact = Artifact {
                    platform: platform.clone(),
                    filename: b.filename,
                    url:      b.url,
                };
                (platform, artifact)
            })
            .collect();

        Ok(Self {
            name: json.name,
            version,
            raw_version,
            shasums: json.shasums,
            shasums_signature: json.shasums_signature,
            shasums_signatures: json.shasums_signatures,
            artifacts,
        })
    }
}

/// Every published version of one product, keyed by canonical version text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIndex {
    product: String,
    entries: HashMap<String, ProductVersionEntry>,
}

impl ReleaseIndex {
    /// Build from entries; a later entry replaces an earlier one with the
    /// same canonical version.
    pub fn from_entries(product: impl Into<String>, entries: impl IntoIterator<Item = ProductVersionEntry>) -> Self {
        Self {
            product: product.into(),
            entries: entries.into_iter().map(|e| (e.version.to_string(), e)).collect(),
        }
    }

    /// Parse an `index.json` payload. `url` is only used for diagnostics.
    pub fn from_json(product: &str, body: &[u8], url: &str) -> Result<Self> {
        let parsed: ProductJson = serde_json::from_slice(body).map_err(|e| Error::IndexParse {
            url:    url.to_string(),
            reason: e.to_string(),
        })?;

        let entries = parsed
            .versions
            .into_iter()
            .map(|(key, json)| ProductVersionEntry::from_json(&key, json, url))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_entries(product, entries))
    }

    pub fn product(&self) -> &str { &self.product }

    pub fn get(&self, version: &Version) -> Option<&ProductVersionEntry> { self.entries.get(&version.to_string()) }

    pub fn iter(&self) -> impl Iterator<Item = &ProductVersionEntry> { self.entries.values() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Reads release indexes from `{base_url}`.
pub struct ReleasesClient<C: HttpClient> {
    fetcher:          Fetcher<C>,
    base_url:         String,
    default_base_url: bool,
}

impl<C: HttpClient> ReleasesClient<C> {
    pub fn new(client: C, base_url: &str) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = if trimmed.is_empty() { crate::DEFAULT_BASE_URL } else { trimmed };
        Self {
            fetcher:          Fetcher::new(client),
            base_url:         base_url.to_string(),
            default_base_url: base_url == crate::DEFAULT_BASE_URL,
        }
    }

    /// Send `User-Agent: {agent}` with every request.
    pub fn with_user_agent(self, agent: &str) -> Self {
        Self {
            fetcher: self
                .fetcher
                .with_headers(vec![("User-Agent".to_string(), agent.to_string())]),
            ..self
        }
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub fn fetcher(&self) -> &Fetcher<C> { &self.fetcher }

    pub fn index_url(&self, product: &str) -> String { format!("{}/{product}/index.json", self.base_url) }

    pub fn version_index_url(&self, product: &str, version: &str) -> String {
        format!("{}/{product}/{version}/index.json", self.base_url)
    }

    /// Fetch the full index. An index without versions is [`Error::EmptyIndex`].
    pub async fn list_versions(&self, product: &str, ctx: &RequestContext) -> Result<ReleaseIndex> {
        check_product_name(product)?;
        let url = self.index_url(product);
        tracing::debug!(%url, "fetching release index");

        let body = self
            .fetcher
            .fetch_bytes(&url, ctx)
            .await
            .map_err(|e| Error::index_fetch(&url, e))?;
        let index = ReleaseIndex::from_json(product, &body, &url)?;

        if index.is_empty() {
            return Err(Error::EmptyIndex {
                product: product.to_string(),
            });
        }
        tracing::debug!(product, versions = index.len(), "parsed release index");
        Ok(index)
    }

    /// Fetch the single-version index. A 404 is [`Error::VersionNotFound`].
    pub async fn get_product_version(
        &self,
        product: &str,
        version: &Version,
        ctx: &RequestContext,
    ) -> Result<ProductVersionEntry> {
        check_product_name(product)?;
        let raw = version.to_string();
        let url = self.version_index_url(product, &raw);
        tracing::debug!(%url, "fetching version index");

        let body = match self.fetcher.fetch_bytes(&url, ctx).await {
            Ok(body) => body,
            Err(FetchError::Status { status: 404, .. }) => {
                return Err(Error::VersionNotFound {
                    product: product.to_string(),
                    version: raw,
                });
            }
            Err(e) => return Err(Error::index_fetch(&url, e)),
        };

        let json: VersionJson = serde_json::from_slice(&body).map_err(|e| Error::IndexParse {
            url:    url.clone(),
            reason: e.to_string(),
        })?;
        ProductVersionEntry::from_json(&raw, json, &url)
    }

    /// Where to download `artifact`. Absolute URLs are rebased onto a
    /// non-default base so mirrors serve every file.
    pub fn artifact_url(&self, product: &str, entry: &ProductVersionEntry, artifact: &Artifact) -> Result<String> {
        let Ok(published) = Url::parse(&artifact.url) else {
            return Ok(self.release_file_url(product, entry, &artifact.filename));
        };
        if self.default_base_url {
            return Ok(published.into());
        }

        let base = Url::parse(&self.base_url)
            .map_err(|e| Error::validation("base_url", format!("invalid base url {:?}: {e}", self.base_url)))?;
        let mut rebased = base.origin().ascii_serialization();
        rebased.push_str(published.path());
        if let Some(query) = published.query() {
            rebased.push('?');
            rebased.push_str(query);
        }
        Ok(rebased)
    }

    /// `{base}/{product}/{version}/{filename}`
    pub fn release_file_url(&self, product: &str, entry: &ProductVersionEntry, filename: &str) -> String {
        format!("{}/{product}/{}/{filename}", self.base_url, entry.raw_version)
    }
}

fn check_product_name(product: &str) -> Result<()> {
    if is_product_name_valid(product) {
        Ok(())
    } else {
        Err(Error::validation("product.name", format!("invalid product name: {product:?}")))
    }
}
