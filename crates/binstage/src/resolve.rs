//! Version selection over a fetched [`ReleaseIndex`].

use binstage_version::{Constraints, Version};

use crate::enterprise::{EnterpriseOptions, enterprise_version_metadata};
use crate::error::{Error, Result};
use crate::index::{ProductVersionEntry, ReleaseIndex};

/// Look up `version` carrying the selector's enterprise metadata.
///
/// Any metadata already on `version` is replaced by the selector's.
pub fn resolve_exact<'a>(
    index: &'a ReleaseIndex,
    version: &Version,
    enterprise: Option<&EnterpriseOptions>,
) -> Result<&'a ProductVersionEntry> {
    let wanted = version.with_metadata(&enterprise_version_metadata(enterprise))?;
    index.get(&wanted).ok_or_else(|| Error::VersionNotFound {
        product: index.product().to_string(),
        version: wanted.to_string(),
    })
}

/// Entries eligible under the policy, ascending by precedence.
///
/// Entries of equal precedence are ordered by their published version text,
/// the key order of the parsed index, so the last one listed wins a tie.
pub fn list_matching<'a>(
    index: &'a ReleaseIndex,
    constraints: &Constraints,
    include_prereleases: bool,
    enterprise: Option<&EnterpriseOptions>,
) -> Vec<&'a ProductVersionEntry> {
    let expected_metadata = enterprise_version_metadata(enterprise);

    let mut eligible: Vec<_> = index
        .iter()
        .filter(|entry| include_prereleases || !entry.version.is_prerelease())
        .filter(|entry| entry.version.metadata() == expected_metadata)
        .filter(|entry| constraints.check(&entry.version))
        .collect();

    eligible.sort_by(|a, b| {
        a.version
            .cmp_precedence(&b.version)
            .then_with(|| a.raw_version.cmp(&b.raw_version))
    });
    eligible
}

/// The newest eligible entry; ties go to the entry sorted last.
pub fn resolve_latest<'a>(
    index: &'a ReleaseIndex,
    constraints: &Constraints,
    include_prereleases: bool,
    enterprise: Option<&EnterpriseOptions>,
) -> Result<&'a ProductVersionEntry> {
    let eligible = list_matching(index, constraints, include_prereleases, enterprise);
    let selected = eligible.last().copied().ok_or_else(|| Error::NoMatchingVersion {
        product: index.product().to_string(),
        constraints: constraints.to_string(),
        include_prereleases,
    })?;

    tracing::debug!(
        product = index.product(),
        version = %selected.version,
        candidates = eligible.len(),
        "selected latest matching version"
    );
    Ok(selected)
}
