use serde::{Deserialize, Serialize};

/// Selects an enterprise build. `meta` is the edition tag, e.g. `hsm` for
/// `1.9.8+ent.hsm`; empty selects plain `+ent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseOptions {
    #[serde(default)]
    pub meta: String,
}

impl EnterpriseOptions {
    pub fn new(meta: impl Into<String>) -> Self { Self { meta: meta.into() } }
}

/// Build metadata an eligible release must carry. Community selection
/// (no options) requires empty metadata.
pub fn enterprise_version_metadata(enterprise: Option<&EnterpriseOptions>) -> String {
    match enterprise {
        None => String::new(),
        Some(opts) if opts.meta.is_empty() => "ent".to_string(),
        Some(opts) => format!("ent.{}", opts.meta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_encoding() {
        assert_eq!(enterprise_version_metadata(None), "");
        assert_eq!(enterprise_version_metadata(Some(&EnterpriseOptions::default())), "ent");
        assert_eq!(enterprise_version_metadata(Some(&EnterpriseOptions::new("hsm"))), "ent.hsm");
        assert_eq!(enterprise_version_metadata(Some(&EnterpriseOptions::new("fips1402"))), "ent.fips1402");
    }
}
