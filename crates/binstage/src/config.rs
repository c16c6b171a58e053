use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pubkey::DEFAULT_PUBLIC_KEY;

/// Public release index host.
pub const DEFAULT_BASE_URL: &str = "https://releases.hashicorp.com";

/// Overall deadline for one install call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_USER_AGENT: &str = concat!("binstage/", env!("CARGO_PKG_VERSION"));

/// Settings shared by every source adapter.
///
/// # Examples
///
/// ```
/// use binstage::ReleasesConfig;
/// use std::time::Duration;
///
/// let config = ReleasesConfig::default()
///     .base_url("https://mirror.internal/releases")
///     .timeout(Duration::from_secs(120));
/// assert_eq!(config.base_url, "https://mirror.internal/releases");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleasesConfig {
    /// Root of the release index; `{base_url}/{product}/index.json`.
    pub base_url: String,

    /// Deadline shared by every request of one install call.
    pub timeout: Duration,

    /// Skip signature and checksum verification entirely.
    pub skip_checksum_verification: bool,

    /// ASCII-armored key replacing [`DEFAULT_PUBLIC_KEY`]: an OpenPGP public
    /// key block or a PEM Ed25519 `PUBLIC KEY`.
    pub armored_public_key: Option<String>,

    pub user_agent: String,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            base_url:                   DEFAULT_BASE_URL.to_string(),
            timeout:                    DEFAULT_TIMEOUT,
            skip_checksum_verification: false,
            armored_public_key:         None,
            user_agent:                 DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ReleasesConfig {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn skip_checksum_verification(mut self, skip: bool) -> Self {
        self.skip_checksum_verification = skip;
        self
    }

    pub fn armored_public_key(mut self, key: impl Into<String>) -> Self {
        self.armored_public_key = Some(key.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Key used for manifest signatures; the override wins when non-empty.
    pub fn public_key(&self) -> Option<&str> {
        match self.armored_public_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(key),
            _ => DEFAULT_PUBLIC_KEY,
        }
    }

    /// Base URL without trailing slashes; empty falls back to the default.
    pub fn normalized_base_url(&self) -> &str {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.is_empty() { DEFAULT_BASE_URL } else { trimmed }
    }

    pub fn uses_default_base_url(&self) -> bool { self.normalized_base_url() == DEFAULT_BASE_URL }

    /// A zero timeout means "use the default".
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() { DEFAULT_TIMEOUT } else { self.timeout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReleasesConfig::default();
        assert_eq!(config.normalized_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
        assert!(!config.skip_checksum_verification);
        assert_eq!(config.public_key(), DEFAULT_PUBLIC_KEY);
        assert!(config.user_agent.starts_with("binstage/"));
    }

    #[test]
    fn overrides() {
        let config = ReleasesConfig::default()
            .base_url("http://127.0.0.1:8080/")
            .armored_public_key("KEY")
            .timeout(Duration::ZERO);
        assert_eq!(config.normalized_base_url(), "http://127.0.0.1:8080");
        assert!(!config.uses_default_base_url());
        assert_eq!(config.public_key(), Some("KEY"));
        assert_eq!(config.effective_timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn blank_key_falls_back_to_default() {
        let config = ReleasesConfig::default().armored_public_key("  ");
        assert_eq!(config.public_key(), DEFAULT_PUBLIC_KEY);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ReleasesConfig =
            serde_json::from_str(r#"{"base_url":"http://mirror","skip_checksum_verification":true}"#).unwrap();
        assert_eq!(config.base_url, "http://mirror");
        assert!(config.skip_checksum_verification);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.armored_public_key, None);
    }
}
