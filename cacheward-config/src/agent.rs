//! Agent configuration: version, origin, manifest and interception policy.
//!
//! ```yaml
//! agent:
//!   version: flash-v12
//!   origin: https://flash.example.com/
//!   policy: network-first   # or cache-first
//!   filter_origin: true     # set false to intercept cross-origin GETs too
//!   fallback: ./index.html
//!   manifest:
//!     - ./
//!     - ./index.html
//!   manifest_file: manifest.txt
//! ```
use crate::config::{load_lines, ConfigError};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// How intercepted requests are served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Try the network, fall back to the bucket when it fails.
    #[default]
    NetworkFirst,
    /// Serve from the bucket, go to the network only on a miss.
    CacheFirst,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::NetworkFirst => f.write_str("network-first"),
            Policy::CacheFirst => f.write_str("cache-first"),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(public, setter(into))]
pub struct AgentConfig {
    /// Bucket name, bump it to force a full refresh.
    pub version: String,
    /// Origin the agent serves, manifest entries resolve against it.
    pub origin: Url,
    #[builder(default)]
    #[serde(default)]
    pub manifest: Vec<String>,
    /// Extra manifest entries, one path per line. Relative to the config file.
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub manifest_file: Option<PathBuf>,
    #[builder(default)]
    #[serde(default)]
    pub policy: Policy,
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub filter_origin: bool,
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub fallback: Option<String>,
    /// Take over right after install instead of waiting for the host.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

impl AgentConfigBuilder {
    /// Append one manifest entry.
    pub fn entry(&mut self, path: impl Into<String>) -> &mut Self {
        self.manifest.get_or_insert_with(Vec::new).push(path.into());
        self
    }
}

impl AgentConfig {
    /// Read the `agent` section. `base_dir` anchors a relative `manifest_file`.
    pub fn from_config(
        agent_config: &serde_yaml::Value,
        base_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        if agent_config.is_null() {
            return Err(ConfigError::MissingField("agent"));
        }
        if agent_config["version"].is_null() {
            return Err(ConfigError::MissingField("agent.version"));
        }
        if agent_config["origin"].is_null() {
            return Err(ConfigError::MissingField("agent.origin"));
        }

        let mut config: AgentConfig = serde_yaml::from_value(agent_config.clone())?;
        config.load_manifest_file(base_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Append entries from `manifest_file`, skipping blanks and `#` comments.
    pub fn load_manifest_file(
        &mut self,
        base_dir: Option<&Path>,
    ) -> Result<(), ConfigError> {
        let Some(file) = &self.manifest_file else {
            return Ok(());
        };
        let path = match base_dir {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.clone(),
        };

        let lines = load_lines(&path)?;
        let before = self.manifest.len();
        self.manifest.extend(
            lines
                .into_iter()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        );
        debug!(
            "Loaded {} manifest entries from {}",
            self.manifest.len() - before,
            path.display()
        );
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::invalid("agent.version", "must not be empty"));
        }
        if !matches!(self.origin.scheme(), "http" | "https")
            || self.origin.host().is_none()
        {
            return Err(ConfigError::invalid(
                "agent.origin",
                format!("{} is not an http(s) origin", self.origin),
            ));
        }

        let manifest = self.manifest_urls()?;
        if let Some(fallback) = self.fallback_url()? {
            if !manifest.contains(&fallback) {
                return Err(ConfigError::invalid(
                    "agent.fallback",
                    format!("{fallback} is not listed in the manifest"),
                ));
            }
        }
        Ok(())
    }

    /// Resolve a manifest path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let mut url = self.origin.join(path).map_err(|e| {
            ConfigError::invalid("agent.manifest", format!("{path}: {e}"))
        })?;
        url.set_fragment(None);
        Ok(url)
    }

    /// Resolved manifest, in order, duplicates removed.
    pub fn manifest_urls(&self) -> Result<Vec<Url>, ConfigError> {
        let mut urls: Vec<Url> = Vec::with_capacity(self.manifest.len());
        for path in &self.manifest {
            let url = self.resolve(path)?;
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        Ok(urls)
    }

    pub fn fallback_url(&self) -> Result<Option<Url>, ConfigError> {
        self.fallback.as_deref().map(|path| self.resolve(path)).transpose()
    }

    /// Same scheme, host and port as the agent's origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

    fn fixture() -> serde_yaml::Value {
        crate::config::load_yaml(Path::new(FIXTURES).join("agent.yml")).unwrap()
    }

    #[test]
    fn test_from_config() {
        let config =
            AgentConfig::from_config(&fixture()["agent"], Some(Path::new(FIXTURES)))
                .unwrap();

        assert_eq!(config.version, "flash-v12");
        assert_eq!(config.policy, Policy::NetworkFirst);
        assert!(config.filter_origin);
        assert_eq!(config.fallback.as_deref(), Some("./index.html"));
        // 6 inline + 3 from file (comment and blank line skipped)
        assert_eq!(config.manifest.len(), 9);
        assert_eq!(config.manifest[6], "./data/en.json");
    }

    #[test]
    fn test_manifest_urls_dedup() {
        let config =
            AgentConfig::from_config(&fixture()["agent"], Some(Path::new(FIXTURES)))
                .unwrap();
        let urls = config.manifest_urls().unwrap();

        // ./index.html is listed twice
        assert_eq!(urls.len(), 8);
        assert_eq!(urls[0].as_str(), "https://flash.example.com/");
        assert_eq!(urls[1].as_str(), "https://flash.example.com/index.html");
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
        version: v1
        origin: https://app.example.com/
        "#;
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let config = AgentConfig::from_config(&value, None).unwrap();

        assert_eq!(config.policy, Policy::NetworkFirst);
        assert!(config.filter_origin);
        assert!(config.manifest.is_empty());
        assert_eq!(config.fallback, None);
        assert!(config.skip_waiting);
    }

    #[test]
    fn test_cache_first_policy() {
        let yaml = r#"
        version: v1
        origin: https://app.example.com/
        policy: cache-first
        filter_origin: false
        "#;
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let config = AgentConfig::from_config(&value, None).unwrap();

        assert_eq!(config.policy, Policy::CacheFirst);
        assert!(!config.filter_origin);
    }

    #[test]
    fn test_missing_version() {
        let yaml = "origin: https://app.example.com/";
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            AgentConfig::from_config(&value, None),
            Err(ConfigError::MissingField("agent.version"))
        ));
    }

    #[test]
    fn test_unknown_policy() {
        let yaml = r#"
        version: v1
        origin: https://app.example.com/
        policy: stale-while-revalidate
        "#;
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            AgentConfig::from_config(&value, None),
            Err(ConfigError::YamlParse(_))
        ));
    }

    #[test]
    fn test_fallback_must_be_in_manifest() {
        let config = AgentConfigBuilder::default()
            .version("v1")
            .origin(Url::parse("https://app.example.com/").unwrap())
            .entry("./")
            .fallback("./offline.html")
            .build()
            .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "agent.fallback",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_http_origin() {
        let config = AgentConfigBuilder::default()
            .version("v1")
            .origin(Url::parse("file:///srv/app/").unwrap())
            .build()
            .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "agent.origin",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_empty_version() {
        let config = AgentConfigBuilder::default()
            .version(" ")
            .origin(Url::parse("https://app.example.com/").unwrap())
            .build()
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_origin() {
        let config = AgentConfigBuilder::default()
            .version("v1")
            .origin(Url::parse("https://app.example.com/").unwrap())
            .build()
            .unwrap();

        let same = Url::parse("https://app.example.com/data/en.json").unwrap();
        let other_host = Url::parse("https://cdn.example.com/app.js").unwrap();
        let other_port = Url::parse("https://app.example.com:8443/").unwrap();
        let other_scheme = Url::parse("http://app.example.com/").unwrap();

        assert!(config.is_same_origin(&same));
        assert!(!config.is_same_origin(&other_host));
        assert!(!config.is_same_origin(&other_port));
        assert!(!config.is_same_origin(&other_scheme));
    }
}
