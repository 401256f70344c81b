//! Application settings loaded from one yaml file.
//!
//! ```yaml
//! agent: { ... }        # see cacheward_config::agent
//! http:
//!   timeout: 30
//!   connect_timeout: 10
//! store:
//!   path: ./cacheward-data
//! logging:
//!   filter: cacheward=debug
//! ```
use cacheward_config::{AgentConfig, ConfigError, Configurable};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Settings {
    config: serde_yaml::Value,
    base_dir: PathBuf,
}

impl Configurable for Settings {
    fn config(&self) -> &serde_yaml::Value {
        &self.config
    }
}

impl Settings {
    /// Load from disk. Relative paths inside resolve against the file's dir.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::load_config(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self { config, base_dir })
    }

    pub fn from_value(
        config: serde_yaml::Value,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    pub fn agent(&self) -> Result<AgentConfig, ConfigError> {
        let section = self
            .get_config_value("agent")
            .ok_or(ConfigError::MissingField("agent"))?;
        AgentConfig::from_config(section, Some(&self.base_dir))
    }

    /// `http` section; library defaults when it is absent.
    #[cfg(feature = "http")]
    pub fn http(
        &self,
    ) -> Result<cacheward_config::http::HttpClientParams, ConfigError> {
        use cacheward_config::http::HttpClientParams;

        match self.get_config_value("http") {
            Some(section) => HttpClientParams::from_config(
                section,
                &HttpClientParams::default().user_agent,
            ),
            None => Ok(HttpClientParams::default()),
        }
    }

    /// `store.path`, resolved against the config file's directory.
    pub fn store_path(&self) -> Option<PathBuf> {
        let path = Path::new(self.get_config_value("store.path")?.as_str()?);
        if path.is_relative() {
            Some(self.base_dir.join(path))
        } else {
            Some(path.to_path_buf())
        }
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.get_config_value("logging.filter")?.as_str()
    }
}
