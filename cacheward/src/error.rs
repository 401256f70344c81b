use crate::lifecycle::LifecycleError;
use crate::network::NetworkError;
use cacheward_cache::CacheError;
use cacheward_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Install failed fetching {url}: {source}")]
    InstallFetch {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("Install failed: {url} returned status {status}")]
    InstallStatus { url: String, status: u16 },

    #[error("No response available for {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: NetworkError,
    },
}
