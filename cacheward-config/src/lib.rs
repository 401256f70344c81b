pub mod agent;
pub mod config;
#[cfg(feature = "http")]
pub mod http;

pub use agent::{AgentConfig, AgentConfigBuilder, Policy};
pub use config::{ConfigError, Configurable};
