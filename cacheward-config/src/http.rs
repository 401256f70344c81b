//! HTTP client settings for the agent's network side.
//!
//! # Example
//! ```no_run
//! use cacheward_config::http::{HttpClientParams, build_http_client};
//! use serde_yaml::Value;
//!
//! let config: Value = serde_yaml::from_str(r#"
//! http:
//!     timeout: 30
//!     connect_timeout: 10
//!     user_agent: my-app/1.0
//! "#).unwrap();
//!
//! let params =
//!     HttpClientParams::from_config(&config["http"], "cacheward").unwrap();
//! let client = build_http_client(&params).unwrap();
//! ```
use crate::config::ConfigError;

/// Parameters for configuring an HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientParams {
    pub timeout: u64,
    pub connect_timeout: u64,
    pub user_agent: String,
}

impl Default for HttpClientParams {
    fn default() -> Self {
        Self {
            timeout: 30,
            connect_timeout: 10,
            user_agent: concat!("cacheward/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

impl HttpClientParams {
    /// Creates an HttpClientParams instance from a YAML configuration.
    ///
    /// ```yaml
    /// http:
    ///     timeout: 30
    ///     connect_timeout: 10
    ///     user_agent: my-app/1.0   # optional
    /// ```
    ///
    /// `timeout` and `connect_timeout` are seconds and required.
    /// `default_user_agent` is used when the config has none.
    pub fn from_config(
        http_config: &serde_yaml::Value,
        default_user_agent: &str,
    ) -> Result<Self, ConfigError> {
        let timeout = http_config["timeout"]
            .as_u64()
            .ok_or(ConfigError::MissingField("http.timeout"))?;
        let connect_timeout = http_config["connect_timeout"]
            .as_u64()
            .ok_or(ConfigError::MissingField("http.connect_timeout"))?;
        let user_agent = http_config["user_agent"]
            .as_str()
            .unwrap_or(default_user_agent)
            .to_string();

        Ok(Self {
            timeout,
            connect_timeout,
            user_agent,
        })
    }
}

/// Builds a reqwest client with TLS, timeouts and user agent set.
///
/// Redirects follow reqwest's default policy.
pub fn build_http_client(
    params: &HttpClientParams,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .use_rustls_tls()
        .timeout(std::time::Duration::from_secs(params.timeout))
        .connect_timeout(std::time::Duration::from_secs(params.connect_timeout))
        .user_agent(params.user_agent.as_str())
        .build()
}
