//! The agent's view of the network.
use crate::request::{Fetched, Request};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network is unreachable")]
    Offline,
    #[error("Request failed: {0}")]
    Request(String),
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Performs one fetch per call. No retries.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Fetched, NetworkError>;
}

pub type AbstractNetwork = Arc<dyn Network>;

#[cfg(feature = "http")]
pub use http::HttpNetwork;

#[cfg(feature = "http")]
mod http {
    use super::{Network, NetworkError};
    use crate::request::{Fetched, Request};
    use async_trait::async_trait;
    use cacheward_config::http::{build_http_client, HttpClientParams};
    use tracing::debug;

    /// reqwest backed network. The whole body is buffered before returning.
    #[derive(Debug, Clone)]
    pub struct HttpNetwork {
        client: reqwest::Client,
    }

    impl HttpNetwork {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn from_params(
            params: &HttpClientParams,
        ) -> Result<Self, NetworkError> {
            Ok(Self::new(build_http_client(params)?))
        }
    }

    #[async_trait]
    impl Network for HttpNetwork {
        async fn fetch(&self, request: &Request) -> Result<Fetched, NetworkError> {
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|e| NetworkError::Request(e.to_string()))?;

            let mut builder = self.client.request(method, request.url.clone());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body.clone());
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response.bytes().await?;
            debug!("{} {} -> {}", request.method, request.url, status);

            Ok(Fetched::new(status, headers, body.to_vec()))
        }
    }
}
