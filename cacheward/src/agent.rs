#![deny(clippy::unwrap_used)]
//! The offline cache agent.
//!
//! One agent instance serves one version. Its three handlers map to the host
//! lifecycle events:
//! - [`Agent::install`] fetches the whole manifest and writes it in one batch
//!   into the bucket named after the version.
//! - [`Agent::activate`] deletes every other bucket.
//! - [`Agent::intercept`] applies the configured policy to one request.
//!
//! Each handler returns an explicit completion value describing what the
//! host must do next, instead of signalling through side channels.
use crate::error::AgentError;
use crate::lifecycle::{AgentState, Lifecycle, LifecycleError, LifecycleEvent};
use crate::network::{AbstractNetwork, NetworkError};
use crate::request::{Request, Response, ResponseSource};
use cacheward_cache::{AbstractBucketStore, Bucket, RequestKey, Snapshot};
use cacheward_config::{AgentConfig, Policy};
use futures::future::try_join_all;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCompletion {
    pub version: String,
    /// Number of distinct entries written into the bucket
    pub entries: usize,
    /// Activate right away instead of waiting for older instances to go
    pub skip_waiting: bool,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateCompletion {
    pub version: String,
    /// Buckets of superseded versions that were removed
    pub deleted: Vec<String>,
    /// Take control of every open session now, not only new ones
    pub claim_clients: bool,
}

/// Background write of a freshly fetched response into the bucket.
///
/// Dropping it does not cancel the write.
#[derive(Debug)]
pub struct CacheWrite(JoinHandle<bool>);

impl CacheWrite {
    /// Wait for the write to finish. `true` if the snapshot was stored.
    pub async fn wait(self) -> bool {
        self.0.await.unwrap_or(false)
    }
}

/// Outcome of intercepting a request.
#[derive(Debug)]
pub enum Interception {
    /// Not ours: the request goes to the network untouched.
    Passthrough,
    /// The agent produced a response.
    Respond {
        response: Response,
        write: Option<CacheWrite>,
    },
}

impl Interception {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Interception::Passthrough)
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Interception::Respond { response, .. } => Some(response),
            Interception::Passthrough => None,
        }
    }

    /// Response plus the pending write, if any.
    pub fn into_parts(self) -> Option<(Response, Option<CacheWrite>)> {
        match self {
            Interception::Respond { response, write } => Some((response, write)),
            Interception::Passthrough => None,
        }
    }
}

pub struct Agent {
    config: Arc<AgentConfig>,
    bucket: Bucket,
    network: AbstractNetwork,
    lifecycle: Mutex<Lifecycle>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        store: AbstractBucketStore,
        network: AbstractNetwork,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        let bucket = Bucket::new(config.version.clone(), store);
        Ok(Self {
            config: Arc::new(config),
            bucket,
            network,
            lifecycle: Mutex::new(Lifecycle::new()),
        })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn state(&self) -> Result<AgentState, LifecycleError> {
        let lifecycle = self
            .lifecycle
            .lock()
            .map_err(|e| LifecycleError::Poisoned(e.to_string()))?;
        Ok(lifecycle.state())
    }

    fn transition(
        &self,
        event: LifecycleEvent,
    ) -> Result<AgentState, LifecycleError> {
        let mut lifecycle = self
            .lifecycle
            .lock()
            .map_err(|e| LifecycleError::Poisoned(e.to_string()))?;
        lifecycle.apply(event)
    }

    /// Fetch the whole manifest and store it. All or nothing: when any entry
    /// fails nothing is written and the agent goes back to `Unregistered`.
    #[instrument(skip(self), fields(version = %self.config.version))]
    pub async fn install(&self) -> Result<InstallCompletion, AgentError> {
        self.transition(LifecycleEvent::Install)?;

        match self.populate().await {
            Ok(entries) => {
                self.transition(LifecycleEvent::Installed)?;
                info!(
                    "Installed {} entries into bucket {}",
                    entries,
                    self.version()
                );
                Ok(InstallCompletion {
                    version: self.config.version.clone(),
                    entries,
                    skip_waiting: self.config.skip_waiting,
                })
            }
            Err(e) => {
                error!("Install of {} failed: {}", self.version(), e);
                self.transition(LifecycleEvent::InstallFailed)?;
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize, AgentError> {
        let urls = self.config.manifest_urls()?;
        let fetches = urls.into_iter().map(|url| self.fetch_for_install(url));
        let entries = try_join_all(fetches).await?;

        let count = entries.len();
        self.bucket.store_all(entries).await?;
        Ok(count)
    }

    async fn fetch_for_install(
        &self,
        url: Url,
    ) -> Result<(RequestKey, Snapshot), AgentError> {
        let request = Request::get(url);
        let fetched = self.network.fetch(&request).await.map_err(|source| {
            AgentError::InstallFetch {
                url: request.url.to_string(),
                source,
            }
        })?;
        if !fetched.is_success() {
            return Err(AgentError::InstallStatus {
                url: request.url.to_string(),
                status: fetched.status(),
            });
        }
        Ok((request.key(), fetched.into_snapshot()))
    }

    /// Remove buckets of every other version and take control.
    ///
    /// The agent is `Active` once this returns, even when purging failed.
    #[instrument(skip(self), fields(version = %self.config.version))]
    pub async fn activate(&self) -> Result<ActivateCompletion, AgentError> {
        self.transition(LifecycleEvent::Activate)?;

        let mut deleted = Vec::new();
        for name in self.bucket.store().keys().await? {
            if name == self.config.version {
                continue;
            }
            match self.bucket.store().delete(&name).await {
                Ok(true) => {
                    info!("Deleted stale bucket {}", name);
                    deleted.push(name);
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to delete stale bucket {}: {}", name, e),
            }
        }

        Ok(ActivateCompletion {
            version: self.config.version.clone(),
            deleted,
            claim_clients: true,
        })
    }

    /// Mark this instance as replaced by a newer version.
    pub fn supersede(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleEvent::Supersede)?;
        info!("Agent {} is now redundant", self.version());
        Ok(())
    }

    /// Only same-origin (unless disabled) http(s) GETs are handled.
    pub fn handles(&self, request: &Request) -> bool {
        if !request.is_get() {
            return false;
        }
        if !matches!(request.url.scheme(), "http" | "https") {
            return false;
        }
        !self.config.filter_origin || self.config.is_same_origin(&request.url)
    }

    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn intercept(
        &self,
        request: &Request,
    ) -> Result<Interception, AgentError> {
        let state = self.state()?;
        if state != AgentState::Active {
            return Err(LifecycleError::NotActive(state).into());
        }

        if !self.handles(request) {
            debug!("Passing through");
            return Ok(Interception::Passthrough);
        }

        let (response, write) = match self.config.policy {
            Policy::NetworkFirst => self.network_first(request).await?,
            Policy::CacheFirst => self.cache_first(request).await?,
        };
        Ok(Interception::Respond { response, write })
    }

    async fn network_first(
        &self,
        request: &Request,
    ) -> Result<(Response, Option<CacheWrite>), AgentError> {
        match self.network.fetch(request).await {
            Ok(fetched) => {
                let (response, snapshot) = fetched.split();
                let write = self.store_in_background(request.key(), snapshot);
                Ok((response, write))
            }
            Err(e) => {
                debug!("Network failed ({}), trying bucket", e);
                if let Some(snapshot) = self.lookup(&request.key()).await {
                    return Ok((
                        Response::from_snapshot(snapshot, ResponseSource::Cache),
                        None,
                    ));
                }
                Ok((self.fallback(request, e).await?, None))
            }
        }
    }

    async fn cache_first(
        &self,
        request: &Request,
    ) -> Result<(Response, Option<CacheWrite>), AgentError> {
        if let Some(snapshot) = self.lookup(&request.key()).await {
            debug!("Served from bucket");
            let response = Response::from_snapshot(snapshot, ResponseSource::Cache);
            return Ok((response, None));
        }

        match self.network.fetch(request).await {
            Ok(fetched) => {
                let (response, snapshot) = fetched.split();
                let write = self.store_in_background(request.key(), snapshot);
                Ok((response, write))
            }
            Err(e) => {
                debug!("Network failed ({}) on a bucket miss", e);
                Ok((self.fallback(request, e).await?, None))
            }
        }
    }

    /// Serve the fallback document, or give up with the network error.
    async fn fallback(
        &self,
        request: &Request,
        source: NetworkError,
    ) -> Result<Response, AgentError> {
        let unavailable = |source| AgentError::Unavailable {
            url: request.url.to_string(),
            source,
        };

        let Some(url) = self.config.fallback_url()? else {
            return Err(unavailable(source));
        };
        match self.lookup(&RequestKey::get(&url)).await {
            Some(snapshot) => {
                info!("Serving fallback {} for {}", url, request.url);
                Ok(Response::from_snapshot(snapshot, ResponseSource::Fallback))
            }
            None => {
                warn!("Fallback {} is not in bucket {}", url, self.version());
                Err(unavailable(source))
            }
        }
    }

    /// Bucket read errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<Snapshot> {
        match self.bucket.lookup(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    "Bucket {} lookup failed for {}: {}",
                    self.version(),
                    key,
                    e
                );
                None
            }
        }
    }

    /// Fire-and-forget store. Failures are logged, never surfaced.
    ///
    /// Responses that cannot stand in for a plain GET are not stored at all.
    fn store_in_background(
        &self,
        key: RequestKey,
        snapshot: Snapshot,
    ) -> Option<CacheWrite> {
        if !snapshot.is_storable() {
            debug!("Not storing {} (status {})", key, snapshot.status);
            return None;
        }

        let bucket = self.bucket.clone();
        Some(CacheWrite(tokio::spawn(async move {
            match bucket.put(&key, snapshot).await {
                Ok(()) => {
                    debug!("Stored {} in {}", key, bucket.name());
                    true
                }
                Err(e) => {
                    warn!("Failed to store {} in {}: {}", key, bucket.name(), e);
                    false
                }
            }
        })))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("version", &self.config.version)
            .field("policy", &self.config.policy)
            .field("bucket", &self.bucket)
            .finish()
    }
}
