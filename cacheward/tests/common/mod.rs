#![allow(dead_code)]
use async_trait::async_trait;
use cacheward::cache::{
    BucketStore, CacheError, InMemoryBucketStore, RequestKey, Snapshot,
};
use cacheward::config::{AgentConfig, AgentConfigBuilder, Policy};
use cacheward::{Agent, Fetched, Network, NetworkError, Request};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const ORIGIN: &str = "https://flash.example.com/";

pub const SHELL: [&str; 4] = ["./", "./index.html", "./app.js", "./icon-192.png"];

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

type Route = (u16, Vec<(String, String)>, String);

/// Scripted network: fixed routes, unknown urls answer 404. Requests with a
/// `Range` header get the partial route for their url, when there is one.
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Route>>,
    partial: Mutex<HashMap<String, String>>,
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Vec<u8>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            partial: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
            bodies: Mutex::new(Vec::new()),
        }
    }

    /// Network serving every shell entry with a body naming the version.
    pub fn with_shell(version: &str) -> Self {
        let network = Self::new();
        for path in SHELL {
            network.route(url(path).as_str(), 200, &format!("{version} {path}"));
        }
        network
    }

    pub fn route(&self, url: &str, status: u16, body: &str) {
        let headers = vec![("content-type".to_string(), "text/plain".to_string())];
        self.route_with_headers(url, status, headers, body);
    }

    pub fn route_with_headers(
        &self,
        url: &str,
        status: u16,
        headers: Vec<(String, String)>,
        body: &str,
    ) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, headers, body.to_string()));
    }

    /// Answer ranged requests for `url` with `206` and `body`.
    pub fn route_partial(&self, url: &str, body: &str) {
        self.partial
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Request bodies in the order they were received.
    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Fetched, NetworkError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));
        self.bodies.lock().unwrap().push(request.body.clone());

        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Offline);
        }

        let ranged = request
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("range"));
        let partial = self.partial.lock().unwrap();
        if let Some(body) = partial.get(request.url.as_str()).filter(|_| ranged) {
            return Ok(Fetched::new(
                206,
                vec![("content-range".to_string(), "bytes 0-3/*".to_string())],
                body.clone(),
            ));
        }
        drop(partial);

        let routes = self.routes.lock().unwrap();
        let (status, headers, body) = routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or((404, Vec::new(), "not found".to_string()));
        Ok(Fetched::new(status, headers, body))
    }
}

/// In-memory store that counts bucket reads and writes, and can be told to
/// fail writes.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryBucketStore,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BucketStore for CountingStore {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        self.inner.open(bucket).await
    }

    async fn has(&self, bucket: &str) -> Result<bool, CacheError> {
        self.inner.has(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        self.inner.delete(bucket).await
    }

    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<Snapshot>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(bucket, key).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        snapshot: Snapshot,
    ) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Lock("disk full".to_string()));
        }
        self.inner.put(bucket, key, snapshot).await
    }

    async fn put_all(
        &self,
        bucket: &str,
        entries: Vec<(RequestKey, Snapshot)>,
    ) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_all(bucket, entries).await
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<RequestKey>, CacheError> {
        self.inner.entries(bucket).await
    }
}

pub fn config(version: &str, policy: Policy) -> AgentConfigBuilder {
    let mut builder = AgentConfigBuilder::default();
    builder
        .version(version)
        .origin(Url::parse(ORIGIN).unwrap())
        .policy(policy);
    for path in SHELL {
        builder.entry(path);
    }
    builder
}

pub fn agent(
    config: AgentConfig,
    store: Arc<CountingStore>,
    network: Arc<MockNetwork>,
) -> Agent {
    Agent::new(config, store, network).unwrap()
}

/// Installed and activated agent.
pub async fn active_agent(
    config: AgentConfig,
    store: Arc<CountingStore>,
    network: Arc<MockNetwork>,
) -> Agent {
    let agent = agent(config, store, network);
    agent.install().await.unwrap();
    agent.activate().await.unwrap();
    agent
}
