use crate::{CacheError, RequestKey, Snapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Named collection of buckets. Backends must implement this.
///
/// Operations addressing a bucket by name fail with
/// [`CacheError::BucketNotFound`] unless the bucket was opened first.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Open a bucket, creating it empty if it does not exist
    async fn open(&self, bucket: &str) -> Result<(), CacheError>;

    /// Check whether a bucket exists
    async fn has(&self, bucket: &str) -> Result<bool, CacheError>;

    /// Names of all existing buckets
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Remove a bucket and everything in it. Returns `false` if it was absent.
    async fn delete(&self, bucket: &str) -> Result<bool, CacheError>;

    /// Look up a stored snapshot
    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<Snapshot>, CacheError>;

    /// Store a snapshot, replacing any previous one under the same key
    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        snapshot: Snapshot,
    ) -> Result<(), CacheError>;

    /// Store a batch of snapshots. Either all of them become visible or none.
    async fn put_all(
        &self,
        bucket: &str,
        entries: Vec<(RequestKey, Snapshot)>,
    ) -> Result<(), CacheError>;

    /// Keys stored in a bucket
    async fn entries(&self, bucket: &str) -> Result<Vec<RequestKey>, CacheError>;
}

pub type AbstractBucketStore = Arc<dyn BucketStore>;

/// Handle to one named bucket inside a store.
#[derive(Clone)]
pub struct Bucket {
    name: String,
    store: AbstractBucketStore,
}

impl Bucket {
    pub fn new(name: impl Into<String>, store: AbstractBucketStore) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &AbstractBucketStore {
        &self.store
    }

    pub async fn open(&self) -> Result<(), CacheError> {
        self.store.open(&self.name).await
    }

    /// Lookup that treats a missing bucket as a miss.
    pub async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<Snapshot>, CacheError> {
        match self.store.get(&self.name, key).await {
            Err(CacheError::BucketNotFound(_)) => Ok(None),
            other => other,
        }
    }

    /// Store one snapshot. Never recreates a deleted bucket.
    pub async fn put(
        &self,
        key: &RequestKey,
        snapshot: Snapshot,
    ) -> Result<(), CacheError> {
        self.store.put(&self.name, key, snapshot).await
    }

    /// Open the bucket if needed and store a whole batch atomically.
    pub async fn store_all(
        &self,
        entries: Vec<(RequestKey, Snapshot)>,
    ) -> Result<(), CacheError> {
        self.open().await?;
        self.store.put_all(&self.name, entries).await
    }

    /// Stored keys; empty when the bucket is gone.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, CacheError> {
        match self.store.entries(&self.name).await {
            Err(CacheError::BucketNotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket").field("name", &self.name).finish()
    }
}
