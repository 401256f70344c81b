//! In-memory implementation of the BucketStore trait. Buckets keep their
//! creation order, entries inside a bucket keep insertion order.
use crate::{BucketStore, CacheError, RequestKey, Snapshot};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Mutex;

type Entries = IndexMap<RequestKey, Snapshot>;

#[derive(Default)]
pub struct InMemoryBucketStore {
    pub buckets: Mutex<IndexMap<String, Entries>>,
}

impl InMemoryBucketStore {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(IndexMap::new()),
        }
    }
}

#[async_trait]
impl BucketStore for InMemoryBucketStore {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn has(&self, bucket: &str) -> Result<bool, CacheError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        Ok(buckets.contains_key(bucket))
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        Ok(buckets.keys().cloned().collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        Ok(buckets.shift_remove(bucket).is_some())
    }

    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<Snapshot>, CacheError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        let entries = buckets
            .get(bucket)
            .ok_or_else(|| CacheError::BucketNotFound(bucket.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        snapshot: Snapshot,
    ) -> Result<(), CacheError> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        let entries = buckets
            .get_mut(bucket)
            .ok_or_else(|| CacheError::BucketNotFound(bucket.to_string()))?;
        entries.insert(key.clone(), snapshot);
        Ok(())
    }

    async fn put_all(
        &self,
        bucket: &str,
        entries: Vec<(RequestKey, Snapshot)>,
    ) -> Result<(), CacheError> {
        // Single lock for the whole batch, readers never see half of it.
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        let stored = buckets
            .get_mut(bucket)
            .ok_or_else(|| CacheError::BucketNotFound(bucket.to_string()))?;
        stored.extend(entries);
        Ok(())
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<RequestKey>, CacheError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))?;
        let entries = buckets
            .get(bucket)
            .ok_or_else(|| CacheError::BucketNotFound(bucket.to_string()))?;
        Ok(entries.keys().cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("InMemoryBucketStore");
        if let Ok(buckets) = self.buckets.lock() {
            debug.field("buckets", &buckets.keys().collect::<Vec<_>>());
        }
        debug.finish()
    }
}
