use std::{path::Path, sync::Mutex};

use async_trait::async_trait;
use fjall::{
    Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode,
};
use tracing::{debug, info};

use crate::{BucketStore, CacheError, RequestKey, Snapshot};

/// Fjall-backed bucket store (default persistent backend).
///
/// Layout: one partition per bucket, `request key -> json snapshot`.
pub struct FjallBucketStore {
    db: Keyspace,
    // Serialize open/delete/put to keep partition bookkeeping simple.
    lock: Mutex<()>,
}

impl FjallBucketStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let keyspace = Config::new(path).open()?;
        info!("Opened bucket store with {} bucket(s)", keyspace.partition_count());
        Ok(Self {
            db: keyspace,
            lock: Mutex::new(()),
        })
    }

    /// Partition names are restricted to `[A-Za-z0-9_.#$-]{1,255}`.
    pub fn validate_name(bucket: &str) -> Result<(), CacheError> {
        let valid = !bucket.is_empty()
            && bucket.len() <= 255
            && bucket.chars().all(|c| {
                c.is_ascii_alphanumeric()
                    || matches!(c, '_' | '-' | '.' | '#' | '$')
            });
        if valid {
            Ok(())
        } else {
            Err(CacheError::InvalidBucketName(bucket.to_string()))
        }
    }

    fn partition(&self, bucket: &str) -> Result<PartitionHandle, CacheError> {
        Self::validate_name(bucket)?;
        if !self.db.partition_exists(bucket) {
            return Err(CacheError::BucketNotFound(bucket.to_string()));
        }
        Ok(self
            .db
            .open_partition(bucket, PartitionCreateOptions::default())?)
    }

    fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(snapshot)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Snapshot, CacheError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, CacheError> {
        self.lock.lock().map_err(|e| CacheError::Lock(e.to_string()))
    }
}

#[async_trait]
impl BucketStore for FjallBucketStore {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        Self::validate_name(bucket)?;
        let _guard = self.guard()?;
        if !self.db.partition_exists(bucket) {
            debug!("Creating bucket {}", bucket);
        }
        self.db
            .open_partition(bucket, PartitionCreateOptions::default())?;
        Ok(())
    }

    async fn has(&self, bucket: &str) -> Result<bool, CacheError> {
        Self::validate_name(bucket)?;
        Ok(self.db.partition_exists(bucket))
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names: Vec<String> = self
            .db
            .list_partitions()
            .iter()
            .map(|name| (**name).to_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        let _guard = self.guard()?;
        let partition = match self.partition(bucket) {
            Ok(partition) => partition,
            Err(CacheError::BucketNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        self.db.delete_partition(partition)?;
        Ok(true)
    }

    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<Snapshot>, CacheError> {
        let partition = self.partition(bucket)?;
        match partition.get(key.as_str())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        snapshot: Snapshot,
    ) -> Result<(), CacheError> {
        let _guard = self.guard()?;
        let partition = self.partition(bucket)?;
        partition.insert(key.as_str(), Self::encode(&snapshot)?)?;

        // Best-effort sync to disk for durability.
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn put_all(
        &self,
        bucket: &str,
        entries: Vec<(RequestKey, Snapshot)>,
    ) -> Result<(), CacheError> {
        let _guard = self.guard()?;
        let partition = self.partition(bucket)?;

        let mut batch = self.db.batch();
        for (key, snapshot) in &entries {
            batch.insert(&partition, key.as_str(), Self::encode(snapshot)?);
        }
        batch.commit()?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<RequestKey>, CacheError> {
        let partition = self.partition(bucket)?;
        let mut keys = Vec::new();
        for key in partition.keys() {
            let key = key?;
            let raw = String::from_utf8(key.to_vec())
                .map_err(|e| CacheError::Deserialization(e.to_string()))?;
            keys.push(RequestKey::from_stored(raw));
        }
        Ok(keys)
    }
}

impl std::fmt::Debug for FjallBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FjallBucketStore").finish()
    }
}
