use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Invalid bucket name: {0:?}")]
    InvalidBucketName(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Store lock poisoned: {0}")]
    Lock(String),

    #[cfg(feature = "fjall")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
}
