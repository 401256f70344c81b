//! Versioned response storage for cacheward.
//!
//! A store holds named buckets, one per agent version, each mapping a
//! request key (method + URL) to an immutable response [`Snapshot`].
//! Access goes through the [`BucketStore`] trait so backends are pluggable.
//!
//! Currently supported backends:
//! - In-memory
//! - Fjall, persistent on local disk (with the "fjall" feature, on by default)

pub mod backend;
mod bucket;
mod error;
mod key;
mod snapshot;

#[cfg(feature = "fjall")]
pub use backend::FjallBucketStore;
pub use backend::InMemoryBucketStore;
pub use bucket::{AbstractBucketStore, Bucket, BucketStore};
pub use error::CacheError;
pub use key::RequestKey;
pub use snapshot::Snapshot;

// Re-export
pub use url;
