//! # cacheward - offline cache agent for static web applications
//!
//! `cacheward` sits between an application and the network. It pre-fetches a
//! fixed manifest into a versioned bucket, purges buckets of older versions
//! when it takes over, and answers intercepted requests from the network or
//! the bucket according to a configured policy.
//!
//! ## Features
//!
//! - **Versioned buckets**: bumping the version is all it takes to force a
//!   full refresh on the next deployment.
//! - **All-or-nothing install**: a manifest entry that fails to load keeps the
//!   new version from ever activating; the previous one keeps serving.
//! - **Network-first and cache-first policies**, with an optional fallback
//!   document when neither network nor bucket can answer.
//! - **Origin filtering**: non-GET and cross-origin requests pass through
//!   untouched.
//! - **Pluggable storage**: in-memory and fjall (on disk) bucket stores.
//!
//! ## Modules
//!
//! - `agent`: install/activate/intercept handlers.
//! - `registration`: host side of the lifecycle, routes requests.
//! - `lifecycle`: per-agent state machine.
//! - `network`: the `Network` trait and its reqwest implementation.
//! - `request`: request/response values and the network-to-snapshot split.
//! - `settings`: yaml settings for the whole application.
pub mod agent;
pub mod error;
pub mod lifecycle;
pub mod network;
pub mod observability;
pub mod registration;
pub mod request;
pub mod settings;

pub use agent::{
    ActivateCompletion, Agent, CacheWrite, InstallCompletion, Interception,
};
pub use error::AgentError;
pub use lifecycle::{AgentState, Lifecycle, LifecycleError, LifecycleEvent};
#[cfg(feature = "http")]
pub use network::HttpNetwork;
pub use network::{AbstractNetwork, Network, NetworkError};
pub use registration::Registration;
pub use request::{Fetched, Request, Response, ResponseSource};
pub use settings::Settings;

pub use cacheward_cache as cache;
pub use cacheward_config as config;
// re-export
pub use async_trait;
#[cfg(feature = "http")]
pub use reqwest;
pub use tracing;
pub use tracing_subscriber;
pub use url;
