//! Install an agent from a yaml file and fetch a few urls through it.
//!
//! cargo run --example offline -- demos/cacheward.yml \
//!     https://flash.example.com/index.html
use std::sync::Arc;

use cacheward::{
    cache::{FjallBucketStore, InMemoryBucketStore},
    config::Configurable,
    observability, tracing, Agent, HttpNetwork, Registration, Request,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .unwrap_or_else(|| "demos/cacheward.yml".to_string());
    let settings = cacheward::Settings::load(&config_path)?;
    observability::init_logging(settings.log_filter().unwrap_or("info"));

    let agent_config = settings.agent()?;
    tracing::info!(
        "Agent {} ({}), {} manifest entries, policy from `{}`: {:?}",
        agent_config.version,
        agent_config.policy,
        agent_config.manifest.len(),
        config_path,
        settings.get_config_value("agent.policy"),
    );

    let network = Arc::new(HttpNetwork::from_params(&settings.http()?)?);
    let store: cacheward::cache::AbstractBucketStore = match settings.store_path() {
        Some(path) => Arc::new(FjallBucketStore::open(path)?),
        None => Arc::new(InMemoryBucketStore::new()),
    };

    let registration = Registration::new(network.clone());
    let agent = Agent::new(agent_config, store, network)?;
    if let Err(e) = registration.register(agent).await {
        tracing::error!("Install failed, nothing to serve offline: {}", e);
    }

    for url in args {
        match registration.dispatch(&Request::parse_get(&url)?).await {
            Ok(response) => tracing::info!(
                "{} -> {} from {:?} ({} bytes)",
                url,
                response.status,
                response.source,
                response.body.len()
            ),
            Err(e) => tracing::warn!("{} -> {}", url, e),
        }
    }

    Ok(())
}
