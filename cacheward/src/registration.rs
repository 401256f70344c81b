//! Host side of the agent lifecycle.
//!
//! A registration holds at most one active agent, which answers intercepted
//! requests, and at most one installed agent waiting to take over.
use crate::agent::Agent;
use crate::error::AgentError;
use crate::lifecycle::LifecycleError;
use crate::network::AbstractNetwork;
use crate::request::{Request, Response};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct Registration {
    network: AbstractNetwork,
    active: RwLock<Option<Arc<Agent>>>,
    waiting: RwLock<Option<Arc<Agent>>>,
    // One install/activate sequence at a time.
    updating: Mutex<()>,
}

impl Registration {
    pub fn new(network: AbstractNetwork) -> Self {
        Self {
            network,
            active: RwLock::new(None),
            waiting: RwLock::new(None),
            updating: Mutex::new(()),
        }
    }

    pub fn active(&self) -> Option<Arc<Agent>> {
        self.active.read().ok().and_then(|active| active.clone())
    }

    pub fn waiting(&self) -> Option<Arc<Agent>> {
        self.waiting.read().ok().and_then(|waiting| waiting.clone())
    }

    pub fn active_version(&self) -> Option<String> {
        self.active().map(|agent| agent.version().to_string())
    }

    /// Install a new agent. When install fails the current agent keeps
    /// serving and the error is returned. When the agent asks to skip
    /// waiting it is activated right away.
    pub async fn register(&self, agent: Agent) -> Result<Arc<Agent>, AgentError> {
        let _updating = self.updating.lock().await;
        let agent = Arc::new(agent);

        let completion = agent.install().await?;

        let replaced = self.swap_waiting(Some(Arc::clone(&agent)))?;
        if let Some(replaced) = replaced {
            replaced.supersede()?;
        }

        if completion.skip_waiting {
            self.promote().await?;
        } else {
            info!("Agent {} installed, waiting to activate", agent.version());
        }
        Ok(agent)
    }

    /// Activate the waiting agent, if any. Hosts call this once older
    /// sessions are gone. Returns the newly active agent.
    pub async fn activate_waiting(&self) -> Result<Option<Arc<Agent>>, AgentError> {
        let _updating = self.updating.lock().await;
        self.promote().await
    }

    async fn promote(&self) -> Result<Option<Arc<Agent>>, AgentError> {
        let Some(next) = self.swap_waiting(None)? else {
            return Ok(None);
        };

        // Previous agent keeps answering until activation has finished.
        match next.activate().await {
            Ok(completion) => {
                if completion.claim_clients {
                    info!(
                        "Agent {} active, claiming open sessions",
                        next.version()
                    );
                }
            }
            // The agent is in control regardless, the host only reports it.
            Err(e) => error!("Activation of {} failed: {}", next.version(), e),
        }

        let previous = {
            let mut active = self
                .active
                .write()
                .map_err(|e| LifecycleError::Poisoned(e.to_string()))?;
            active.replace(Arc::clone(&next))
        };
        if let Some(previous) = previous {
            previous.supersede()?;
        }
        Ok(Some(next))
    }

    fn swap_waiting(
        &self,
        agent: Option<Arc<Agent>>,
    ) -> Result<Option<Arc<Agent>>, LifecycleError> {
        let mut waiting = self
            .waiting
            .write()
            .map_err(|e| LifecycleError::Poisoned(e.to_string()))?;
        Ok(std::mem::replace(&mut *waiting, agent))
    }

    /// Route a request through the active agent, or straight to the network
    /// when there is none or the agent passes it through.
    ///
    /// A promotion can retire the agent between reading the active slot and
    /// intercepting. The slot is then read once more, and if it still holds
    /// no active agent the request goes to the network.
    pub async fn dispatch(
        &self,
        request: &Request,
    ) -> Result<Response, AgentError> {
        for _ in 0..2 {
            let Some(agent) = self.active() else {
                break;
            };
            match agent.intercept(request).await {
                Ok(interception) => match interception.into_parts() {
                    Some((response, _write)) => return Ok(response),
                    None => break,
                },
                Err(AgentError::Lifecycle(LifecycleError::NotActive(state))) => {
                    debug!(
                        "Agent {} is {:?}, looking again",
                        agent.version(),
                        state
                    );
                }
                Err(e) => return Err(e),
            }
        }

        match self.network.fetch(request).await {
            Ok(fetched) => Ok(fetched.passthrough()),
            Err(source) => {
                warn!("{} {} failed: {}", request.method, request.url, source);
                Err(AgentError::Unavailable {
                    url: request.url.to_string(),
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("active", &self.active_version())
            .field(
                "waiting",
                &self.waiting().map(|agent| agent.version().to_string()),
            )
            .finish()
    }
}
