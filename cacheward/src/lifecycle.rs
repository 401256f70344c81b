//! Per-agent lifecycle state machine.
//!
//! ```text
//! Unregistered -> Installing -> WaitingToActivate -> Active -> Redundant
//!                     |
//!                     +-- install failed --> Unregistered
//! ```
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Unregistered,
    Installing,
    WaitingToActivate,
    Active,
    Redundant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Installed,
    InstallFailed,
    Activate,
    Supersede,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Cannot apply {event:?} while {state:?}")]
    InvalidTransition {
        state: AgentState,
        event: LifecycleEvent,
    },
    #[error("Agent is not active (state: {0:?})")]
    NotActive(AgentState),
    #[error("Lifecycle lock poisoned: {0}")]
    Poisoned(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    state: AgentState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AgentState::Unregistered,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn apply(
        &mut self,
        event: LifecycleEvent,
    ) -> Result<AgentState, LifecycleError> {
        use AgentState::*;
        use LifecycleEvent::*;

        let next = match (self.state, event) {
            (Unregistered, Install) => Installing,
            (Installing, Installed) => WaitingToActivate,
            (Installing, InstallFailed) => Unregistered,
            (WaitingToActivate, Activate) => Active,
            (WaitingToActivate | Active, Supersede) => Redundant,
            (state, event) => {
                return Err(LifecycleError::InvalidTransition { state, event });
            }
        };
        self.state = next;
        Ok(next)
    }
}
