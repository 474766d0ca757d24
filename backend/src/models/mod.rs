//! Domain models for the commute simulator

pub mod agent;
pub mod counts;
pub mod event;
pub mod mode;

// Re-exports
pub use agent::{
    AgentTraits, BehaviorConfig, ChoiceContext, ChoiceError, CommuterAgent, ModeShareTargets,
    ReferenceSnapshot,
};
pub use counts::{ModeCounts, ModeTransition};
pub use event::{Event, EventLog};
pub use mode::{PerGroup, PerMode, SocioGroup, TransportMode};
