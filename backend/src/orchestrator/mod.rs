//! Orchestrator - main simulation loop
//!
//! Implements the complete step loop integrating all simulation components.
//!
//! See `engine.rs` for full implementation.

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod metrics;

// Re-export main types for convenience
pub use config::{ModelConfig, PolicyConfig, PricingConfig};
pub use engine::{SimulationError, StepResult, TransportModel};
pub use metrics::{AgentChoices, MetricsCollector, ModeShares, ModelMetrics};

// Re-export checkpoint types
pub use checkpoint::{AgentSnapshot, StateSnapshot};
