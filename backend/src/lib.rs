//! Commute Simulator Core - Rust Engine
//!
//! Agent-based commuter mode-choice simulation with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Step clock
//! - **models**: Domain types (modes, groups, agents, counters, events)
//! - **population**: Income calibration and commuter trait sampling
//! - **costs**: Congestion, emission and finance accounting
//! - **orchestrator**: Configuration, main simulation loop, metrics, checkpoints
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Mode counters always sum to the population after a step
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Agents report transitions; only the model mutates aggregate state

// Module declarations
pub mod core;
pub mod costs;
pub mod models;
pub mod orchestrator;
pub mod population;
pub mod rng;

// Re-exports for convenience
pub use core::time::StepClock;
pub use costs::{CostLedger, CostRates};
pub use models::{
    agent::{AgentTraits, ChoiceError, CommuterAgent},
    counts::{ModeCounts, ModeTransition},
    event::{Event, EventLog},
    mode::{PerGroup, PerMode, SocioGroup, TransportMode},
};
pub use orchestrator::{
    MetricsCollector, ModelConfig, ModelMetrics, SimulationError, StepResult, TransportModel,
};
pub use population::{CalibrationError, IncomeSampler};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn commute_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::model::PyTransportModel>()?;
    Ok(())
}
