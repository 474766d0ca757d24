//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete model state
//! for pause/resume functionality.
//!
//! # Critical Invariants
//!
//! - **Determinism**: A restored model continues exactly like the original
//! - **Population Integrity**: Agent ids are `0..num_agents` with no gaps
//! - **Choice Consistency**: Non-owners never hold a car choice; the habit
//!   streak is positive exactly when the current choice is car
//! - **Config Matching**: State can only be loaded with matching config

use crate::costs::CostLedger;
use crate::models::agent::{AgentTraits, CommuterAgent, ReferenceSnapshot};
use crate::models::event::EventLog;
use crate::models::mode::{PerMode, TransportMode};
use crate::orchestrator::metrics::{MetricsCollector, ModeShares};
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete model state snapshot
///
/// This structure captures all state necessary to resume a simulation
/// from an arbitrary step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Steps executed so far
    pub current_step: usize,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// All agent states, ordered by id
    pub agents: Vec<AgentSnapshot>,

    pub congestion_level: f64,
    pub v_over_c: f64,

    pub car_toll: f64,
    pub fare_discount: f64,
    pub new_car_toll: f64,
    pub new_fare_discount: f64,
    pub policy_applied: bool,

    pub shares: ModeShares,
    pub ledger: CostLedger,
    pub total_ghg_sum: f64,

    pub event_log: EventLog,
    pub metrics: MetricsCollector,

    /// SHA256 hash of original config (for validation)
    pub config_hash: String,
}

/// Agent state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: usize,
    pub traits: AgentTraits,
    pub value_of_time: f64,
    pub price_sensitivity: f64,
    pub reference: ReferenceSnapshot,
    pub utility_constants: PerMode<f64>,
    pub mode_choice: Option<TransportMode>,
    pub car_habit_streak: u32,
}

impl From<&CommuterAgent> for AgentSnapshot {
    fn from(agent: &CommuterAgent) -> Self {
        AgentSnapshot {
            id: agent.id(),
            traits: *agent.traits(),
            value_of_time: agent.value_of_time(),
            price_sensitivity: agent.price_sensitivity(),
            reference: *agent.reference(),
            utility_constants: *agent.utility_constants(),
            mode_choice: agent.mode_choice(),
            car_habit_streak: agent.car_habit_streak(),
        }
    }
}

impl From<AgentSnapshot> for CommuterAgent {
    fn from(snapshot: AgentSnapshot) -> Self {
        CommuterAgent::from_snapshot(
            snapshot.id,
            snapshot.traits,
            snapshot.value_of_time,
            snapshot.price_sensitivity,
            snapshot.reference,
            snapshot.utility_constants,
            snapshot.mode_choice,
            snapshot.car_habit_streak,
        )
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate state snapshot integrity
///
/// Checks:
/// - Population size and id ordering
/// - Every agent has chosen iff at least one step ran
/// - Car choices only for owners, habit streak consistent with the choice
/// - Accumulators are finite
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    expected_agents: usize,
) -> Result<(), SimulationError> {
    let invalid = SimulationError::StateValidationError;

    // 1. Population integrity
    if snapshot.agents.len() != expected_agents {
        return Err(invalid(format!(
            "Expected {} agents, snapshot has {}",
            expected_agents,
            snapshot.agents.len()
        )));
    }
    if let Some((idx, agent)) = snapshot
        .agents
        .iter()
        .enumerate()
        .find(|(idx, agent)| agent.id != *idx)
    {
        return Err(invalid(format!(
            "Agent at position {} has id {}",
            idx, agent.id
        )));
    }

    // 2. Choice consistency
    let stepped = snapshot.current_step > 0;
    for agent in &snapshot.agents {
        if agent.mode_choice.is_some() != stepped {
            return Err(invalid(format!(
                "Agent {} choice {:?} inconsistent with step {}",
                agent.id, agent.mode_choice, snapshot.current_step
            )));
        }
        let drives = agent.mode_choice == Some(TransportMode::Car);
        if drives && !agent.traits.car_owner {
            return Err(invalid(format!(
                "Agent {} chose car without owning one",
                agent.id
            )));
        }
        if drives != (agent.car_habit_streak > 0) {
            return Err(invalid(format!(
                "Agent {} has car habit streak {} with choice {:?}",
                agent.id, agent.car_habit_streak, agent.mode_choice
            )));
        }
    }

    // 3. Accumulators
    if !snapshot.total_ghg_sum.is_finite() || snapshot.total_ghg_sum < 0.0 {
        return Err(invalid(format!(
            "total_ghg_sum must be finite and non-negative, got {}",
            snapshot.total_ghg_sum
        )));
    }
    if !snapshot.congestion_level.is_finite() || snapshot.congestion_level < 1.0 {
        return Err(invalid(format!(
            "congestion_level must be at least 1, got {}",
            snapshot.congestion_level
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_config_hash_deterministic() {
        #[derive(Serialize)]
        struct Pricing {
            bus_fare: f64,
            train_fare: f64,
        }

        let a = Pricing {
            bus_fare: 4.0,
            train_fare: 6.0,
        };
        let b = Pricing {
            bus_fare: 4.0,
            train_fare: 6.0,
        };

        assert_eq!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_compute_config_hash_different_for_different_configs() {
        #[derive(Serialize)]
        struct Seeded {
            rng_seed: u64,
        }

        assert_ne!(
            compute_config_hash(&Seeded { rng_seed: 42 }).unwrap(),
            compute_config_hash(&Seeded { rng_seed: 43 }).unwrap()
        );
    }
}
