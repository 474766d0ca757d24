//! Checkpoint Tests - Save/Load Simulation State
//!
//! Critical invariants tested:
//! - Determinism: Restored simulation produces identical results
//! - Config matching: Reject state from different config
//! - Integrity: Reject tampered snapshots

use commute_simulator_core_rs::orchestrator::{
    ModelConfig, SimulationError, StateSnapshot, TransportModel,
};
use commute_simulator_core_rs::TransportMode;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config() -> ModelConfig {
    let mut config = ModelConfig {
        num_agents: 400,
        rng_seed: 12345,
        ..ModelConfig::default()
    };
    config.policy.new_car_toll = 5.0;
    config.policy.new_fare_discount = 0.5;
    config.policy.policy_step = 6;
    config
}

fn model_after(steps: usize) -> TransportModel {
    let mut model = TransportModel::new(test_config()).expect("Failed to create test model");
    model.run(steps).expect("run succeeds");
    model
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_save_load_preserves_state() {
    let original = model_after(4);
    let json = original.save_state().unwrap();
    let restored = TransportModel::load_state(test_config(), &json).unwrap();

    assert_eq!(restored.current_step(), 4);
    assert_eq!(restored.agents(), original.agents());
    assert_eq!(restored.mode_counts(), original.mode_counts());
    assert_eq!(restored.congestion_level(), original.congestion_level());
    assert_eq!(restored.total_ghg_sum(), original.total_ghg_sum());
    assert_eq!(restored.metrics(), original.metrics());
    assert_eq!(restored.event_log(), original.event_log());
}

#[test]
fn test_restored_model_continues_identically() {
    // Checkpoint straddles the policy step
    let mut original = model_after(4);
    let json = original.save_state().unwrap();
    let mut restored = TransportModel::load_state(test_config(), &json).unwrap();

    for _ in 0..6 {
        let a = original.step().unwrap();
        let b = restored.step().unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(original.agents(), restored.agents());
    assert!(restored.policy_applied());
    assert!((restored.car_toll() - 14.2).abs() < 1e-12);
}

#[test]
fn test_save_before_first_step() {
    let model = TransportModel::new(test_config()).unwrap();
    let json = model.save_state().unwrap();
    let mut restored = TransportModel::load_state(test_config(), &json).unwrap();

    assert_eq!(restored.current_step(), 0);
    assert!(restored.agents().iter().all(|a| a.mode_choice().is_none()));
    assert_eq!(restored.step().unwrap().step, 1);
}

// ============================================================================
// Rejection
// ============================================================================

#[test]
fn test_load_rejects_different_config() {
    let json = model_after(2).save_state().unwrap();

    let mut other = test_config();
    other.pricing.train_fare = 7.0;

    assert!(matches!(
        TransportModel::load_state(other, &json),
        Err(SimulationError::StateValidationError(_))
    ));
}

#[test]
fn test_load_rejects_malformed_json() {
    assert!(matches!(
        TransportModel::load_state(test_config(), "{\"current_step\": 3"),
        Err(SimulationError::SerializationError(_))
    ));
}

#[test]
fn test_load_rejects_car_choice_without_car() {
    let model = model_after(3);
    let mut snapshot: StateSnapshot = model.snapshot().unwrap();

    let non_owner = snapshot
        .agents
        .iter_mut()
        .find(|a| !a.traits.car_owner)
        .expect("population has non-owners");
    non_owner.mode_choice = Some(TransportMode::Car);
    non_owner.car_habit_streak = 1;

    assert!(matches!(
        TransportModel::from_snapshot(test_config(), snapshot),
        Err(SimulationError::StateValidationError(_))
    ));
}

#[test]
fn test_load_rejects_inconsistent_streak() {
    let model = model_after(3);
    let mut snapshot = model.snapshot().unwrap();

    let walker = snapshot
        .agents
        .iter_mut()
        .find(|a| a.mode_choice != Some(TransportMode::Car))
        .expect("someone did not drive");
    walker.car_habit_streak = 2;

    assert!(TransportModel::from_snapshot(test_config(), snapshot).is_err());
}

#[test]
fn test_load_rejects_missing_agents() {
    let model = model_after(1);
    let mut snapshot = model.snapshot().unwrap();
    snapshot.agents.pop();

    assert!(matches!(
        TransportModel::from_snapshot(test_config(), snapshot),
        Err(SimulationError::StateValidationError(_))
    ));
}
