//! Transport Model Integration Tests
//!
//! Step-loop invariants over full runs:
//! - Counters account for every commuter
//! - Shares sum to 100 per non-empty group
//! - Congestion is exactly 1 without cars
//! - Habit streaks match the recorded choice history

use commute_simulator_core_rs::models::Event;
use commute_simulator_core_rs::orchestrator::{ModelConfig, SimulationError, TransportModel};
use commute_simulator_core_rs::{SocioGroup, TransportMode};

fn config(num_agents: usize, seed: u64) -> ModelConfig {
    ModelConfig {
        num_agents,
        rng_seed: seed,
        ..ModelConfig::default()
    }
}

fn run(config: ModelConfig, steps: usize) -> TransportModel {
    let mut model = TransportModel::new(config).expect("valid config");
    model.run(steps).expect("run succeeds");
    model
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_invalid_config_builds_no_model() {
    let mut bad = config(100, 1);
    bad.pricing.bus_fare = -1.0;

    assert!(matches!(
        TransportModel::new(bad),
        Err(SimulationError::InvalidConfig(_))
    ));
}

#[test]
fn test_infinite_bpr_alpha_builds_no_model() {
    let mut bad = config(50, 1);
    bad.congestion.bpr_alpha = f64::INFINITY;

    assert!(matches!(
        TransportModel::new(bad),
        Err(SimulationError::InvalidConfig(_))
    ));
}

#[test]
fn test_construction_logs_population_summary() {
    let model = TransportModel::new(config(1_000, 42)).unwrap();

    let started = model.event_log().events_of_type("SimulationStarted");
    match started.as_slice() {
        [Event::SimulationStarted {
            num_agents,
            car_owners,
            lower,
            middle,
            upper,
            ..
        }] => {
            assert_eq!(*num_agents, 1_000);
            assert_eq!(lower + middle + upper, 1_000);
            assert_eq!(*car_owners, model.car_owners());
        }
        other => panic!("expected one SimulationStarted event, got {:?}", other),
    }
}

#[test]
fn test_road_capacity_matches_initial_congestion() {
    let model = TransportModel::new(config(2_000, 42)).unwrap();

    // Half the population driving reproduces the initial congestion level
    let v_over_c = 1_000.0 / model.road_capacity();
    let level = 1.0 + 0.15 * v_over_c.powi(4);
    assert!((level - 1.3).abs() < 1e-9);
}

// ============================================================================
// Step Invariants
// ============================================================================

#[test]
fn test_counts_sum_to_population_every_step() {
    let mut model = TransportModel::new(config(800, 3)).unwrap();

    for _ in 0..10 {
        let result = model.step().unwrap();
        let total: usize = result.mode_totals.iter().map(|(_, n)| *n).sum();
        assert_eq!(total, 800);

        for group in SocioGroup::ALL {
            assert_eq!(
                model.mode_counts().group_population(group),
                model.group_size(group)
            );
        }
    }
}

#[test]
fn test_counts_match_agent_choices() {
    let model = run(config(600, 9), 6);

    for mode in TransportMode::ALL {
        let chosen = model
            .agents()
            .iter()
            .filter(|a| a.mode_choice() == Some(mode))
            .count();
        assert_eq!(model.mode_counts().total(mode), chosen);
    }
}

#[test]
fn test_group_shares_sum_to_hundred() {
    let model = run(config(1_000, 5), 4);
    let shares = model.mode_shares();

    let overall: f64 = TransportMode::ALL.iter().map(|&m| shares.overall(m)).sum();
    assert!((overall - 100.0).abs() < 1e-9);

    for group in SocioGroup::ALL {
        if model.group_size(group) == 0 {
            continue;
        }
        let total: f64 = TransportMode::ALL.iter().map(|&m| shares.group(m, group)).sum();
        assert!((total - 100.0).abs() < 1e-9, "{} shares sum to {}", group, total);
    }
}

#[test]
fn test_empty_group_reports_zero_and_logs_guard() {
    // Lower threshold 30k sits below the Pareto minimum (~41.7k)
    let mut cfg = config(500, 17);
    cfg.population.lower_income_ratio = 0.5;
    let mut model = TransportModel::new(cfg).unwrap();
    assert_eq!(model.group_size(SocioGroup::Lower), 0);

    model.step().unwrap();

    for mode in TransportMode::ALL {
        assert_eq!(model.mode_shares().group(mode, SocioGroup::Lower), 0.0);
    }
    let guards = model.event_log().events_of_type("MetricGuarded");
    assert!(guards.iter().any(|e| matches!(
        e,
        Event::MetricGuarded { step: 1, metric, .. } if metric == "share_pct_lower"
    )));
}

#[test]
fn test_congestion_is_one_without_cars() {
    // Ownership probability underflows to zero for every income
    let mut cfg = config(500, 23);
    cfg.population.car_ownership.intercept = 1_000.0;
    cfg.population.car_ownership.income_slope = 0.0;
    let mut model = TransportModel::new(cfg).unwrap();
    assert_eq!(model.car_owners(), 0);

    for _ in 0..5 {
        let result = model.step().unwrap();
        assert_eq!(result.mode_totals[TransportMode::Car], 0);
        assert_eq!(result.congestion_level, 1.0);
    }
    assert_eq!(model.ledger().congestion.total, 0.0);
}

#[test]
fn test_congestion_above_one_with_cars() {
    let mut model = TransportModel::new(config(1_000, 29)).unwrap();

    for _ in 0..5 {
        let result = model.step().unwrap();
        assert!(result.mode_totals[TransportMode::Car] > 0);
        assert!(result.congestion_level > 1.0);
    }
}

#[test]
fn test_non_owners_never_drive_in_model() {
    let mut model = TransportModel::new(config(1_000, 31)).unwrap();

    for _ in 0..8 {
        model.step().unwrap();
        assert!(model
            .agents()
            .iter()
            .filter(|a| !a.car_owner())
            .all(|a| a.mode_choice() != Some(TransportMode::Car)));
    }
}

#[test]
fn test_streak_matches_choice_history() {
    let model = run(config(300, 37), 12);
    let records = model.metrics().agent_records();
    assert_eq!(records.len(), 12);

    for agent in model.agents() {
        let trailing_car_steps = records
            .iter()
            .rev()
            .take_while(|r| r.mode_choice[agent.id()] == Some(TransportMode::Car))
            .count();
        assert_eq!(agent.car_habit_streak() as usize, trailing_car_steps);
    }
}

// ============================================================================
// Metrics
// ============================================================================

#[test]
fn test_one_record_per_step() {
    let model = run(config(200, 41), 7);

    assert_eq!(model.metrics().len(), 7);
    let steps: Vec<usize> = model.metrics().model_records().iter().map(|m| m.step).collect();
    assert_eq!(steps, (1..=7).collect::<Vec<_>>());
    assert_eq!(model.event_log().events_of_type("StepCompleted").len(), 7);
}

#[test]
fn test_agent_records_can_be_disabled() {
    let mut cfg = config(200, 43);
    cfg.collect_agent_choices = false;
    let model = run(cfg, 3);

    assert_eq!(model.metrics().len(), 3);
    assert!(model.metrics().agent_records().is_empty());
}

#[test]
fn test_ghg_sum_accumulates_step_emissions() {
    let model = run(config(500, 47), 10);

    let per_step: f64 = model.metrics().series(|m| m.total_ghg).iter().sum();
    assert!((model.total_ghg_sum() - per_step).abs() < 1e-6 * per_step.max(1.0));

    let sums = model.metrics().series(|m| m.total_ghg_sum);
    assert!(sums.windows(2).all(|w| w[1] >= w[0]));
}
