//! Commuter Agent Tests
//!
//! Utility model, logit draw and the car-habit streak.

use commute_simulator_core_rs::models::agent::{
    choice_probabilities, choose_mode, commute_time, AgentTraits, BehaviorConfig, ChoiceContext,
    ChoiceError, CommuterAgent, ModeShareTargets,
};
use commute_simulator_core_rs::{PerMode, RngManager, SocioGroup, TransportMode};

// ============================================================================
// Test Helpers
// ============================================================================

const MEDIAN: f64 = 60_000.0;

fn reference_ctx() -> ChoiceContext {
    ChoiceContext {
        congestion_level: 1.3,
        costs: PerMode {
            car: 10.0 + 9.2,
            bus: 4.0,
            train: 6.0,
            bike_walk: 0.0,
        },
        median_income: MEDIAN,
    }
}

fn make_agent(income: f64, car_owner: bool) -> CommuterAgent {
    let socio_group = SocioGroup::classify(income, MEDIAN, 0.75, 2.0);
    let traits = AgentTraits {
        income,
        socio_group,
        car_owner,
        distance: 10.0,
        time_value: 0.5 * income / 2080.0,
    };
    let asc = ModeShareTargets::default().utility_constants(socio_group);
    CommuterAgent::new(0, traits, &BehaviorConfig::default(), &reference_ctx(), asc)
}

// ============================================================================
// Derived Parameters
// ============================================================================

#[test]
fn test_behavioral_weights_scale_with_income() {
    let median_earner = make_agent(MEDIAN, true);
    assert!((median_earner.value_of_time() - 1.0).abs() < 1e-12);
    assert!((median_earner.price_sensitivity() - 0.1).abs() < 1e-12);

    let rich = make_agent(2.0 * MEDIAN, true);
    assert!((rich.value_of_time() - 2.0).abs() < 1e-12);
    assert!((rich.price_sensitivity() - 0.05).abs() < 1e-12);
}

#[test]
fn test_reference_snapshot_captured_at_creation() {
    let agent = make_agent(MEDIAN, true);
    let reference = agent.reference();

    assert_eq!(reference.commute_cost, reference_ctx().costs);
    assert_eq!(
        reference.commute_time[TransportMode::Car],
        commute_time(10.0, TransportMode::Car, 1.3)
    );
    assert_eq!(
        reference.commute_time[TransportMode::BikeWalk],
        10.0 * 15.0 / 60.0
    );
}

#[test]
fn test_utility_constants_from_target_shares() {
    let asc = ModeShareTargets::default().utility_constants(SocioGroup::Lower);

    assert_eq!(asc[TransportMode::BikeWalk], 0.0);
    assert!((asc[TransportMode::Car] - (0.47f64 / 0.18).ln()).abs() < 1e-12);
    assert!((asc[TransportMode::Train] - (0.10f64 / 0.18).ln()).abs() < 1e-12);
}

// ============================================================================
// Utilities
// ============================================================================

#[test]
fn test_reference_conditions_give_constants_plus_habit() {
    let agent = make_agent(MEDIAN, true);
    let behavior = BehaviorConfig::default();
    let utilities = agent.calculate_utilities(&reference_ctx(), &behavior);

    for mode in [TransportMode::Bus, TransportMode::Train, TransportMode::BikeWalk] {
        assert!((utilities[mode] - agent.utility_constants()[mode]).abs() < 1e-12);
    }
    // streak 0: 1.5 − 0.5 × 1.0
    let expected_car = agent.utility_constants()[TransportMode::Car] + 1.0;
    assert!((utilities[TransportMode::Car] - expected_car).abs() < 1e-12);
}

#[test]
fn test_higher_congestion_lowers_road_modes_only() {
    let agent = make_agent(MEDIAN, true);
    let behavior = BehaviorConfig::default();
    let base = agent.calculate_utilities(&reference_ctx(), &behavior);

    let jammed = ChoiceContext {
        congestion_level: 2.0,
        ..reference_ctx()
    };
    let utilities = agent.calculate_utilities(&jammed, &behavior);

    assert!(utilities[TransportMode::Car] < base[TransportMode::Car]);
    assert!(utilities[TransportMode::Bus] < base[TransportMode::Bus]);
    assert_eq!(utilities[TransportMode::Train], base[TransportMode::Train]);
    assert_eq!(utilities[TransportMode::BikeWalk], base[TransportMode::BikeWalk]);
}

#[test]
fn test_fare_discount_raises_transit_utility() {
    let agent = make_agent(30_000.0, false);
    let behavior = BehaviorConfig::default();
    let base = agent.calculate_utilities(&reference_ctx(), &behavior);

    let mut discounted = reference_ctx();
    discounted.costs[TransportMode::Bus] = 0.0;
    let utilities = agent.calculate_utilities(&discounted, &behavior);

    // price sensitivity 0.2 × $4 saved
    assert!((utilities[TransportMode::Bus] - base[TransportMode::Bus] - 0.8).abs() < 1e-12);
}

#[test]
fn test_stickiness_never_negative() {
    let rich = make_agent(10.0 * MEDIAN, true);
    assert_eq!(rich.stickiness_bonus(&BehaviorConfig::default(), MEDIAN), 0.0);
}

// ============================================================================
// Choice
// ============================================================================

#[test]
fn test_probabilities_sum_to_one() {
    let agent = make_agent(MEDIAN, true);
    let utilities = agent.calculate_utilities(&reference_ctx(), &BehaviorConfig::default());
    let probabilities = choice_probabilities(&utilities).unwrap();

    let total: f64 = probabilities.iter().map(|(_, &p)| p).sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!(probabilities.iter().all(|(_, &p)| p > 0.0));
}

#[test]
fn test_non_owner_never_drives() {
    let mut agent = make_agent(MEDIAN, false);
    let behavior = BehaviorConfig::default();
    let mut rng = RngManager::new(42);

    for _ in 0..1000 {
        let transition = agent.step(&reference_ctx(), &behavior, &mut rng).unwrap();
        assert_ne!(transition.current, TransportMode::Car);
    }
    assert_eq!(agent.car_habit_streak(), 0);
}

#[test]
fn test_all_modes_unavailable_is_error() {
    let utilities = PerMode::from_fn(|_| f64::NEG_INFINITY);
    let mut rng = RngManager::new(1);

    assert_eq!(
        choose_mode(&utilities, &mut rng),
        Err(ChoiceError::NoViableMode)
    );
}

#[test]
fn test_nan_utility_is_error() {
    let mut utilities = PerMode::from_fn(|_| 0.0);
    utilities[TransportMode::Train] = f64::NAN;

    assert_eq!(
        choice_probabilities(&utilities),
        Err(ChoiceError::NanUtility {
            mode: TransportMode::Train
        })
    );
}

#[test]
fn test_dominant_utility_always_chosen() {
    let mut utilities = PerMode::from_fn(|_| f64::NEG_INFINITY);
    utilities[TransportMode::Bus] = -3.0;
    let mut rng = RngManager::new(8);

    for _ in 0..100 {
        assert_eq!(choose_mode(&utilities, &mut rng), Ok(TransportMode::Bus));
    }
}

// ============================================================================
// Habit Streak
// ============================================================================

#[test]
fn test_streak_counts_consecutive_car_choices() {
    let mut agent = make_agent(MEDIAN, true);

    for k in 1..=5 {
        agent.apply_choice(TransportMode::Car);
        assert_eq!(agent.car_habit_streak(), k);
    }

    agent.apply_choice(TransportMode::Train);
    assert_eq!(agent.car_habit_streak(), 0);

    agent.apply_choice(TransportMode::Car);
    assert_eq!(agent.car_habit_streak(), 1);
}

#[test]
fn test_transition_reports_previous_choice() {
    let mut agent = make_agent(MEDIAN, true);

    let first = agent.apply_choice(TransportMode::Bus);
    assert_eq!(first.previous, None);
    assert_eq!(first.group, SocioGroup::Middle);

    let second = agent.apply_choice(TransportMode::Car);
    assert_eq!(second.previous, Some(TransportMode::Bus));
    assert_eq!(second.current, TransportMode::Car);
}

#[test]
fn test_streak_strengthens_car_utility() {
    let mut agent = make_agent(MEDIAN, true);
    let behavior = BehaviorConfig::default();
    let before = agent.calculate_utilities(&reference_ctx(), &behavior)[TransportMode::Car];

    for _ in 0..10 {
        agent.apply_choice(TransportMode::Car);
    }
    let after = agent.calculate_utilities(&reference_ctx(), &behavior)[TransportMode::Car];

    assert!((after - before - 1.0).abs() < 1e-12);
}
