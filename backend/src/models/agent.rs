//! Commuter agent model
//!
//! Represents one traveler choosing a commute mode every step.
//! Each agent has:
//! - Static traits drawn once by the income sampler (income, class,
//!   car ownership, distance, hourly time value)
//! - Behavioral parameters derived from income relative to the median
//! - A reference snapshot of commute times and costs at model start
//! - Alternative-specific constants calibrated to its class's target shares
//! - Mutable choice state (current mode, consecutive car-use streak)
//!
//! # Utility model
//!
//! ```text
//! U_car   = ASC_car + habit − ps·Δcost − vot·Δtime     (−∞ without a car)
//! U_bus   = ASC_bus − ps·Δcost − vot·Δtime             (time scales with congestion)
//! U_train = ASC_train − ps·Δcost − vot·Δtime
//! U_bike  = ASC_bike − vot·Δtime
//! ```
//!
//! Δ values are current minus reference. The agent draws from the
//! multinomial logit over these utilities and reports the resulting
//! `ModeTransition`; it never mutates model-level counters.

use crate::models::counts::ModeTransition;
use crate::models::mode::{PerGroup, PerMode, SocioGroup, TransportMode};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the logit choice routine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChoiceError {
    #[error("No alternative has a finite utility")]
    NoViableMode,

    #[error("Utility for {mode} is not a number")]
    NanUtility { mode: TransportMode },
}

/// Static traits produced by the income sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentTraits {
    /// Annual income ($)
    pub income: f64,
    pub socio_group: SocioGroup,
    pub car_owner: bool,
    /// One-way commute distance (miles)
    pub distance: f64,
    /// Hourly time value ($/hour), a fraction of the hourly wage
    pub time_value: f64,
}

/// Behavioral constants shared by every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Value of time at median income ($/hour)
    pub base_value_of_time: f64,
    /// Scale converting `base_value_of_time` into the utility's time weight
    pub value_of_time_scale: f64,
    pub value_of_time_elasticity: f64,
    pub price_sensitivity_scale: f64,
    pub price_sensitivity_elasticity: f64,
    /// Car loyalty before any streak or income adjustment
    pub habit_base: f64,
    /// Loyalty gained per consecutive car step
    pub habit_step: f64,
    /// Loyalty lost per unit of income/median
    pub habit_income_weight: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            base_value_of_time: 10.0,
            value_of_time_scale: 0.1,
            value_of_time_elasticity: 1.0,
            price_sensitivity_scale: 0.1,
            price_sensitivity_elasticity: 1.0,
            habit_base: 1.5,
            habit_step: 0.1,
            habit_income_weight: 0.5,
        }
    }
}

/// Observed mode shares per socio-economic group, used to calibrate ASCs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeShareTargets {
    pub shares: PerGroup<PerMode<f64>>,
}

impl Default for ModeShareTargets {
    fn default() -> Self {
        Self {
            shares: PerGroup {
                lower: PerMode {
                    car: 0.47,
                    bus: 0.25,
                    train: 0.10,
                    bike_walk: 0.18,
                },
                middle: PerMode {
                    car: 0.60,
                    bus: 0.15,
                    train: 0.15,
                    bike_walk: 0.10,
                },
                upper: PerMode {
                    car: 0.70,
                    bus: 0.05,
                    train: 0.20,
                    bike_walk: 0.05,
                },
            },
        }
    }
}

impl ModeShareTargets {
    /// Check every share is finite and strictly positive.
    ///
    /// A zero share would make its log-ratio ASC −∞ (or +∞ for the reference
    /// mode), so it is rejected rather than silently excluding the mode.
    pub fn validate(&self) -> Result<(), String> {
        for (group, shares) in self.shares.iter() {
            for (mode, &share) in shares.iter() {
                if !share.is_finite() || share <= 0.0 {
                    return Err(format!(
                        "target share for {} commuters on {} must be positive, got {}",
                        group, mode, share
                    ));
                }
            }
        }
        Ok(())
    }

    /// `ASC[m] = ln(share[m] / share[reference])`, zero for bike/walk.
    pub fn utility_constants(&self, group: SocioGroup) -> PerMode<f64> {
        let shares = &self.shares[group];
        let reference = shares[TransportMode::REFERENCE];
        shares.map(|mode, &share| {
            if mode == TransportMode::REFERENCE {
                0.0
            } else {
                (share / reference).ln()
            }
        })
    }
}

/// Live conditions an agent evaluates its alternatives against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChoiceContext {
    pub congestion_level: f64,
    /// Out-of-pocket cost per mode, discounts and tolls already applied
    pub costs: PerMode<f64>,
    pub median_income: f64,
}

/// Commute time in hours for a mode under the given congestion.
///
/// # Example
/// ```
/// use commute_simulator_core_rs::models::agent::commute_time;
/// use commute_simulator_core_rs::TransportMode;
///
/// // 10 miles by train: 10 × 5.6 / 60 hours, congestion ignored
/// let t = commute_time(10.0, TransportMode::Train, 1.5);
/// assert!((t - 56.0 / 60.0).abs() < 1e-12);
/// ```
pub fn commute_time(distance: f64, mode: TransportMode, congestion_level: f64) -> f64 {
    let free_flow = distance * mode.minutes_per_mile() / 60.0;
    if mode.shares_road() {
        free_flow * congestion_level
    } else {
        free_flow
    }
}

/// Commute times and costs captured once at agent creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    pub commute_time: PerMode<f64>,
    pub commute_cost: PerMode<f64>,
}

impl ReferenceSnapshot {
    pub fn capture(distance: f64, reference: &ChoiceContext) -> Self {
        Self {
            commute_time: PerMode::from_fn(|mode| {
                commute_time(distance, mode, reference.congestion_level)
            }),
            commute_cost: reference.costs,
        }
    }
}

/// Multinomial logit probabilities.
///
/// The maximum utility is subtracted before exponentiating. Alternatives with
/// utility −∞ get probability exactly 0.
pub fn choice_probabilities(utilities: &PerMode<f64>) -> Result<PerMode<f64>, ChoiceError> {
    for (mode, &u) in utilities.iter() {
        if u.is_nan() {
            return Err(ChoiceError::NanUtility { mode });
        }
    }

    let max_utility = utilities
        .iter()
        .map(|(_, &u)| u)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_utility.is_finite() {
        return Err(ChoiceError::NoViableMode);
    }

    let weights = utilities.map(|_, &u| {
        if u == f64::NEG_INFINITY {
            0.0
        } else {
            (u - max_utility).exp()
        }
    });
    let total: f64 = weights.iter().map(|(_, &w)| w).sum();
    Ok(weights.map(|_, &w| w / total))
}

/// Draw a mode from the logit probabilities (one RNG draw).
pub fn choose_mode(
    utilities: &PerMode<f64>,
    rng: &mut RngManager,
) -> Result<TransportMode, ChoiceError> {
    let probabilities = choice_probabilities(utilities)?;
    let idx = rng
        .categorical(&probabilities.to_array())
        .ok_or(ChoiceError::NoViableMode)?;
    Ok(TransportMode::ALL[idx])
}

/// Represents one commuter in the simulation
///
/// # Example
/// ```
/// use commute_simulator_core_rs::models::agent::{
///     AgentTraits, BehaviorConfig, ChoiceContext, CommuterAgent, ModeShareTargets,
/// };
/// use commute_simulator_core_rs::models::PerMode;
/// use commute_simulator_core_rs::{SocioGroup, TransportMode};
///
/// let traits = AgentTraits {
///     income: 60_000.0,
///     socio_group: SocioGroup::Middle,
///     car_owner: false,
///     distance: 12.0,
///     time_value: 14.42,
/// };
/// let reference = ChoiceContext {
///     congestion_level: 1.3,
///     costs: PerMode { car: 19.2, bus: 4.0, train: 6.0, bike_walk: 0.0 },
///     median_income: 60_000.0,
/// };
/// let asc = ModeShareTargets::default().utility_constants(SocioGroup::Middle);
/// let agent = CommuterAgent::new(0, traits, &BehaviorConfig::default(), &reference, asc);
///
/// let utilities = agent.calculate_utilities(&reference, &BehaviorConfig::default());
/// assert_eq!(utilities[TransportMode::Car], f64::NEG_INFINITY);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuterAgent {
    id: usize,
    traits: AgentTraits,

    /// Utility weight on commute time ($ per unit of time delta)
    value_of_time: f64,

    /// Utility weight on cost deltas
    price_sensitivity: f64,

    reference: ReferenceSnapshot,

    /// Alternative-specific constants (bike/walk = 0)
    utility_constants: PerMode<f64>,

    /// None until the first step
    mode_choice: Option<TransportMode>,

    /// Consecutive steps with car chosen
    car_habit_streak: u32,
}

impl CommuterAgent {
    /// Create an agent, deriving its behavioral weights and reference snapshot.
    pub fn new(
        id: usize,
        traits: AgentTraits,
        behavior: &BehaviorConfig,
        reference: &ChoiceContext,
        utility_constants: PerMode<f64>,
    ) -> Self {
        let relative_income = traits.income / reference.median_income;
        let value_of_time = behavior.value_of_time_scale
            * behavior.base_value_of_time
            * relative_income.powf(behavior.value_of_time_elasticity);
        let price_sensitivity = behavior.price_sensitivity_scale
            * (1.0 / relative_income).powf(behavior.price_sensitivity_elasticity);

        Self {
            id,
            traits,
            value_of_time,
            price_sensitivity,
            reference: ReferenceSnapshot::capture(traits.distance, reference),
            utility_constants,
            mode_choice: None,
            car_habit_streak: 0,
        }
    }

    /// Rebuild an agent from checkpointed state.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_snapshot(
        id: usize,
        traits: AgentTraits,
        value_of_time: f64,
        price_sensitivity: f64,
        reference: ReferenceSnapshot,
        utility_constants: PerMode<f64>,
        mode_choice: Option<TransportMode>,
        car_habit_streak: u32,
    ) -> Self {
        Self {
            id,
            traits,
            value_of_time,
            price_sensitivity,
            reference,
            utility_constants,
            mode_choice,
            car_habit_streak,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn traits(&self) -> &AgentTraits {
        &self.traits
    }

    pub fn income(&self) -> f64 {
        self.traits.income
    }

    pub fn socio_group(&self) -> SocioGroup {
        self.traits.socio_group
    }

    pub fn car_owner(&self) -> bool {
        self.traits.car_owner
    }

    pub fn distance(&self) -> f64 {
        self.traits.distance
    }

    pub fn time_value(&self) -> f64 {
        self.traits.time_value
    }

    pub fn value_of_time(&self) -> f64 {
        self.value_of_time
    }

    pub fn price_sensitivity(&self) -> f64 {
        self.price_sensitivity
    }

    pub fn reference(&self) -> &ReferenceSnapshot {
        &self.reference
    }

    pub fn utility_constants(&self) -> &PerMode<f64> {
        &self.utility_constants
    }

    pub fn mode_choice(&self) -> Option<TransportMode> {
        self.mode_choice
    }

    pub fn car_habit_streak(&self) -> u32 {
        self.car_habit_streak
    }

    /// Car loyalty bonus: grows with the streak, shrinks with relative income.
    pub fn stickiness_bonus(&self, behavior: &BehaviorConfig, median_income: f64) -> f64 {
        let bonus = behavior.habit_base + behavior.habit_step * self.car_habit_streak as f64
            - behavior.habit_income_weight * (self.traits.income / median_income);
        bonus.max(0.0)
    }

    /// Utility of every alternative under the given conditions.
    pub fn calculate_utilities(
        &self,
        ctx: &ChoiceContext,
        behavior: &BehaviorConfig,
    ) -> PerMode<f64> {
        PerMode::from_fn(|mode| {
            if mode == TransportMode::Car && !self.traits.car_owner {
                return f64::NEG_INFINITY;
            }

            let time_delta = commute_time(self.traits.distance, mode, ctx.congestion_level)
                - self.reference.commute_time[mode];
            let mut utility = self.utility_constants[mode] - self.value_of_time * time_delta;

            if mode != TransportMode::BikeWalk {
                let cost_delta = ctx.costs[mode] - self.reference.commute_cost[mode];
                utility -= self.price_sensitivity * cost_delta;
            }
            if mode == TransportMode::Car {
                utility += self.stickiness_bonus(behavior, ctx.median_income);
            }
            utility
        })
    }

    /// Record a chosen mode and update the habit streak.
    ///
    /// Returns the transition the model applies to its counters.
    pub fn apply_choice(&mut self, mode: TransportMode) -> ModeTransition {
        let previous = self.mode_choice.replace(mode);
        if mode == TransportMode::Car {
            self.car_habit_streak += 1;
        } else {
            self.car_habit_streak = 0;
        }
        ModeTransition {
            group: self.traits.socio_group,
            previous,
            current: mode,
        }
    }

    /// Full per-step protocol: utilities, logit draw, state update.
    pub fn step(
        &mut self,
        ctx: &ChoiceContext,
        behavior: &BehaviorConfig,
        rng: &mut RngManager,
    ) -> Result<ModeTransition, ChoiceError> {
        let utilities = self.calculate_utilities(ctx, behavior);
        let mode = choose_mode(&utilities, rng)?;
        Ok(self.apply_choice(mode))
    }
}
