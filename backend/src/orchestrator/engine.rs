//! Transport Model Engine
//!
//! Main simulation loop integrating all components:
//! - Population generation (calibrated Pareto incomes)
//! - Agent mode choice (multinomial logit with car habit)
//! - Congestion feedback (BPR volume-delay)
//! - Cost, emission and finance accounting
//! - One-shot policy activation
//! - Metrics collection and event logging
//!
//! # Architecture
//!
//! ```text
//! For each step t (1-based):
//! 1. Shuffle agent order, each agent draws a mode; model applies transitions
//! 2. Congestion level from the car count
//! 3. Mode shares (overall and per group)
//! 4. Congestion cost
//! 5. Emissions (running total)
//! 6. Transit finance
//! 7. Road / toll finance
//! 8. System profit
//! 9. Policy activation when t == policy_step
//! 10. Collect metrics
//! ```
//!
//! # Example
//!
//! ```rust
//! use commute_simulator_core_rs::orchestrator::{ModelConfig, TransportModel};
//!
//! let config = ModelConfig {
//!     num_agents: 200,
//!     rng_seed: 12345,
//!     ..ModelConfig::default()
//! };
//!
//! let mut model = TransportModel::new(config).unwrap();
//! for _ in 0..3 {
//!     let result = model.step().unwrap();
//!     assert!(result.congestion_level >= 1.0);
//! }
//! assert_eq!(model.current_step(), 3);
//! ```

use crate::core::time::StepClock;
use crate::costs::{CostLedger, LedgerInputs};
use crate::models::agent::{ChoiceContext, CommuterAgent};
use crate::models::counts::{ModeCounts, ModeTransition};
use crate::models::event::{Event, EventLog};
use crate::models::mode::{PerGroup, PerMode, SocioGroup, TransportMode};
use crate::orchestrator::checkpoint::{
    compute_config_hash, validate_snapshot, AgentSnapshot, StateSnapshot,
};
use crate::orchestrator::config::ModelConfig;
use crate::orchestrator::metrics::{MetricsCollector, ModeShares, ModelMetrics};
use crate::population::{CalibrationError, IncomeSampler};
use crate::rng::RngManager;
use thiserror::Error;

/// Simulation error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Income targets admit no Pareto fit
    #[error("Income calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    /// A computation produced no usable number
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation error: {0}")]
    StateValidationError(String),
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Step number (1-based)
    pub step: usize,

    /// Commuters per mode after the agent phase
    pub mode_totals: PerMode<usize>,

    pub congestion_level: f64,

    /// Emissions this step
    pub total_ghg: f64,

    /// Emissions accumulated over the run
    pub total_ghg_sum: f64,

    pub total_system_profit: f64,

    /// Whether the pending policy was activated on this step
    pub policy_activated: bool,
}

/// Main model managing the commuter population and step loop
///
/// The model owns all simulation state: agents only return their chosen mode
/// and the model applies it to the aggregate counters.
///
/// # Determinism
///
/// All randomness is via `rng` with seeded xorshift64*.
/// Same seed + same config = identical results (deterministic replay).
pub struct TransportModel {
    config: ModelConfig,

    /// All commuters, ordered by id
    agents: Vec<CommuterAgent>,

    counts: ModeCounts,

    /// Commuters per socio-economic group (fixed after construction)
    group_sizes: PerGroup<usize>,

    car_owners: usize,

    clock: StepClock,

    rng: RngManager,

    /// Calibrated Pareto tail index of the income distribution
    pareto_shape: f64,

    /// Vehicles the road carries at v/c = 1
    road_capacity: f64,

    v_over_c: f64,

    congestion_level: f64,

    /// Active toll ($ per car trip)
    car_toll: f64,

    /// Active transit fare discount in [0, 1]
    fare_discount: f64,

    new_car_toll: f64,

    new_fare_discount: f64,

    policy_applied: bool,

    shares: ModeShares,

    ledger: CostLedger,

    total_ghg_sum: f64,

    event_log: EventLog,

    metrics: MetricsCollector,

    /// Reused agent visiting order
    order: Vec<usize>,
}

impl TransportModel {
    /// Create new model from configuration
    ///
    /// Validates the configuration, calibrates and samples the population,
    /// and captures every agent's reference snapshot at the initial
    /// congestion level and prices.
    ///
    /// # Returns
    ///
    /// * `Ok(TransportModel)` - Fully initialized model at step 0
    /// * `Err(SimulationError)` - Configuration or calibration failed
    pub fn new(config: ModelConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let mut rng = RngManager::new(config.rng_seed);
        let sampler = IncomeSampler::new(&config.population)?;
        let population = sampler.sample_population(config.num_agents, &mut rng);

        let congestion_level = config.congestion.initial_congestion_level;
        let reference = Self::context_for(
            &config,
            congestion_level,
            config.policy.initial_car_toll,
            config.policy.initial_fare_discount,
        );
        let utility_constants =
            PerGroup::from_fn(|group| config.mode_share_targets.utility_constants(group));

        let agents: Vec<CommuterAgent> = population
            .into_iter()
            .enumerate()
            .map(|(id, traits)| {
                CommuterAgent::new(
                    id,
                    traits,
                    &config.behavior,
                    &reference,
                    utility_constants[traits.socio_group],
                )
            })
            .collect();

        let group_sizes = Self::group_sizes_of(&agents);
        let car_owners = agents.iter().filter(|a| a.car_owner()).count();
        let road_capacity = config.congestion.road_capacity(config.num_agents);

        let mut event_log = EventLog::new();
        event_log.log(Event::SimulationStarted {
            step: 0,
            num_agents: config.num_agents,
            pareto_shape: sampler.distribution().shape,
            road_capacity,
            car_owners,
            lower: group_sizes.lower,
            middle: group_sizes.middle,
            upper: group_sizes.upper,
        });

        Ok(Self {
            order: Vec::with_capacity(agents.len()),
            agents,
            counts: ModeCounts::new(),
            group_sizes,
            car_owners,
            clock: StepClock::new(),
            rng,
            pareto_shape: sampler.distribution().shape,
            road_capacity,
            v_over_c: config.congestion.initial_v_over_c(),
            congestion_level,
            car_toll: config.policy.initial_car_toll,
            fare_discount: config.policy.initial_fare_discount,
            new_car_toll: config.policy.new_car_toll,
            new_fare_discount: config.policy.new_fare_discount,
            policy_applied: false,
            shares: ModeShares::default(),
            ledger: CostLedger::default(),
            total_ghg_sum: 0.0,
            event_log,
            metrics: MetricsCollector::new(config.collect_agent_choices),
            config,
        })
    }

    fn context_for(
        config: &ModelConfig,
        congestion_level: f64,
        car_toll: f64,
        fare_discount: f64,
    ) -> ChoiceContext {
        let fares = config.pricing.fares();
        ChoiceContext {
            congestion_level,
            costs: PerMode::from_fn(|mode| match mode {
                TransportMode::Car => fares[mode] + car_toll,
                TransportMode::Bus | TransportMode::Train => fares[mode] * (1.0 - fare_discount),
                TransportMode::BikeWalk => 0.0,
            }),
            median_income: config.population.median_income,
        }
    }

    fn group_sizes_of(agents: &[CommuterAgent]) -> PerGroup<usize> {
        let mut sizes = PerGroup::default();
        for agent in agents {
            sizes[agent.socio_group()] += 1;
        }
        sizes
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Steps executed so far (0 before the first `step()`)
    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn agents(&self) -> &[CommuterAgent] {
        &self.agents
    }

    pub fn agent(&self, id: usize) -> Option<&CommuterAgent> {
        self.agents.get(id)
    }

    pub fn mode_counts(&self) -> &ModeCounts {
        &self.counts
    }

    pub fn group_size(&self, group: SocioGroup) -> usize {
        self.group_sizes[group]
    }

    pub fn car_owners(&self) -> usize {
        self.car_owners
    }

    pub fn pareto_shape(&self) -> f64 {
        self.pareto_shape
    }

    pub fn road_capacity(&self) -> f64 {
        self.road_capacity
    }

    pub fn v_over_c(&self) -> f64 {
        self.v_over_c
    }

    pub fn congestion_level(&self) -> f64 {
        self.congestion_level
    }

    pub fn car_toll(&self) -> f64 {
        self.car_toll
    }

    pub fn fare_discount(&self) -> f64 {
        self.fare_discount
    }

    pub fn new_car_toll(&self) -> f64 {
        self.new_car_toll
    }

    pub fn new_fare_discount(&self) -> f64 {
        self.new_fare_discount
    }

    pub fn policy_step(&self) -> usize {
        self.config.policy.policy_step
    }

    pub fn policy_applied(&self) -> bool {
        self.policy_applied
    }

    pub fn mode_shares(&self) -> &ModeShares {
        &self.shares
    }

    /// Cost, emission and finance figures of the latest step
    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub fn total_ghg(&self) -> f64 {
        self.ledger.emissions.total
    }

    pub fn total_ghg_sum(&self) -> f64 {
        self.total_ghg_sum
    }

    pub fn total_system_profit(&self) -> f64 {
        self.ledger.total_system_profit
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Conditions agents evaluate at the next step.
    pub fn choice_context(&self) -> ChoiceContext {
        Self::context_for(
            &self.config,
            self.congestion_level,
            self.car_toll,
            self.fare_discount,
        )
    }

    /// Replace the pending toll increment and fare discount.
    ///
    /// Only allowed before activation.
    pub fn schedule_policy(
        &mut self,
        new_car_toll: f64,
        new_fare_discount: f64,
    ) -> Result<(), SimulationError> {
        if self.policy_applied {
            return Err(SimulationError::InvalidConfig(format!(
                "policy already activated at step {}",
                self.config.policy.policy_step
            )));
        }
        if !new_car_toll.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "new_car_toll must be finite, got {}",
                new_car_toll
            )));
        }
        if !(0.0..=1.0).contains(&new_fare_discount) {
            return Err(SimulationError::InvalidConfig(format!(
                "new_fare_discount must be within [0, 1], got {}",
                new_fare_discount
            )));
        }
        self.new_car_toll = new_car_toll;
        self.new_fare_discount = new_fare_discount;
        Ok(())
    }

    // ========================================================================
    // Step Loop Implementation
    // ========================================================================

    /// Execute one simulation step
    ///
    /// # Returns
    ///
    /// * `Ok(StepResult)` - Step executed successfully
    /// * `Err(SimulationError)` - An agent had no viable alternative
    pub fn step(&mut self) -> Result<StepResult, SimulationError> {
        let step = self.clock.advance();

        // STEP 1: AGENT PHASE
        self.run_agent_phase()?;

        // STEP 2: CONGESTION
        let car_count = self.counts.total(TransportMode::Car);
        self.update_congestion(car_count);

        // STEP 3: MODE SHARES
        self.update_mode_shares(step);

        // STEPS 4-8: COSTS, EMISSIONS, FINANCE, SYSTEM PROFIT
        self.update_ledger(step);

        // STEP 9: POLICY ACTIVATION
        let policy_activated = self.maybe_activate_policy(step);

        self.event_log.log(Event::StepCompleted {
            step,
            car_count,
            congestion_level: self.congestion_level,
            total_ghg: self.ledger.emissions.total,
            total_system_profit: self.ledger.total_system_profit,
        });

        // STEP 10: COLLECTION
        self.collect_metrics(step);

        Ok(StepResult {
            step,
            mode_totals: *self.counts.totals(),
            congestion_level: self.congestion_level,
            total_ghg: self.ledger.emissions.total,
            total_ghg_sum: self.total_ghg_sum,
            total_system_profit: self.ledger.total_system_profit,
            policy_activated,
        })
    }

    /// Run `steps` steps, returning each result.
    pub fn run(&mut self, steps: usize) -> Result<Vec<StepResult>, SimulationError> {
        (0..steps).map(|_| self.step()).collect()
    }

    fn run_agent_phase(&mut self) -> Result<(), SimulationError> {
        let ctx = self.choice_context();

        self.order.clear();
        self.order.extend(0..self.agents.len());
        self.rng.shuffle(&mut self.order);

        for &idx in &self.order {
            let agent = &mut self.agents[idx];
            let transition = agent
                .step(&ctx, &self.config.behavior, &mut self.rng)
                .map_err(|e| {
                    SimulationError::NumericDegeneracy(format!("agent {}: {}", agent.id(), e))
                })?;
            self.counts.apply(&transition);
        }
        Ok(())
    }

    fn update_congestion(&mut self, car_count: usize) {
        self.v_over_c = car_count as f64 / self.road_capacity;
        self.congestion_level = self.config.congestion.congestion_level(self.v_over_c);
    }

    fn update_mode_shares(&mut self, step: usize) {
        let (shares, empty_groups) =
            ModeShares::compute(&self.counts, self.agents.len(), &self.group_sizes);
        self.shares = shares;

        for group in empty_groups {
            self.event_log.log(Event::MetricGuarded {
                step,
                metric: format!("share_pct_{}", group),
                reason: format!("no {} commuters; shares reported as 0", group),
            });
        }
    }

    fn update_ledger(&mut self, step: usize) {
        let fares = self.config.pricing.fares();
        self.ledger = CostLedger::compute(
            LedgerInputs {
                totals: self.counts.totals(),
                num_agents: self.agents.len(),
                congestion_level: self.congestion_level,
                fares: &fares,
                car_toll: self.car_toll,
                fare_discount: self.fare_discount,
            },
            &self.config.cost_rates,
            &self.config.transit,
            &self.config.road,
        );

        let total_ghg = self.ledger.emissions.total;
        if total_ghg.is_finite() && total_ghg >= 0.0 {
            self.total_ghg_sum += total_ghg;
        } else {
            self.event_log.log(Event::MetricGuarded {
                step,
                metric: "total_ghg_sum".to_string(),
                reason: format!("step emissions {} not accumulated", total_ghg),
            });
        }

        if !self.ledger.total_system_profit.is_finite() {
            self.event_log.log(Event::MetricGuarded {
                step,
                metric: "total_system_profit".to_string(),
                reason: format!("{} replaced by 0", self.ledger.total_system_profit),
            });
            self.ledger.total_system_profit = 0.0;
        }
    }

    fn maybe_activate_policy(&mut self, step: usize) -> bool {
        if self.policy_applied || !self.clock.is_step(self.config.policy.policy_step) {
            return false;
        }

        self.car_toll += self.new_car_toll;
        self.fare_discount = self.new_fare_discount;
        self.policy_applied = true;
        self.event_log.log(Event::PolicyActivated {
            step,
            car_toll: self.car_toll,
            fare_discount: self.fare_discount,
        });
        true
    }

    fn collect_metrics(&mut self, step: usize) {
        let record = ModelMetrics {
            step,
            congestion_level: self.congestion_level,
            mode_shares: self.shares,
            total_ghg: self.ledger.emissions.total,
            total_ghg_sum: self.total_ghg_sum,
            total_system_profit: self.ledger.total_system_profit,
            total_congestion_cost: self.ledger.congestion.total,
            total_transit_profit: self.ledger.transit.profit,
            toll_profit: self.ledger.road.toll_profit,
            car_toll: self.car_toll,
            fare_discount: self.fare_discount,
        };
        let agents = &self.agents;
        self.metrics
            .collect(record, || agents.iter().map(|a| a.mode_choice()).collect());
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Capture the complete model state.
    pub fn snapshot(&self) -> Result<StateSnapshot, SimulationError> {
        Ok(StateSnapshot {
            current_step: self.clock.current_step(),
            rng_state: self.rng.get_state(),
            agents: self.agents.iter().map(AgentSnapshot::from).collect(),
            congestion_level: self.congestion_level,
            v_over_c: self.v_over_c,
            car_toll: self.car_toll,
            fare_discount: self.fare_discount,
            new_car_toll: self.new_car_toll,
            new_fare_discount: self.new_fare_discount,
            policy_applied: self.policy_applied,
            shares: self.shares,
            ledger: self.ledger,
            total_ghg_sum: self.total_ghg_sum,
            event_log: self.event_log.clone(),
            metrics: self.metrics.clone(),
            config_hash: compute_config_hash(&self.config)?,
        })
    }

    /// Serialize the complete model state to JSON.
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let snapshot = self.snapshot()?;
        serde_json::to_string(&snapshot).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e))
        })
    }

    /// Restore a model from a JSON snapshot taken with the same config.
    pub fn load_state(config: ModelConfig, state_json: &str) -> Result<Self, SimulationError> {
        let snapshot: StateSnapshot = serde_json::from_str(state_json).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot parse failed: {}", e))
        })?;
        Self::from_snapshot(config, snapshot)
    }

    /// Restore a model from a snapshot taken with the same config.
    pub fn from_snapshot(
        config: ModelConfig,
        snapshot: StateSnapshot,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let expected_hash = compute_config_hash(&config)?;
        if snapshot.config_hash != expected_hash {
            return Err(SimulationError::StateValidationError(
                "Snapshot was taken with a different config".to_string(),
            ));
        }
        validate_snapshot(&snapshot, config.num_agents)?;

        let pareto_shape = IncomeSampler::new(&config.population)?.distribution().shape;
        let agents: Vec<CommuterAgent> =
            snapshot.agents.into_iter().map(CommuterAgent::from).collect();

        let mut counts = ModeCounts::new();
        for agent in &agents {
            if let Some(mode) = agent.mode_choice() {
                counts.apply(&ModeTransition {
                    group: agent.socio_group(),
                    previous: None,
                    current: mode,
                });
            }
        }

        Ok(Self {
            order: Vec::with_capacity(agents.len()),
            group_sizes: Self::group_sizes_of(&agents),
            car_owners: agents.iter().filter(|a| a.car_owner()).count(),
            agents,
            counts,
            clock: StepClock::at(snapshot.current_step),
            rng: RngManager::new(snapshot.rng_state),
            pareto_shape,
            road_capacity: config.congestion.road_capacity(config.num_agents),
            v_over_c: snapshot.v_over_c,
            congestion_level: snapshot.congestion_level,
            car_toll: snapshot.car_toll,
            fare_discount: snapshot.fare_discount,
            new_car_toll: snapshot.new_car_toll,
            new_fare_discount: snapshot.new_fare_discount,
            policy_applied: snapshot.policy_applied,
            shares: snapshot.shares,
            ledger: snapshot.ledger,
            total_ghg_sum: snapshot.total_ghg_sum,
            event_log: snapshot.event_log,
            metrics: snapshot.metrics,
            config,
        })
    }
}
