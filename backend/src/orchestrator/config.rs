//! Model configuration
//!
//! Every construction parameter of a run, grouped by concern. All structs
//! implement `Default` with the calibrated reference values and deserialize
//! with `#[serde(default)]`, so a JSON document only needs the fields it
//! overrides:
//!
//! ```rust
//! use commute_simulator_core_rs::orchestrator::ModelConfig;
//!
//! let config = ModelConfig::from_json_str(r#"{
//!     "num_agents": 500,
//!     "rng_seed": 7,
//!     "policy": { "new_car_toll": 5.0, "new_fare_discount": 0.5 }
//! }"#).unwrap();
//!
//! assert_eq!(config.num_agents, 500);
//! assert_eq!(config.policy.policy_step, 12);
//! ```

use crate::costs::{CongestionConfig, CostRates, RoadConfig, TransitConfig};
use crate::models::agent::{BehaviorConfig, ModeShareTargets};
use crate::models::mode::PerMode;
use crate::orchestrator::SimulationError;
use crate::population::PopulationConfig;
use serde::{Deserialize, Serialize};

/// Undiscounted out-of-pocket prices per trip ($)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Operating cost of a car trip, excluding tolls
    pub car_cost: f64,
    pub bus_fare: f64,
    pub train_fare: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            car_cost: 5.0 * 2.0,
            bus_fare: 2.0 * 2.0,
            train_fare: 3.0 * 2.0,
        }
    }
}

impl PricingConfig {
    /// Base price per mode; bike/walk is free.
    pub fn fares(&self) -> PerMode<f64> {
        PerMode {
            car: self.car_cost,
            bus: self.bus_fare,
            train: self.train_fare,
            bike_walk: 0.0,
        }
    }
}

/// Toll and fare-discount schedule
///
/// The initial values are active from construction. At step `policy_step`
/// the pending toll is added to the active toll and the pending discount
/// replaces the active discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub initial_car_toll: f64,
    pub initial_fare_discount: f64,
    /// Added to the active toll on activation
    pub new_car_toll: f64,
    /// Replaces the active discount on activation
    pub new_fare_discount: f64,
    /// 1-based step index of activation
    pub policy_step: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            initial_car_toll: 9.2,
            initial_fare_discount: 0.0,
            new_car_toll: 0.0,
            new_fare_discount: 0.0,
            policy_step: 12,
        }
    }
}

/// Complete model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Population size
    pub num_agents: usize,

    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// Record every agent's mode choice each step
    pub collect_agent_choices: bool,

    pub pricing: PricingConfig,
    pub policy: PolicyConfig,
    pub population: PopulationConfig,
    pub behavior: BehaviorConfig,
    pub mode_share_targets: ModeShareTargets,
    pub congestion: CongestionConfig,
    pub cost_rates: CostRates,
    pub transit: TransitConfig,
    pub road: RoadConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            num_agents: 20_000,
            rng_seed: 42,
            collect_agent_choices: true,
            pricing: PricingConfig::default(),
            policy: PolicyConfig::default(),
            population: PopulationConfig::default(),
            behavior: BehaviorConfig::default(),
            mode_share_targets: ModeShareTargets::default(),
            congestion: CongestionConfig::default(),
            cost_rates: CostRates::default(),
            transit: TransitConfig::default(),
            road: RoadConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json)
            .map_err(|e| SimulationError::InvalidConfig(format!("Config parse failed: {}", e)))
    }

    /// Validate configuration
    ///
    /// Income calibration is checked separately when the sampler is built.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = SimulationError::InvalidConfig;

        if self.num_agents == 0 {
            return Err(invalid("num_agents must be positive".to_string()));
        }

        let prices = [
            ("car_cost", self.pricing.car_cost),
            ("bus_fare", self.pricing.bus_fare),
            ("train_fare", self.pricing.train_fare),
            ("initial_car_toll", self.policy.initial_car_toll),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        // The pending toll is additive and may lower the active toll
        if !self.policy.new_car_toll.is_finite() {
            return Err(invalid(format!(
                "new_car_toll must be finite, got {}",
                self.policy.new_car_toll
            )));
        }
        for (name, value) in [
            ("initial_fare_discount", self.policy.initial_fare_discount),
            ("new_fare_discount", self.policy.new_fare_discount),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if self.policy.policy_step == 0 {
            return Err(invalid(
                "policy_step must be at least 1 (steps are 1-based)".to_string(),
            ));
        }

        self.population.validate().map_err(invalid)?;
        self.mode_share_targets.validate().map_err(invalid)?;
        self.congestion.validate().map_err(invalid)?;
        self.cost_rates.validate().map_err(invalid)?;
        self.transit.validate().map_err(invalid)?;
        self.road.validate().map_err(invalid)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_agents_rejected() {
        let config = ModelConfig {
            num_agents: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_target_share_rejected() {
        let mut config = ModelConfig::default();
        config.mode_share_targets.shares.upper.bus = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("upper"));
    }

    #[test]
    fn test_discount_out_of_range_rejected() {
        let mut config = ModelConfig::default();
        config.policy.new_fare_discount = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ModelConfig::from_json_str(r#"{"pricing": {"bus_fare": 3.0}}"#).unwrap();
        assert_eq!(config.pricing.bus_fare, 3.0);
        assert_eq!(config.pricing.train_fare, 6.0);
        assert_eq!(config.num_agents, 20_000);
    }

    #[test]
    fn test_malformed_json_is_invalid_config() {
        assert!(matches!(
            ModelConfig::from_json_str("{ not json"),
            Err(SimulationError::InvalidConfig(_))
        ));
    }
}
