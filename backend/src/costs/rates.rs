//! Cost Rates and Related Types
//!
//! Rate tables for road congestion, emissions, transit operations and road
//! finance. Monetary values are dollars; emission rates are per vehicle-hour.

use serde::{Deserialize, Serialize};

/// BPR volume-delay parameters and road-capacity calibration.
///
/// Road capacity is fixed at construction so that `initial_car_share` of the
/// population driving yields `initial_congestion_level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CongestionConfig {
    /// Congestion multiplier the model starts at (reference conditions)
    pub initial_congestion_level: f64,
    /// Share of the population assumed to drive at calibration
    pub initial_car_share: f64,
    /// BPR α
    pub bpr_alpha: f64,
    /// BPR β
    pub bpr_beta: f64,
}

impl Default for CongestionConfig {
    fn default() -> Self {
        Self {
            initial_congestion_level: 1.3,
            initial_car_share: 0.5,
            bpr_alpha: 0.15,
            bpr_beta: 4.0,
        }
    }
}

impl CongestionConfig {
    /// `1 + α·(v/c)^β`
    ///
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::costs::CongestionConfig;
    ///
    /// let bpr = CongestionConfig::default();
    /// assert_eq!(bpr.congestion_level(0.0), 1.0);
    /// assert!((bpr.congestion_level(1.0) - 1.15).abs() < 1e-12);
    /// ```
    pub fn congestion_level(&self, v_over_c: f64) -> f64 {
        1.0 + self.congestion_excess(v_over_c)
    }

    /// `α·(v/c)^β`, the delay factor above free flow.
    pub fn congestion_excess(&self, v_over_c: f64) -> f64 {
        self.bpr_alpha * v_over_c.powf(self.bpr_beta)
    }

    /// v/c implied by `initial_congestion_level`.
    pub fn initial_v_over_c(&self) -> f64 {
        ((self.initial_congestion_level - 1.0) / self.bpr_alpha).powf(1.0 / self.bpr_beta)
    }

    /// Road capacity (vehicles) for a population of `num_agents`.
    pub fn road_capacity(&self, num_agents: usize) -> f64 {
        num_agents as f64 * self.initial_car_share / self.initial_v_over_c()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_congestion_level > 1.0 && self.initial_congestion_level.is_finite()) {
            return Err(format!(
                "initial_congestion_level must be finite and above 1, got {}",
                self.initial_congestion_level
            ));
        }
        if !(self.initial_car_share > 0.0 && self.initial_car_share.is_finite()) {
            return Err(format!(
                "initial_car_share must be positive, got {}",
                self.initial_car_share
            ));
        }
        let positive = |v: f64| v > 0.0 && v.is_finite();
        if !(positive(self.bpr_alpha) && positive(self.bpr_beta)) {
            return Err(format!(
                "BPR parameters must be finite and positive, got alpha={}, beta={}",
                self.bpr_alpha, self.bpr_beta
            ));
        }
        Ok(())
    }
}

/// Congestion cost and emission rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Free-flow trip duration per driver (hours)
    pub avg_freeflow_duration: f64,

    /// Peak hours per day in which trucks share the road
    pub rush_hours: f64,

    /// Trucks per commuter; trucks are not simulated agents
    pub truck_ratio: f64,

    /// Value of a car occupant's hour lost in congestion ($)
    pub car_hourly_value: f64,

    /// Value of a truck hour lost in congestion ($)
    pub truck_hourly_value: f64,

    /// Gasoline price ($/gallon)
    pub gas_price: f64,

    /// Diesel price ($/gallon)
    pub diesel_price: f64,

    /// Gallons burned per congested car-hour
    pub gasoline_consumption_hr: f64,

    /// Gallons burned per congested truck-hour
    pub diesel_consumption_hr: f64,

    /// GHG per congested car-hour
    pub car_congestion_ghg_hourly: f64,

    /// GHG per congested truck-hour
    pub truck_congestion_ghg_hourly: f64,

    /// GHG per free-flow car-hour
    pub car_freeflow_ghg_hourly: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            avg_freeflow_duration: 1.0,
            rush_hours: 3.0,
            truck_ratio: 1.0 / 12.0,
            car_hourly_value: 23.12,
            truck_hourly_value: 64.48,
            gas_price: 0.0,
            diesel_price: 0.0,
            gasoline_consumption_hr: 0.25,
            diesel_consumption_hr: 0.65,
            car_congestion_ghg_hourly: 2.22,
            truck_congestion_ghg_hourly: 6.64,
            car_freeflow_ghg_hourly: 16.0,
        }
    }
}

impl CostRates {
    /// Monetized cost of one congested car-hour.
    pub fn car_hour_cost(&self) -> f64 {
        self.gasoline_consumption_hr * self.gas_price + self.car_hourly_value
    }

    /// Monetized cost of one congested truck-hour.
    pub fn truck_hour_cost(&self) -> f64 {
        self.diesel_consumption_hr * self.diesel_price + self.truck_hourly_value
    }

    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("avg_freeflow_duration", self.avg_freeflow_duration),
            ("rush_hours", self.rush_hours),
            ("truck_ratio", self.truck_ratio),
            ("car_hourly_value", self.car_hourly_value),
            ("truck_hourly_value", self.truck_hourly_value),
            ("gas_price", self.gas_price),
            ("diesel_price", self.diesel_price),
            ("gasoline_consumption_hr", self.gasoline_consumption_hr),
            ("diesel_consumption_hr", self.diesel_consumption_hr),
            ("car_congestion_ghg_hourly", self.car_congestion_ghg_hourly),
            ("truck_congestion_ghg_hourly", self.truck_congestion_ghg_hourly),
            ("car_freeflow_ghg_hourly", self.car_freeflow_ghg_hourly),
        ];
        non_negative(&fields)
    }
}

/// Transit operating cost curve.
///
/// Per-rider cost falls once ridership exceeds a baseline, capped:
/// `cost_per_rider = base − min(cap, rate·max(0, riders − baseline))`.
/// Baselines are absolute rider counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    pub train_cost_base: f64,
    pub bus_cost_base: f64,
    pub train_baseline_ridership: f64,
    pub bus_baseline_ridership: f64,
    pub train_discount_rate: f64,
    pub bus_discount_rate: f64,
    pub train_discount_cap: f64,
    pub bus_discount_cap: f64,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            train_cost_base: 11.0 * 2.0,
            bus_cost_base: 5.0 * 2.0,
            train_baseline_ridership: 0.125,
            bus_baseline_ridership: 0.11,
            train_discount_rate: 0.0001,
            bus_discount_rate: 0.00005,
            train_discount_cap: 2.0,
            bus_discount_cap: 1.0,
        }
    }
}

impl TransitConfig {
    pub fn validate(&self) -> Result<(), String> {
        non_negative(&[
            ("train_cost_base", self.train_cost_base),
            ("bus_cost_base", self.bus_cost_base),
            ("train_baseline_ridership", self.train_baseline_ridership),
            ("bus_baseline_ridership", self.bus_baseline_ridership),
            ("train_discount_rate", self.train_discount_rate),
            ("bus_discount_rate", self.bus_discount_rate),
            ("train_discount_cap", self.train_discount_cap),
            ("bus_discount_cap", self.bus_discount_cap),
        ])
    }
}

/// Toll collection and road maintenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Fraction of toll revenue lost to evasion
    pub enforcement_evasion: f64,
    /// Maintenance per car-hour on the road ($)
    pub maintenance_cost_car: f64,
    /// Maintenance per congested truck-hour ($)
    pub maintenance_cost_truck: f64,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            enforcement_evasion: 0.1,
            maintenance_cost_car: 1.0,
            maintenance_cost_truck: 10.0,
        }
    }
}

impl RoadConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.enforcement_evasion) {
            return Err(format!(
                "enforcement_evasion must be within [0, 1], got {}",
                self.enforcement_evasion
            ));
        }
        non_negative(&[
            ("maintenance_cost_car", self.maintenance_cost_car),
            ("maintenance_cost_truck", self.maintenance_cost_truck),
        ])
    }
}

fn non_negative(fields: &[(&str, f64)]) -> Result<(), String> {
    for (name, value) in fields {
        if !value.is_finite() || *value < 0.0 {
            return Err(format!("{} must be finite and non-negative, got {}", name, value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_capacity_reproduces_initial_congestion() {
        let cfg = CongestionConfig::default();
        let capacity = cfg.road_capacity(20_000);
        let level = cfg.congestion_level(10_000.0 / capacity);
        assert!((level - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_default_rates_validate() {
        assert!(CostRates::default().validate().is_ok());
        assert!(TransitConfig::default().validate().is_ok());
        assert!(RoadConfig::default().validate().is_ok());
        assert!(CongestionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_infinite_bpr_parameters_rejected() {
        for (alpha, beta) in [(f64::INFINITY, 4.0), (0.15, f64::INFINITY), (f64::NAN, 4.0)] {
            let cfg = CongestionConfig {
                bpr_alpha: alpha,
                bpr_beta: beta,
                ..CongestionConfig::default()
            };
            let err = cfg.validate().unwrap_err();
            assert!(err.contains("BPR"), "{}", err);
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        let rates = CostRates {
            truck_ratio: -0.1,
            ..CostRates::default()
        };
        let err = rates.validate().unwrap_err();
        assert!(err.contains("truck_ratio"));
    }

    #[test]
    fn test_hour_costs_include_fuel() {
        let rates = CostRates {
            gas_price: 4.0,
            diesel_price: 5.0,
            ..CostRates::default()
        };
        assert!((rates.car_hour_cost() - (0.25 * 4.0 + 23.12)).abs() < 1e-12);
        assert!((rates.truck_hour_cost() - (0.65 * 5.0 + 64.48)).abs() < 1e-12);
    }
}
