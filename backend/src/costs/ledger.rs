//! Per-step cost, emission and finance ledger
//!
//! Pure functions of the step's mode totals, congestion level and active
//! policy. The orchestrator computes one `CostLedger` per step after the
//! congestion update.
//!
//! ```text
//! congestion cost → emissions → transit finance → road finance → system profit
//! ```

use crate::costs::rates::{CostRates, RoadConfig, TransitConfig};
use crate::models::mode::{PerMode, TransportMode};
use serde::{Deserialize, Serialize};

/// Congested hours and their monetized cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CongestionCost {
    /// Car-hours at free-flow speed
    pub free_flow_hours: f64,
    /// Extra car-hours caused by congestion
    pub car_congestion_hours: f64,
    /// Extra truck-hours caused by congestion (truck surrogate)
    pub truck_congestion_hours: f64,
    pub car_cost: f64,
    pub truck_cost: f64,
    pub total: f64,
}

impl CongestionCost {
    pub fn compute(
        car_count: usize,
        num_agents: usize,
        congestion_level: f64,
        rates: &CostRates,
    ) -> Self {
        let excess = congestion_level - 1.0;
        let free_flow_hours = car_count as f64 * rates.avg_freeflow_duration;
        let car_congestion_hours = free_flow_hours * excess;
        let truck_congestion_hours =
            rates.truck_ratio * num_agents as f64 * rates.rush_hours * excess;

        let car_cost = car_congestion_hours * rates.car_hour_cost();
        let truck_cost = truck_congestion_hours * rates.truck_hour_cost();

        Self {
            free_flow_hours,
            car_congestion_hours,
            truck_congestion_hours,
            car_cost,
            truck_cost,
            total: car_cost + truck_cost,
        }
    }
}

/// Greenhouse-gas emissions for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Emissions {
    pub car_congestion: f64,
    pub truck_congestion: f64,
    pub car_free_flow: f64,
    pub total: f64,
}

impl Emissions {
    pub fn compute(congestion: &CongestionCost, rates: &CostRates) -> Self {
        let car_congestion = congestion.car_congestion_hours * rates.car_congestion_ghg_hourly;
        let truck_congestion =
            congestion.truck_congestion_hours * rates.truck_congestion_ghg_hourly;
        let car_free_flow = congestion.free_flow_hours * rates.car_freeflow_ghg_hourly;

        Self {
            car_congestion,
            truck_congestion,
            car_free_flow,
            total: car_congestion + truck_congestion + car_free_flow,
        }
    }

    pub fn congestion_total(&self) -> f64 {
        self.car_congestion + self.truck_congestion
    }
}

/// Bus and train operating finances
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitFinance {
    pub train_cost_discount: f64,
    pub train_cost_per_rider: f64,
    pub bus_cost_discount: f64,
    pub bus_cost_per_rider: f64,
    pub train_revenue: f64,
    pub bus_revenue: f64,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
}

/// Volume discount on per-rider cost once ridership passes the baseline.
fn volume_discount(riders: usize, baseline_riders: f64, rate: f64, cap: f64) -> f64 {
    (rate * (riders as f64 - baseline_riders).max(0.0)).min(cap)
}

impl TransitFinance {
    /// # Arguments
    ///
    /// * `totals` - Riders per mode this step
    /// * `fares` - Undiscounted fare per mode
    /// * `fare_discount` - Active discount in [0, 1]
    pub fn compute(
        totals: &PerMode<usize>,
        fares: &PerMode<f64>,
        fare_discount: f64,
        config: &TransitConfig,
    ) -> Self {
        let train_riders = totals[TransportMode::Train];
        let bus_riders = totals[TransportMode::Bus];

        let train_cost_discount = volume_discount(
            train_riders,
            config.train_baseline_ridership,
            config.train_discount_rate,
            config.train_discount_cap,
        );
        let bus_cost_discount = volume_discount(
            bus_riders,
            config.bus_baseline_ridership,
            config.bus_discount_rate,
            config.bus_discount_cap,
        );
        let train_cost_per_rider = config.train_cost_base - train_cost_discount;
        let bus_cost_per_rider = config.bus_cost_base - bus_cost_discount;
        let total_cost =
            train_cost_per_rider * train_riders as f64 + bus_cost_per_rider * bus_riders as f64;

        let paid_share = 1.0 - fare_discount;
        let train_revenue = paid_share * train_riders as f64 * fares[TransportMode::Train];
        let bus_revenue = paid_share * bus_riders as f64 * fares[TransportMode::Bus];
        let total_revenue = train_revenue + bus_revenue;

        Self {
            train_cost_discount,
            train_cost_per_rider,
            bus_cost_discount,
            bus_cost_per_rider,
            train_revenue,
            bus_revenue,
            total_revenue,
            total_cost,
            profit: total_revenue - total_cost,
        }
    }
}

/// Toll revenue and road maintenance
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadFinance {
    pub maintenance: f64,
    /// Gross tolls charged, before evasion
    pub toll_revenue: f64,
    pub toll_profit: f64,
}

impl RoadFinance {
    pub fn compute(
        car_count: usize,
        car_toll: f64,
        congestion: &CongestionCost,
        config: &RoadConfig,
    ) -> Self {
        let maintenance = config.maintenance_cost_car
            * (congestion.free_flow_hours + congestion.car_congestion_hours)
            + config.maintenance_cost_truck * congestion.truck_congestion_hours;
        let toll_revenue = car_count as f64 * car_toll;

        Self {
            maintenance,
            toll_revenue,
            toll_profit: toll_revenue * (1.0 - config.enforcement_evasion) - maintenance,
        }
    }
}

/// Everything the aggregation pass computes after congestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    pub congestion: CongestionCost,
    pub emissions: Emissions,
    pub transit: TransitFinance,
    pub road: RoadFinance,
    /// toll profit + transit profit − congestion cost
    pub total_system_profit: f64,
}

/// Inputs to one ledger computation
#[derive(Debug, Clone, Copy)]
pub struct LedgerInputs<'a> {
    pub totals: &'a PerMode<usize>,
    pub num_agents: usize,
    pub congestion_level: f64,
    pub fares: &'a PerMode<f64>,
    pub car_toll: f64,
    pub fare_discount: f64,
}

impl CostLedger {
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::costs::{CostLedger, CostRates, LedgerInputs, RoadConfig, TransitConfig};
    /// use commute_simulator_core_rs::models::PerMode;
    ///
    /// let totals = PerMode { car: 0, bus: 0, train: 0, bike_walk: 100 };
    /// let fares = PerMode { car: 10.0, bus: 4.0, train: 6.0, bike_walk: 0.0 };
    /// let ledger = CostLedger::compute(
    ///     LedgerInputs {
    ///         totals: &totals,
    ///         num_agents: 100,
    ///         congestion_level: 1.0,
    ///         fares: &fares,
    ///         car_toll: 9.2,
    ///         fare_discount: 0.0,
    ///     },
    ///     &CostRates::default(),
    ///     &TransitConfig::default(),
    ///     &RoadConfig::default(),
    /// );
    /// assert_eq!(ledger.emissions.total, 0.0);
    /// assert_eq!(ledger.total_system_profit, 0.0);
    /// ```
    pub fn compute(
        inputs: LedgerInputs<'_>,
        rates: &CostRates,
        transit: &TransitConfig,
        road: &RoadConfig,
    ) -> Self {
        let car_count = inputs.totals[TransportMode::Car];
        let congestion = CongestionCost::compute(
            car_count,
            inputs.num_agents,
            inputs.congestion_level,
            rates,
        );
        let emissions = Emissions::compute(&congestion, rates);
        let transit = TransitFinance::compute(
            inputs.totals,
            inputs.fares,
            inputs.fare_discount,
            transit,
        );
        let road = RoadFinance::compute(car_count, inputs.car_toll, &congestion, road);

        Self {
            congestion,
            emissions,
            transit,
            road,
            total_system_profit: road.toll_profit + transit.profit - congestion.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_congestion_no_congestion_cost() {
        let cost = CongestionCost::compute(500, 1000, 1.0, &CostRates::default());
        assert_eq!(cost.total, 0.0);
        assert_eq!(cost.free_flow_hours, 500.0);
    }

    #[test]
    fn test_volume_discount_capped() {
        assert_eq!(volume_discount(10, 100.0, 0.0001, 2.0), 0.0);
        assert!((volume_discount(1_100, 100.0, 0.0001, 2.0) - 0.1).abs() < 1e-12);
        assert_eq!(volume_discount(10_000_000, 100.0, 0.0001, 2.0), 2.0);
    }

    #[test]
    fn test_full_subsidy_zeroes_revenue() {
        let totals = PerMode {
            car: 0,
            bus: 40,
            train: 60,
            bike_walk: 0,
        };
        let fares = PerMode {
            car: 10.0,
            bus: 4.0,
            train: 6.0,
            bike_walk: 0.0,
        };
        let finance =
            TransitFinance::compute(&totals, &fares, 1.0, &TransitConfig::default());
        assert_eq!(finance.total_revenue, 0.0);
        assert!(finance.profit < 0.0);
    }

    #[test]
    fn test_toll_profit_applies_evasion() {
        let congestion = CongestionCost::default();
        let road = RoadFinance::compute(100, 10.0, &congestion, &RoadConfig::default());
        assert_eq!(road.toll_revenue, 1_000.0);
        assert!((road.toll_profit - 900.0).abs() < 1e-9);
    }
}
