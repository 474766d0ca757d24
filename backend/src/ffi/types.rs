//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList, etc.)

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::models::mode::{SocioGroup, TransportMode};
use crate::orchestrator::{ModelConfig, ModelMetrics, StepResult};

/// Keyword arguments accepted for compatibility but without effect.
///
/// Grid size, fixed road capacity and the lambda weights are superseded by
/// the calibrated road capacity and logit model.
const IGNORED_KWARGS: &[&str] = &[
    "width",
    "height",
    "road_capacity",
    "lambda_public",
    "lambda_private",
    "commute_distance_mean",
    "commute_distance_sigma",
];

const KNOWN_KWARGS: &[&str] = &[
    "num_agents",
    "fare_discount",
    "car_toll",
    "car_cost",
    "bus_cost",
    "train_cost",
    "median_income",
    "mean_income",
    "avg_freeflow_duration",
    "gas_cost",
    "diesel_cost",
    "rush_hours",
    "car_hourly_value",
    "truck_hourly_value",
    "truck_ratio",
    "train_cost_base",
    "bus_cost_base",
    "train_baseline_ridership",
    "bus_baseline_ridership",
    "car_enforcement_pct",
    "road_maintainence_cost_car",
    "road_maintainence_cost_truck",
    "seed",
    "collect_agent_choices",
];

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a field with a default value if missing.
///
/// # Example
/// ```ignore
/// let toll: f64 = extract_with_default(&kwargs, "car_toll", 0.0)?;
/// ```
fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    for<'py> T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

// ========================================================================
// Configuration Parser
// ========================================================================

/// Build a `ModelConfig` from the model's keyword arguments.
///
/// `car_toll` and `fare_discount` are the pending policy values activated
/// at the policy step; the initial toll stays at its default.
pub fn parse_model_kwargs(kwargs: Option<&Bound<'_, PyDict>>) -> PyResult<ModelConfig> {
    let mut config = ModelConfig::default();
    let Some(dict) = kwargs else {
        return Ok(config);
    };

    for key in dict.keys() {
        let key: String = key.extract()?;
        if !KNOWN_KWARGS.contains(&key.as_str()) && !IGNORED_KWARGS.contains(&key.as_str()) {
            return Err(PyErr::new::<pyo3::exceptions::PyTypeError, _>(format!(
                "Unexpected keyword argument '{}'",
                key
            )));
        }
    }

    config.num_agents = extract_with_default(dict, "num_agents", config.num_agents)?;
    let seed: Option<u64> = extract_with_default(dict, "seed", None)?;
    if let Some(seed) = seed {
        config.rng_seed = seed;
    }
    config.collect_agent_choices =
        extract_with_default(dict, "collect_agent_choices", config.collect_agent_choices)?;

    let policy = &mut config.policy;
    policy.new_car_toll = extract_with_default(dict, "car_toll", policy.new_car_toll)?;
    policy.new_fare_discount =
        extract_with_default(dict, "fare_discount", policy.new_fare_discount)?;

    let pricing = &mut config.pricing;
    pricing.car_cost = extract_with_default(dict, "car_cost", pricing.car_cost)?;
    pricing.bus_fare = extract_with_default(dict, "bus_cost", pricing.bus_fare)?;
    pricing.train_fare = extract_with_default(dict, "train_cost", pricing.train_fare)?;

    let population = &mut config.population;
    population.mean_income = extract_with_default(dict, "mean_income", population.mean_income)?;
    population.median_income =
        extract_with_default(dict, "median_income", population.median_income)?;

    let rates = &mut config.cost_rates;
    rates.avg_freeflow_duration =
        extract_with_default(dict, "avg_freeflow_duration", rates.avg_freeflow_duration)?;
    rates.gas_price = extract_with_default(dict, "gas_cost", rates.gas_price)?;
    rates.diesel_price = extract_with_default(dict, "diesel_cost", rates.diesel_price)?;
    rates.rush_hours = extract_with_default(dict, "rush_hours", rates.rush_hours)?;
    rates.car_hourly_value =
        extract_with_default(dict, "car_hourly_value", rates.car_hourly_value)?;
    rates.truck_hourly_value =
        extract_with_default(dict, "truck_hourly_value", rates.truck_hourly_value)?;
    rates.truck_ratio = extract_with_default(dict, "truck_ratio", rates.truck_ratio)?;

    let transit = &mut config.transit;
    transit.train_cost_base =
        extract_with_default(dict, "train_cost_base", transit.train_cost_base)?;
    transit.bus_cost_base = extract_with_default(dict, "bus_cost_base", transit.bus_cost_base)?;
    transit.train_baseline_ridership = extract_with_default(
        dict,
        "train_baseline_ridership",
        transit.train_baseline_ridership,
    )?;
    transit.bus_baseline_ridership =
        extract_with_default(dict, "bus_baseline_ridership", transit.bus_baseline_ridership)?;

    let road = &mut config.road;
    road.enforcement_evasion =
        extract_with_default(dict, "car_enforcement_pct", road.enforcement_evasion)?;
    road.maintenance_cost_car =
        extract_with_default(dict, "road_maintainence_cost_car", road.maintenance_cost_car)?;
    road.maintenance_cost_truck = extract_with_default(
        dict,
        "road_maintainence_cost_truck",
        road.maintenance_cost_truck,
    )?;

    Ok(config)
}

// ========================================================================
// Result Converters
// ========================================================================

/// Convert StepResult plus the step's metrics record to a Python dict
pub fn step_result_to_py<'py>(
    py: Python<'py>,
    result: &StepResult,
    metrics: Option<&ModelMetrics>,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);

    dict.set_item("step", result.step)?;
    dict.set_item("policy_activated", result.policy_activated)?;

    let counts = PyDict::new_bound(py);
    for mode in TransportMode::ALL {
        counts.set_item(mode.as_str(), result.mode_totals[mode])?;
    }
    dict.set_item("mode_counts", counts)?;

    match metrics {
        Some(record) => {
            for (name, value) in record.named_values() {
                dict.set_item(name, value)?;
            }
        }
        None => {
            dict.set_item("congestion_level", result.congestion_level)?;
            dict.set_item("total_ghg", result.total_ghg)?;
            dict.set_item("total_ghg_sum", result.total_ghg_sum)?;
            dict.set_item("total_system_profit", result.total_system_profit)?;
        }
    }

    Ok(dict)
}

/// Convert one metrics record to a Python dict keyed by metric name
pub fn metrics_to_py<'py>(py: Python<'py>, record: &ModelMetrics) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("step", record.step)?;
    for (name, value) in record.named_values() {
        dict.set_item(name, value)?;
    }
    Ok(dict)
}

/// Convert per-agent choices to a list of mode names (None before the first step)
pub fn choices_to_py<'py>(
    py: Python<'py>,
    choices: impl IntoIterator<Item = Option<TransportMode>>,
) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty_bound(py);
    for choice in choices {
        list.append(choice.map(TransportMode::as_str))?;
    }
    Ok(list)
}

/// Group sizes keyed by group name
pub fn group_sizes_to_py<'py>(
    py: Python<'py>,
    size_of: impl Fn(SocioGroup) -> usize,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    for group in SocioGroup::ALL {
        dict.set_item(group.as_str(), size_of(group))?;
    }
    Ok(dict)
}
