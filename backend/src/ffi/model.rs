//! PyO3 wrapper for TransportModel
//!
//! This module provides the Python interface to the Rust model.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{
    choices_to_py, group_sizes_to_py, metrics_to_py, parse_model_kwargs, step_result_to_py,
};
use crate::orchestrator::{SimulationError, TransportModel as RustTransportModel};

fn runtime_error(context: &str, e: SimulationError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}: {}", context, e))
}

/// Python wrapper for Rust TransportModel
///
/// # Example (from Python)
///
/// ```python
/// from commute_simulator_core_rs import TransportModel
///
/// model = TransportModel(num_agents=1000, car_toll=5.0, fare_discount=0.5, seed=42)
/// for _ in range(24):
///     row = model.step()
/// print(row["car_share_pct"], row["total_ghg_sum"])
/// ```
#[pyclass(name = "TransportModel")]
pub struct PyTransportModel {
    inner: RustTransportModel,
}

#[pymethods]
impl PyTransportModel {
    /// Create a new model from keyword arguments
    ///
    /// # Errors
    ///
    /// Raises TypeError for unknown keywords, ValueError for values of the
    /// wrong type and RuntimeError when the configuration is rejected.
    #[new]
    #[pyo3(signature = (**kwargs))]
    fn new(kwargs: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = parse_model_kwargs(kwargs)?;
        let inner = RustTransportModel::new(config)
            .map_err(|e| runtime_error("Failed to create model", e))?;
        Ok(PyTransportModel { inner })
    }

    /// Execute one simulation step
    ///
    /// # Returns
    ///
    /// Dictionary with `step`, `policy_activated`, `mode_counts` and every
    /// published metric (`congestion_level`, `car_share_pct_upper`, ...).
    fn step<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let result = self
            .inner
            .step()
            .map_err(|e| runtime_error("Step execution failed", e))?;
        step_result_to_py(py, &result, self.inner.metrics().latest())
    }

    /// Current step (0 before the first `step()`)
    fn current_step(&self) -> usize {
        self.inner.current_step()
    }

    fn congestion_level(&self) -> f64 {
        self.inner.congestion_level()
    }

    fn car_toll(&self) -> f64 {
        self.inner.car_toll()
    }

    fn fare_discount(&self) -> f64 {
        self.inner.fare_discount()
    }

    fn policy_applied(&self) -> bool {
        self.inner.policy_applied()
    }

    /// Replace the pending toll increment and fare discount before activation
    fn schedule_policy(&mut self, car_toll: f64, fare_discount: f64) -> PyResult<()> {
        self.inner
            .schedule_policy(car_toll, fare_discount)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))
    }

    /// Every agent's current mode, indexed by agent id
    fn mode_choices<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        choices_to_py(py, self.inner.agents().iter().map(|a| a.mode_choice()))
    }

    /// Population per socio-economic group
    fn group_sizes<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        group_sizes_to_py(py, |group| self.inner.group_size(group))
    }

    /// One dict per executed step
    fn metrics_history<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let list = PyList::empty_bound(py);
        for record in self.inner.metrics().model_records() {
            list.append(metrics_to_py(py, record)?)?;
        }
        Ok(list)
    }

    /// Serialize the complete model state to JSON
    fn save_state(&self) -> PyResult<String> {
        self.inner
            .save_state()
            .map_err(|e| runtime_error("Failed to save state", e))
    }
}
