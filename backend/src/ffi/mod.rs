//! Python bindings (feature `pyo3`)

pub mod model;
pub mod types;
