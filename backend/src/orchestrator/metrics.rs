//! Metrics collection
//!
//! Records one `ModelMetrics` per step plus, optionally, every agent's mode
//! choice. This is the data sink external dashboards and plotting tools read;
//! the collector itself does no export.

use crate::models::counts::ModeCounts;
use crate::models::mode::{PerGroup, PerMode, SocioGroup, TransportMode};
use serde::{Deserialize, Serialize};

/// Mode-share percentages, overall and per socio-economic group
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeShares {
    pub overall: PerMode<f64>,
    pub by_group: PerGroup<PerMode<f64>>,
}

impl ModeShares {
    /// Compute shares from the counters.
    ///
    /// Returns the shares and the groups whose population is zero. Those
    /// groups report 0% for every mode instead of dividing by zero.
    pub fn compute(
        counts: &ModeCounts,
        num_agents: usize,
        group_sizes: &PerGroup<usize>,
    ) -> (Self, Vec<SocioGroup>) {
        let pct = |n: usize, of: usize| {
            if of == 0 {
                0.0
            } else {
                n as f64 / of as f64 * 100.0
            }
        };

        let overall = PerMode::from_fn(|mode| pct(counts.total(mode), num_agents));
        let by_group = PerGroup::from_fn(|group| {
            let size = group_sizes[group];
            PerMode::from_fn(|mode| pct(counts.count(mode, group), size))
        });
        let empty_groups = SocioGroup::ALL
            .into_iter()
            .filter(|&group| group_sizes[group] == 0)
            .collect();

        (Self { overall, by_group }, empty_groups)
    }

    pub fn overall(&self, mode: TransportMode) -> f64 {
        self.overall[mode]
    }

    pub fn group(&self, mode: TransportMode, group: SocioGroup) -> f64 {
        self.by_group[group][mode]
    }
}

/// Model-level values published after each step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub step: usize,
    pub congestion_level: f64,
    pub mode_shares: ModeShares,
    pub total_ghg: f64,
    pub total_ghg_sum: f64,
    pub total_system_profit: f64,
    pub total_congestion_cost: f64,
    pub total_transit_profit: f64,
    pub toll_profit: f64,
    /// Toll in force after this step (includes an activation on this step)
    pub car_toll: f64,
    pub fare_discount: f64,
}

impl ModelMetrics {
    /// Flat `(name, value)` pairs, e.g. `car_share_pct_upper`.
    pub fn named_values(&self) -> Vec<(String, f64)> {
        let mut values = vec![("congestion_level".to_string(), self.congestion_level)];
        for mode in TransportMode::ALL {
            values.push((
                format!("{}_share_pct", mode),
                self.mode_shares.overall(mode),
            ));
        }
        for group in [SocioGroup::Upper, SocioGroup::Middle, SocioGroup::Lower] {
            for mode in TransportMode::ALL {
                values.push((
                    format!("{}_share_pct_{}", mode, group),
                    self.mode_shares.group(mode, group),
                ));
            }
        }
        values.extend([
            ("total_ghg".to_string(), self.total_ghg),
            ("total_ghg_sum".to_string(), self.total_ghg_sum),
            ("total_system_profit".to_string(), self.total_system_profit),
            ("total_congestion_cost".to_string(), self.total_congestion_cost),
            ("total_transit_profit".to_string(), self.total_transit_profit),
            ("toll_profit".to_string(), self.toll_profit),
            ("car_toll".to_string(), self.car_toll),
            ("fare_discount".to_string(), self.fare_discount),
        ]);
        values
    }
}

/// Every agent's choice at one step, indexed by agent id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentChoices {
    pub step: usize,
    pub mode_choice: Vec<Option<TransportMode>>,
}

/// Time series of model and agent records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsCollector {
    collect_agents: bool,
    model_records: Vec<ModelMetrics>,
    agent_records: Vec<AgentChoices>,
}

impl MetricsCollector {
    pub fn new(collect_agents: bool) -> Self {
        Self {
            collect_agents,
            model_records: Vec::new(),
            agent_records: Vec::new(),
        }
    }

    /// Record one step.
    pub fn collect(
        &mut self,
        metrics: ModelMetrics,
        choices: impl FnOnce() -> Vec<Option<TransportMode>>,
    ) {
        if self.collect_agents {
            self.agent_records.push(AgentChoices {
                step: metrics.step,
                mode_choice: choices(),
            });
        }
        self.model_records.push(metrics);
    }

    pub fn model_records(&self) -> &[ModelMetrics] {
        &self.model_records
    }

    pub fn agent_records(&self) -> &[AgentChoices] {
        &self.agent_records
    }

    pub fn latest(&self) -> Option<&ModelMetrics> {
        self.model_records.last()
    }

    pub fn len(&self) -> usize {
        self.model_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model_records.is_empty()
    }

    pub fn at_step(&self, step: usize) -> Option<&ModelMetrics> {
        self.model_records.iter().find(|m| m.step == step)
    }

    pub fn choices_at_step(&self, step: usize) -> Option<&[Option<TransportMode>]> {
        self.agent_records
            .iter()
            .find(|r| r.step == step)
            .map(|r| r.mode_choice.as_slice())
    }

    /// One model-level field across all recorded steps.
    ///
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::orchestrator::{ModelConfig, TransportModel};
    ///
    /// let config = ModelConfig { num_agents: 50, ..ModelConfig::default() };
    /// let mut model = TransportModel::new(config).unwrap();
    /// model.run(3).unwrap();
    ///
    /// let congestion = model.metrics().series(|m| m.congestion_level);
    /// assert_eq!(congestion.len(), 3);
    /// assert!(congestion.iter().all(|&c| c >= 1.0));
    /// ```
    pub fn series(&self, field: impl Fn(&ModelMetrics) -> f64) -> Vec<f64> {
        self.model_records.iter().map(field).collect()
    }
}
