//! Incremental mode counters
//!
//! The model owns one `ModeCounts` and applies the transition each agent
//! returns from its step. Agents never hold a reference into it, so the
//! counters after a step do not depend on the order agents were visited in.
//!
//! # Critical Invariants
//!
//! 1. `totals[mode] == Σ_group by_group[mode][group]`
//! 2. `Σ_mode totals[mode]` equals the number of agents that have chosen at
//!    least once (the whole population after the first step)

use crate::models::mode::{PerGroup, PerMode, SocioGroup, TransportMode};
use serde::{Deserialize, Serialize};

/// A single agent's choice change, applied by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTransition {
    pub group: SocioGroup,
    pub previous: Option<TransportMode>,
    pub current: TransportMode,
}

/// Per-mode, per-group commuter tallies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeCounts {
    by_group: PerMode<PerGroup<usize>>,
    totals: PerMode<usize>,
}

impl ModeCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transition: decrement the old choice (if any), increment
    /// the new one.
    ///
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::models::{ModeCounts, ModeTransition};
    /// use commute_simulator_core_rs::{SocioGroup, TransportMode};
    ///
    /// let mut counts = ModeCounts::new();
    /// counts.apply(&ModeTransition {
    ///     group: SocioGroup::Lower,
    ///     previous: None,
    ///     current: TransportMode::Bus,
    /// });
    /// counts.apply(&ModeTransition {
    ///     group: SocioGroup::Lower,
    ///     previous: Some(TransportMode::Bus),
    ///     current: TransportMode::Car,
    /// });
    /// assert_eq!(counts.total(TransportMode::Bus), 0);
    /// assert_eq!(counts.count(TransportMode::Car, SocioGroup::Lower), 1);
    /// ```
    pub fn apply(&mut self, transition: &ModeTransition) {
        if let Some(previous) = transition.previous {
            let slot = &mut self.by_group[previous][transition.group];
            debug_assert!(*slot > 0, "decrement below zero for {}", previous);
            *slot = slot.saturating_sub(1);
            self.totals[previous] = self.totals[previous].saturating_sub(1);
        }
        self.by_group[transition.current][transition.group] += 1;
        self.totals[transition.current] += 1;
    }

    pub fn count(&self, mode: TransportMode, group: SocioGroup) -> usize {
        self.by_group[mode][group]
    }

    pub fn total(&self, mode: TransportMode) -> usize {
        self.totals[mode]
    }

    pub fn totals(&self) -> &PerMode<usize> {
        &self.totals
    }

    /// Number of commuters counted across all modes.
    pub fn population(&self) -> usize {
        self.totals.iter().map(|(_, n)| *n).sum()
    }

    /// Number of commuters of `group` counted across all modes.
    pub fn group_population(&self, group: SocioGroup) -> usize {
        TransportMode::ALL
            .iter()
            .map(|&mode| self.by_group[mode][group])
            .sum()
    }
}
