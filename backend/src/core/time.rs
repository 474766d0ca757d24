//! Step clock for the simulation
//!
//! The simulation advances in discrete steps. Step 0 is the freshly
//! constructed model; each `step()` call advances the clock first, so the
//! first executed step has index 1. The policy activation step is compared
//! against this index.

use serde::{Deserialize, Serialize};

/// Counts executed steps
///
/// # Example
/// ```
/// use commute_simulator_core_rs::StepClock;
///
/// let mut clock = StepClock::new();
/// assert_eq!(clock.current_step(), 0);
///
/// clock.advance();
/// assert_eq!(clock.current_step(), 1);
/// assert!(clock.is_step(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepClock {
    /// Steps executed since construction
    current_step: usize,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume at a checkpointed step index.
    pub fn at(step: usize) -> Self {
        Self { current_step: step }
    }

    /// Advance by one step and return the new index.
    pub fn advance(&mut self) -> usize {
        self.current_step += 1;
        self.current_step
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Whether the clock is exactly at `step`.
    pub fn is_step(&self, step: usize) -> bool {
        self.current_step == step
    }
}
