//! Event logging for simulation replay and auditing.
//!
//! This module defines the Event enum which captures significant state changes
//! during a commute simulation run:
//! - **Lifecycle**: model construction, end of each step
//! - **Policy**: the one-shot toll / fare-discount activation
//! - **Guards**: metrics zero-filled because their inputs were degenerate
//!
//! Per-agent choices are not logged here; they are recorded by the
//! metrics collector.
//!
//! # Example
//!
//! ```rust
//! use commute_simulator_core_rs::models::Event;
//!
//! let event = Event::PolicyActivated {
//!     step: 12,
//!     car_toll: 14.2,
//!     fare_discount: 0.5,
//! };
//!
//! assert_eq!(event.step(), 12);
//! assert_eq!(event.event_type(), "PolicyActivated");
//! ```

use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change.
///
/// All events include a step number for temporal ordering.
/// Step 0 is construction; the first `step()` call is step 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Population built and calibrated
    SimulationStarted {
        step: usize,
        num_agents: usize,
        pareto_shape: f64,
        road_capacity: f64,
        car_owners: usize,
        lower: usize,
        middle: usize,
        upper: usize,
    },

    /// Pending toll and fare discount became active
    PolicyActivated {
        step: usize,
        car_toll: f64,
        fare_discount: f64,
    },

    /// A metric was zero-filled or an accumulation skipped
    MetricGuarded {
        step: usize,
        metric: String,
        reason: String,
    },

    /// Aggregation pass finished
    StepCompleted {
        step: usize,
        car_count: usize,
        congestion_level: f64,
        total_ghg: f64,
        total_system_profit: f64,
    },
}

impl Event {
    /// Get the step number when this event occurred
    pub fn step(&self) -> usize {
        match self {
            Event::SimulationStarted { step, .. } => *step,
            Event::PolicyActivated { step, .. } => *step,
            Event::MetricGuarded { step, .. } => *step,
            Event::StepCompleted { step, .. } => *step,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SimulationStarted { .. } => "SimulationStarted",
            Event::PolicyActivated { .. } => "PolicyActivated",
            Event::MetricGuarded { .. } => "MetricGuarded",
            Event::StepCompleted { .. } => "StepCompleted",
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific step
    pub fn events_at_step(&self, step: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.step() == step).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_queries() {
        let mut log = EventLog::new();
        log.log(Event::MetricGuarded {
            step: 3,
            metric: "share_pct_upper".to_string(),
            reason: "empty group".to_string(),
        });
        log.log(Event::StepCompleted {
            step: 3,
            car_count: 10,
            congestion_level: 1.01,
            total_ghg: 5.0,
            total_system_profit: -2.0,
        });
        log.log(Event::StepCompleted {
            step: 4,
            car_count: 12,
            congestion_level: 1.02,
            total_ghg: 6.0,
            total_system_profit: -3.0,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.events_at_step(3).len(), 2);
        assert_eq!(log.events_of_type("StepCompleted").len(), 2);
        assert!(log.events_of_type("PolicyActivated").is_empty());

        log.clear();
        assert!(log.is_empty());
    }
}
