//! Cost Types
//!
//! This module provides:
//! - Rate configuration (`CostRates`, `CongestionConfig`, `TransitConfig`, `RoadConfig`)
//! - The per-step ledger of congestion cost, emissions and finances (`CostLedger`)

pub mod ledger;
pub mod rates;

// Re-exports
pub use ledger::{CongestionCost, CostLedger, Emissions, LedgerInputs, RoadFinance, TransitFinance};
pub use rates::{CongestionConfig, CostRates, RoadConfig, TransitConfig};
