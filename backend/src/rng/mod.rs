//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the simulator MUST go through this module.
//! Income draws, car ownership, commute distances, the per-step agent
//! shuffle and every mode draw consume the same single stream.

mod distributions;
mod xorshift;

pub use xorshift::RngManager;
