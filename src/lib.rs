//! Crowd Consensus Engine
//!
//! Turns the positions of individual prediction-market traders into a
//! calibrated YES probability and a bankroll-safe bet recommendation.
//!
//! ## Architecture
//!
//! ```text
//! Traders → Weighting → Aggregation → Calibration → Betting
//!               ↑            ↑             ↑            ↑
//!                      EngineConfig (classic / advanced presets)
//! ```

pub mod aggregation;
pub mod betting;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod stats;
pub mod types;
pub mod weighting;

pub use engine::{ConsensusEngine, ConsensusReport};

#[cfg(test)]
mod config_tests;
