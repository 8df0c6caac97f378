//! Markov cohort model for comparing mono and combination therapy.
//!
//! Raw transition counts become a row-stochastic matrix per therapy, and a
//! simulated cohort walks that chain to produce a survival curve plus
//! discounted cost and utility.

pub mod cohort;
pub mod config;
pub mod economics;
pub mod error;
pub mod parameters;
pub mod patient;
pub mod states;
pub mod stats;
pub mod transitions;

pub use cohort::{simulate, Cohort, CohortOutcomes};
pub use config::{read_transition_counts, ModelConfig};
pub use economics::{compare, discount_factor, run_strategies, StrategyComparison, StrategyResults};
pub use error::{ModelError, Result};
pub use parameters::{ParameterSet, Therapy};
pub use patient::{simulate_patient, PatientPath};
pub use states::{HealthState, StateSpace};
pub use transitions::{
    build_combo_probabilities, build_mono_probabilities, TransitionCounts, TransitionMatrix,
    ROW_SUM_TOLERANCE,
};
