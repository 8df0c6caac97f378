//! Discounting and the incremental comparison of two therapies.

use serde::Serialize;

use crate::cohort::{Cohort, CohortOutcomes};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::parameters::{ParameterSet, Therapy};
use crate::transitions::TransitionCounts;

/// Present-value factor for a payment `t` periods ahead.
pub fn discount_factor(rate: f64, t: usize) -> f64 {
    1.0 / (1.0 + rate).powf(t as f64)
}

/// Alternative minus base, per patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyComparison {
    pub incremental_cost: f64,
    pub incremental_utility: f64,
    pub incremental_survival: f64,
    /// Cost per unit of utility gained; `None` when utility does not change.
    pub icer: Option<f64>,
}

pub fn compare(base: &CohortOutcomes, alternative: &CohortOutcomes) -> StrategyComparison {
    let incremental_cost = alternative.mean_discounted_cost() - base.mean_discounted_cost();
    let incremental_utility = alternative.mean_discounted_utility() - base.mean_discounted_utility();
    let incremental_survival = alternative.mean_survival_time() - base.mean_survival_time();
    let icer = if incremental_utility != 0.0 {
        Some(incremental_cost / incremental_utility)
    } else {
        None
    };
    StrategyComparison { incremental_cost, incremental_utility, incremental_survival, icer }
}

/// Both cohorts plus their comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResults {
    pub mono: CohortOutcomes,
    pub combo: CohortOutcomes,
    pub comparison: StrategyComparison,
}

/// Simulate mono and combination therapy with the same seed and compare them.
pub fn run_strategies(config: &ModelConfig, seed: u64) -> Result<StrategyResults> {
    let counts = config.counts()?;
    run_strategies_with_counts(config, &counts, seed)
}

pub fn run_strategies_with_counts(config: &ModelConfig, counts: &TransitionCounts, seed: u64) -> Result<StrategyResults> {
    // Resolve and validate everything before simulating either arm.
    let mono_params = ParameterSet::from_counts(config, counts, Therapy::Mono)?;
    let combo_params = ParameterSet::from_counts(config, counts, Therapy::Combo)?;
    let mono_cohort = Cohort::new(1, config.population_size, config.horizon, &mono_params)?;
    let combo_cohort = Cohort::new(2, config.population_size, config.horizon, &combo_params)?;

    let mono = mono_cohort.simulate(seed);
    let combo = combo_cohort.simulate(seed);
    let comparison = compare(&mono, &combo);
    log::info!(
        "Combination vs mono: +{:.2} cost, +{:.4} utility, ICER {:?}",
        comparison.incremental_cost, comparison.incremental_utility, comparison.icer
    );
    Ok(StrategyResults { mono, combo, comparison })
}
