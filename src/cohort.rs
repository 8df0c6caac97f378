//! Cohort simulation: one independent Markov walk per patient, aggregated
//! into a survival curve and discounted cost/utility totals.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::parameters::ParameterSet;
use crate::patient::{simulate_patient, PatientPath};
use crate::stats::{mean, median};

// === OUTCOMES ===

/// Aggregated results of one cohort run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortOutcomes {
    /// Patients alive at each step 0..=horizon.
    survival_curve: Vec<usize>,
    survival_times: Vec<usize>,
    discounted_costs: Vec<f64>,
    discounted_utilities: Vec<f64>,
    n_deaths: usize,
}

impl CohortOutcomes {
    fn new(horizon: usize, population_size: usize) -> Self {
        CohortOutcomes {
            survival_curve: vec![0; horizon + 1],
            survival_times: Vec::with_capacity(population_size),
            discounted_costs: Vec::with_capacity(population_size),
            discounted_utilities: Vec::with_capacity(population_size),
            n_deaths: 0,
        }
    }

    fn record(&mut self, path: &PatientPath, params: &ParameterSet) {
        let horizon = self.survival_curve.len() - 1;
        for (t, alive) in self.survival_curve.iter_mut().enumerate() {
            if path.alive_at(t, horizon) {
                *alive += 1;
            }
        }
        if path.died() {
            self.n_deaths += 1;
        }
        self.survival_times.push(path.survival_time());
        self.discounted_costs.push(path.discounted_cost(params));
        self.discounted_utilities.push(path.discounted_utility(params));
    }

    pub fn survival_curve(&self) -> &[usize] { &self.survival_curve }
    pub fn survival_times(&self) -> &[usize] { &self.survival_times }
    pub fn discounted_costs(&self) -> &[f64] { &self.discounted_costs }
    pub fn discounted_utilities(&self) -> &[f64] { &self.discounted_utilities }
    pub fn n_deaths(&self) -> usize { self.n_deaths }

    pub fn population_size(&self) -> usize {
        self.survival_times.len()
    }

    pub fn horizon(&self) -> usize {
        self.survival_curve.len() - 1
    }

    pub fn mean_survival_time(&self) -> f64 {
        let times: Vec<f64> = self.survival_times.iter().map(|&t| t as f64).collect();
        mean(&times)
    }

    pub fn median_survival_time(&self) -> f64 {
        let times: Vec<f64> = self.survival_times.iter().map(|&t| t as f64).collect();
        median(&times)
    }

    pub fn total_discounted_cost(&self) -> f64 {
        self.discounted_costs.iter().sum()
    }

    pub fn mean_discounted_cost(&self) -> f64 {
        mean(&self.discounted_costs)
    }

    pub fn total_discounted_utility(&self) -> f64 {
        self.discounted_utilities.iter().sum()
    }

    pub fn mean_discounted_utility(&self) -> f64 {
        mean(&self.discounted_utilities)
    }
}

// === SIMULATION ===

pub struct Cohort<'a> {
    id: u64,
    population_size: usize,
    horizon: usize,
    params: &'a ParameterSet,
}

impl<'a> Cohort<'a> {
    pub fn new(id: u64, population_size: usize, horizon: usize, params: &'a ParameterSet) -> Result<Self> {
        if population_size == 0 {
            return Err(ModelError::invalid("population size must be positive"));
        }
        if horizon == 0 {
            return Err(ModelError::invalid("simulation horizon must be positive"));
        }
        Ok(Cohort { id, population_size, horizon, params })
    }

    /// Patient `i` draws from its own generator seeded with `seed + i`
    /// (wrapping), and results are merged in patient order.
    pub fn simulate(&self, seed: u64) -> CohortOutcomes {
        log::info!(
            "Cohort {}: simulating {} patients on {} for {} steps (seed {})",
            self.id, self.population_size, self.params.therapy(), self.horizon, seed
        );

        let mut outcomes = CohortOutcomes::new(self.horizon, self.population_size);
        for i in 0..self.population_size {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let path = simulate_patient(&mut rng, self.params, self.horizon);
            outcomes.record(&path, self.params);
        }

        log::debug!(
            "Cohort {}: {} deaths, survival curve {:?}",
            self.id, outcomes.n_deaths(), outcomes.survival_curve()
        );
        log::info!(
            "Cohort {}: mean survival {:.2}, mean discounted cost {:.2}, mean discounted utility {:.4}",
            self.id,
            outcomes.mean_survival_time(),
            outcomes.mean_discounted_cost(),
            outcomes.mean_discounted_utility()
        );
        outcomes
    }
}

/// Validate the run size and simulate a cohort in one call.
pub fn simulate(population_size: usize, horizon: usize, params: &ParameterSet, seed: u64) -> Result<CohortOutcomes> {
    Ok(Cohort::new(1, population_size, horizon, params)?.simulate(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::parameters::Therapy;

    #[test]
    fn test_outcome_shapes() {
        let params = ParameterSet::new(&ModelConfig::default(), Therapy::Mono).unwrap();
        let out = simulate(300, 12, &params, 5).unwrap();
        assert_eq!(out.survival_curve().len(), 13);
        assert_eq!(out.survival_times().len(), 300);
        assert_eq!(out.population_size(), 300);
        assert_eq!(out.horizon(), 12);
        assert_eq!(out.survival_curve()[0], 300);
        assert_eq!(out.survival_curve()[12], 300 - out.n_deaths());
    }

    #[test]
    fn test_curve_non_increasing_and_times_bounded() {
        let params = ParameterSet::new(&ModelConfig::default(), Therapy::Combo).unwrap();
        let out = simulate(500, 20, &params, 2024).unwrap();
        assert!(out.survival_curve().windows(2).all(|w| w[1] <= w[0]));
        assert!(out.survival_times().iter().all(|&t| t <= 20));
    }

    #[test]
    fn test_deterministic_given_seed() {
        let params = ParameterSet::new(&ModelConfig::default(), Therapy::Mono).unwrap();
        let a = simulate(200, 20, &params, 77).unwrap();
        let b = simulate(200, 20, &params, 77).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mean_discounted_cost().to_bits(), b.mean_discounted_cost().to_bits());

        let c = simulate(200, 20, &params, 78).unwrap();
        assert_ne!(a.survival_times(), c.survival_times());
    }

    #[test]
    fn test_totals_match_means() {
        let params = ParameterSet::new(&ModelConfig::default(), Therapy::Mono).unwrap();
        let out = simulate(100, 10, &params, 1).unwrap();
        assert!((out.total_discounted_cost() / 100.0 - out.mean_discounted_cost()).abs() < 1e-6);
        assert!((out.total_discounted_utility() / 100.0 - out.mean_discounted_utility()).abs() < 1e-9);
    }

    #[test]
    fn test_outcomes_serialize_to_json() {
        let params = ParameterSet::new(&ModelConfig::default(), Therapy::Mono).unwrap();
        let out = simulate(20, 5, &params, 4).unwrap();
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["survival_curve"].as_array().unwrap().len(), 6);
        assert_eq!(value["survival_times"].as_array().unwrap().len(), 20);
        assert_eq!(value["n_deaths"].as_u64().unwrap() as usize, out.n_deaths());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let params = ParameterSet::new(&ModelConfig::default(), Therapy::Mono).unwrap();
        assert!(matches!(simulate(0, 10, &params, 1), Err(ModelError::InvalidParameter { .. })));
        assert!(matches!(simulate(10, 0, &params, 1), Err(ModelError::InvalidParameter { .. })));
    }
}
