//! Per-therapy parameter set, resolved once from a [`ModelConfig`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::states::{HealthState, StateSpace};
use crate::transitions::{
    build_combo_probabilities, build_mono_probabilities, TransitionCounts, TransitionMatrix,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Therapy {
    Mono,
    Combo,
}

impl Therapy {
    pub fn parse(s: &str) -> Option<Therapy> {
        match s.to_lowercase().as_str() {
            "mono" | "m" => Some(Therapy::Mono),
            "combo" | "c" | "combination" => Some(Therapy::Combo),
            _ => None,
        }
    }
}

impl fmt::Display for Therapy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Therapy::Mono => write!(f, "Mono Therapy"),
            Therapy::Combo => write!(f, "Combination Therapy"),
        }
    }
}

/// Everything a cohort run needs for one therapy. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    therapy: Therapy,
    states: StateSpace,
    initial_state: HealthState,
    prob_matrix: TransitionMatrix,
    annual_treatment_cost: f64,
    annual_state_costs: Vec<f64>,
    annual_state_utilities: Vec<f64>,
    discount_rate: f64,
}

impl ParameterSet {
    /// Resolve the therapy's matrix and costs from the config counts.
    pub fn new(config: &ModelConfig, therapy: Therapy) -> Result<Self> {
        let counts = config.counts()?;
        Self::from_counts(config, &counts, therapy)
    }

    /// Same as [`ParameterSet::new`] but with counts supplied separately,
    /// e.g. read from a CSV table.
    pub fn from_counts(config: &ModelConfig, counts: &TransitionCounts, therapy: Therapy) -> Result<Self> {
        let states = StateSpace::new(config.state_names.clone())?;
        if counts.n_states() != states.len() {
            return Err(ModelError::invalid(format!(
                "{} health states but a {}x{} count matrix",
                states.len(),
                counts.n_states(),
                counts.n_states()
            )));
        }

        let mono = build_mono_probabilities(counts)?;
        let (prob_matrix, annual_treatment_cost) = match therapy {
            Therapy::Mono => (mono, config.mono_drug_cost),
            Therapy::Combo => (
                build_combo_probabilities(&mono, config.combo_relative_risk)?,
                config.mono_drug_cost + config.add_on_drug_cost,
            ),
        };

        let initial_state = states.find(&config.initial_state).ok_or_else(|| {
            ModelError::invalid(format!(
                "unknown initial state {:?} (known: {:?})",
                config.initial_state,
                states.names()
            ))
        })?;

        Self::from_parts(
            therapy,
            states,
            initial_state,
            prob_matrix,
            annual_treatment_cost,
            config.annual_state_costs.clone(),
            config.annual_state_utilities.clone(),
            config.discount_rate,
        )
    }

    /// Assemble a parameter set from already-resolved pieces, validating all of them.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        therapy: Therapy,
        states: StateSpace,
        initial_state: HealthState,
        prob_matrix: TransitionMatrix,
        annual_treatment_cost: f64,
        annual_state_costs: Vec<f64>,
        annual_state_utilities: Vec<f64>,
        discount_rate: f64,
    ) -> Result<Self> {
        let n = states.len();
        if prob_matrix.n_states() != n {
            return Err(ModelError::invalid(format!(
                "{} health states but a {}-state probability matrix",
                n,
                prob_matrix.n_states()
            )));
        }
        prob_matrix.validate()?;

        if initial_state.index() >= n {
            return Err(ModelError::invalid(format!("initial {} out of range", initial_state)));
        }
        if states.is_terminal(initial_state) {
            return Err(ModelError::invalid(format!(
                "initial state {:?} is the absorbing death state",
                states.name(initial_state)
            )));
        }

        if !annual_treatment_cost.is_finite() || annual_treatment_cost < 0.0 {
            return Err(ModelError::invalid(format!(
                "annual treatment cost must be non-negative, got {}",
                annual_treatment_cost
            )));
        }
        check_per_state("annual state cost", &annual_state_costs, &states)?;
        check_per_state("annual state utility", &annual_state_utilities, &states)?;

        if !discount_rate.is_finite() || !(0.0..1.0).contains(&discount_rate) {
            return Err(ModelError::invalid(format!(
                "discount rate must be in [0, 1), got {}",
                discount_rate
            )));
        }

        Ok(ParameterSet {
            therapy,
            states,
            initial_state,
            prob_matrix,
            annual_treatment_cost,
            annual_state_costs,
            annual_state_utilities,
            discount_rate,
        })
    }

    pub fn therapy(&self) -> Therapy { self.therapy }
    pub fn states(&self) -> &StateSpace { &self.states }
    pub fn initial_state(&self) -> HealthState { self.initial_state }
    pub fn prob_matrix(&self) -> &TransitionMatrix { &self.prob_matrix }
    pub fn annual_treatment_cost(&self) -> f64 { self.annual_treatment_cost }
    pub fn annual_state_costs(&self) -> &[f64] { &self.annual_state_costs }
    pub fn annual_state_utilities(&self) -> &[f64] { &self.annual_state_utilities }
    pub fn discount_rate(&self) -> f64 { self.discount_rate }

    /// Treatment plus state cost for one year spent in `state`.
    pub fn annual_cost(&self, state: HealthState) -> f64 {
        self.annual_treatment_cost + self.annual_state_costs[state.index()]
    }

    pub fn annual_utility(&self, state: HealthState) -> f64 {
        self.annual_state_utilities[state.index()]
    }
}

fn check_per_state(what: &str, values: &[f64], states: &StateSpace) -> Result<()> {
    if values.len() != states.len() {
        return Err(ModelError::invalid(format!(
            "{} has {} entries for {} health states",
            what,
            values.len(),
            states.len()
        )));
    }
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        return Err(ModelError::invalid(format!(
            "{} for {:?} must be non-negative, got {}",
            what,
            states.name(HealthState(i)),
            v
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_and_combo_costs() {
        let config = ModelConfig::default();
        let mono = ParameterSet::new(&config, Therapy::Mono).unwrap();
        let combo = ParameterSet::new(&config, Therapy::Combo).unwrap();

        assert_eq!(mono.annual_treatment_cost(), 2278.0);
        assert_eq!(combo.annual_treatment_cost(), 2278.0 + 2086.0);
        assert_eq!(mono.initial_state(), HealthState(0));
        assert_eq!(mono.annual_cost(HealthState(0)), 2278.0 + 4457.0);
        assert_eq!(combo.therapy(), Therapy::Combo);
        assert_ne!(mono.prob_matrix(), combo.prob_matrix());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut config = ModelConfig::default();
        config.annual_state_costs[1] = -10.0;
        let err = ParameterSet::new(&config, Therapy::Mono).unwrap_err();
        assert!(err.to_string().contains("CD4_200"), "{}", err);
    }

    #[test]
    fn test_negative_utility_rejected() {
        let mut config = ModelConfig::default();
        config.annual_state_utilities[0] = -0.1;
        match ParameterSet::new(&config, Therapy::Combo) {
            Err(ModelError::InvalidParameter { reason }) => {
                assert!(reason.contains("utility"), "{}", reason)
            }
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_discount_rate_rejected() {
        let mut config = ModelConfig::default();
        config.discount_rate = 1.0;
        assert!(ParameterSet::new(&config, Therapy::Mono).is_err());
        config.discount_rate = -0.01;
        assert!(ParameterSet::new(&config, Therapy::Mono).is_err());
    }

    #[test]
    fn test_rr_only_checked_for_combo() {
        let mut config = ModelConfig::default();
        config.combo_relative_risk = 10.0;
        assert!(ParameterSet::new(&config, Therapy::Mono).is_ok());
        assert!(matches!(
            ParameterSet::new(&config, Therapy::Combo),
            Err(ModelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_initial_state_checks() {
        let mut config = ModelConfig::default();
        config.initial_state = "HIV_DEATH".to_string();
        assert!(ParameterSet::new(&config, Therapy::Mono).is_err());
        config.initial_state = "Cured".to_string();
        assert!(ParameterSet::new(&config, Therapy::Mono).is_err());
        config.initial_state = "AIDS".to_string();
        let params = ParameterSet::new(&config, Therapy::Mono).unwrap();
        assert_eq!(params.initial_state(), HealthState(2));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut config = ModelConfig::default();
        config.annual_state_utilities.pop();
        assert!(ParameterSet::new(&config, Therapy::Mono).is_err());

        let mut config = ModelConfig::default();
        config.state_names.pop();
        assert!(ParameterSet::new(&config, Therapy::Mono).is_err());
    }

    #[test]
    fn test_therapy_parse() {
        assert_eq!(Therapy::parse("MONO"), Some(Therapy::Mono));
        assert_eq!(Therapy::parse("combo"), Some(Therapy::Combo));
        assert_eq!(Therapy::parse("triple"), None);
    }
}
