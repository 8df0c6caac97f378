//! Single-patient Markov walk and its per-step cost and utility attribution.

use rand::Rng;

use crate::economics::discount_factor;
use crate::parameters::ParameterSet;
use crate::states::HealthState;

/// Alive states visited by one patient, one per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientPath {
    states: Vec<HealthState>,
    died: bool,
}

impl PatientPath {
    /// Number of time steps spent alive.
    pub fn survival_time(&self) -> usize {
        self.states.len()
    }

    /// Whether the patient reached the death state within the horizon.
    pub fn died(&self) -> bool {
        self.died
    }

    pub fn states(&self) -> &[HealthState] {
        &self.states
    }

    /// Whether the patient counts as alive at step `t` of a run with the given horizon.
    pub fn alive_at(&self, t: usize, horizon: usize) -> bool {
        t < self.states.len() || (!self.died && t <= horizon)
    }

    /// Sum of (treatment + state) cost over the alive steps, discounted per step.
    pub fn discounted_cost(&self, params: &ParameterSet) -> f64 {
        self.states
            .iter()
            .enumerate()
            .map(|(t, &s)| params.annual_cost(s) * discount_factor(params.discount_rate(), t))
            .sum()
    }

    pub fn discounted_utility(&self, params: &ParameterSet) -> f64 {
        self.states
            .iter()
            .enumerate()
            .map(|(t, &s)| params.annual_utility(s) * discount_factor(params.discount_rate(), t))
            .sum()
    }
}

// === SIMULATION ===

/// Walk one patient from the initial state until death or `horizon` steps.
pub fn simulate_patient<R: Rng + ?Sized>(rng: &mut R, params: &ParameterSet, horizon: usize) -> PatientPath {
    let matrix = params.prob_matrix();
    let space = params.states();
    let mut state = params.initial_state();
    let mut states = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        if space.is_terminal(state) {
            break;
        }
        states.push(state);
        state = matrix.sample_next(rng, state);
    }

    PatientPath { states, died: space.is_terminal(state) }
}
