//! Transition probability matrices: raw counts to row-stochastic
//! probabilities, and the relative-risk adjusted combination variant.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::states::HealthState;

/// Allowed deviation of a row sum from 1.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

// === COUNTS ===

/// Observed transition counts, row = from-state, column = to-state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCounts {
    counts: Vec<Vec<u64>>,
}

impl TransitionCounts {
    pub fn new(counts: Vec<Vec<u64>>) -> Result<Self> {
        check_square(counts.iter().map(Vec::len), counts.len())?;
        Ok(TransitionCounts { counts })
    }

    pub fn n_states(&self) -> usize {
        self.counts.len()
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.counts
    }
}

// === PROBABILITIES ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    probs: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Wrap an explicit probability table. Use [`TransitionMatrix::validate`]
    /// before simulating with it.
    pub fn new(probs: Vec<Vec<f64>>) -> Result<Self> {
        check_square(probs.iter().map(Vec::len), probs.len())?;
        Ok(TransitionMatrix { probs })
    }

    pub fn n_states(&self) -> usize {
        self.probs.len()
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.probs[from][to]
    }

    pub fn row(&self, state: HealthState) -> &[f64] {
        &self.probs[state.index()]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.probs
    }

    /// Check entries lie in [0,1], rows sum to 1, and the last state is absorbing.
    pub fn validate(&self) -> Result<()> {
        self.check_stochastic()?;
        let last = self.probs.len() - 1;
        if self.probs[last][last] != 1.0 {
            return Err(ModelError::invalid(format!(
                "terminal state {} is not absorbing ({:?})",
                last, self.probs[last]
            )));
        }
        Ok(())
    }

    /// Check entries lie in [0,1] and every row sums to 1.
    pub fn check_stochastic(&self) -> Result<()> {
        for (s, row) in self.probs.iter().enumerate() {
            if let Some((t, &p)) = row
                .iter()
                .enumerate()
                .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0)
            {
                return Err(ModelError::invalid(format!(
                    "probability [{}][{}] = {} outside [0, 1]",
                    s, t, p
                )));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ModelError::invalid(format!(
                    "row {} sums to {} instead of 1 ({:?})",
                    s, sum, row
                )));
            }
        }
        Ok(())
    }

    /// Draw the next state from the current state's row.
    pub fn sample_next<R: Rng + ?Sized>(&self, rng: &mut R, current: HealthState) -> HealthState {
        let u: f64 = rng.gen();
        let mut cumulative = 0.0;
        self.probs[current.index()]
            .iter()
            .position(|&p| {
                cumulative += p;
                u < cumulative
            })
            .map(HealthState)
            // A row within tolerance below 1 can miss every bucket; the patient stays put.
            .unwrap_or(current)
    }

    /// State occupancy distribution after `steps` transitions from a single
    /// starting state.
    pub fn distribution_after(&self, initial: HealthState, steps: usize) -> Vec<f64> {
        let n = self.n_states();
        let mut dist = vec![0.0; n];
        dist[initial.index()] = 1.0;
        for _ in 0..steps {
            let mut next = vec![0.0; n];
            for (s, &mass) in dist.iter().enumerate() {
                if mass == 0.0 { continue; }
                for (t, &p) in self.probs[s].iter().enumerate() {
                    next[t] += mass * p;
                }
            }
            dist = next;
        }
        dist
    }
}

fn check_square<I: Iterator<Item = usize>>(row_lens: I, n: usize) -> Result<()> {
    if n == 0 {
        return Err(ModelError::invalid("transition matrix has no rows"));
    }
    for (i, len) in row_lens.enumerate() {
        if len != n {
            return Err(ModelError::invalid(format!(
                "transition matrix is not square: row {} has {} entries, expected {}",
                i, len, n
            )));
        }
    }
    Ok(())
}

// === BUILDERS ===

/// Normalise each count row into probabilities.
pub fn build_mono_probabilities(counts: &TransitionCounts) -> Result<TransitionMatrix> {
    let mut probs = Vec::with_capacity(counts.n_states());
    for (state, row) in counts.rows().iter().enumerate() {
        let total: u64 = row.iter().sum();
        if total == 0 {
            return Err(ModelError::DivisionByZero { state, row: row.clone() });
        }
        let total = total as f64;
        probs.push(row.iter().map(|&c| c as f64 / total).collect());
    }
    Ok(TransitionMatrix { probs })
}

/// Scale state-worsening transitions by `relative_risk` and rebalance the
/// diagonal. Transitions to better states are set to zero.
///
/// `mono` must be row-stochastic. The diagonal is computed as the mono
/// diagonal plus the mass removed from the other entries, which equals
/// `1 - sum(upper)` for a stochastic row and leaves the row untouched when
/// `relative_risk == 1`.
pub fn build_combo_probabilities(mono: &TransitionMatrix, relative_risk: f64) -> Result<TransitionMatrix> {
    mono.check_stochastic()?;
    if !relative_risk.is_finite() || relative_risk < 0.0 {
        return Err(ModelError::invalid(format!(
            "relative risk must be a non-negative finite number, got {}",
            relative_risk
        )));
    }

    let n = mono.n_states();
    let mut probs = vec![vec![0.0; n]; n];

    for s in 0..n {
        let mut released = 0.0;
        for t in 0..s {
            released += mono.probs[s][t];
        }
        let mut upper = 0.0;
        for t in (s + 1)..n {
            let p = relative_risk * mono.probs[s][t];
            probs[s][t] = p;
            upper += p;
            released += mono.probs[s][t] - p;
        }
        let diagonal = mono.probs[s][s] + released;
        if diagonal < -ROW_SUM_TOLERANCE || upper > 1.0 + ROW_SUM_TOLERANCE {
            return Err(ModelError::invalid(format!(
                "relative risk {} drives the diagonal of state {} negative \
                 (worsening transitions sum to {:.6})",
                relative_risk, s, upper
            )));
        }
        // Only rounding noise is left outside [0, 1] at this point.
        probs[s][s] = diagonal.clamp(0.0, 1.0);
    }

    Ok(TransitionMatrix { probs })
}
