//! Health state indices and the ordered state space ending in death.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, Result};

/// Index of a health state. States are ordered from least to most severe,
/// the last one being the absorbing death state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HealthState(pub usize);

impl HealthState {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state {}", self.0)
    }
}

/// Ordered names of the health states in a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpace {
    names: Vec<String>,
}

impl StateSpace {
    /// Needs at least one living state plus the terminal one.
    pub fn new<S: Into<String>>(names: Vec<S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() < 2 {
            return Err(ModelError::invalid(format!(
                "need at least 2 health states (one alive, one dead), got {}",
                names.len()
            )));
        }
        Ok(StateSpace { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn terminal(&self) -> HealthState {
        HealthState(self.names.len() - 1)
    }

    pub fn is_terminal(&self, state: HealthState) -> bool {
        state == self.terminal()
    }

    pub fn name(&self, state: HealthState) -> &str {
        self.names.get(state.0).map(String::as_str).unwrap_or("?")
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up a state by name (case-sensitive).
    pub fn find(&self, name: &str) -> Option<HealthState> {
        self.names.iter().position(|n| n == name).map(HealthState)
    }

}
