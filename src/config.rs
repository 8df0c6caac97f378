//! Static model inputs: state names, transition counts, costs, utilities,
//! discounting and run size.
//!
//! Defaults reproduce the HIV mono (zidovudine) versus combination
//! (zidovudine + lamivudine) therapy model.

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ModelError, Result};
use crate::transitions::TransitionCounts;

pub const ZIDOVUDINE_COST: f64 = 2278.0;
pub const LAMIVUDINE_COST: f64 = 2086.0;
pub const TREATMENT_RR: f64 = 0.509;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ordered least to most severe; the last entry is the absorbing death state.
    pub state_names: Vec<String>,
    pub initial_state: String,
    pub transition_counts: Vec<Vec<u64>>,
    /// Annual drug cost under mono therapy.
    pub mono_drug_cost: f64,
    /// Extra annual drug cost added on top of mono therapy for the combination.
    pub add_on_drug_cost: f64,
    pub combo_relative_risk: f64,
    pub annual_state_costs: Vec<f64>,
    pub annual_state_utilities: Vec<f64>,
    pub discount_rate: f64,
    pub population_size: usize,
    pub horizon: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            state_names: vec![
                "CD4_200to500".to_string(),
                "CD4_200".to_string(),
                "AIDS".to_string(),
                "HIV_DEATH".to_string(),
            ],
            initial_state: "CD4_200to500".to_string(),
            // Chancellor et al. 1997 cohort counts
            transition_counts: vec![
                vec![1251, 350, 116, 17],
                vec![0, 731, 512, 15],
                vec![0, 0, 1312, 437],
                vec![0, 0, 0, 469],
            ],
            mono_drug_cost: ZIDOVUDINE_COST,
            add_on_drug_cost: LAMIVUDINE_COST,
            combo_relative_risk: TREATMENT_RR,
            // direct medical + community care
            annual_state_costs: vec![2756.0 + 1701.0, 3052.0 + 1774.0, 9007.0 + 6948.0, 0.0],
            annual_state_utilities: vec![0.75, 0.50, 0.25, 0.0],
            discount_rate: 0.03,
            population_size: 2000,
            horizon: 20,
            seed: default_seed(),
        }
    }
}

impl ModelConfig {
    /// Read a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: ModelConfig = serde_json::from_str(&contents)?;
        log::info!("Loaded model config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Read a JSON config file, or fall back to the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded model config from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse model config: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Model config file not found, using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn counts(&self) -> Result<TransitionCounts> {
        TransitionCounts::new(self.transition_counts.clone())
    }
}

// === CSV COUNTS ===

/// Read a transition count table.
///
/// Format: one header line, then one line per from-state. The first column
/// is the from-state label and the remaining columns are counts per to-state.
pub fn read_transition_counts<P: AsRef<Path>>(path: P) -> Result<TransitionCounts> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let line = i + 2;
        let mut row = Vec::with_capacity(record.len().saturating_sub(1));
        for field in record.iter().skip(1) {
            let count = field.parse::<u64>().map_err(|_| {
                ModelError::Config(format!("invalid count {:?} at line {}", field, line))
            })?;
            row.push(count);
        }
        rows.push(row);
    }

    log::debug!("Read {} count rows from {:?}", rows.len(), path.as_ref());
    TransitionCounts::new(rows)
}
